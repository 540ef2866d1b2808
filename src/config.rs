//! Interpreter configuration
//!
//! [`Config`] replaces passing a bare timezone string to [`crate::interpreter::Interpreter::new`]
//! with a small struct, so a host can also opt standard-library modules in or out without
//! threading extra constructor arguments through.

/// Which standard-library modules a freshly created interpreter should import.
///
/// All fields default to `true`; a host that wants a bare interpreter (no standard
/// words at all) can start from `StandardModules::none()` and opt modules back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardModules {
    pub core: bool,
    pub array: bool,
    pub record: bool,
    pub string: bool,
    pub boolean: bool,
    pub math: bool,
    pub datetime: bool,
}

impl StandardModules {
    /// No standard-library modules imported.
    pub fn none() -> Self {
        Self {
            core: false,
            array: false,
            record: false,
            string: false,
            boolean: false,
            math: false,
            datetime: false,
        }
    }

    /// Every standard-library module imported.
    pub fn all() -> Self {
        Self {
            core: true,
            array: true,
            record: true,
            string: true,
            boolean: true,
            math: true,
            datetime: true,
        }
    }
}

impl Default for StandardModules {
    fn default() -> Self {
        Self::all()
    }
}

/// Interpreter construction settings.
///
/// # Examples
///
/// ```
/// use forthic::config::Config;
///
/// let config = Config::new("America/Los_Angeles");
/// assert_eq!(config.timezone, "America/Los_Angeles");
/// assert!(config.standard_modules.core);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Timezone used to resolve wildcard/local-time literals (e.g. "UTC", "America/Los_Angeles")
    pub timezone: String,
    /// Which standard-library modules to import on construction
    pub standard_modules: StandardModules,
}

impl Config {
    /// Create a config with the given timezone and every standard module enabled.
    pub fn new(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            standard_modules: StandardModules::all(),
        }
    }

    /// Create a config with no standard-library modules imported.
    pub fn bare(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            standard_modules: StandardModules::none(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("UTC")
    }
}
