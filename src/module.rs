//! Module system for Forthic
//!
//! This module provides the core abstractions for organizing Forthic code:
//! - **Variable**: Named mutable value containers
//! - **Word**: Executable units (trait and implementations)
//! - **Module**: Containers for words, variables, and imported modules
//! - **WordErrorHandler**: Per-word error handling
//!
//! # Word Types
//!
//! - **PushValueWord**: Pushes a literal value onto the stack
//! - **DefinitionWord**: User-defined word composed of other words
//! - **ModuleMemoWord**: Memoized word that caches its result
//! - **ModuleMemoBangWord**: Forces refresh of a memoized word
//! - **ModuleMemoBangAtWord**: Refreshes and returns memoized value
//! - **ExecuteWord**: Wrapper that executes another word (for prefixed imports)
//! - **ModuleWord**: Word with integrated per-word error handling support
//! - **RemoteWord**: Word that delegates execution to a host-supplied transport
//!
//! # Module Features
//!
//! - Word and variable management
//! - Module importing with optional prefixes
//! - Exportable word lists for controlled visibility
//! - Module duplication for isolated execution contexts
//! - Per-word error handlers with automatic retry logic

use crate::errors::{CodeLocation, ForthicError};
use crate::literals::ForthicValue;
use crate::remote::RemoteTransport;
use crate::word_options::WordOptions;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// Forward declaration - Interpreter will be defined in interpreter.rs
// We use a trait to avoid circular dependencies
pub trait InterpreterContext {
    fn stack_push(&mut self, value: ForthicValue);
    fn stack_pop(&mut self) -> Result<ForthicValue, ForthicError>;
    fn stack_peek(&self) -> Option<&ForthicValue>;
    /// Current number of values on the stack. Used by array construction to find
    /// how far back a `[` reached without a sentinel value on the stack itself.
    fn stack_len(&self) -> usize;
    /// Record a `[` at the given stack depth.
    fn array_mark_push(&mut self, depth: usize);
    /// Pop the most recently recorded `[` depth. Errors if none is pending.
    fn array_mark_pop(&mut self) -> Result<usize, ForthicError>;
    fn cur_module(&self) -> &Module;
    fn cur_module_mut(&mut self) -> &mut Module;
    fn get_app_module(&self) -> &Module;
    fn module_stack_push(&mut self, module: Module);
    fn module_stack_pop(&mut self) -> Result<Module, ForthicError>;
    /// Push the exportable-name set of the Definition that is about to run, so `EXPORT`
    /// reaches the module where the enclosing `:`/`@:` was compiled rather than whatever
    /// module happens to be current when the word actually executes. Default is a no-op:
    /// contexts that never run a `DefinitionWord` (most tests) don't need to track this.
    fn exportable_stack_push(&mut self, _exportable: Arc<Mutex<Vec<String>>>) {}
    /// Pop the handle pushed by the matching `exportable_stack_push`.
    fn exportable_stack_pop(&mut self) {}
    /// The exportable handle belonging to the innermost Definition currently executing,
    /// if any. `EXPORT` falls back to `cur_module_mut()` when this is `None`.
    fn current_exportable(&self) -> Option<Arc<Mutex<Vec<String>>>> {
        None
    }
    /// Timezone used to resolve datetime words (e.g. `TODAY`, `NOW`). Words never capture
    /// a timezone themselves, since a `ModuleWord` handler is a bare `fn`, not a closure.
    fn timezone(&self) -> &str;
    /// Run `code` against the same interpreter, in its current module, sharing the stack.
    /// Backs `INTERPRET`.
    fn interpret(&mut self, code: &str) -> Result<(), ForthicError>;
    /// Stash options parsed by `~>` for the next word to pick up. `WordOptions` never
    /// appears on the data stack itself, so this is a one-shot side channel instead.
    fn set_pending_options(&mut self, options: WordOptions);
    /// Take (and clear) whatever options `~>` most recently stashed, if any.
    fn take_pending_options(&mut self) -> Option<WordOptions>;
}

/// Word error handler trait - handles errors during word execution
///
/// Error handlers can suppress errors by returning Ok, or propagate them by returning Err.
/// Multiple handlers can be attached to a single word and are tried in order.
pub trait WordErrorHandler: Send + Sync {
    /// Handle an error that occurred during word execution
    ///
    /// # Arguments
    /// * `error` - The error that occurred
    /// * `word_name` - Name of the word that generated the error
    /// * `context` - Interpreter context for stack manipulation
    ///
    /// # Returns
    /// * `Ok(())` - Handler successfully handled the error (error is suppressed)
    /// * `Err(error)` - Handler did not handle the error (try next handler or propagate)
    fn handle(
        &self,
        error: &ForthicError,
        word_name: &str,
        context: &mut dyn InterpreterContext,
    ) -> Result<(), ForthicError>;
}

// Type alias for word executor functions
pub type WordExecutor = fn(&mut dyn InterpreterContext) -> Result<(), ForthicError>;

/// Variable - Named mutable value container
///
/// Represents a variable that can store and retrieve values within a module scope.
///
/// # Examples
///
/// ```
/// use forthic::module::Variable;
/// use forthic::literals::ForthicValue;
///
/// let mut var = Variable::new("counter".to_string(), ForthicValue::Int(0));
/// assert_eq!(var.get_value(), &ForthicValue::Int(0));
///
/// var.set_value(ForthicValue::Int(42));
/// assert_eq!(var.get_value(), &ForthicValue::Int(42));
/// ```
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    value: ForthicValue,
}

impl Variable {
    /// Create a new variable with a name and initial value
    pub fn new(name: String, value: ForthicValue) -> Self {
        Self { name, value }
    }

    /// Get the variable name
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Set the variable value
    pub fn set_value(&mut self, value: ForthicValue) {
        self.value = value;
    }

    /// Get a reference to the variable value
    pub fn get_value(&self) -> &ForthicValue {
        &self.value
    }

    /// Duplicate the variable
    pub fn dup(&self) -> Self {
        Self {
            name: self.name.clone(),
            value: self.value.clone(),
        }
    }
}

/// Word trait - Base abstraction for all executable words in Forthic
///
/// A word is the fundamental unit of execution. When interpreted,
/// it performs an action (typically manipulating the stack or control flow).
pub trait Word: Send + Sync {
    /// Get the word name
    fn name(&self) -> &str;

    /// Get the word's source string representation
    fn string(&self) -> &str {
        self.name()
    }

    /// Get the word's code location (where it was defined)
    fn location(&self) -> Option<&CodeLocation> {
        None
    }

    /// Set the word's code location
    fn set_location(&mut self, _location: CodeLocation) {
        // Default implementation does nothing - override in concrete types if needed
    }

    /// Execute the word (will be async in full implementation)
    ///
    /// Note: For Phase 3, we'll use a simplified synchronous version.
    /// The full interpreter in Phase 4 will make this async.
    fn execute(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError>;

    /// Check if this word is a memo word
    fn is_memo(&self) -> bool {
        false
    }
}

/// PushValueWord - Word that pushes a value onto the stack
///
/// Executes by pushing its stored value onto the interpreter's stack.
/// Used for literals, variables, and constants.
#[derive(Debug, Clone)]
pub struct PushValueWord {
    name: String,
    value: ForthicValue,
    location: Option<CodeLocation>,
}

impl PushValueWord {
    pub fn new(name: String, value: ForthicValue) -> Self {
        Self {
            name,
            value,
            location: None,
        }
    }
}

impl Word for PushValueWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&CodeLocation> {
        self.location.as_ref()
    }

    fn set_location(&mut self, location: CodeLocation) {
        self.location = Some(location);
    }

    fn execute(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        context.stack_push(self.value.clone());
        Ok(())
    }
}

/// DefinitionWord - User-defined word composed of other words
///
/// Represents a word defined in Forthic code using `:`
/// Contains a sequence of words that are executed in order.
#[derive(Clone)]
pub struct DefinitionWord {
    name: String,
    words: Vec<Arc<dyn Word>>,
    location: Option<CodeLocation>,
    defining_exportable: Arc<Mutex<Vec<String>>>,
}

impl DefinitionWord {
    pub fn new(name: String) -> Self {
        Self {
            name,
            words: Vec::new(),
            location: None,
            defining_exportable: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_word(&mut self, word: Arc<dyn Word>) {
        self.words.push(word);
    }

    pub fn get_words(&self) -> &[Arc<dyn Word>] {
        &self.words
    }

    /// Record the exportable-name set of the module this definition was compiled in, so
    /// `EXPORT` called from inside its body targets that module even when the word is later
    /// invoked through a prefixed import from some other module's current context.
    pub fn set_defining_exportable(&mut self, exportable: Arc<Mutex<Vec<String>>>) {
        self.defining_exportable = exportable;
    }

    fn execute_words(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        for word in &self.words {
            match word.execute(context) {
                Ok(()) => {}
                Err(e @ ForthicError::IntentionalStop { .. }) => return Err(e),
                Err(e) => {
                    return Err(ForthicError::WordExecution {
                        message: format!("Error executing {}", self.name),
                        inner_error: Box::new(e),
                        call_location: None,
                        definition_location: self.location.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Word for DefinitionWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&CodeLocation> {
        self.location.as_ref()
    }

    fn set_location(&mut self, location: CodeLocation) {
        self.location = Some(location);
    }

    fn execute(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        context.exportable_stack_push(Arc::clone(&self.defining_exportable));
        let result = self.execute_words(context);
        context.exportable_stack_pop();
        result
    }
}

/// ModuleMemoWord - Memoized word that caches its result
///
/// Executes the wrapped word once and caches the result on the stack.
/// Subsequent calls return the cached value without re-executing.
/// Defined in Forthic using `@:`.
pub struct ModuleMemoWord {
    name: String,
    word: Arc<dyn Word>,
    has_value: std::sync::Mutex<bool>,
    value: std::sync::Mutex<Option<ForthicValue>>,
    location: Option<CodeLocation>,
}

impl ModuleMemoWord {
    pub fn new(word: Arc<dyn Word>) -> Self {
        let name = word.name().to_string();
        Self {
            name,
            word,
            has_value: std::sync::Mutex::new(false),
            value: std::sync::Mutex::new(None),
            location: None,
        }
    }

    pub fn refresh(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        self.word.execute(context)?;
        let val = context.stack_pop()?;

        let mut has_value = self.has_value.lock().unwrap();
        let mut value = self.value.lock().unwrap();

        *has_value = true;
        *value = Some(val);

        Ok(())
    }

    pub fn get_value(&self) -> Option<ForthicValue> {
        self.value.lock().unwrap().clone()
    }
}

impl Word for ModuleMemoWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&CodeLocation> {
        self.location.as_ref()
    }

    fn is_memo(&self) -> bool {
        true
    }

    fn execute(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        let has_value = *self.has_value.lock().unwrap();

        if !has_value {
            self.refresh(context)?;
        }

        if let Some(val) = self.value.lock().unwrap().as_ref() {
            context.stack_push(val.clone());
        }

        Ok(())
    }
}

/// ModuleMemoBangWord - Forces refresh of a memoized word
///
/// Re-executes the memoized word and updates its cached value.
/// Named with a `!` suffix (e.g., `WORD!` for a memo word named `WORD`).
/// Does not push the new value onto the stack.
pub struct ModuleMemoBangWord {
    name: String,
    memo_word: Arc<ModuleMemoWord>,
}

impl ModuleMemoBangWord {
    pub fn new(memo_word: Arc<ModuleMemoWord>) -> Self {
        let name = format!("{}!", memo_word.name());
        Self { name, memo_word }
    }
}

impl Word for ModuleMemoBangWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        self.memo_word.refresh(context)
    }
}

/// ModuleMemoBangAtWord - Refreshes a memoized word and returns its value
///
/// Re-executes the memoized word, updates its cached value, and pushes the new value onto the stack.
/// Named with a `!@` suffix (e.g., `WORD!@` for a memo word named `WORD`).
pub struct ModuleMemoBangAtWord {
    name: String,
    memo_word: Arc<ModuleMemoWord>,
}

impl ModuleMemoBangAtWord {
    pub fn new(memo_word: Arc<ModuleMemoWord>) -> Self {
        let name = format!("{}!@", memo_word.name());
        Self { name, memo_word }
    }
}

impl Word for ModuleMemoBangAtWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        self.memo_word.refresh(context)?;
        if let Some(val) = self.memo_word.get_value() {
            context.stack_push(val);
        }
        Ok(())
    }
}

/// ExecuteWord - Wrapper word that executes another word
///
/// Delegates execution to a target word. Used for prefixed module imports
/// to create words like `prefix.word` that execute the original word from the imported module.
#[derive(Clone)]
pub struct ExecuteWord {
    name: String,
    target_word: Arc<dyn Word>,
}

impl ExecuteWord {
    pub fn new(name: String, target_word: Arc<dyn Word>) -> Self {
        Self { name, target_word }
    }
}

impl Word for ExecuteWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        self.target_word.execute(context)
    }
}

/// ModuleWord - Word that executes a handler with error handling support
///
/// Used to create module words with integrated per-word error handling.
/// Wraps execution in error handling logic, trying handlers in order if an error occurs.
/// IntentionalStop errors bypass error handlers (used for flow control).
pub struct ModuleWord {
    name: String,
    handler: WordExecutor,
    error_handlers: Mutex<Vec<Arc<dyn WordErrorHandler>>>,
    location: Option<CodeLocation>,
}

impl ModuleWord {
    /// Create a new ModuleWord with a given name and handler function
    pub fn new(name: String, handler: WordExecutor) -> Self {
        Self {
            name,
            handler,
            error_handlers: Mutex::new(Vec::new()),
            location: None,
        }
    }

    /// Add an error handler to this word
    pub fn add_error_handler(&self, handler: Arc<dyn WordErrorHandler>) {
        self.error_handlers.lock().unwrap().push(handler);
    }

    /// Remove an error handler (requires PartialEq, so we compare Arc pointers)
    pub fn remove_error_handler(&self, handler: &Arc<dyn WordErrorHandler>) {
        let mut handlers = self.error_handlers.lock().unwrap();
        if let Some(pos) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            handlers.remove(pos);
        }
    }

    /// Clear all error handlers
    pub fn clear_error_handlers(&self) {
        self.error_handlers.lock().unwrap().clear();
    }

    /// Get a copy of all error handlers (for testing)
    pub fn get_error_handlers(&self) -> Vec<Arc<dyn WordErrorHandler>> {
        self.error_handlers.lock().unwrap().clone()
    }

    /// Try error handlers in order until one succeeds
    ///
    /// Returns true if any handler successfully handled the error
    fn try_error_handlers(
        &self,
        error: &ForthicError,
        context: &mut dyn InterpreterContext,
    ) -> bool {
        let handlers = self.error_handlers.lock().unwrap().clone();
        for handler in handlers {
            if handler.handle(error, &self.name, context).is_ok() {
                return true; // Handler succeeded
            }
            // Handler failed, try next one
        }
        false // No handler succeeded
    }
}

impl Word for ModuleWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&CodeLocation> {
        self.location.as_ref()
    }

    fn set_location(&mut self, location: CodeLocation) {
        self.location = Some(location);
    }

    fn execute(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        match (self.handler)(context) {
            Ok(()) => Ok(()),
            Err(ForthicError::IntentionalStop { .. }) => {
                // Never handle intentional flow control errors
                Err(ForthicError::IntentionalStop {
                    message: "Intentional stop".to_string(),
                })
            }
            Err(e) => {
                // Try error handlers
                let handled = self.try_error_handlers(&e, context);
                if handled {
                    Ok(()) // Error was handled, execution continues
                } else {
                    Err(e) // Re-raise if not handled
                }
            }
        }
    }
}

/// RemoteWord - Word whose body is executed by an external collaborator
///
/// Snapshots the stack, hands it to a [`RemoteTransport`], and on success
/// clears the stack and pushes the values the transport returned, in order.
/// On failure raises `ForthicError::RemoteExecutionFailed` and leaves the
/// stack untouched.
pub struct RemoteWord {
    name: String,
    transport: Arc<dyn RemoteTransport>,
    location: Option<CodeLocation>,
}

impl RemoteWord {
    pub fn new(name: String, transport: Arc<dyn RemoteTransport>) -> Self {
        Self {
            name,
            transport,
            location: None,
        }
    }
}

impl Word for RemoteWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&CodeLocation> {
        self.location.as_ref()
    }

    fn set_location(&mut self, location: CodeLocation) {
        self.location = Some(location);
    }

    fn execute(&self, context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        let mut snapshot = Vec::new();
        while let Some(val) = context.stack_peek().cloned() {
            snapshot.push(val);
            context.stack_pop()?;
        }
        snapshot.reverse();

        let name = self.name.clone();
        let transport = self.transport.clone();
        let stack_for_call = snapshot.clone();
        let outcome = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to start runtime for remote word invocation");
            rt.block_on(transport.call(&name, stack_for_call))
        })
        .join()
        .map_err(|_| ForthicError::RemoteExecutionFailed {
            forthic: self.name.clone(),
            reason: "remote transport panicked".to_string(),
            location: self.location.clone(),
            cause: None,
        })?;

        match outcome {
            Ok(results) => {
                for val in results {
                    context.stack_push(val);
                }
                Ok(())
            }
            Err(e) => {
                for val in snapshot {
                    context.stack_push(val);
                }
                Err(ForthicError::RemoteExecutionFailed {
                    forthic: self.name.clone(),
                    reason: e.to_string(),
                    location: self.location.clone(),
                    cause: None,
                })
            }
        }
    }
}

/// Module - Container for words, variables, and imported modules
///
/// Modules provide namespacing and code organization in Forthic.
/// Each module maintains its own dictionary of words, variables, and imported modules.
///
/// # Examples
///
/// ```
/// use forthic::module::Module;
///
/// let mut module = Module::new("my_module".to_string());
/// assert_eq!(module.get_name(), "my_module");
/// ```
#[derive(Clone)]
pub struct Module {
    name: String,
    words: Vec<Arc<dyn Word>>,
    exportable: Arc<Mutex<Vec<String>>>,
    variables: HashMap<String, Variable>,
    modules: HashMap<String, Module>,
    module_prefixes: HashMap<String, Vec<String>>,
    forthic_code: String,
}

impl Module {
    /// Create a new module with the given name
    pub fn new(name: String) -> Self {
        Self {
            name,
            words: Vec::new(),
            exportable: Arc::new(Mutex::new(Vec::new())),
            variables: HashMap::new(),
            modules: HashMap::new(),
            module_prefixes: HashMap::new(),
            forthic_code: String::new(),
        }
    }

    /// Create a new module with name and forthic code
    pub fn new_with_code(name: String, forthic_code: String) -> Self {
        Self {
            name,
            words: Vec::new(),
            exportable: Arc::new(Mutex::new(Vec::new())),
            variables: HashMap::new(),
            modules: HashMap::new(),
            module_prefixes: HashMap::new(),
            forthic_code,
        }
    }

    /// Get the module name
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Set the Forthic code for this module
    pub fn set_forthic_code(&mut self, code: String) {
        self.forthic_code = code;
    }

    /// Get the Forthic code for this module
    pub fn get_forthic_code(&self) -> &str {
        &self.forthic_code
    }

    // ---- Word management ----

    /// Add a word to the module
    pub fn add_word(&mut self, word: Arc<dyn Word>) {
        self.words.push(word);
    }

    /// Add a memoized word and its refresh variants (!word and !@word)
    ///
    /// If a memo word of the same name already sits at the top of this
    /// module's dictionary (i.e. it is the word `find_dictionary_word` would
    /// return right now), it and its `!`/`!@` variants are replaced in place
    /// rather than shadowed by a second, stale cache entry underneath.
    ///
    /// Returns the Arc<ModuleMemoWord> for potential further use
    pub fn add_memo_words(&mut self, word: Arc<dyn Word>) -> Arc<ModuleMemoWord> {
        let name = word.name().to_string();
        let len = self.words.len();
        if len >= 3 {
            let candidate = &self.words[len - 3];
            if candidate.is_memo() && candidate.name() == name {
                self.words.truncate(len - 3);
            }
        }

        let memo_word = Arc::new(ModuleMemoWord::new(word));
        let bang_word = Arc::new(ModuleMemoBangWord::new(Arc::clone(&memo_word)));
        let bang_at_word = Arc::new(ModuleMemoBangAtWord::new(Arc::clone(&memo_word)));

        self.words.push(memo_word.clone());
        self.words.push(bang_word);
        self.words.push(bang_at_word);

        memo_word
    }

    /// Add a word to the exportable list
    pub fn add_exportable(&mut self, names: Vec<String>) {
        self.exportable.lock().unwrap().extend(names);
    }

    /// Add a word and mark it as exportable
    pub fn add_exportable_word(&mut self, word: Arc<dyn Word>) {
        let name = word.name().to_string();
        self.words.push(word);
        self.exportable.lock().unwrap().push(name);
    }

    /// Get all exportable words
    pub fn exportable_words(&self) -> Vec<Arc<dyn Word>> {
        let exportable = self.exportable.lock().unwrap();
        self.words
            .iter()
            .filter(|w| exportable.contains(&w.name().to_string()))
            .cloned()
            .collect()
    }

    /// Snapshot of the exportable name set, for inspection.
    pub fn exportable_names(&self) -> Vec<String> {
        self.exportable.lock().unwrap().clone()
    }

    /// Shared handle to this module's exportable name set. Captured by a `DefinitionWord`
    /// at the point its `:`/`@:` closes, so `EXPORT` inside its body can find its way back
    /// here even when the word is later run through a prefixed import.
    pub fn exportable_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.exportable)
    }

    /// Find a word by name (searches dictionary then variables)
    pub fn find_word(&self, name: &str) -> Option<Arc<dyn Word>> {
        // First check dictionary words
        if let Some(word) = self.find_dictionary_word(name) {
            return Some(word);
        }

        // Then check variables
        self.find_variable(name)
    }

    /// Find a word in the word dictionary (not variables)
    pub fn find_dictionary_word(&self, word_name: &str) -> Option<Arc<dyn Word>> {
        // Search backwards to find most recently defined word
        self.words
            .iter()
            .rev()
            .find(|w| w.name() == word_name)
            .cloned()
    }

    /// Find a variable and return it as a PushValueWord
    pub fn find_variable(&self, varname: &str) -> Option<Arc<dyn Word>> {
        self.variables.get(varname).map(|var| {
            Arc::new(PushValueWord::new(
                varname.to_string(),
                var.get_value().clone(),
            )) as Arc<dyn Word>
        })
    }

    // ---- Variable management ----

    /// Add a variable to the module
    pub fn add_variable(&mut self, name: String, value: ForthicValue) {
        if !self.variables.contains_key(&name) {
            self.variables.insert(name.clone(), Variable::new(name, value));
        }
    }

    /// Get a variable by name
    pub fn get_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Get a mutable reference to a variable
    pub fn get_variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    // ---- Module management ----

    /// Find a module by name
    pub fn find_module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Register a module with a prefix
    pub fn register_module(&mut self, module_name: String, prefix: String, module: Module) {
        self.modules.insert(module_name.clone(), module);

        self.module_prefixes
            .entry(module_name)
            .or_insert_with(Vec::new)
            .push(prefix);
    }

    /// Import a module with optional prefix
    ///
    /// If prefix is empty, words are imported directly.
    /// If prefix is provided, words are imported as `prefix.word_name`.
    pub fn import_module(&mut self, prefix: &str, module: &Module) {
        let new_module = module.dup();
        let words = new_module.exportable_words();

        for word in words {
            if prefix.is_empty() {
                // Unprefixed import - add word directly
                self.add_word(word);
            } else {
                // Prefixed import - create ExecuteWord with prefix
                let prefixed_name = format!("{}.{}", prefix, word.name());
                let prefixed_word = Arc::new(ExecuteWord::new(prefixed_name, word));
                self.add_word(prefixed_word);
            }
        }

        self.register_module(new_module.get_name().to_string(), prefix.to_string(), new_module);
    }

    /// Duplicate the module (shallow copy of words, deep copy of variables)
    pub fn dup(&self) -> Self {
        let mut result = Module::new(self.name.clone());

        result.words = self.words.clone();
        result.exportable = self.exportable.clone();

        // Deep copy variables
        for (key, var) in &self.variables {
            result.variables.insert(key.clone(), var.dup());
        }

        // Shallow copy modules
        result.modules = self.modules.clone();
        result.forthic_code = self.forthic_code.clone();

        result
    }
}
