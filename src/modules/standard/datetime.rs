// DateTime module for Forthic
//
// Construction, string rendering, and Unix-timestamp round-trip of the single
// consolidated datetime value.
//
// ## Categories
// - Current: TODAY, NOW
// - Conversion: >DATETIME, DATETIME>STR
// - Timestamps: >TIMESTAMP, TIMESTAMP>DATETIME

use crate::errors::ForthicError;
use crate::literals::{ForthicDateTime, ForthicValue};
use crate::module::{InterpreterContext, Module, ModuleWord};
use crate::utils;
use chrono::{Datelike, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// DateTimeModule provides date and time construction and conversion. `TODAY`/`NOW`
/// and timestamp conversions resolve against `context.timezone()` at call time.
pub struct DateTimeModule {
    module: Module,
}

impl DateTimeModule {
    pub fn new() -> Self {
        let mut module = Module::new("datetime".to_string());

        Self::register_current_words(&mut module);
        Self::register_conversion_words(&mut module);
        Self::register_timestamp_words(&mut module);

        Self { module }
    }

    /// Get the underlying module
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Get a mutable reference to the underlying module
    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    fn register_current_words(module: &mut Module) {
        let word = Arc::new(ModuleWord::new("TODAY".to_string(), Self::word_today));
        module.add_exportable_word(word);

        let word = Arc::new(ModuleWord::new("NOW".to_string(), Self::word_now));
        module.add_exportable_word(word);
    }

    fn word_today(context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        let now = utils::convert_timezone(&Utc::now(), context.timezone())
            .unwrap_or_else(|| Utc::now().with_timezone(&chrono_tz::UTC));
        context.stack_push(ForthicValue::DateTime(ForthicDateTime::date_only(
            now.year(),
            now.month() as u8,
            now.day() as u8,
        )));
        Ok(())
    }

    fn word_now(context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        let now = utils::convert_timezone(&Utc::now(), context.timezone())
            .unwrap_or_else(|| Utc::now().with_timezone(&chrono_tz::UTC));
        context.stack_push(ForthicValue::DateTime(ForthicDateTime::new(
            now.year(),
            now.month() as u8,
            now.day() as u8,
            now.hour() as u8,
            now.minute() as u8,
            now.second() as u8,
        )));
        Ok(())
    }

    fn register_conversion_words(module: &mut Module) {
        let word = Arc::new(ModuleWord::new(">DATETIME".to_string(), Self::word_to_datetime));
        module.add_exportable_word(word);

        let word = Arc::new(ModuleWord::new(
            "DATETIME>STR".to_string(),
            Self::word_datetime_to_str,
        ));
        module.add_exportable_word(word);
    }

    /// Parses ISO-ish datetime strings ("YYYY-MM-DDTHH:MM:SS" or a bare "YYYY-MM-DD")
    /// and passes an existing datetime through unchanged; anything else is `Null`.
    fn word_to_datetime(context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        let val = context.stack_pop()?;

        let result = match val {
            ForthicValue::DateTime(dt) => ForthicValue::DateTime(dt),
            ForthicValue::String(s) => Self::parse_datetime_string(&s).unwrap_or(ForthicValue::Null),
            _ => ForthicValue::Null,
        };

        context.stack_push(result);
        Ok(())
    }

    fn word_datetime_to_str(context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        let val = context.stack_pop()?;

        let result = match val {
            ForthicValue::DateTime(dt) if dt.hour == 0 && dt.minute == 0 && dt.second == 0 => {
                ForthicValue::String(format!("{:04}-{:02}-{:02}", dt.year, dt.month, dt.day))
            }
            ForthicValue::DateTime(dt) => ForthicValue::String(format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
            )),
            _ => ForthicValue::String(String::new()),
        };

        context.stack_push(result);
        Ok(())
    }

    fn register_timestamp_words(module: &mut Module) {
        let word = Arc::new(ModuleWord::new(">TIMESTAMP".to_string(), Self::word_to_timestamp));
        module.add_exportable_word(word);

        let word = Arc::new(ModuleWord::new(
            "TIMESTAMP>DATETIME".to_string(),
            Self::word_timestamp_to_datetime,
        ));
        module.add_exportable_word(word);
    }

    fn word_to_timestamp(context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        let tz = context.timezone().to_string();
        let val = context.stack_pop()?;

        let result = match val {
            ForthicValue::DateTime(dt) => match Self::to_chrono(dt, &tz) {
                Some(zoned) => ForthicValue::Int(zoned.timestamp()),
                None => ForthicValue::Null,
            },
            _ => ForthicValue::Null,
        };

        context.stack_push(result);
        Ok(())
    }

    fn word_timestamp_to_datetime(context: &mut dyn InterpreterContext) -> Result<(), ForthicError> {
        let tz = context.timezone().to_string();
        let val = context.stack_pop()?;

        let result = match val {
            ForthicValue::Int(timestamp) => match chrono::DateTime::from_timestamp(timestamp, 0) {
                Some(utc) => match utils::convert_timezone(&utc, &tz) {
                    Some(local) => ForthicValue::DateTime(ForthicDateTime::new(
                        local.year(),
                        local.month() as u8,
                        local.day() as u8,
                        local.hour() as u8,
                        local.minute() as u8,
                        local.second() as u8,
                    )),
                    None => ForthicValue::Null,
                },
                None => ForthicValue::Null,
            },
            _ => ForthicValue::Null,
        };

        context.stack_push(result);
        Ok(())
    }

    /// Interprets `dt`'s fields as local wall-clock time in `tz` by routing through the
    /// "YYYY-MM-DD HH:MM:SS" zoned parser.
    fn to_chrono(dt: ForthicDateTime, tz: &str) -> Option<chrono::DateTime<Tz>> {
        let formatted = format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
        );
        utils::to_zoned_datetime(&formatted, tz)
    }

    fn parse_datetime_string(s: &str) -> Option<ForthicValue> {
        let s = s.trim();

        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Some(ForthicValue::DateTime(ForthicDateTime::new(
                naive.year(),
                naive.month() as u8,
                naive.day() as u8,
                naive.hour() as u8,
                naive.minute() as u8,
                naive.second() as u8,
            )));
        }

        utils::parse_date(s).map(|date| {
            ForthicValue::DateTime(ForthicDateTime::date_only(
                date.year(),
                date.month() as u8,
                date.day() as u8,
            ))
        })
    }
}

impl Default for DateTimeModule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn interp_with_datetime() -> Interpreter {
        let mut interp = Interpreter::new("UTC");
        interp.import_module(DateTimeModule::new().module().clone(), "");
        interp
    }

    #[test]
    fn test_today_is_date_only() {
        let mut interp = interp_with_datetime();
        interp.run("TODAY").unwrap();
        match interp.stack_pop().unwrap() {
            ForthicValue::DateTime(dt) => {
                assert_eq!(dt.hour, 0);
                assert_eq!(dt.minute, 0);
                assert_eq!(dt.second, 0);
            }
            other => panic!("expected DateTime, got {other:?}"),
        }
    }

    #[test]
    fn test_now_has_time_component() {
        let mut interp = interp_with_datetime();
        interp.run("NOW").unwrap();
        assert!(matches!(interp.stack_pop().unwrap(), ForthicValue::DateTime(_)));
    }

    #[test]
    fn test_to_datetime_parses_string() {
        let mut interp = interp_with_datetime();
        interp.run("'2024-03-05T08:30:00' >DATETIME").unwrap();
        match interp.stack_pop().unwrap() {
            ForthicValue::DateTime(dt) => {
                assert_eq!(dt.year, 2024);
                assert_eq!(dt.month, 3);
                assert_eq!(dt.day, 5);
                assert_eq!(dt.hour, 8);
                assert_eq!(dt.minute, 30);
            }
            other => panic!("expected DateTime, got {other:?}"),
        }
    }

    #[test]
    fn test_to_datetime_invalid_is_null() {
        let mut interp = interp_with_datetime();
        interp.run("'not-a-date' >DATETIME").unwrap();
        assert_eq!(interp.stack_pop().unwrap(), ForthicValue::Null);
    }

    #[test]
    fn test_datetime_to_str_date_only() {
        let mut interp = interp_with_datetime();
        interp.run("'2024-03-05' >DATETIME DATETIME>STR").unwrap();
        assert_eq!(
            interp.stack_pop().unwrap(),
            ForthicValue::String("2024-03-05".to_string())
        );
    }

    #[test]
    fn test_datetime_to_str_with_time() {
        let mut interp = interp_with_datetime();
        interp
            .run("'2024-03-05T08:30:00' >DATETIME DATETIME>STR")
            .unwrap();
        assert_eq!(
            interp.stack_pop().unwrap(),
            ForthicValue::String("2024-03-05T08:30:00".to_string())
        );
    }

    #[test]
    fn test_timestamp_round_trip() {
        let mut interp = interp_with_datetime();
        interp
            .run("'2024-03-05T08:30:00' >DATETIME >TIMESTAMP TIMESTAMP>DATETIME DATETIME>STR")
            .unwrap();
        assert_eq!(
            interp.stack_pop().unwrap(),
            ForthicValue::String("2024-03-05T08:30:00".to_string())
        );
    }

    #[test]
    fn test_to_timestamp_non_datetime_is_null() {
        let mut interp = interp_with_datetime();
        interp.run("42 >TIMESTAMP").unwrap();
        assert_eq!(interp.stack_pop().unwrap(), ForthicValue::Null);
    }
}
