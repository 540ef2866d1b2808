use forthic::literals::{ForthicDateTime, ForthicValue};
use forthic::modules::standard::DateTimeModule;
use forthic::module::{InterpreterContext, Module};

// Mock interpreter context for testing
struct MockContext {
    stack: Vec<ForthicValue>,
    module: Module,
    array_marks: Vec<usize>,
    pending_options: Option<forthic::word_options::WordOptions>,
    timezone: String,
}

impl MockContext {
    fn new() -> Self {
        Self::with_timezone("UTC")
    }

    fn with_timezone(tz: &str) -> Self {
        Self {
            stack: Vec::new(),
            module: Module::new("test".to_string()),
            array_marks: Vec::new(),
            pending_options: None,
            timezone: tz.to_string(),
        }
    }
}

impl InterpreterContext for MockContext {
    fn stack_push(&mut self, value: ForthicValue) {
        self.stack.push(value);
    }

    fn stack_pop(&mut self) -> Result<ForthicValue, forthic::ForthicError> {
        self.stack.pop().ok_or(forthic::ForthicError::StackUnderflow {
            forthic: "test".to_string(),
            location: None,
            cause: None,
        })
    }

    fn stack_peek(&self) -> Option<&ForthicValue> {
        self.stack.last()
    }

    fn stack_len(&self) -> usize {
        self.stack.len()
    }

    fn array_mark_push(&mut self, depth: usize) {
        self.array_marks.push(depth);
    }

    fn array_mark_pop(&mut self) -> Result<usize, forthic::ForthicError> {
        self.array_marks.pop().ok_or(forthic::ForthicError::StackUnderflow {
            forthic: "test".to_string(),
            location: None,
            cause: None,
        })
    }

    fn cur_module(&self) -> &Module {
        &self.module
    }

    fn cur_module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    fn get_app_module(&self) -> &Module {
        &self.module
    }

    fn module_stack_push(&mut self, _module: Module) {}

    fn module_stack_pop(&mut self) -> Result<Module, forthic::ForthicError> {
        Err(forthic::ForthicError::StackUnderflow {
            forthic: "test".to_string(),
            location: None,
            cause: None,
        })
    }

    fn timezone(&self) -> &str {
        &self.timezone
    }

    fn interpret(&mut self, _code: &str) -> Result<(), forthic::ForthicError> {
        Ok(())
    }

    fn set_pending_options(&mut self, options: forthic::word_options::WordOptions) {
        self.pending_options = Some(options);
    }

    fn take_pending_options(&mut self) -> Option<forthic::word_options::WordOptions> {
        self.pending_options.take()
    }
}

// Current Tests

#[test]
fn test_today_is_date_only() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word("TODAY").unwrap();
    word.execute(&mut ctx).unwrap();

    match ctx.stack.pop().unwrap() {
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
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word("NOW").unwrap();
    word.execute(&mut ctx).unwrap();

    assert!(matches!(ctx.stack.pop().unwrap(), ForthicValue::DateTime(_)));
}

// Conversion Tests

#[test]
fn test_to_datetime_from_date_string() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word(">DATETIME").unwrap();
    ctx.stack.push(ForthicValue::String("2024-03-05".to_string()));
    word.execute(&mut ctx).unwrap();

    match ctx.stack.pop().unwrap() {
        ForthicValue::DateTime(dt) => {
            assert_eq!(dt.year, 2024);
            assert_eq!(dt.month, 3);
            assert_eq!(dt.day, 5);
            assert_eq!(dt.hour, 0);
        }
        other => panic!("expected DateTime, got {other:?}"),
    }
}

#[test]
fn test_to_datetime_from_full_string() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word(">DATETIME").unwrap();
    ctx.stack.push(ForthicValue::String("2024-03-05T08:30:15".to_string()));
    word.execute(&mut ctx).unwrap();

    match ctx.stack.pop().unwrap() {
        ForthicValue::DateTime(dt) => {
            assert_eq!(dt.hour, 8);
            assert_eq!(dt.minute, 30);
            assert_eq!(dt.second, 15);
        }
        other => panic!("expected DateTime, got {other:?}"),
    }
}

#[test]
fn test_to_datetime_passes_through_existing_datetime() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word(">DATETIME").unwrap();
    ctx.stack.push(ForthicValue::DateTime(ForthicDateTime::date_only(2020, 1, 1)));
    word.execute(&mut ctx).unwrap();

    assert_eq!(
        ctx.stack.pop().unwrap(),
        ForthicValue::DateTime(ForthicDateTime::date_only(2020, 1, 1))
    );
}

#[test]
fn test_to_datetime_invalid_string_is_null() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word(">DATETIME").unwrap();
    ctx.stack.push(ForthicValue::String("not-a-date".to_string()));
    word.execute(&mut ctx).unwrap();

    assert_eq!(ctx.stack.pop().unwrap(), ForthicValue::Null);
}

#[test]
fn test_to_datetime_non_string_non_datetime_is_null() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word(">DATETIME").unwrap();
    ctx.stack.push(ForthicValue::Int(42));
    word.execute(&mut ctx).unwrap();

    assert_eq!(ctx.stack.pop().unwrap(), ForthicValue::Null);
}

// String Rendering Tests

#[test]
fn test_datetime_to_str_date_only() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word("DATETIME>STR").unwrap();
    ctx.stack.push(ForthicValue::DateTime(ForthicDateTime::date_only(2024, 3, 5)));
    word.execute(&mut ctx).unwrap();

    assert_eq!(
        ctx.stack.pop().unwrap(),
        ForthicValue::String("2024-03-05".to_string())
    );
}

#[test]
fn test_datetime_to_str_with_time() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word("DATETIME>STR").unwrap();
    ctx.stack.push(ForthicValue::DateTime(ForthicDateTime::new(2024, 3, 5, 8, 30, 15)));
    word.execute(&mut ctx).unwrap();

    assert_eq!(
        ctx.stack.pop().unwrap(),
        ForthicValue::String("2024-03-05T08:30:15".to_string())
    );
}

#[test]
fn test_datetime_to_str_non_datetime_is_empty_string() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word("DATETIME>STR").unwrap();
    ctx.stack.push(ForthicValue::Null);
    word.execute(&mut ctx).unwrap();

    assert_eq!(ctx.stack.pop().unwrap(), ForthicValue::String(String::new()));
}

// Timestamp Tests

#[test]
fn test_timestamp_round_trip() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let to_ts = module.module().find_word(">TIMESTAMP").unwrap();
    ctx.stack.push(ForthicValue::DateTime(ForthicDateTime::new(2024, 3, 5, 8, 30, 15)));
    to_ts.execute(&mut ctx).unwrap();

    let timestamp = ctx.stack.pop().unwrap();
    assert!(matches!(timestamp, ForthicValue::Int(_)));

    ctx.stack.push(timestamp);
    let from_ts = module.module().find_word("TIMESTAMP>DATETIME").unwrap();
    from_ts.execute(&mut ctx).unwrap();

    assert_eq!(
        ctx.stack.pop().unwrap(),
        ForthicValue::DateTime(ForthicDateTime::new(2024, 3, 5, 8, 30, 15))
    );
}

#[test]
fn test_to_timestamp_non_datetime_is_null() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word(">TIMESTAMP").unwrap();
    ctx.stack.push(ForthicValue::String("not a datetime".to_string()));
    word.execute(&mut ctx).unwrap();

    assert_eq!(ctx.stack.pop().unwrap(), ForthicValue::Null);
}

#[test]
fn test_timestamp_to_datetime_non_int_is_null() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::new();

    let word = module.module().find_word("TIMESTAMP>DATETIME").unwrap();
    ctx.stack.push(ForthicValue::String("1700000000".to_string()));
    word.execute(&mut ctx).unwrap();

    assert_eq!(ctx.stack.pop().unwrap(), ForthicValue::Null);
}

#[test]
fn test_timestamp_resolves_against_context_timezone() {
    let module = DateTimeModule::new();
    let mut ctx = MockContext::with_timezone("America/Los_Angeles");

    let word = module.module().find_word("TIMESTAMP>DATETIME").unwrap();
    // 2024-01-01T00:00:00Z
    ctx.stack.push(ForthicValue::Int(1704067200));
    word.execute(&mut ctx).unwrap();

    match ctx.stack.pop().unwrap() {
        ForthicValue::DateTime(dt) => {
            // Los Angeles is UTC-8 in January, so this lands on 2023-12-31.
            assert_eq!(dt.year, 2023);
            assert_eq!(dt.month, 12);
            assert_eq!(dt.day, 31);
        }
        other => panic!("expected DateTime, got {other:?}"),
    }
}
