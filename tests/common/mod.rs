// tests/common/mod.rs

#![allow(dead_code, unused_imports)]

pub use taskdag_test_utils::builders;
pub use taskdag_test_utils::fake_executor::RecordingExecutor;
pub use taskdag_test_utils::probe::ConcurrencyProbe;
pub use taskdag_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
