mod executor;
mod default_executor;
pub mod builtin;
pub mod path_resolver;

pub use executor::{Executor, ExecError, ExecOutcome, ExecStatus};
pub use default_executor::DefaultExecutor;
