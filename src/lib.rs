pub mod config;
pub mod environment;
pub mod error;
pub mod executor;
pub mod expander;
pub mod io;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod repl;
pub mod signal;
pub mod state;
