use std::process;
use minishell::config::{Config, ConfigLoader};
use minishell::environment::Environment;
use minishell::error::{report, ShellError};
use minishell::executor::DefaultExecutor;
use minishell::io::InputHandler;
use minishell::logging;
use minishell::repl::Shell;
use minishell::state::ShellState;

fn main() {
    let config = ConfigLoader::load().unwrap_or_else(|e| {
        report(ShellError::from(e));
        Config::default()
    });
    if let Err(e) = logging::init(&config) {
        report(ShellError::from(e));
    }

    let mut env = Environment::from_os();
    for (name, value) in &config.env_vars {
        env.export_value(name, value);
    }

    let reader = InputHandler::stdin();
    let mut state = ShellState::new(env);
    state.interactive = reader.is_interactive();

    let code = Shell::new(state, config, reader, DefaultExecutor::new()).run();
    process::exit(code);
}
