use crate::environment::Environment;

/// Everything a line can read or change: variables, `$?`, and whether the
/// session talks to a terminal.
#[derive(Debug, Clone, Default)]
pub struct ShellState {
    pub env: Environment,
    pub last_status: i32,
    pub interactive: bool,
}

impl ShellState {
    pub fn new(env: Environment) -> Self {
        ShellState {
            env,
            last_status: 0,
            interactive: false,
        }
    }
}
