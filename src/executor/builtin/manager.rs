use std::collections::HashMap;
use std::io::Write;
use crate::executor::{ExecError, ExecStatus};
use crate::state::ShellState;
use super::commands::{
    CdCommand,
    EchoCommand,
    EnvCommand,
    ExitCommand,
    ExportCommand,
    PwdCommand,
    UnsetCommand,
};

pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    /// `args` excludes the command name. Regular output goes to `out`,
    /// diagnostics to stderr.
    fn run(&self, args: &[String], state: &mut ShellState, out: &mut dyn Write) -> ExecStatus;
}

pub struct BuiltinManager {
    commands: HashMap<String, Box<dyn BuiltinCommand>>,
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(EchoCommand));
        mgr.register(Box::new(CdCommand));
        mgr.register(Box::new(PwdCommand));
        mgr.register(Box::new(ExportCommand));
        mgr.register(Box::new(UnsetCommand));
        mgr.register(Box::new(EnvCommand));
        mgr.register(Box::new(ExitCommand));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn execute(
        &self,
        name: &str,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> ExecStatus {
        if let Some(cmd) = self.commands.get(name) {
            cmd.run(args, state, out)
        } else {
            Err(ExecError::NoSuchBuiltin(name.to_string()))
        }
    }
}
