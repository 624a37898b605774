use std::io::{self, Write};
use std::path::PathBuf;
use log::debug;
use crate::environment::is_valid_name;
use crate::error::{os_message, report};
use crate::executor::{ExecOutcome, ExecStatus};
use crate::executor::builtin::manager::BuiltinCommand;
use crate::state::ShellState;

pub struct EchoCommand;

impl BuiltinCommand for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }
    fn run(&self, args: &[String], _state: &mut ShellState, out: &mut dyn Write) -> ExecStatus {
        let flags = args.iter().take_while(|a| is_n_flag(a)).count();
        let newline = flags == 0;

        out.write_all(args[flags..].join(" ").as_bytes())?;
        if newline {
            out.write_all(b"\n")?;
        }
        Ok(ExecOutcome::Code(0))
    }
}

/// `-n`, `-nn`, ...
fn is_n_flag(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'n')
}

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }
    fn run(&self, args: &[String], state: &mut ShellState, out: &mut dyn Write) -> ExecStatus {
        if args.len() > 1 {
            report("cd: too many arguments");
            return Ok(ExecOutcome::Code(1));
        }

        let (target, announce) = match args.first().map(String::as_str) {
            None => match state.env.get("HOME") {
                Some(home) => (home.to_string(), false),
                None => {
                    report("cd: HOME not set");
                    return Ok(ExecOutcome::Code(1));
                }
            },
            Some("-") => match state.env.get("OLDPWD") {
                Some(old) => (old.to_string(), true),
                None => {
                    report("cd: OLDPWD not set");
                    return Ok(ExecOutcome::Code(1));
                }
            },
            Some(dir) => (dir.to_string(), false),
        };

        let previous = current_dir(state);
        if let Err(e) = std::env::set_current_dir(&target) {
            report(format!("cd: {}: {}", target, os_message(&e)));
            return Ok(ExecOutcome::Code(1));
        }

        let now = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or(target);
        debug!("cd {} -> {}", previous, now);
        state.env.set("OLDPWD", &previous);
        state.env.set("PWD", &now);
        if announce {
            writeln!(out, "{}", now)?;
        }
        Ok(ExecOutcome::Code(0))
    }
}

fn current_dir(state: &ShellState) -> String {
    std::env::current_dir()
        .map(|p| p.display().to_string())
        .ok()
        .or_else(|| state.env.get("PWD").map(str::to_string))
        .unwrap_or_default()
}

pub struct PwdCommand;

impl BuiltinCommand for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }
    fn run(&self, _args: &[String], state: &mut ShellState, out: &mut dyn Write) -> ExecStatus {
        let dir = match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => match state.env.get("PWD") {
                Some(pwd) => PathBuf::from(pwd),
                None => {
                    report(format!("pwd: {}", os_message(&e)));
                    return Ok(ExecOutcome::Code(1));
                }
            },
        };
        writeln!(out, "{}", dir.display())?;
        Ok(ExecOutcome::Code(0))
    }
}

pub struct ExportCommand;

impl BuiltinCommand for ExportCommand {
    fn name(&self) -> &'static str {
        "export"
    }
    fn run(&self, args: &[String], state: &mut ShellState, out: &mut dyn Write) -> ExecStatus {
        if args.is_empty() {
            for (name, value) in state.env.exported() {
                match value {
                    Some(value) => writeln!(out, "declare -x {}=\"{}\"", name, escape(value))?,
                    None => writeln!(out, "declare -x {}", name)?,
                }
            }
            return Ok(ExecOutcome::Code(0));
        }

        let mut status = 0;
        for arg in args {
            let (name, value) = match arg.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (arg.as_str(), None),
            };
            if !is_valid_name(name) {
                report(format!("export: `{}': not a valid identifier", arg));
                status = 1;
                continue;
            }
            match value {
                Some(value) => state.env.export_value(name, value),
                None => state.env.export(name),
            }
        }
        Ok(ExecOutcome::Code(status))
    }
}

/// Backslash-escape what would break a double-quoted listing.
fn escape(value: &str) -> String {
    let mut s = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            s.push('\\');
        }
        s.push(ch);
    }
    s
}

pub struct UnsetCommand;

impl BuiltinCommand for UnsetCommand {
    fn name(&self) -> &'static str {
        "unset"
    }
    fn run(&self, args: &[String], state: &mut ShellState, _out: &mut dyn Write) -> ExecStatus {
        let mut status = 0;
        for name in args {
            if is_valid_name(name) {
                state.env.unset(name);
            } else {
                report(format!("unset: `{}': not a valid identifier", name));
                status = 1;
            }
        }
        Ok(ExecOutcome::Code(status))
    }
}

pub struct EnvCommand;

impl BuiltinCommand for EnvCommand {
    fn name(&self) -> &'static str {
        "env"
    }
    fn run(&self, args: &[String], state: &mut ShellState, out: &mut dyn Write) -> ExecStatus {
        if !args.is_empty() {
            report("env: too many arguments");
            return Ok(ExecOutcome::Code(1));
        }
        for (name, value) in state.env.exported() {
            if let Some(value) = value {
                writeln!(out, "{}={}", name, value)?;
            }
        }
        Ok(ExecOutcome::Code(0))
    }
}

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }
    fn run(&self, args: &[String], state: &mut ShellState, _out: &mut dyn Write) -> ExecStatus {
        if state.interactive {
            let mut err = io::stderr();
            writeln!(err, "exit")?;
        }

        let Some(arg) = args.first() else {
            return Ok(ExecOutcome::Exit(state.last_status));
        };
        let Some(code) = parse_status(arg) else {
            report(format!("exit: {}: numeric argument required", arg));
            return Ok(ExecOutcome::Exit(2));
        };
        if args.len() > 1 {
            report("exit: too many arguments");
            return Ok(ExecOutcome::Code(1));
        }
        Ok(ExecOutcome::Exit(code))
    }
}

/// Parse an `exit` argument as a 64-bit integer and wrap it to 0..=255.
fn parse_status(arg: &str) -> Option<i32> {
    let n: i64 = arg.trim().parse().ok()?;
    Some(n.rem_euclid(256) as i32)
}
