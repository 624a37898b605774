use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;
use crate::lexer::TokenKind;

/// Mode for files created by output redirections.
pub const CREATE_MODE: u32 = 0o644;

/// A redirection target opened for a stage.
#[derive(Debug)]
pub enum Redirection {
    Input(OwnedFd),
    Output(OwnedFd),
}

pub struct RedirectHandler;

impl RedirectHandler {
    /// Open the target of a file redirection operator.
    pub fn open(kind: TokenKind, path: &str) -> io::Result<Redirection> {
        let mut options = OpenOptions::new();
        options.mode(CREATE_MODE);
        match kind {
            TokenKind::RedirectIn => Ok(Redirection::Input(File::open(path)?.into())),
            TokenKind::RedirectInOut => {
                let file = options.read(true).write(true).create(true).open(path)?;
                Ok(Redirection::Input(file.into()))
            }
            TokenKind::RedirectOut | TokenKind::RedirectOutIn => {
                let file = options.write(true).create(true).truncate(true).open(path)?;
                Ok(Redirection::Output(file.into()))
            }
            TokenKind::AppendOut => {
                let file = options.append(true).create(true).open(path)?;
                Ok(Redirection::Output(file.into()))
            }
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{:?} is not a file redirection", other),
            )),
        }
    }
}
