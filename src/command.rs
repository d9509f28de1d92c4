//! Shell command grammar for the interactive client.
//!
//! This module defines the [`Command`] enum, the line grammar the
//! `millidb_cli` binary speaks, and a generic [`prompt`] that reads one
//! command from any reader/writer pair so the loop can be tested with
//! in-memory buffers.
//!
//! # Overview
//! The supported commands are:
//!
//! - `.exit`: close the session and leave the shell.
//! - `ls`: list the files of the current collection.
//! - `enter <name>`: move into a child collection.
//! - `up`: move back to the parent collection.
//! - `get <document> [sub-path]`: read a value from a document.
//! - `set <document> <sub-path> <value>`: write a JSON value into a
//!   document; `.` as the sub-path addresses the whole content.
//! - `delete <name>`: delete a child file.
use std::io::{BufRead, Write};

use serde_json::Value;
use thiserror::Error;

/// List of possible errors raised while parsing a command line.
#[derive(Debug, Error, Clone)]
pub enum CommandError {
    #[error("unrecognized command '{0}'")]
    UnrecognizedCommand(String),

    #[error("invalid '{command}' command, {reason}")]
    InvalidCommandArguments { command: String, reason: String },

    #[error("no command provided")]
    Empty,
}

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Close the session and leave the shell, `.exit`
    Exit,
    /// List the files of the current collection, `ls`
    List,
    /// Move into a child collection, `enter <name>`
    Enter(String),
    /// Move back to the parent collection, `up`
    Up,
    /// Read a value from a document, `get <document> [sub-path]`
    Get { document: String, sub_path: String },
    /// Write a value into a document, `set <document> <sub-path> <value>`
    Set {
        document: String,
        sub_path: String,
        value: Value,
    },
    /// Delete a child file, `delete <name>`
    Delete(String),
}

impl TryInto<Command> for &str {
    type Error = CommandError;

    fn try_into(self) -> Result<Command, Self::Error> {
        let mut parts = self.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(CommandError::Empty);
        };
        match head {
            ".exit" => Ok(Command::Exit),
            "ls" => Ok(Command::List),
            "up" => Ok(Command::Up),
            "enter" => {
                let name = parts
                    .next()
                    .ok_or_else(|| invalid("enter", "requires a collection name. Example: enter logs"))?;
                Ok(Command::Enter(name.to_string()))
            }
            "delete" => {
                let name = parts
                    .next()
                    .ok_or_else(|| invalid("delete", "requires a file name. Example: delete report.mll"))?;
                Ok(Command::Delete(name.to_string()))
            }
            "get" => {
                let document = parts.next().ok_or_else(|| {
                    invalid("get", "requires a document name. Example: get report.mll stats/views")
                })?;
                Ok(Command::Get {
                    document: document.to_string(),
                    sub_path: sub_path(parts.next()),
                })
            }
            "set" => {
                let document = parts.next().ok_or_else(|| {
                    invalid("set", "requires a document name. Example: set report.mll stats/views 3")
                })?;
                let Some(path) = parts.next() else {
                    return Err(invalid(
                        "set",
                        "requires a sub-path; use '.' for the whole content.",
                    ));
                };
                let rest = parts.collect::<Vec<&str>>().join(" ");
                let value = serde_json::from_str(&rest)
                    .map_err(|e| invalid("set", &format!("requires a JSON value, {e}")))?;
                Ok(Command::Set {
                    document: document.to_string(),
                    sub_path: sub_path(Some(path)),
                    value,
                })
            }
            _ => Err(CommandError::UnrecognizedCommand(self.trim().to_string())),
        }
    }
}

/// `.` addresses the whole content; an omitted sub-path does too.
fn sub_path(part: Option<&str>) -> String {
    match part {
        Some(".") | None => String::new(),
        Some(path) => path.to_string(),
    }
}

fn invalid(command: &str, reason: &str) -> CommandError {
    CommandError::InvalidCommandArguments {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

/// Prompt for one shell command.
///
/// # Panics
/// If the reader or writer fails at the IO level.
pub fn prompt<R, W>(mut reader: R, mut writer: W) -> Result<Command, CommandError>
where
    R: BufRead,
    W: Write,
{
    let mut s = String::default();
    write!(&mut writer, "> ").expect("failed to write to writer.");
    writer.flush().expect("failed to flush writer.");

    reader
        .read_line(&mut s)
        .expect("failed to read from reader.");

    s.as_str().try_into()
}
