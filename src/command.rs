//! Interactive Commands - Parsing for the Shell Loop

use thiserror::Error;

pub const HELP: &str = "\
Available commands:
    generate [n=1]  -  Generate `n` image(s).
    quit            -  Close the app.
    ?               -  Get the list of available commands.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Generate(usize),
    Quit,
    Help,
}

/// User-facing argument errors; the shell prints them and keeps going
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Not a number: \"{0}\"")]
    NotANumber(String),

    #[error("Has to be a positive integer: \"{0}\"")]
    NotPositive(String),

    #[error("Unknown command: \"{0}\". Type ? for the list of commands.")]
    Unknown(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut args = line.split_whitespace();
        let Some(name) = args.next() else {
            return Ok(None);
        };

        let command = match name.to_lowercase().as_str() {
            "generate" | "g" | "gen" | "create" | "c" | "build" | "b" => {
                Command::Generate(parse_count(args.next())?)
            }
            "quit" | "q" | "exit" | "close" | "stop" | "leave" => Command::Quit,
            "?" | "help" | "h" | "commands" => Command::Help,
            _ => return Err(CommandError::Unknown(name.to_string())),
        };
        Ok(Some(command))
    }
}

/// Artifact count for `generate`; defaults to 1
pub fn parse_count(arg: Option<&str>) -> Result<usize, CommandError> {
    let Some(arg) = arg else {
        return Ok(1);
    };
    let value: i64 = arg
        .parse()
        .map_err(|_| CommandError::NotANumber(arg.to_string()))?;
    if value <= 0 {
        return Err(CommandError::NotPositive(arg.to_string()));
    }
    usize::try_from(value).map_err(|_| CommandError::NotANumber(arg.to_string()))
}
