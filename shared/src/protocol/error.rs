use thiserror::Error;

/// Errors that can occur while parsing the text form of a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line does not start with a command name
    #[error("Invalid syntax. Command name expected (line {line})")]
    MissingName { line: usize },

    /// The command name is not in the command table
    #[error("Unknown command '{name}' (line {line})")]
    UnknownCommand { name: String, line: usize },

    /// A payload token is not a hexadecimal byte
    #[error("Invalid syntax. Byte expected, found '{token}' (line {line})")]
    InvalidByte { token: String, line: usize },
}
