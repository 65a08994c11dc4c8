use thiserror::Error;

/// A message that looks like a command but cannot be understood.
///
/// The `Display` text is sent back to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0}, send /help for the list of commands")]
    Unknown(String),

    #[error("{command} needs an argument: {usage}")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },

    #[error("{0:?} is not a contract address")]
    InvalidAddress(String),

    #[error("{0:?} is not a candidate number")]
    InvalidChoice(String),
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}
