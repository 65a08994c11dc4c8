//! Text command parsing.

use votebox_types::Address;

use crate::error::CommandError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Start drafting a new poll.
    New,
    /// Create the drafted poll.
    Done,
    /// Drop the draft or leave the current poll.
    Cancel,
    /// Attach to an existing poll.
    Open(Address),
    Candidates,
    /// Vote for a candidate, numbered from 1 as shown to the user.
    Vote(u64),
    Results,
    Voted,
    /// Finalize the current poll (owner only).
    Close,
    /// Anything that is not a command. While drafting, a candidate name.
    Text(String),
}

impl Command {
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let input = input.trim();
        let Some(rest) = input.strip_prefix('/') else {
            return Ok(Command::Text(input.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        // Group chats address commands as /vote@botname.
        let name = name.split('@').next().unwrap_or(name);

        match name.to_ascii_lowercase().as_str() {
            "help" | "start" => Ok(Command::Help),
            "new" => Ok(Command::New),
            "done" => Ok(Command::Done),
            "cancel" => Ok(Command::Cancel),
            "open" => {
                if arg.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "/open",
                        usage: "/open <address>",
                    });
                }
                arg.parse::<Address>()
                    .map(Command::Open)
                    .map_err(|_| CommandError::InvalidAddress(arg.to_string()))
            }
            "candidates" => Ok(Command::Candidates),
            "vote" => {
                if arg.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "/vote",
                        usage: "/vote <number>",
                    });
                }
                match arg.parse::<u64>() {
                    Ok(n) if n >= 1 => Ok(Command::Vote(n)),
                    _ => Err(CommandError::InvalidChoice(arg.to_string())),
                }
            }
            "results" => Ok(Command::Results),
            "voted" => Ok(Command::Voted),
            "close" => Ok(Command::Close),
            _ => Err(CommandError::Unknown(format!("/{name}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(
            Command::parse("  Alice \n").unwrap(),
            Command::Text("Alice".into())
        );
    }

    #[test]
    fn simple_commands() {
        assert_eq!(Command::parse("/new").unwrap(), Command::New);
        assert_eq!(Command::parse("/DONE").unwrap(), Command::Done);
        assert_eq!(Command::parse("/start").unwrap(), Command::Help);
        assert_eq!(Command::parse("/results@votebox_bot").unwrap(), Command::Results);
    }

    #[test]
    fn vote_takes_a_positive_number() {
        assert_eq!(Command::parse("/vote 2").unwrap(), Command::Vote(2));
        assert_eq!(
            Command::parse("/vote 0").unwrap_err(),
            CommandError::InvalidChoice("0".into())
        );
        assert_eq!(
            Command::parse("/vote two").unwrap_err(),
            CommandError::InvalidChoice("two".into())
        );
        assert!(matches!(
            Command::parse("/vote").unwrap_err(),
            CommandError::MissingArgument { command: "/vote", .. }
        ));
    }

    #[test]
    fn open_parses_an_address() {
        let text = "/open 0xc000000000000000000000000000000000000001";
        let Command::Open(address) = Command::parse(text).unwrap() else {
            panic!("expected /open");
        };
        assert_eq!(address.as_slice()[0], 0xc0);
        assert_eq!(address.as_slice()[19], 0x01);

        assert!(matches!(
            Command::parse("/open nowhere").unwrap_err(),
            CommandError::InvalidAddress(_)
        ));
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(
            Command::parse("/frobnicate now").unwrap_err(),
            CommandError::Unknown("/frobnicate".into())
        );
    }
}
