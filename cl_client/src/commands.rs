use card_lobby::messages::ClientMessage;
use std::fmt;

/// A line typed by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyCommand {
    /// Mark the seat ready to start
    Ready,
    /// Take the ready mark back
    Unready,
    /// Change display name
    Rename(String),
    /// Change avatar
    Avatar(u32),
    /// Print the roster again
    Show,
    /// Print the command list
    Help,
    /// Leave the lobby
    Quit,
}

impl LobbyCommand {
    /// Message to send for this command; `None` for local-only commands.
    pub fn to_message(&self) -> Option<ClientMessage> {
        let (name, avatar_index, ready) = match self {
            Self::Ready => (None, None, Some(true)),
            Self::Unready => (None, None, Some(false)),
            Self::Rename(name) => (Some(name.clone()), None, None),
            Self::Avatar(avatar_index) => (None, Some(*avatar_index), None),
            Self::Quit => return Some(ClientMessage::Leave),
            Self::Show | Self::Help => return None,
        };
        Some(ClientMessage::UpdateSeat {
            name,
            avatar_index,
            ready,
        })
    }
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// `name` without a new name.
    MissingName,
    /// `avatar` with something that is not a non-negative number.
    InvalidAvatar(String),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "Name requires a value (e.g., 'name Bob')"),
            Self::InvalidAvatar(value) => write!(
                f,
                "Invalid avatar '{}'. Must be a non-negative number (e.g., 'avatar 3')",
                value
            ),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
Commands:
  ready            Mark yourself ready
  unready          Take it back
  name NAME        Change your display name
  avatar N         Change your avatar
  show             Print the roster
  quit             Leave the lobby";

/// Parse a command string into a LobbyCommand.
///
/// # Examples
///
/// ```
/// use cl_client::commands::{LobbyCommand, parse_command};
///
/// assert_eq!(parse_command("ready"), Ok(LobbyCommand::Ready));
/// assert_eq!(parse_command("name Bob Smith"), Ok(LobbyCommand::Rename("Bob Smith".to_string())));
/// assert_eq!(parse_command("avatar 3"), Ok(LobbyCommand::Avatar(3)));
/// ```
pub fn parse_command(input: &str) -> Result<LobbyCommand, ParseError> {
    let trimmed = input.trim();

    match trimmed {
        "ready" => return Ok(LobbyCommand::Ready),
        "unready" => return Ok(LobbyCommand::Unready),
        "show" => return Ok(LobbyCommand::Show),
        "help" | "?" => return Ok(LobbyCommand::Help),
        "quit" | "exit" | "leave" => return Ok(LobbyCommand::Quit),
        _ => {}
    }

    let (command, rest) = trimmed
        .split_once(char::is_whitespace)
        .map(|(command, rest)| (command, rest.trim()))
        .unwrap_or((trimmed, ""));

    match command {
        "name" if rest.is_empty() => Err(ParseError::MissingName),
        "name" => Ok(LobbyCommand::Rename(rest.to_string())),
        "avatar" => rest
            .parse::<u32>()
            .map(LobbyCommand::Avatar)
            .map_err(|_| ParseError::InvalidAvatar(rest.to_string())),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}
