//! Line grammar of the batch protocol.
//!
//! The protocol is line oriented: one setup header creating the game, then
//! one command per line. Parsing here is pure - the session runner in
//! [`crate::batch`] owns all I/O and error reporting.

use annex_core::PlayerId;
use thiserror::Error;

/// Letters that may open a line; together with digits and whitespace they
/// form the whole protocol alphabet.
const COMMAND_LETTERS: &str = "BImgbfqp";

/// Parameters of the `B` setup header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setup {
    pub width: u32,
    pub height: u32,
    pub players: u32,
    pub areas: u32,
}

/// One command line of a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `m player x y` - claim an unclaimed cell.
    Claim { player: PlayerId, x: u32, y: u32 },
    /// `g player x y` - golden move onto an opponent's cell.
    GoldenMove { player: PlayerId, x: u32, y: u32 },
    /// `b player` - cells the player owns.
    BusyFields { player: PlayerId },
    /// `f player` - cells the player could still claim.
    FreeFields { player: PlayerId },
    /// `q player` - whether a legal golden move exists.
    GoldenPossible { player: PlayerId },
    /// `p` - print the board.
    PrintBoard,
}

/// Why a line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line is not newline-terminated")]
    MissingNewline,
    #[error("line contains a character outside the protocol alphabet")]
    ForbiddenCharacter,
    #[error("unknown or malformed command")]
    Malformed,
    #[error("interactive sessions are not supported")]
    InteractiveUnsupported,
}

/// Whether the line produces no output at all: empty or a comment.
pub fn is_skipped(line: &str) -> bool {
    line == "\n" || line.starts_with('#')
}

fn valid_chars(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_whitespace() || COMMAND_LETTERS.contains(c))
}

/// Split a raw input line into its verb letter and number tokens.
///
/// A significant line must be newline-terminated, contain only protocol
/// characters, and start with a single-letter verb in its first column.
fn split(line: &str) -> Result<(char, Vec<u32>), ParseError> {
    if !line.ends_with('\n') {
        return Err(ParseError::MissingNewline);
    }
    if !valid_chars(line) {
        return Err(ParseError::ForbiddenCharacter);
    }
    let body = &line[..line.len() - 1];
    let mut parts = body.split_ascii_whitespace();
    let verb_token = parts.next().ok_or(ParseError::Malformed)?;
    if verb_token.len() != 1 || !body.starts_with(verb_token) {
        return Err(ParseError::Malformed);
    }
    let verb = verb_token.chars().next().ok_or(ParseError::Malformed)?;
    let mut numbers = Vec::new();
    for part in parts {
        let value = part.parse::<u32>().map_err(|_| ParseError::Malformed)?;
        numbers.push(value);
    }
    Ok((verb, numbers))
}

/// Parse the session-opening header line.
pub fn parse_setup(line: &str) -> Result<Setup, ParseError> {
    let (verb, numbers) = split(line)?;
    match verb {
        'B' => match numbers.as_slice() {
            &[width, height, players, areas] => Ok(Setup {
                width,
                height,
                players,
                areas,
            }),
            _ => Err(ParseError::Malformed),
        },
        'I' => Err(ParseError::InteractiveUnsupported),
        _ => Err(ParseError::Malformed),
    }
}

/// Parse one command line of a running session.
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let (verb, numbers) = split(line)?;
    match (verb, numbers.as_slice()) {
        ('m', &[player, x, y]) => Ok(Command::Claim { player, x, y }),
        ('g', &[player, x, y]) => Ok(Command::GoldenMove { player, x, y }),
        ('b', &[player]) => Ok(Command::BusyFields { player }),
        ('f', &[player]) => Ok(Command::FreeFields { player }),
        ('q', &[player]) => Ok(Command::GoldenPossible { player }),
        ('p', &[]) => Ok(Command::PrintBoard),
        _ => Err(ParseError::Malformed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setup_header() {
        assert_eq!(
            parse_setup("B 4 3 2 1\n"),
            Ok(Setup {
                width: 4,
                height: 3,
                players: 2,
                areas: 1
            })
        );
    }

    #[test]
    fn test_parse_setup_rejects_interactive_header() {
        assert_eq!(
            parse_setup("I 4 3 2 1\n"),
            Err(ParseError::InteractiveUnsupported)
        );
    }

    #[test]
    fn test_parse_setup_arity_and_shape() {
        assert_eq!(parse_setup("B 4 3 2\n"), Err(ParseError::Malformed));
        assert_eq!(parse_setup("B 4 3 2 1 5\n"), Err(ParseError::Malformed));
        assert_eq!(parse_setup("B4 3 2 1 5\n"), Err(ParseError::Malformed));
        assert_eq!(parse_setup(" B 4 3 2 1\n"), Err(ParseError::Malformed));
        assert_eq!(parse_setup("m 1 0 0\n"), Err(ParseError::Malformed));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("m 1 0 2\n"),
            Ok(Command::Claim { player: 1, x: 0, y: 2 })
        );
        assert_eq!(
            parse_command("g 2 1 1\n"),
            Ok(Command::GoldenMove { player: 2, x: 1, y: 1 })
        );
        assert_eq!(parse_command("b 1\n"), Ok(Command::BusyFields { player: 1 }));
        assert_eq!(parse_command("f 2\n"), Ok(Command::FreeFields { player: 2 }));
        assert_eq!(
            parse_command("q 1\n"),
            Ok(Command::GoldenPossible { player: 1 })
        );
        assert_eq!(parse_command("p\n"), Ok(Command::PrintBoard));
    }

    #[test]
    fn test_parse_command_tolerates_extra_whitespace() {
        assert_eq!(
            parse_command("m  1\t0   2\n"),
            Ok(Command::Claim { player: 1, x: 0, y: 2 })
        );
    }

    #[test]
    fn test_parse_command_rejects_malformed_lines() {
        assert_eq!(parse_command("m 1 0\n"), Err(ParseError::Malformed));
        assert_eq!(parse_command("m 1 0 2 9\n"), Err(ParseError::Malformed));
        assert_eq!(parse_command("p 1\n"), Err(ParseError::Malformed));
        assert_eq!(parse_command("z 1\n"), Err(ParseError::ForbiddenCharacter));
        assert_eq!(parse_command("m 1 0 2"), Err(ParseError::MissingNewline));
        assert_eq!(parse_command(" m 1 0 2\n"), Err(ParseError::Malformed));
        assert_eq!(parse_command("mm 1 0 2\n"), Err(ParseError::Malformed));
    }

    #[test]
    fn test_numbers_must_fit_u32() {
        assert_eq!(parse_command("b 4294967295\n"), Ok(Command::BusyFields { player: u32::MAX }));
        assert_eq!(parse_command("b 4294967296\n"), Err(ParseError::Malformed));
    }
}
