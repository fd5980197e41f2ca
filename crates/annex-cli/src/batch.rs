//! The batch session: reads the line protocol and answers on stdout.
//!
//! The runner is generic over its reader and writers so the whole session
//! can be driven from in-memory buffers in tests. Command results go to
//! `out`; per-line diagnostics (`ERROR n`) go to `err`, which the binary
//! wires to stderr.

use crate::protocol::{self, Command};
use annex_core::Game;
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// Drive a whole session: wait for a valid setup header, then execute
/// commands until end of input.
///
/// The line counter covers every input line, including skipped and
/// rejected ones, so diagnostics always name the physical line.
pub fn run(
    mut input: impl BufRead,
    mut out: impl Write,
    mut err: impl Write,
) -> anyhow::Result<()> {
    let mut line_number: u32 = 0;
    let mut line = String::new();

    // Phase 1: find a setup header.
    let mut game = loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            // End of input before any game was created.
            return Ok(());
        }
        line_number += 1;
        if protocol::is_skipped(&line) {
            continue;
        }
        match parse_and_create(&line) {
            Ok(game) => {
                info!(
                    "game created: {}x{}, {} players, area limit {}",
                    game.width(),
                    game.height(),
                    game.player_count(),
                    game.area_limit()
                );
                writeln!(out, "OK {}", line_number)?;
                break game;
            }
            Err(reason) => {
                warn!("rejected line {}: {}", line_number, reason);
                writeln!(err, "ERROR {}", line_number)?;
            }
        }
    };

    // Phase 2: commands against the running game.
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        line_number += 1;
        if protocol::is_skipped(&line) {
            continue;
        }
        match protocol::parse_command(&line) {
            Ok(command) => execute(&mut game, command, &mut out)?,
            Err(reason) => {
                warn!("rejected line {}: {}", line_number, reason);
                writeln!(err, "ERROR {}", line_number)?;
            }
        }
    }
    Ok(())
}

/// Parse a setup line and create the game it describes. Both parse errors
/// and rejected game parameters surface as one diagnostic string.
fn parse_and_create(line: &str) -> Result<Game, String> {
    let setup = protocol::parse_setup(line).map_err(|e| e.to_string())?;
    Game::new(setup.width, setup.height, setup.players, setup.areas).map_err(|e| e.to_string())
}

fn execute(game: &mut Game, command: Command, out: &mut impl Write) -> std::io::Result<()> {
    match command {
        Command::Claim { player, x, y } => {
            writeln!(out, "{}", game.claim(player, x, y).is_ok() as u8)
        }
        Command::GoldenMove { player, x, y } => {
            writeln!(out, "{}", game.golden_move(player, x, y).is_ok() as u8)
        }
        Command::BusyFields { player } => writeln!(out, "{}", game.busy_fields(player)),
        Command::FreeFields { player } => writeln!(out, "{}", game.free_fields(player)),
        Command::GoldenPossible { player } => {
            writeln!(out, "{}", game.golden_move_possible(player) as u8)
        }
        Command::PrintBoard => write!(out, "{}", game.snapshot()),
    }
}
