//! Batch front-end for the annex game engine.
//!
//! Reads a line-oriented protocol on stdin: a `B width height players
//! areas` header creates the game, then one command per line plays it
//! (`m`/`g` for moves, `b`/`f`/`q` for queries, `p` to print the board).
//! Results go to stdout, `ERROR <line>` diagnostics to stderr.
//!
//! Logging is off unless `RUST_LOG` says otherwise, and always goes to
//! stderr so it can never corrupt the protocol stream on stdout.

use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod batch;
mod protocol;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "error".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    batch::run(stdin.lock(), stdout.lock(), io::stderr().lock())
}
