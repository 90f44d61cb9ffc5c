//! `segdb-cli`: an interactive front-end over a [`segdb_session::Session`].
//!
//! Reads newline-delimited commands from stdin:
//!
//! ```text
//! read <offset> <len>
//! write <offset> <hex-bytes>
//! commit
//! rollback
//! quit
//! ```
//!
//! `<hex-bytes>` is a hex string with no `0x` prefix or separators, e.g.
//! `write 0 deadbeef` writes `[0xDE, 0xAD, 0xBE, 0xEF]` at offset 0.
//!
//! One session, and therefore at most one pending transaction, is live for
//! the lifetime of the process.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;

use segdb_engine::{Store, StoreConfigBuilder};
use segdb_session::Session;

/// Interactive front-end for a segdb store.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Segment width, in bytes.
    #[arg(long, default_value_t = 64)]
    segment_size: usize,

    /// Commits allowed before the version chain is compacted.
    #[arg(long, default_value_t = 15)]
    commits_before_compaction: usize,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = StoreConfigBuilder::new()
        .segment_size(args.segment_size)
        .commits_before_compaction(args.commits_before_compaction)
        .build()
        .expect("command-line arguments were already validated by clap's type system");

    let store = Arc::new(Store::with_config(config));
    let mut session = Session::new(store);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(%err, "failed to read command");
                break;
            }
        };

        match run_command(&mut session, line.trim()) {
            CommandOutcome::Continue => {}
            CommandOutcome::Quit => break,
        }

        let _ = stdout.flush();
    }
}

enum CommandOutcome {
    Continue,
    Quit,
}

fn run_command(session: &mut Session, line: &str) -> CommandOutcome {
    let mut parts = line.splitn(3, ' ');
    match parts.next().unwrap_or("") {
        "read" => {
            let (Some(offset), Some(len)) = (parts.next(), parts.next()) else {
                println!("error: usage: read <offset> <len>");
                return CommandOutcome::Continue;
            };
            match (offset.parse::<u64>(), len.parse::<usize>()) {
                (Ok(offset), Ok(len)) => match session.read_at(offset, len) {
                    Ok(bytes) => println!("{}", hex::encode(bytes)),
                    Err(err) => println!("error: {err}"),
                },
                _ => println!("error: offset and len must be non-negative integers"),
            }
        }
        "write" => {
            let (Some(offset), Some(hex_bytes)) = (parts.next(), parts.next()) else {
                println!("error: usage: write <offset> <hex-bytes>");
                return CommandOutcome::Continue;
            };
            match offset.parse::<u64>() {
                Ok(offset) => match hex::decode(hex_bytes.trim()) {
                    Ok(bytes) => match session.write_at(offset, &bytes) {
                        Ok(()) => println!("ok"),
                        Err(err) => println!("error: {err}"),
                    },
                    Err(err) => println!("error: invalid hex bytes: {err}"),
                },
                Err(_) => println!("error: offset must be a non-negative integer"),
            }
        }
        "commit" => {
            println!("{:?}", session.commit());
        }
        "rollback" => {
            println!("{:?}", session.rollback());
        }
        "quit" | "exit" => return CommandOutcome::Quit,
        "" => {}
        other => println!("error: unknown command {other:?}"),
    }
    CommandOutcome::Continue
}
