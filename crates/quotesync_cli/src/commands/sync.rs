//! Sync commands and interactive conflict resolution.

use super::list::format_quote;
use super::Context;
use quotesync_sync_engine::{
    ConflictChoice, ConflictSession, QuoteTransport, Resolution, SyncOutcome, SyncReport,
    SyncScheduler,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Parses an answer to the conflict prompt.
fn parse_answer(answer: &str) -> Option<ConflictChoice> {
    match answer.trim() {
        "l" | "L" => Some(ConflictChoice::KeepLocal),
        "s" | "S" => Some(ConflictChoice::KeepServer),
        other => other.parse().ok(),
    }
}

fn print_report(report: &SyncReport) {
    println!(
        "✓ Synced: {} quote(s) ({} from server, {} local only, {} conflict(s) resolved) in {:?}",
        report.merged, report.fetched, report.kept_local, report.conflicts_resolved, report.duration
    );
}

/// Asks which side to keep for every pending conflict, committing once the
/// last one is answered.
pub fn resolve_interactively<R: BufRead, W: Write>(
    session: &mut ConflictSession,
    mut input: R,
    mut output: W,
) -> Result<SyncReport, Box<dyn std::error::Error>> {
    let total = session.conflicts().len();
    let pending: Vec<usize> = session.pending().map(|(i, _)| i).collect();
    if pending.is_empty() {
        return Ok(session.commit()?);
    }

    let mut resolution = Resolution::Pending {
        remaining: pending.len(),
    };
    for index in pending {
        let conflict = &session.conflicts()[index];
        writeln!(output, "Conflict {} of {}: \"{}\"", index + 1, total, conflict.local.text)?;
        writeln!(output, "  [l] local:  {}", format_quote(&conflict.local))?;
        writeln!(output, "  [s] server: {}", format_quote(&conflict.server))?;

        let choice = loop {
            write!(output, "Keep which? [l/s]: ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(format!(
                    "input closed with {} conflict(s) unresolved",
                    session.pending_count()
                )
                .into());
            }
            match parse_answer(&line) {
                Some(choice) => break choice,
                None => writeln!(output, "Please answer l (local) or s (server).")?,
            }
        };

        resolution = session.resolve(index, choice)?;
    }

    match resolution {
        Resolution::Committed(report) => Ok(report),
        Resolution::Pending { remaining } => {
            Err(format!("{remaining} conflict(s) left unresolved").into())
        }
    }
}

fn settle(
    mut session: ConflictSession,
    keep: Option<ConflictChoice>,
) -> Result<SyncReport, Box<dyn std::error::Error>> {
    println!("! {} conflict(s) with the server", session.pending_count());
    match keep {
        Some(choice) => match session.resolve_all(choice)? {
            Resolution::Committed(report) => Ok(report),
            Resolution::Pending { remaining } => {
                Err(format!("{remaining} conflict(s) left unresolved").into())
            }
        },
        None => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            resolve_interactively(&mut session, stdin.lock(), stdout.lock())
        }
    }
}

/// Runs one sync cycle.
pub async fn run(
    ctx: &Context,
    keep: Option<ConflictChoice>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.engine()?;
    info!(url = %ctx.sync_config().server_url, "syncing with server");

    let report = match engine.run_sync().await {
        SyncOutcome::Synced(report) => report,
        SyncOutcome::Conflicts(session) => settle(session, keep)?,
        SyncOutcome::Failed(e) => return Err(e.into()),
    };
    print_report(&report);
    Ok(())
}

fn handle_outcome(outcome: SyncOutcome) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        SyncOutcome::Synced(report) => print_report(&report),
        SyncOutcome::Conflicts(session) => {
            let report = tokio::task::block_in_place(|| settle(session, None))?;
            print_report(&report);
        }
        SyncOutcome::Failed(e) => {
            let retry = if e.is_retryable() { ", retrying next cycle" } else { "" };
            warn!(error = %e, "sync cycle failed");
            eprintln!("✗ Sync failed: {e}{retry}");
        }
    }
    Ok(())
}

/// Drains scheduler outcomes until Ctrl-C.
async fn watch_outcomes<T: QuoteTransport + 'static>(
    scheduler: &SyncScheduler<T>,
    mut events: mpsc::UnboundedReceiver<SyncOutcome>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(outcome) = events.recv() => {
                if let Err(e) = handle_outcome(outcome) {
                    // A stale or abandoned session is superseded by the next cycle.
                    eprintln!("✗ {e}");
                }
            }
        }
    }

    println!("Stopping after the current cycle...");
    scheduler.shutdown().await;
    Ok(())
}

/// Syncs on the configured interval until interrupted.
pub async fn watch(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Arc::new(ctx.engine()?);
    let (tx, rx) = mpsc::unbounded_channel();
    let scheduler = SyncScheduler::new(engine, tx);

    scheduler.start();
    println!(
        "Syncing with {} every {:?}, press Ctrl-C to stop",
        ctx.sync_config().server_url,
        scheduler.interval()
    );
    watch_outcomes(&scheduler, rx).await
}
