//! Session controller.
//!
//! Applies UI commands to the map session, dispatches requests and feeds their
//! completions back, emitting events for presentation layers.

use crate::model::{Endpoint, InfoEvent, SessionEvent};
use crate::session::{Completion, CompletionOutcome, MapSession};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    AddStop,
    RemoveLastStop,
    SetStart { index: usize, value: String },
    SetEnd { index: usize, value: String },
    SetAntCount(String),
    SetIterationCount(String),
    SelectMode(String),
    /// Fetch the default stop layout.
    NewMap,
    /// Fetch routes for the current form.
    Recompute,
    Quit,
}

fn send_info(event_tx: &UnboundedSender<SessionEvent>, info: InfoEvent) {
    let _ = event_tx.send(SessionEvent::Info(info));
}

fn send_snapshot(event_tx: &UnboundedSender<SessionEvent>, session: &MapSession) {
    let _ = event_tx.send(SessionEvent::Snapshot {
        view: Box::new(session.view()),
    });
}

/// Apply one command. Returns false when the loop should stop.
fn apply_command(
    session: &mut MapSession,
    cmd: UiCommand,
    event_tx: &UnboundedSender<SessionEvent>,
) -> bool {
    match cmd {
        UiCommand::AddStop => {
            session.add_stop();
        }
        UiCommand::RemoveLastStop => {
            // Guarded no-op on the last remaining pair.
            session.remove_last_stop();
        }
        UiCommand::SetStart { index, value } => {
            if let Err(e) = session.set_start(index, value) {
                send_info(event_tx, InfoEvent::Message(e.to_string()));
            }
        }
        UiCommand::SetEnd { index, value } => {
            if let Err(e) = session.set_end(index, value) {
                send_info(event_tx, InfoEvent::Message(e.to_string()));
            }
        }
        UiCommand::SetAntCount(v) => session.set_ant_count(v),
        UiCommand::SetIterationCount(v) => session.set_iteration_count(v),
        UiCommand::SelectMode(v) => {
            if let Err(e) = session.select_mode(&v) {
                send_info(event_tx, InfoEvent::Message(e.to_string()));
            }
        }
        UiCommand::NewMap => {
            let seq = session.initialize();
            send_info(
                event_tx,
                InfoEvent::RequestIssued {
                    seq,
                    endpoint: Endpoint::Stops,
                },
            );
        }
        UiCommand::Recompute => match session.recompute() {
            Ok(seq) => send_info(
                event_tx,
                InfoEvent::RequestIssued {
                    seq,
                    endpoint: Endpoint::Routes,
                },
            ),
            Err(e) => send_info(
                event_tx,
                InfoEvent::Message(format!("Cannot compute routes: {e}")),
            ),
        },
        UiCommand::Quit => return false,
    }
    send_snapshot(event_tx, session);
    true
}

fn apply_completion(
    session: &mut MapSession,
    completion: Completion,
    event_tx: &UnboundedSender<SessionEvent>,
) {
    let info = match session.complete(completion) {
        CompletionOutcome::Rendered { seq, endpoint } => InfoEvent::Rendered { seq, endpoint },
        CompletionOutcome::Stale { seq, latest } => InfoEvent::StaleDiscarded { seq, latest },
        CompletionOutcome::Failed(f) => InfoEvent::RequestFailed {
            seq: f.seq,
            endpoint: f.endpoint,
            error: f.message,
        },
    };
    send_info(event_tx, info);
    send_snapshot(event_tx, session);
}

/// Drive the session from UI commands and request completions until quit.
///
/// Requests still in flight on quit are abandoned; there is no cancellation.
pub async fn run_controller(
    mut session: MapSession,
    mut completion_rx: UnboundedReceiver<Completion>,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<MapSession> {
    send_snapshot(&event_tx, &session);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => {
                        if !apply_command(&mut session, cmd, &event_tx) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            // The session holds a sender, so this only ends if the channel is
            // dropped elsewhere; park the arm instead of spinning.
            done = async {
                match completion_rx.recv().await {
                    Some(c) => c,
                    None => futures::future::pending().await,
                }
            } => {
                apply_completion(&mut session, done, &event_tx);
            }
        }
    }

    tracing::debug!(in_flight = session.in_flight(), "controller stopped");
    Ok(session)
}
