use crate::session::{Session, SessionEvent};
use amp_protocol::{Effect, Param};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::debug;

pub const COMMAND_CAP: usize = 64;
pub const EVENT_CAP: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    ToggleEffect(Effect),
    SetParameter(Param, f64),
    SendPressed,
    /// Ask for a `SessionEvent::Settings` snapshot.
    Snapshot,
    Shutdown,
}

/// Drives a session from UI commands until `Shutdown` or until every sender is
/// gone. Starts with the start-up fetch. A `SendPressed` that arrives while an
/// exchange is in flight, or is already queued when one starts, abandons it and
/// disconnects. Other commands that arrive mid-exchange are applied once it
/// finishes.
pub async fn run(
    mut session: Session,
    mut rx: mpsc::Receiver<UiCommand>,
    events: mpsc::Sender<SessionEvent>,
) -> Session {
    let mut backlog: VecDeque<UiCommand> = VecDeque::from([UiCommand::SendPressed]);

    while let Some(cmd) = recv_or_backlog(&mut rx, &mut backlog).await {
        match cmd {
            UiCommand::ToggleEffect(effect) => {
                session.on_effect_toggled(effect);
                emit(&events, session_snapshot(&session)).await;
            }
            UiCommand::SetParameter(param, value) => {
                session.on_parameter_changed(param, value);
                emit(&events, session_snapshot(&session)).await;
            }
            UiCommand::Snapshot => {
                emit(&events, session_snapshot(&session)).await;
            }
            UiCommand::SendPressed => {
                let finished = {
                    let exchange = session.on_send_pressed();
                    tokio::pin!(exchange);
                    loop {
                        // The exchange is polled first, so a press that is
                        // already queued tears down a started connect.
                        tokio::select! {
                            biased;
                            result = &mut exchange => break Some(result),
                            next = rx.recv() => match next {
                                Some(UiCommand::SendPressed) => break None,
                                Some(other) => backlog.push_back(other),
                                None => {
                                    backlog.push_back(UiCommand::Shutdown);
                                    break None;
                                }
                            },
                        }
                    }
                };

                let result = match finished {
                    Some(result) => result,
                    None => {
                        debug!("exchange abandoned");
                        session.on_send_pressed().await
                    }
                };
                emit(&events, SessionEvent::from_outcome(&result)).await;
            }
            UiCommand::Shutdown => break,
        }
    }

    session.disconnect().await;
    session
}

async fn recv_or_backlog(
    rx: &mut mpsc::Receiver<UiCommand>,
    backlog: &mut VecDeque<UiCommand>,
) -> Option<UiCommand> {
    if let Some(cmd) = backlog.pop_front() {
        return Some(cmd);
    }
    rx.recv().await
}

fn session_snapshot(session: &Session) -> SessionEvent {
    SessionEvent::settings(session.settings(), session.connection_state())
}

async fn emit(events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    if events.send(event).await.is_err() {
        debug!("event receiver dropped");
    }
}
