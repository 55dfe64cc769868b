//! Async wrapper that gives a [`ProctorSession`] a clock and a mailbox.
//!
//! The spawned task is the sole owner of the session, so events are applied
//! strictly one at a time in arrival order. The task drives the per-second
//! tick itself; callers only forward student input through the handle.

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, interval};

use super::events::{FocusSignal, NavDirection, SessionEvent};
use super::session::{ProctorSession, SessionError, SessionOutcome};

struct Command {
    event: SessionEvent,
    reply: oneshot::Sender<Result<(), SessionError>>,
}

/// Caller-side handle to a running session task.
///
/// Dropping the handle abandons the session: the task stops, no outcome is
/// delivered, and nothing is recorded.
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

/// Spawns the session task.
///
/// The returned receiver resolves at most once, with the outcome of the
/// session; it errors if the session was abandoned.
pub fn spawn(session: ProctorSession) -> (SessionHandle, oneshot::Receiver<SessionOutcome>) {
    let (tx, rx) = mpsc::channel::<Command>(32);
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(run(session, rx, done_tx));

    (SessionHandle { tx }, done_rx)
}

async fn run(
    mut session: ProctorSession,
    mut rx: mpsc::Receiver<Command>,
    done_tx: oneshot::Sender<SessionOutcome>,
) {
    let mut ticker = interval(Duration::from_secs(1));

    let outcome = loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command { event, reply }) => {
                    let result = session.apply(event);
                    let outcome = match &result {
                        Ok(Some(outcome)) => Some(outcome.clone()),
                        _ => None,
                    };
                    let _ = reply.send(result.map(|_| ()));
                    if let Some(outcome) = outcome {
                        break Some(outcome);
                    }
                }
                None => {
                    log::info!("proctored session abandoned before completion");
                    break None;
                }
            },
            _ = ticker.tick() => {
                // Tick is never rejected, only sometimes ignored.
                if let Ok(Some(outcome)) = session.apply(SessionEvent::Tick) {
                    break Some(outcome);
                }
            }
        }
    };

    if let Some(outcome) = outcome {
        let _ = done_tx.send(outcome);
    }
}

impl SessionHandle {
    async fn dispatch(&self, event: SessionEvent) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command {
                event,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Finished)?;
        reply_rx.await.map_err(|_| SessionError::Finished)?
    }

    pub async fn enter_secure_mode(&self) -> Result<(), SessionError> {
        self.dispatch(SessionEvent::EnterSecureMode).await
    }

    pub async fn focus_lost(&self, signal: FocusSignal) -> Result<(), SessionError> {
        self.dispatch(SessionEvent::from(signal)).await
    }

    pub async fn select_answer(&self, question_index: usize, option: &str) -> Result<(), SessionError> {
        self.dispatch(SessionEvent::SelectAnswer {
            question_index,
            option: option.to_owned(),
        })
        .await
    }

    pub async fn navigate(&self, direction: NavDirection) -> Result<(), SessionError> {
        self.dispatch(SessionEvent::Navigate(direction)).await
    }

    pub async fn submit(&self) -> Result<(), SessionError> {
        self.dispatch(SessionEvent::Submit).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::session::SessionQuestion;
    use super::*;

    fn questions(count: usize) -> Vec<SessionQuestion> {
        (0..count)
            .map(|i| SessionQuestion {
                question_text: format!("Question {}", i + 1),
                options: vec![
                    "Option A".to_owned(),
                    "Option B".to_owned(),
                    "Option C".to_owned(),
                    "Option D".to_owned(),
                ],
                correct_option: "Option A".to_owned(),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn submit_delivers_the_outcome() {
        let session = ProctorSession::new(1, 2, questions(2), 10);
        let (handle, done) = spawn(session);

        handle.enter_secure_mode().await.unwrap();
        handle.select_answer(0, "Option A").await.unwrap();
        handle.navigate(NavDirection::Next).await.unwrap();
        handle.select_answer(1, "Option B").await.unwrap();
        handle.submit().await.unwrap();

        let outcome = done.await.expect("outcome delivered");
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total_questions, 2);
        assert!(!outcome.disqualified);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expiry_finishes_the_session() {
        let session = ProctorSession::new(1, 2, questions(1), 1);
        let (handle, done) = spawn(session);

        handle.enter_secure_mode().await.unwrap();
        handle.select_answer(0, "Option A").await.unwrap();

        // The runner's own ticker runs the minute down.
        let outcome = done.await.expect("outcome delivered");
        assert_eq!(outcome.score, 1);
        assert!(!outcome.disqualified);

        let err = handle.submit().await.unwrap_err();
        assert_eq!(err, SessionError::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn third_violation_disqualifies_through_the_handle() {
        let session = ProctorSession::new(1, 2, questions(1), 10);
        let (handle, done) = spawn(session);

        handle.enter_secure_mode().await.unwrap();
        for _ in 0..2 {
            handle.focus_lost(FocusSignal::FullscreenExited).await.unwrap();
            handle.enter_secure_mode().await.unwrap();
        }
        handle.focus_lost(FocusSignal::WindowBlurred).await.unwrap();

        let outcome = done.await.expect("outcome delivered");
        assert!(outcome.disqualified);
        assert_eq!(outcome.violations, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_abandons_the_session() {
        let session = ProctorSession::new(1, 2, questions(1), 10);
        let (handle, done) = spawn(session);

        handle.enter_secure_mode().await.unwrap();
        drop(handle);

        assert!(done.await.is_err());
    }
}
