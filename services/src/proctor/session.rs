//! Pure state machine for one student's proctored run of one test.

use db::models::test_question;
use thiserror::Error;

use super::events::{NavDirection, SessionEvent};

/// Number of focus-loss violations that disqualifies a session.
pub const VIOLATION_LIMIT: u32 = 3;

/// Lifecycle of a session. `Submitted` and `Disqualified` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created but the client has not yet confirmed fullscreen. The timer is
    /// not running and violations are not counted.
    AwaitingFullscreen,
    /// Timer running, violations armed.
    InProgress,
    Submitted,
    Disqualified,
}

/// Rejected inputs. Ignored inputs (stray ticks, duplicate focus signals)
/// return `Ok(None)` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("secure mode has not been entered")]
    SecureModeRequired,
    #[error("session already finished")]
    Finished,
    #[error("question index {index} out of range for {total} questions")]
    QuestionOutOfRange { index: usize, total: usize },
    #[error("'{option}' is not an option of question {index}")]
    UnknownOption { index: usize, option: String },
}

/// One question as the session sees it: prompt, options, and the correct
/// option for scoring at finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuestion {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option: String,
}

impl From<test_question::Model> for SessionQuestion {
    fn from(model: test_question::Model) -> Self {
        SessionQuestion {
            question_text: model.question_text,
            options: model.options.0,
            correct_option: model.correct_option,
        }
    }
}

/// Immutable result of a finished session, produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub test_id: i64,
    pub student_id: i64,
    /// Submitted answer per question position; `None` means unanswered.
    pub answers: Vec<Option<String>>,
    /// Count of answers equal to the correct option.
    pub score: u32,
    pub total_questions: u32,
    pub violations: u32,
    /// True when the violation limit ended the session.
    pub disqualified: bool,
}

/// The proctored session state machine.
///
/// All inputs go through [`apply`](Self::apply); every other method is a read.
/// The machine has no clock of its own — the caller feeds it
/// [`SessionEvent::Tick`] once per second while it is in progress.
#[derive(Debug, Clone)]
pub struct ProctorSession {
    test_id: i64,
    student_id: i64,
    questions: Vec<SessionQuestion>,
    answers: Vec<Option<String>>,
    current: usize,
    remaining_seconds: u32,
    violations: u32,
    /// True while the client is known to be in the secure context. A focus
    /// loss flips it off, so further signals from the same episode are
    /// ignored until the client re-enters secure mode.
    secure: bool,
    state: SessionState,
}

impl ProctorSession {
    pub fn new(
        test_id: i64,
        student_id: i64,
        questions: Vec<SessionQuestion>,
        duration_minutes: u32,
    ) -> Self {
        let answers = vec![None; questions.len()];
        ProctorSession {
            test_id,
            student_id,
            questions,
            answers,
            current: 0,
            remaining_seconds: duration_minutes.saturating_mul(60),
            violations: 0,
            secure: false,
            state: SessionState::AwaitingFullscreen,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Submitted | SessionState::Disqualified)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&SessionQuestion> {
        self.questions.get(self.current)
    }

    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    pub fn violations(&self) -> u32 {
        self.violations
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Feeds one event into the machine.
    ///
    /// Returns `Ok(Some(outcome))` exactly once, on the event that finishes
    /// the session (submit, timer expiry, or the violation that reaches
    /// [`VIOLATION_LIMIT`]). Events that are invalid in the current state
    /// return an error and leave the session untouched; events that are
    /// merely redundant (a duplicate focus signal, a tick after submission)
    /// return `Ok(None)`.
    pub fn apply(
        &mut self,
        event: SessionEvent,
    ) -> Result<Option<SessionOutcome>, SessionError> {
        match event {
            SessionEvent::EnterSecureMode => self.enter_secure_mode(),
            SessionEvent::FocusLost => self.focus_lost(),
            SessionEvent::SelectAnswer {
                question_index,
                option,
            } => self.select_answer(question_index, option),
            SessionEvent::Navigate(direction) => self.navigate(direction),
            SessionEvent::Tick => self.tick(),
            SessionEvent::Submit => self.submit(),
        }
    }

    fn enter_secure_mode(&mut self) -> Result<Option<SessionOutcome>, SessionError> {
        match self.state {
            SessionState::AwaitingFullscreen => {
                self.state = SessionState::InProgress;
                self.secure = true;
                Ok(None)
            }
            SessionState::InProgress => {
                // Re-arming after a focus loss; the timer kept running.
                self.secure = true;
                Ok(None)
            }
            _ => Err(SessionError::Finished),
        }
    }

    fn focus_lost(&mut self) -> Result<Option<SessionOutcome>, SessionError> {
        if self.state != SessionState::InProgress || !self.secure {
            // Not armed yet, already finished, or a second signal from the
            // same episode (e.g. fullscreen exit followed by window blur).
            return Ok(None);
        }

        self.secure = false;
        self.violations += 1;

        if self.violations >= VIOLATION_LIMIT {
            log::warn!(
                "student {} disqualified from test {} after {} violations",
                self.student_id,
                self.test_id,
                self.violations
            );
            return Ok(Some(self.finalize(true)));
        }

        log::warn!(
            "student {} violation {}/{} on test {}: answers cleared",
            self.student_id,
            self.violations,
            VIOLATION_LIMIT,
            self.test_id
        );
        // The penalty: progress is wiped and the student restarts from the
        // first question, on whatever time is left.
        self.answers = vec![None; self.questions.len()];
        self.current = 0;
        Ok(None)
    }

    fn select_answer(
        &mut self,
        index: usize,
        option: String,
    ) -> Result<Option<SessionOutcome>, SessionError> {
        self.require_interactive()?;

        let total = self.questions.len();
        let question = self
            .questions
            .get(index)
            .ok_or(SessionError::QuestionOutOfRange { index, total })?;
        if !question.options.contains(&option) {
            return Err(SessionError::UnknownOption { index, option });
        }

        self.answers[index] = Some(option);
        Ok(None)
    }

    fn navigate(&mut self, direction: NavDirection) -> Result<Option<SessionOutcome>, SessionError> {
        self.require_interactive()?;

        // Clamped at both ends; no wraparound.
        match direction {
            NavDirection::Previous => {
                self.current = self.current.saturating_sub(1);
            }
            NavDirection::Next => {
                if self.current + 1 < self.questions.len() {
                    self.current += 1;
                }
            }
        }
        Ok(None)
    }

    fn tick(&mut self) -> Result<Option<SessionOutcome>, SessionError> {
        if self.state != SessionState::InProgress {
            return Ok(None);
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            log::info!(
                "test {} timed out for student {}: auto-submitting",
                self.test_id,
                self.student_id
            );
            return Ok(Some(self.finalize(false)));
        }
        Ok(None)
    }

    fn submit(&mut self) -> Result<Option<SessionOutcome>, SessionError> {
        match self.state {
            SessionState::InProgress => Ok(Some(self.finalize(false))),
            SessionState::AwaitingFullscreen => Err(SessionError::SecureModeRequired),
            // A resend after the session finished is harmless.
            _ => Ok(None),
        }
    }

    fn require_interactive(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::InProgress if self.secure => Ok(()),
            SessionState::InProgress | SessionState::AwaitingFullscreen => {
                Err(SessionError::SecureModeRequired)
            }
            _ => Err(SessionError::Finished),
        }
    }

    fn finalize(&mut self, disqualified: bool) -> SessionOutcome {
        self.state = if disqualified {
            SessionState::Disqualified
        } else {
            SessionState::Submitted
        };
        self.secure = false;

        let score = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(question, answer)| answer.as_deref() == Some(&question.correct_option))
            .count() as u32;

        SessionOutcome {
            test_id: self.test_id,
            student_id: self.student_id,
            answers: self.answers.clone(),
            score,
            total_questions: self.questions.len() as u32,
            violations: self.violations,
            disqualified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, correct: &str) -> SessionQuestion {
        SessionQuestion {
            question_text: text.to_owned(),
            options: vec![
                "Option A".to_owned(),
                "Option B".to_owned(),
                "Option C".to_owned(),
                "Option D".to_owned(),
            ],
            correct_option: correct.to_owned(),
        }
    }

    fn session(questions: usize) -> ProctorSession {
        let questions = (0..questions)
            .map(|i| question(&format!("Question {}", i + 1), "Option A"))
            .collect();
        ProctorSession::new(10, 20, questions, 10)
    }

    fn started(questions: usize) -> ProctorSession {
        let mut s = session(questions);
        s.apply(SessionEvent::EnterSecureMode).unwrap();
        s
    }

    fn select(s: &mut ProctorSession, index: usize, option: &str) {
        s.apply(SessionEvent::SelectAnswer {
            question_index: index,
            option: option.to_owned(),
        })
        .unwrap();
    }

    #[test]
    fn interaction_requires_secure_mode() {
        let mut s = session(3);
        assert_eq!(s.state(), SessionState::AwaitingFullscreen);

        let err = s
            .apply(SessionEvent::SelectAnswer {
                question_index: 0,
                option: "Option A".to_owned(),
            })
            .unwrap_err();
        assert_eq!(err, SessionError::SecureModeRequired);

        let err = s.apply(SessionEvent::Navigate(NavDirection::Next)).unwrap_err();
        assert_eq!(err, SessionError::SecureModeRequired);

        assert_eq!(s.apply(SessionEvent::Submit).unwrap_err(), SessionError::SecureModeRequired);
    }

    #[test]
    fn timer_does_not_run_before_secure_mode() {
        let mut s = session(3);
        for _ in 0..100 {
            assert_eq!(s.apply(SessionEvent::Tick).unwrap(), None);
        }
        assert_eq!(s.remaining_seconds(), 600);

        s.apply(SessionEvent::EnterSecureMode).unwrap();
        s.apply(SessionEvent::Tick).unwrap();
        assert_eq!(s.remaining_seconds(), 599);
    }

    #[test]
    fn absurd_durations_saturate_instead_of_overflowing() {
        let s = ProctorSession::new(10, 20, Vec::new(), u32::MAX);
        assert_eq!(s.remaining_seconds(), u32::MAX);
    }

    #[test]
    fn focus_loss_before_secure_mode_is_not_a_violation() {
        let mut s = session(3);
        assert_eq!(s.apply(SessionEvent::FocusLost).unwrap(), None);
        assert_eq!(s.violations(), 0);
    }

    #[test]
    fn answers_overwrite_and_navigation_clamps() {
        let mut s = started(3);

        select(&mut s, 0, "Option B");
        select(&mut s, 0, "Option A");
        assert_eq!(s.answers()[0].as_deref(), Some("Option A"));

        // Previous at the first question stays put.
        s.apply(SessionEvent::Navigate(NavDirection::Previous)).unwrap();
        assert_eq!(s.current_index(), 0);

        s.apply(SessionEvent::Navigate(NavDirection::Next)).unwrap();
        s.apply(SessionEvent::Navigate(NavDirection::Next)).unwrap();
        s.apply(SessionEvent::Navigate(NavDirection::Next)).unwrap();
        assert_eq!(s.current_index(), 2);
    }

    #[test]
    fn select_answer_validates_index_and_option() {
        let mut s = started(2);

        let err = s
            .apply(SessionEvent::SelectAnswer {
                question_index: 5,
                option: "Option A".to_owned(),
            })
            .unwrap_err();
        assert_eq!(err, SessionError::QuestionOutOfRange { index: 5, total: 2 });

        let err = s
            .apply(SessionEvent::SelectAnswer {
                question_index: 1,
                option: "Option Z".to_owned(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::UnknownOption {
                index: 1,
                option: "Option Z".to_owned()
            }
        );
        assert_eq!(s.answers()[1], None);
    }

    #[test]
    fn violation_clears_answers_but_not_the_clock() {
        let mut s = started(3);
        select(&mut s, 0, "Option A");
        s.apply(SessionEvent::Navigate(NavDirection::Next)).unwrap();
        select(&mut s, 1, "Option C");
        s.apply(SessionEvent::Tick).unwrap();
        s.apply(SessionEvent::Tick).unwrap();

        assert_eq!(s.apply(SessionEvent::FocusLost).unwrap(), None);

        assert_eq!(s.violations(), 1);
        assert_eq!(s.answers(), &[None, None, None]);
        assert_eq!(s.current_index(), 0);
        // The penalty restarts progress on the remaining time, not a fresh clock.
        assert_eq!(s.remaining_seconds(), 598);
        assert_eq!(s.state(), SessionState::InProgress);
    }

    #[test]
    fn overlapping_focus_signals_count_once() {
        let mut s = started(3);

        // Fullscreen exit, then the blur the browser fires right after it.
        s.apply(SessionEvent::FocusLost).unwrap();
        s.apply(SessionEvent::FocusLost).unwrap();
        s.apply(SessionEvent::FocusLost).unwrap();
        assert_eq!(s.violations(), 1);

        // Interaction stays blocked until secure mode is re-entered.
        let err = s
            .apply(SessionEvent::SelectAnswer {
                question_index: 0,
                option: "Option A".to_owned(),
            })
            .unwrap_err();
        assert_eq!(err, SessionError::SecureModeRequired);

        // A fresh episode counts again.
        s.apply(SessionEvent::EnterSecureMode).unwrap();
        s.apply(SessionEvent::FocusLost).unwrap();
        assert_eq!(s.violations(), 2);
    }

    #[test]
    fn third_violation_disqualifies_and_keeps_answers() {
        let mut s = started(3);

        for _ in 0..2 {
            s.apply(SessionEvent::FocusLost).unwrap();
            s.apply(SessionEvent::EnterSecureMode).unwrap();
        }
        select(&mut s, 0, "Option A");

        let outcome = s.apply(SessionEvent::FocusLost).unwrap().expect("terminal outcome");
        assert_eq!(s.state(), SessionState::Disqualified);
        assert!(outcome.disqualified);
        assert_eq!(outcome.violations, 3);
        // The final violation does not wipe anything; the answers at the
        // moment of disqualification are what gets recorded.
        assert_eq!(outcome.answers[0].as_deref(), Some("Option A"));
        assert_eq!(outcome.score, 1);
    }

    #[test]
    fn timer_expiry_submits_current_answers() {
        let questions = vec![question("Q1", "Option A"), question("Q2", "Option B")];
        let mut s = ProctorSession::new(10, 20, questions, 1);
        s.apply(SessionEvent::EnterSecureMode).unwrap();
        select(&mut s, 0, "Option A");

        let mut outcome = None;
        for _ in 0..60 {
            outcome = s.apply(SessionEvent::Tick).unwrap();
        }
        let outcome = outcome.expect("outcome on the 60th tick");

        assert_eq!(s.state(), SessionState::Submitted);
        assert!(!outcome.disqualified);
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.answers, vec![Some("Option A".to_owned()), None]);
    }

    #[test]
    fn scoring_is_strict_equality_and_unanswered_never_matches() {
        let questions = vec![
            question("Q1", "Option A"),
            question("Q2", "Option C"),
            question("Q3", "Option B"),
            question("Q4", "Option D"),
        ];
        let mut s = ProctorSession::new(10, 20, questions, 10);
        s.apply(SessionEvent::EnterSecureMode).unwrap();
        select(&mut s, 0, "Option A"); // correct
        select(&mut s, 1, "Option B"); // wrong
        // Q3 left unanswered.
        select(&mut s, 3, "Option D"); // correct

        let outcome = s.apply(SessionEvent::Submit).unwrap().expect("outcome");
        assert_eq!(outcome.score, 2);
        assert_eq!(outcome.total_questions, 4);
    }

    #[test]
    fn terminal_state_rejects_interaction_and_ignores_noise() {
        let mut s = started(2);
        let first = s.apply(SessionEvent::Submit).unwrap();
        assert!(first.is_some());

        // The outcome is produced exactly once.
        assert_eq!(s.apply(SessionEvent::Submit).unwrap(), None);
        assert_eq!(s.apply(SessionEvent::Tick).unwrap(), None);
        assert_eq!(s.apply(SessionEvent::FocusLost).unwrap(), None);

        let err = s.apply(SessionEvent::Navigate(NavDirection::Next)).unwrap_err();
        assert_eq!(err, SessionError::Finished);
        let err = s.apply(SessionEvent::EnterSecureMode).unwrap_err();
        assert_eq!(err, SessionError::Finished);
    }
}
