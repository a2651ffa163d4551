use std::time::Duration;
use tokio::time::Instant;

/// Default delay between a single-choice selection and the automatic advance
pub const DEFAULT_AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(300);

/// An advance armed by a single-choice answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAdvance {
    pub question_id: String,
    pub step: usize,
    pub due: Instant,
}

/// Cancellable auto-advance timer
///
/// The timer holds at most one pending advance. It is a passive deadline: the
/// owner awaits [`AutoAdvance::expired`], so dropping the owner or calling
/// [`AutoAdvance::cancel`] discards the pending advance and nothing can fire
/// afterwards.
#[derive(Debug)]
pub struct AutoAdvance {
    delay: Duration,
    pending: Option<ScheduledAdvance>,
}

impl AutoAdvance {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the timer, replacing any pending advance
    pub fn schedule(&mut self, question_id: &str, step: usize) -> Instant {
        let due = Instant::now() + self.delay;
        if let Some(previous) = self.pending.replace(ScheduledAdvance {
            question_id: question_id.to_string(),
            step,
            due,
        }) {
            tracing::trace!("Replaced pending auto-advance for {}", previous.question_id);
        }
        due
    }

    pub fn cancel(&mut self) -> Option<ScheduledAdvance> {
        self.pending.take()
    }

    /// Cancel only if the pending advance was armed by `question_id`
    pub fn cancel_for(&mut self, question_id: &str) -> bool {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.question_id == question_id)
        {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<&ScheduledAdvance> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for the pending advance to come due and take it
    ///
    /// Returns `None` immediately when nothing is pending. Cancel safe: if the
    /// returned future is dropped before the deadline, the advance stays pending.
    pub async fn expired(&mut self) -> Option<ScheduledAdvance> {
        let due = self.pending.as_ref()?.due;
        tokio::time::sleep_until(due).await;
        self.pending.take()
    }
}

impl Default for AutoAdvance {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_ADVANCE_DELAY)
    }
}
