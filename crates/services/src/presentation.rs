use async_trait::async_trait;
use serde::Serialize;

use vocab_core::model::{SessionCounters, UserId, WordId};

/// Failure reported by a presentation channel, propagated to the caller as-is.
pub type ChannelError = Box<dyn std::error::Error + Send + Sync>;

/// A word shown without its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordPrompt {
    pub word_id: WordId,
    pub text: String,
    /// 1-based position in the batch.
    pub position: usize,
    pub total: usize,
    pub is_new: bool,
}

/// Final counters of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionReport {
    pub counters: SessionCounters,
    /// `correct / reviewed`, 0 when nothing was reviewed.
    pub accuracy: f64,
}

impl SessionReport {
    #[must_use]
    pub fn from_counters(counters: SessionCounters) -> Self {
        Self {
            counters,
            accuracy: counters.accuracy(),
        }
    }
}

/// Outbound side of the transport that talks to the learner.
///
/// The inbound knowledge and difficulty signals arrive as calls on
/// `SessionLoopService`.
#[async_trait]
pub trait PresentationChannel: Send + Sync {
    /// # Errors
    ///
    /// Returns `ChannelError` if the prompt could not be delivered.
    async fn present_word(&self, user_id: UserId, prompt: &WordPrompt) -> Result<(), ChannelError>;

    /// # Errors
    ///
    /// Returns `ChannelError` if the report could not be delivered.
    async fn session_summary(
        &self,
        user_id: UserId,
        report: &SessionReport,
    ) -> Result<(), ChannelError>;
}

/// Channel that drops every event; for callers that poll session state instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentChannel;

#[async_trait]
impl PresentationChannel for SilentChannel {
    async fn present_word(
        &self,
        _user_id: UserId,
        _prompt: &WordPrompt,
    ) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn session_summary(
        &self,
        _user_id: UserId,
        _report: &SessionReport,
    ) -> Result<(), ChannelError> {
        Ok(())
    }
}
