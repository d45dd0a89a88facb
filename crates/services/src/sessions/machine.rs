//! Pure transitions of a single review pass.
//!
//! `SessionState::apply` maps `(state, event)` to the next state without any
//! I/O. Store access and presentation live in the workflow driver.

use vocab_core::Difficulty;
use vocab_core::model::{ReviewOutcome, SessionCounters, WordId};

use crate::error::SessionError;

//
// ─── BATCH ─────────────────────────────────────────────────────────────────────
//

/// Which part of the batch an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSegment {
    Review,
    New,
}

/// Ordered word ids: the review segment followed by the new segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionBatch {
    entries: Vec<WordId>,
    review_len: usize,
}

impl SessionBatch {
    #[must_use]
    pub fn new(
        review: impl IntoIterator<Item = WordId>,
        new: impl IntoIterator<Item = WordId>,
    ) -> Self {
        let mut entries: Vec<WordId> = review.into_iter().collect();
        let review_len = entries.len();
        entries.extend(new);
        Self {
            entries,
            review_len,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn review_len(&self) -> usize {
        self.review_len
    }

    #[must_use]
    pub fn new_len(&self) -> usize {
        self.entries.len() - self.review_len
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<WordId> {
        self.entries.get(index).copied()
    }

    #[must_use]
    pub fn segment(&self, index: usize) -> BatchSegment {
        if index < self.review_len {
            BatchSegment::Review
        } else {
            BatchSegment::New
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[WordId] {
        &self.entries
    }
}

//
// ─── PHASES AND EVENTS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Word at `index` is shown without its definition.
    Presenting { index: usize },
    /// The learner answered; the definition is disclosed.
    Revealed { index: usize, knew_it: bool },
    /// Rated and waiting for the progress write to land.
    Rating { index: usize, outcome: ReviewOutcome },
    Completed,
}

impl SessionPhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Presenting { .. } => "presenting",
            SessionPhase::Revealed { .. } => "revealed",
            SessionPhase::Rating { .. } => "rating",
            SessionPhase::Completed => "completed",
        }
    }

    /// Batch index the phase refers to, if any.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match *self {
            SessionPhase::Presenting { index }
            | SessionPhase::Revealed { index, .. }
            | SessionPhase::Rating { index, .. } => Some(index),
            SessionPhase::Completed => None,
        }
    }
}

/// Inputs the machine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// "I know it" / "I don't know it".
    Knowledge(bool),
    Difficulty(Difficulty),
    /// The progress record for the rated word was stored.
    Committed,
    /// The current entry no longer resolves and is dropped.
    Skip,
    Stop,
}

impl SessionEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Knowledge(_) => "knowledge",
            SessionEvent::Difficulty(_) => "difficulty",
            SessionEvent::Committed => "commit",
            SessionEvent::Skip => "skip",
            SessionEvent::Stop => "stop",
        }
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Batch, cursor and counters: the entire state of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    batch: SessionBatch,
    cursor: usize,
    phase: SessionPhase,
    counters: SessionCounters,
}

impl SessionState {
    /// Enter the first word, or `Completed` straight away for an empty batch.
    #[must_use]
    pub fn start(batch: SessionBatch) -> Self {
        let phase = if batch.is_empty() {
            SessionPhase::Completed
        } else {
            SessionPhase::Presenting { index: 0 }
        };
        Self {
            batch,
            cursor: 0,
            phase,
            counters: SessionCounters::default(),
        }
    }

    #[must_use]
    pub fn batch(&self) -> &SessionBatch {
        &self.batch
    }

    /// Number of entries already processed; never decreases.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    /// Word id at the current index, if the session is not complete.
    #[must_use]
    pub fn current_word(&self) -> Option<WordId> {
        self.phase.index().and_then(|i| self.batch.get(i))
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.batch.len().saturating_sub(self.cursor)
    }

    /// Next state after `event`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnexpectedSignal` when the event does not fit the
    /// current phase; `self` is left untouched.
    pub fn apply(&self, event: SessionEvent) -> Result<Self, SessionError> {
        match (self.phase, event) {
            (SessionPhase::Completed, SessionEvent::Stop) => Ok(self.clone()),
            (_, SessionEvent::Stop) => Ok(Self {
                phase: SessionPhase::Completed,
                ..self.clone()
            }),
            (SessionPhase::Presenting { index }, SessionEvent::Knowledge(knew_it)) => Ok(Self {
                phase: SessionPhase::Revealed { index, knew_it },
                ..self.clone()
            }),
            (SessionPhase::Presenting { index }, SessionEvent::Skip) => {
                Ok(self.advance(index, self.counters.record_skip()))
            }
            (SessionPhase::Revealed { index, knew_it }, SessionEvent::Difficulty(difficulty)) => {
                let word_id = self.word_at(index, event)?;
                Ok(Self {
                    phase: SessionPhase::Rating {
                        index,
                        outcome: ReviewOutcome::new(word_id, knew_it, difficulty),
                    },
                    ..self.clone()
                })
            }
            (SessionPhase::Rating { index, outcome }, SessionEvent::Committed) => {
                let is_new = self.batch.segment(index) == BatchSegment::New;
                Ok(self.advance(index, self.counters.record(outcome.knew_it, is_new)))
            }
            (phase, event) => Err(SessionError::UnexpectedSignal {
                signal: event.name(),
                phase: phase.name(),
            }),
        }
    }

    fn word_at(&self, index: usize, event: SessionEvent) -> Result<WordId, SessionError> {
        self.batch.get(index).ok_or(SessionError::UnexpectedSignal {
            signal: event.name(),
            phase: self.phase.name(),
        })
    }

    fn advance(&self, index: usize, counters: SessionCounters) -> Self {
        let cursor = index + 1;
        let phase = if cursor < self.batch.len() {
            SessionPhase::Presenting { index: cursor }
        } else {
            SessionPhase::Completed
        };
        Self {
            batch: self.batch.clone(),
            cursor,
            phase,
            counters,
        }
    }
}
