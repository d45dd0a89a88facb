use serde::{Deserialize, Serialize};

use crate::leitner::Difficulty;
use crate::model::ids::WordId;

/// One rating of one word: the atomic input to the scheduling engine.
///
/// Ephemeral; the resulting `WordProgress` is what gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub word_id: WordId,
    pub knew_it: bool,
    pub difficulty: Difficulty,
}

impl ReviewOutcome {
    #[must_use]
    pub fn new(word_id: WordId, knew_it: bool, difficulty: Difficulty) -> Self {
        Self {
            word_id,
            knew_it,
            difficulty,
        }
    }
}
