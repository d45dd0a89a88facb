use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use storage::repository::{
    ProgressRepository, SessionSummaryRepository, StorageError, UserSettingsRepository,
    WordCatalog,
};
use vocab_core::Difficulty;
use vocab_core::model::{SessionSummary, UserId, Word, WordProgress};

use super::machine::{BatchSegment, SessionEvent, SessionPhase, SessionState};
use super::selector::ReviewSelector;
use crate::Clock;
use crate::error::SessionError;
use crate::presentation::{PresentationChannel, SessionReport, WordPrompt};
use crate::review_service::ReviewService;
use crate::settings_service::SettingsService;

/// Word currently on screen, with the progress its rating will build on.
#[derive(Debug, Clone, PartialEq)]
struct PresentedEntry {
    word: Word,
    /// `None` for a word the user has never seen.
    base: Option<WordProgress>,
}

/// One interactive review pass for one user.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    user_id: UserId,
    state: SessionState,
    presented: Option<PresentedEntry>,
    /// Record computed at rating time, written by `commit_pending`.
    pending: Option<WordProgress>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    summary_id: Option<i64>,
    reported: bool,
}

impl ReviewSession {
    fn new(user_id: UserId, state: SessionState, started_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            state,
            presented: None,
            pending: None,
            started_at,
            completed_at: None,
            summary_id: None,
            reported: false,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// The word being shown, once it has been resolved.
    #[must_use]
    pub fn current_word(&self) -> Option<&Word> {
        self.presented.as_ref().map(|entry| &entry.word)
    }

    /// Progress record waiting to be committed after a failed write.
    #[must_use]
    pub fn pending(&self) -> Option<&WordProgress> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn summary_id(&self) -> Option<i64> {
        self.summary_id
    }

    #[must_use]
    pub fn report(&self) -> SessionReport {
        SessionReport::from_counters(self.state.counters())
    }

    fn build_summary(&self, completed_at: DateTime<Utc>) -> Result<SessionSummary, SessionError> {
        Ok(SessionSummary::from_counters(
            self.user_id,
            self.started_at,
            completed_at,
            &self.state.counters(),
        )?)
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitResult {
    pub progress: WordProgress,
    pub is_complete: bool,
    pub summary_id: Option<i64>,
    /// The write landed but showing the next word (or wrapping up) failed;
    /// call [`SessionLoopService::resume`] or just answer the next word.
    pub needs_resume: bool,
}

/// Drives review sessions: selection, presentation, rating and commits.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    words: Arc<dyn WordCatalog>,
    progress: Arc<dyn ProgressRepository>,
    summaries: Arc<dyn SessionSummaryRepository>,
    settings: SettingsService,
    channel: Arc<dyn PresentationChannel>,
    shuffle_new: bool,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        words: Arc<dyn WordCatalog>,
        progress: Arc<dyn ProgressRepository>,
        summaries: Arc<dyn SessionSummaryRepository>,
        settings: Arc<dyn UserSettingsRepository>,
        channel: Arc<dyn PresentationChannel>,
    ) -> Self {
        Self {
            clock,
            words,
            progress,
            summaries,
            settings: SettingsService::new(settings),
            channel,
            shuffle_new: false,
        }
    }

    #[must_use]
    pub fn with_shuffle_new(mut self, shuffle_new: bool) -> Self {
        self.shuffle_new = shuffle_new;
        self
    }

    /// Daily limit applied to users without stored settings.
    #[must_use]
    pub fn with_default_daily_limit(mut self, limit: u32) -> Self {
        self.settings = self.settings.with_default_daily_limit(limit);
        self
    }

    /// Start a session sized by the user's daily word limit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for storage or presentation failures.
    pub async fn start_session(&self, user_id: UserId) -> Result<ReviewSession, SessionError> {
        let settings = self.settings.settings(user_id).await?;
        self.start_session_with_capacity(user_id, settings.daily_word_limit())
            .await
    }

    /// Start a session of at most `capacity` words and present the first one.
    ///
    /// An empty selection completes the session immediately and reports zero
    /// counters.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for storage or presentation failures.
    pub async fn start_session_with_capacity(
        &self,
        user_id: UserId,
        capacity: u32,
    ) -> Result<ReviewSession, SessionError> {
        let selection = ReviewSelector::new(Arc::clone(&self.progress))
            .with_shuffle_new(self.shuffle_new)
            .select_batch(user_id, capacity, self.clock.today())
            .await?;

        let state = SessionState::start(selection.batch());
        info!(
            user_id = %user_id,
            due = state.batch().review_len(),
            new = state.batch().new_len(),
            "session started"
        );

        let mut session = ReviewSession::new(user_id, state, self.clock.now());
        self.present_current(&mut session).await?;
        Ok(session)
    }

    /// Record the learner's "know / don't know" answer and reveal the word.
    ///
    /// If the word at the cursor was never resolved, it is resolved and shown
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnexpectedSignal` unless a word is being presented.
    pub async fn answer_knowledge(
        &self,
        session: &mut ReviewSession,
        knew_it: bool,
    ) -> Result<Word, SessionError> {
        if session.presented.is_none()
            && matches!(session.state.phase(), SessionPhase::Presenting { .. })
        {
            self.present_current(session).await?;
        }
        let next = session.state.apply(SessionEvent::Knowledge(knew_it))?;
        let word = session
            .presented
            .as_ref()
            .map(|entry| entry.word.clone())
            .ok_or(SessionError::UnexpectedSignal {
                signal: "knowledge",
                phase: session.state.phase().name(),
            })?;
        session.state = next;
        Ok(word)
    }

    /// Rate the revealed word and commit its new progress.
    ///
    /// On a store failure the session stays in the rating step with the
    /// computed record; call [`SessionLoopService::commit_pending`] to retry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnexpectedSignal` unless a word was revealed,
    /// `SessionError::CommitFailed` if the write fails.
    pub async fn rate_difficulty(
        &self,
        session: &mut ReviewSession,
        difficulty: Difficulty,
    ) -> Result<CommitResult, SessionError> {
        let next = session.state.apply(SessionEvent::Difficulty(difficulty))?;
        let SessionPhase::Rating { outcome, .. } = next.phase() else {
            return Err(SessionError::UnexpectedSignal {
                signal: "difficulty",
                phase: session.state.phase().name(),
            });
        };
        let base = session
            .presented
            .as_ref()
            .and_then(|entry| entry.base.as_ref());

        let record = ReviewService::new()
            .with_clock(self.clock)
            .next_progress(session.user_id, base, &outcome)?;

        session.state = next;
        session.pending = Some(record);
        self.commit_pending(session).await
    }

    /// Same as [`SessionLoopService::rate_difficulty`] for a raw label such as
    /// `"easy"`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Leitner` for an unknown label; the session is
    /// unchanged.
    pub async fn rate_difficulty_label(
        &self,
        session: &mut ReviewSession,
        label: &str,
    ) -> Result<CommitResult, SessionError> {
        let difficulty: Difficulty = label.parse()?;
        self.rate_difficulty(session, difficulty).await
    }

    /// Write the record computed at rating time, then move to the next word.
    ///
    /// Retrying writes the identical record, so a commit that did land before
    /// the failure was reported is not applied twice. Once the write lands the
    /// result is `Ok` even if the next word cannot be shown; see
    /// [`CommitResult::needs_resume`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CommitFailed` if the write fails again, or
    /// `SessionError::UnexpectedSignal` if nothing is pending.
    pub async fn commit_pending(
        &self,
        session: &mut ReviewSession,
    ) -> Result<CommitResult, SessionError> {
        let Some(record) = session.pending.clone() else {
            return Err(SessionError::UnexpectedSignal {
                signal: "commit",
                phase: session.state.phase().name(),
            });
        };
        let next = session.state.apply(SessionEvent::Committed)?;

        if let Err(source) = self.progress.upsert_progress(&record).await {
            warn!(
                user_id = %session.user_id,
                word_id = %record.word_id(),
                error = %source,
                "progress commit failed"
            );
            return Err(SessionError::CommitFailed {
                word_id: record.word_id(),
                source,
            });
        }
        debug!(
            user_id = %session.user_id,
            word_id = %record.word_id(),
            leitner_box = record.leitner_box().value(),
            due = %record.due_date(),
            "progress committed"
        );

        session.state = next;
        session.pending = None;
        session.presented = None;
        let needs_resume = match self.present_current(session).await {
            Ok(()) => false,
            Err(err) => {
                warn!(
                    user_id = %session.user_id,
                    phase = session.state.phase().name(),
                    error = %err,
                    "advance after commit failed"
                );
                true
            }
        };

        Ok(CommitResult {
            progress: record,
            is_complete: session.is_complete(),
            summary_id: session.summary_id,
            needs_resume,
        })
    }

    /// Redo the step that failed after a commit or a start: show the word at
    /// the cursor again, or finish wrapping up a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnexpectedSignal` once the learner has answered
    /// the current word, or the failure of the redone step.
    pub async fn resume(&self, session: &mut ReviewSession) -> Result<(), SessionError> {
        match session.state.phase() {
            SessionPhase::Presenting { .. } => {
                session.presented = None;
                self.present_current(session).await
            }
            SessionPhase::Completed => self.finish(session).await,
            phase => Err(SessionError::UnexpectedSignal {
                signal: "resume",
                phase: phase.name(),
            }),
        }
    }

    /// Abandon the session, keeping every commit made so far.
    ///
    /// A rating that was computed but never stored is dropped. Stopping a
    /// completed session only retries a wrap-up that failed earlier.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the summary cannot be stored or reported.
    pub async fn stop(&self, session: &mut ReviewSession) -> Result<SessionReport, SessionError> {
        if session.is_complete() {
            self.finish(session).await?;
            return Ok(session.report());
        }
        session.state = session.state.apply(SessionEvent::Stop)?;
        session.pending = None;
        session.presented = None;
        info!(user_id = %session.user_id, "session stopped");
        self.finish(session).await?;
        Ok(session.report())
    }

    /// Persist and report a completed session whose wrap-up failed earlier.
    ///
    /// Returns the summary id, or `None` for a session with an empty batch.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnexpectedSignal` if the session is still running,
    /// `SessionError::Storage` if the summary cannot be stored.
    pub async fn finalize_summary(
        &self,
        session: &mut ReviewSession,
    ) -> Result<Option<i64>, SessionError> {
        if !session.is_complete() {
            return Err(SessionError::UnexpectedSignal {
                signal: "finalize",
                phase: session.state.phase().name(),
            });
        }
        self.finish(session).await?;
        Ok(session.summary_id)
    }

    /// Resolve and show the word at the cursor, skipping entries that no longer
    /// resolve. Wraps up the session once the batch is exhausted.
    async fn present_current(&self, session: &mut ReviewSession) -> Result<(), SessionError> {
        loop {
            let SessionPhase::Presenting { index } = session.state.phase() else {
                if session.is_complete() {
                    self.finish(session).await?;
                }
                return Ok(());
            };

            match self.resolve_entry(session, index).await? {
                Some(entry) => {
                    let batch = session.state.batch();
                    let prompt = WordPrompt {
                        word_id: entry.word.id,
                        text: entry.word.text.clone(),
                        position: index + 1,
                        total: batch.len(),
                        is_new: batch.segment(index) == BatchSegment::New,
                    };
                    session.presented = Some(entry);
                    self.channel
                        .present_word(session.user_id, &prompt)
                        .await
                        .map_err(SessionError::Presentation)?;
                    return Ok(());
                }
                None => {
                    session.state = session.state.apply(SessionEvent::Skip)?;
                }
            }
        }
    }

    async fn resolve_entry(
        &self,
        session: &ReviewSession,
        index: usize,
    ) -> Result<Option<PresentedEntry>, StorageError> {
        let batch = session.state.batch();
        let Some(word_id) = batch.get(index) else {
            return Ok(None);
        };

        let word = match self.words.get_word(word_id).await? {
            Some(word) => word,
            None => {
                warn!(user_id = %session.user_id, word_id = %word_id, "word vanished, skipping");
                return Ok(None);
            }
        };

        let base = self.progress.get_progress(session.user_id, word_id).await?;
        if base.is_none() && batch.segment(index) == BatchSegment::Review {
            warn!(
                user_id = %session.user_id,
                word_id = %word_id,
                "progress vanished, skipping"
            );
            return Ok(None);
        }

        Ok(Some(PresentedEntry { word, base }))
    }

    async fn finish(&self, session: &mut ReviewSession) -> Result<(), SessionError> {
        let completed_at = *session.completed_at.get_or_insert_with(|| self.clock.now());

        if !session.state.batch().is_empty() && session.summary_id.is_none() {
            let summary = session.build_summary(completed_at)?;
            let summary_id = self.summaries.append_summary(&summary).await?;
            session.summary_id = Some(summary_id);
            debug!(user_id = %session.user_id, summary_id, "session summary stored");
        }

        if !session.reported {
            let report = session.report();
            self.channel
                .session_summary(session.user_id, &report)
                .await
                .map_err(SessionError::Presentation)?;
            session.reported = true;
            info!(
                user_id = %session.user_id,
                reviewed = report.counters.reviewed,
                correct = report.counters.correct,
                skipped = report.counters.skipped,
                accuracy = report.accuracy,
                "session completed"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use vocab_core::model::{WordDraft, WordId};
    use vocab_core::time::{fixed_clock, fixed_now};

    use crate::presentation::SilentChannel;

    fn service(repo: &InMemoryRepository) -> SessionLoopService {
        SessionLoopService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(SilentChannel),
        )
    }

    async fn seed(repo: &InMemoryRepository, texts: &[&str]) -> Vec<Word> {
        let mut out = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let at = fixed_now() + chrono::Duration::seconds(i64::try_from(i).unwrap());
            let draft = WordDraft::new(*text, format!("{text} def")).validate(at).unwrap();
            out.push(repo.add_word(&draft, None).await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn empty_catalog_completes_without_summary() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);

        let session = svc.start_session(UserId::new(1)).await.unwrap();
        assert!(session.is_complete());
        assert_eq!(session.summary_id(), None);
        assert_eq!(session.report().accuracy, 0.0);
    }

    #[tokio::test]
    async fn answer_reveals_the_presented_word() {
        let repo = InMemoryRepository::new();
        let words = seed(&repo, &["lucid"]).await;
        let svc = service(&repo);

        let mut session = svc.start_session(UserId::new(1)).await.unwrap();
        assert_eq!(session.current_word().map(|w| w.id), Some(words[0].id));

        let revealed = svc.answer_knowledge(&mut session, false).await.unwrap();
        assert_eq!(revealed.definition, "lucid def");
        assert!(matches!(
            session.phase(),
            SessionPhase::Revealed { index: 0, knew_it: false }
        ));
    }

    #[tokio::test]
    async fn unknown_label_leaves_session_revealed() {
        let repo = InMemoryRepository::new();
        seed(&repo, &["terse"]).await;
        let svc = service(&repo);

        let mut session = svc.start_session(UserId::new(1)).await.unwrap();
        svc.answer_knowledge(&mut session, true).await.unwrap();

        let err = svc
            .rate_difficulty_label(&mut session, "trivial")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Leitner(_)));
        assert!(matches!(session.phase(), SessionPhase::Revealed { .. }));

        let result = svc.rate_difficulty_label(&mut session, "Easy").await.unwrap();
        assert!(result.is_complete);
        // box 2 base 2 days * 1.5
        assert_eq!(
            result.progress.due_date(),
            vocab_core::time::fixed_today() + chrono::Duration::days(3)
        );
    }

    #[tokio::test]
    async fn missing_word_is_skipped() {
        let repo = InMemoryRepository::new();
        seed(&repo, &["kept"]).await;
        let user = UserId::new(1);
        // Progress for a word that is not in the catalog.
        repo.upsert_progress(&WordProgress::first_exposure(
            user,
            WordId::new(42),
            vocab_core::time::fixed_today(),
        ))
        .await
        .unwrap();
        let svc = service(&repo);

        let session = svc.start_session(user).await.unwrap();
        assert_eq!(session.state().batch().len(), 2);
        assert_eq!(session.state().counters().skipped, 1);
        assert_eq!(session.current_word().map(|w| w.text.as_str()), Some("kept"));
    }

    #[tokio::test]
    async fn commit_without_pending_is_rejected() {
        let repo = InMemoryRepository::new();
        seed(&repo, &["idle"]).await;
        let svc = service(&repo);

        let mut session = svc.start_session(UserId::new(1)).await.unwrap();
        assert!(matches!(
            svc.commit_pending(&mut session).await,
            Err(SessionError::UnexpectedSignal { signal: "commit", .. })
        ));
        assert!(matches!(
            svc.finalize_summary(&mut session).await,
            Err(SessionError::UnexpectedSignal { .. })
        ));
    }
}
