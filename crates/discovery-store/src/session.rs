use std::sync::Arc;

use discovery_core::{
    Catalog, ConfirmRequest, Confirmation, Edit, FormState, GateRejection, Level, OutboundLink,
    Presenter, ProgressResult, ProgressTracker, SummaryGenerator, Timestamp, time_ago,
};

use crate::answers::AnswerStore;
use crate::config::DiscoveryConfig;
use crate::error::Result;
use crate::store::Storage;

pub const SUMMARY_TITLE: &str = "Answer summary";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Not enough answers; the user was warned and can keep editing.
    Rejected(GateRejection),
    /// The user backed out of the confirmation.
    Cancelled,
    /// The user confirmed. Opening `link` is the caller's job.
    Accepted { summary: String, link: String },
}

/// One user's pass over the questionnaire: the live form plus the store it
/// is saved to.
///
/// The form and the stored snapshot are separate. They only meet on
/// [`DiscoverySession::open`] (store → form) and on every save
/// (form → store).
pub struct DiscoverySession<S: Storage> {
    store: AnswerStore<S>,
    form: FormState,
    tracker: ProgressTracker,
    summary: SummaryGenerator,
    link: OutboundLink,
    dirty: bool,
}

impl<S: Storage> DiscoverySession<S> {
    pub fn open(
        storage: S,
        catalog: Arc<Catalog>,
        config: &DiscoveryConfig,
        presenter: &mut dyn Presenter,
    ) -> Result<Self> {
        Self::open_at(storage, catalog, config, presenter, Timestamp::now())
    }

    /// Load saved answers into a fresh form. `now` is only used to phrase
    /// the "saved … ago" notice.
    pub fn open_at(
        storage: S,
        catalog: Arc<Catalog>,
        config: &DiscoveryConfig,
        presenter: &mut dyn Presenter,
        now: Timestamp,
    ) -> Result<Self> {
        let store = AnswerStore::new(storage);

        let form = match store.load()? {
            Some(snapshot) => {
                let form = FormState::rehydrate(catalog, &snapshot);
                if let Some(saved_at) = store.last_saved_at()? {
                    presenter.notify(
                        &format!("Answers loaded (saved {})", time_ago(saved_at, now)),
                        Level::Info,
                    );
                }
                form
            }
            None => FormState::new(catalog),
        };

        Ok(Self {
            store,
            form,
            tracker: ProgressTracker::new(config.gate()),
            summary: SummaryGenerator::default(),
            link: config.outbound_link(),
            dirty: false,
        })
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn store(&self) -> &AnswerStore<S> {
        &self.store
    }

    /// Unsaved edits since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Change the live form. Nothing is persisted until [`Self::save`].
    pub fn apply(&mut self, edit: Edit) -> Result<ProgressResult> {
        self.form.apply(edit)?;
        self.dirty = true;
        Ok(self.progress())
    }

    pub fn progress(&self) -> ProgressResult {
        self.tracker.recompute(&self.form)
    }

    pub fn save(&mut self) -> Result<Timestamp> {
        let saved_at = self.store.save(&self.form)?;
        self.dirty = false;
        Ok(saved_at)
    }

    pub fn save_draft(&mut self, presenter: &mut dyn Presenter) -> Result<Timestamp> {
        let saved_at = self.save()?;
        presenter.notify("Draft saved", Level::Success);
        Ok(saved_at)
    }

    /// Gate, summarise and ask for confirmation.
    pub fn submit(&mut self, presenter: &mut dyn Presenter) -> Result<SubmitOutcome> {
        let progress = match self.tracker.check_submission(&self.form) {
            Ok(progress) => progress,
            Err(rejection) => {
                presenter.notify(&rejection.to_string(), Level::Warning);
                return Ok(SubmitOutcome::Rejected(rejection));
            }
        };

        self.save()?;

        let summary = self
            .summary
            .build(&self.form.snapshot(), progress.total_questions);
        let link = self.link.build(&summary);
        let request = ConfirmRequest {
            title: SUMMARY_TITLE.to_string(),
            body: summary.clone(),
            link: link.clone(),
        };

        match presenter.confirm(&request) {
            Confirmation::Accepted => {
                tracing::info!("discovery submitted with {} answers", progress.answered_count);
                Ok(SubmitOutcome::Accepted { summary, link })
            }
            Confirmation::Cancelled => Ok(SubmitOutcome::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use discovery_core::RecordingPresenter;

    use super::*;
    use crate::store::{MemoryStorage, SqliteStorage};

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::aro_discovery())
    }

    fn open(
        storage: MemoryStorage,
        presenter: &mut RecordingPresenter,
    ) -> DiscoverySession<MemoryStorage> {
        DiscoverySession::open(storage, catalog(), &DiscoveryConfig::default(), presenter).unwrap()
    }

    /// Answer the first `n` choice questions with their first option.
    fn answer_choices(session: &mut DiscoverySession<impl Storage>, n: usize) {
        let edits: Vec<Edit> = session
            .form()
            .catalog()
            .questions()
            .filter(|q| q.kind.is_choice())
            .take(n)
            .map(|q| Edit::Select {
                question: q.id,
                values: vec![q.options[0].clone()],
            })
            .collect();
        for edit in edits {
            session.apply(edit).unwrap();
        }
    }

    #[test]
    fn test_fresh_session_is_silent() {
        let mut presenter = RecordingPresenter::default();
        let session = open(MemoryStorage::new(), &mut presenter);
        assert!(presenter.notifications.is_empty());
        assert_eq!(session.progress().answered_count, 0);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_apply_marks_dirty_until_saved() {
        let mut presenter = RecordingPresenter::default();
        let mut session = open(MemoryStorage::new(), &mut presenter);

        let progress = session
            .apply(Edit::Text {
                question: 5,
                text: "hello".into(),
            })
            .unwrap();
        assert_eq!(progress.answered_count, 1);
        assert!(session.is_dirty());
        assert!(session.store().load().unwrap().is_none());

        session.save().unwrap();
        assert!(!session.is_dirty());
        assert_eq!(session.store().load().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_edit_leaves_form_clean() {
        let mut presenter = RecordingPresenter::default();
        let mut session = open(MemoryStorage::new(), &mut presenter);
        assert!(
            session
                .apply(Edit::Select {
                    question: 1,
                    values: vec!["nope".into()],
                })
                .is_err()
        );
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_reopen_rehydrates_and_notifies() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("answers.db");
        let config = DiscoveryConfig::default();
        let mut presenter = RecordingPresenter::default();

        let saved_at = {
            let storage = SqliteStorage::open(&path, &config.origin).unwrap();
            let mut session =
                DiscoverySession::open(storage, catalog(), &config, &mut presenter).unwrap();
            answer_choices(&mut session, 3);
            session.save().unwrap()
        };

        let storage = SqliteStorage::open(&path, &config.origin).unwrap();
        let later = Timestamp::from_unix_millis(saved_at.unix_millis() + 5 * 60 * 1000);
        let session =
            DiscoverySession::open_at(storage, catalog(), &config, &mut presenter, later).unwrap();

        assert_eq!(session.progress().answered_count, 3);
        assert_eq!(
            presenter.last_notification(),
            Some(&(Level::Info, "Answers loaded (saved 5 minutes ago)".to_string()))
        );
    }

    #[test]
    fn test_corrupted_store_opens_blank() {
        let storage = MemoryStorage::new();
        storage
            .set_item(crate::answers::ANSWERS_KEY, "}}garbage")
            .unwrap();
        let mut presenter = RecordingPresenter::default();
        let session = open(storage, &mut presenter);

        assert_eq!(session.progress().answered_count, 0);
        assert!(presenter.notifications.is_empty());
    }

    #[test]
    fn test_save_draft_notifies() {
        let mut presenter = RecordingPresenter::default();
        let mut session = open(MemoryStorage::new(), &mut presenter);
        session.save_draft(&mut presenter).unwrap();
        assert_eq!(
            presenter.last_notification(),
            Some(&(Level::Success, "Draft saved".to_string()))
        );
    }

    #[test]
    fn test_submit_below_threshold_warns() {
        let mut presenter = RecordingPresenter::new(Confirmation::Accepted);
        let mut session = open(MemoryStorage::new(), &mut presenter);
        answer_choices(&mut session, 11);

        let outcome = session.submit(&mut presenter).unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected(GateRejection {
                answered: 11,
                required: 12
            })
        );
        assert_eq!(
            presenter.last_notification(),
            Some(&(
                Level::Warning,
                "Please answer at least 12 questions before submitting".to_string()
            ))
        );
        assert!(presenter.confirmations.is_empty());
        // Still editable.
        assert!(session.apply(Edit::Clear { question: 1 }).is_ok());
    }

    #[test]
    fn test_submit_accepted_returns_link() {
        let mut presenter = RecordingPresenter::new(Confirmation::Accepted);
        let mut session = open(MemoryStorage::new(), &mut presenter);
        answer_choices(&mut session, 12);

        let SubmitOutcome::Accepted { summary, link } = session.submit(&mut presenter).unwrap()
        else {
            panic!("expected acceptance");
        };

        assert!(summary.contains("• Client type: Mostly residential clients"));
        assert!(summary.ends_with("12/24 questions answered"));
        assert!(link.starts_with("https://wa.me/34614362100?text="));

        let request = &presenter.confirmations[0];
        assert_eq!(request.title, SUMMARY_TITLE);
        assert_eq!(request.body, summary);
        assert_eq!(request.link, link);

        // Submitting persists what was sent.
        assert!(!session.is_dirty());
        assert_eq!(session.store().load().unwrap().unwrap().len(), 12);
    }

    #[test]
    fn test_submit_cancelled() {
        let mut presenter = RecordingPresenter::new(Confirmation::Cancelled);
        let mut session = open(MemoryStorage::new(), &mut presenter);
        answer_choices(&mut session, 20);

        assert_eq!(
            session.submit(&mut presenter).unwrap(),
            SubmitOutcome::Cancelled
        );
        assert_eq!(presenter.confirmations.len(), 1);
    }

    #[test]
    fn test_configured_threshold_and_recipient() {
        let config = DiscoveryConfig::from_toml_str(
            "min_answered_ratio = 0.25\n[messaging]\nrecipient = \"3499\"\n",
        )
        .unwrap();
        let mut presenter = RecordingPresenter::new(Confirmation::Accepted);
        let mut session =
            DiscoverySession::open(MemoryStorage::new(), catalog(), &config, &mut presenter)
                .unwrap();
        answer_choices(&mut session, 6);

        let SubmitOutcome::Accepted { link, .. } = session.submit(&mut presenter).unwrap() else {
            panic!("expected acceptance");
        };
        assert!(link.starts_with("https://wa.me/3499?text="));
    }
}
