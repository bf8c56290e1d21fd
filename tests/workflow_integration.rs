//! End-to-end workflow tests: drive the engine through the full
//! conversation with mock collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tallybot::application::{tokens, Engine, Event, Reply};
use tallybot::domain::catalog::Catalog;
use tallybot::domain::foundation::UserId;
use tallybot::domain::session::Stage;
use tallybot::ports::{
    RecognitionError, StoreError, SubmissionRecord, SubmitAck, TallyStore, TextRecognizer,
};

// ─────────────────────────────────────────────────────────────────────────
// Mocks
// ─────────────────────────────────────────────────────────────────────────

struct MockRecognizer {
    result: Result<String, RecognitionError>,
}

impl MockRecognizer {
    fn returning(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
        }
    }

    fn failing() -> Self {
        Self {
            result: Err(RecognitionError::Transport("timeout".to_string())),
        }
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    async fn recognize(&self, _image_url: &str) -> Result<String, RecognitionError> {
        self.result.clone()
    }
}

struct MockStore {
    districts: Mutex<Vec<String>>,
    district_queries: AtomicUsize,
    submissions: Mutex<Vec<SubmissionRecord>>,
    submit_ok: bool,
    query_fails: bool,
}

impl MockStore {
    fn empty() -> Self {
        Self {
            districts: Mutex::new(Vec::new()),
            district_queries: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            submit_ok: true,
            query_fails: false,
        }
    }

    fn with_districts(districts: &[&str]) -> Self {
        let store = Self::empty();
        *store.districts.lock().unwrap() = districts.iter().map(|d| d.to_string()).collect();
        store
    }

    fn rejecting_submission() -> Self {
        Self {
            submit_ok: false,
            ..Self::empty()
        }
    }

    fn failing_queries() -> Self {
        Self {
            query_fails: true,
            ..Self::empty()
        }
    }

    fn queries(&self) -> usize {
        self.district_queries.load(Ordering::SeqCst)
    }

    fn submissions(&self) -> Vec<SubmissionRecord> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TallyStore for MockStore {
    async fn submitted_districts(&self) -> Result<Vec<String>, StoreError> {
        self.district_queries.fetch_add(1, Ordering::SeqCst);
        if self.query_fails {
            return Err(StoreError::Transport("connection refused".to_string()));
        }
        Ok(self.districts.lock().unwrap().clone())
    }

    async fn submit(&self, record: &SubmissionRecord) -> Result<SubmitAck, StoreError> {
        self.submissions.lock().unwrap().push(record.clone());
        Ok(SubmitAck {
            success: self.submit_ok,
            message: if self.submit_ok {
                None
            } else {
                Some("sheet rejected the row".to_string())
            },
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────

struct Harness {
    engine: Engine,
    store: Arc<MockStore>,
    user: UserId,
}

impl Harness {
    fn new(recognizer: MockRecognizer, store: MockStore) -> Self {
        let store = Arc::new(store);
        let engine = Engine::new(
            Arc::new(Catalog::default_catalog().clone()),
            Arc::new(recognizer),
            store.clone(),
        );
        Self {
            engine,
            store,
            user: UserId::new("user-1").unwrap(),
        }
    }

    fn text_flow(store: MockStore) -> Self {
        Self::new(MockRecognizer::returning(""), store)
    }

    async fn send(&self, event: Event) -> Reply {
        self.engine.dispatch(&self.user, "Jane Doe", event).await
    }

    async fn pick(&self, token: &str) -> Reply {
        self.send(Event::Select(token.to_string())).await
    }

    async fn text(&self, text: &str) -> Reply {
        self.send(Event::Text(text.to_string())).await
    }

    async fn stage(&self) -> Option<Stage> {
        self.engine
            .registry()
            .get(&self.user)
            .await
            .map(|s| s.stage())
    }

    /// Start and capture a tally via pasted text.
    async fn start_with_tally(&self) {
        self.send(Event::Start).await;
        self.pick(tokens::MODE_TEXT).await;
        self.text("Chakwera: 12,345\nMutharika 9000").await;
        assert_eq!(self.stage().await, Some(Stage::EditMenu));
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Capture
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_capture_parses_votes_and_opens_edit_menu() {
    let h = Harness::text_flow(MockStore::empty());

    let reply = h.send(Event::Start).await;
    assert!(reply.text.contains("Choose an input mode"));
    assert!(reply.menu.is_some());

    h.pick(tokens::MODE_TEXT).await;
    let reply = h.text("Chakwera: 12,345\nMutharika 9000\n???").await;

    assert!(reply.text.contains("Chakwera: 12345"));
    assert!(reply.text.contains("Mutharika: 9000"));
    let session = h.engine.registry().get(&h.user).await.unwrap();
    assert_eq!(session.tally().count("Chakwera"), Some(12345));
    assert_eq!(session.tally().len(), 2);
}

#[tokio::test]
async fn image_capture_tolerates_recognition_typos() {
    let h = Harness::new(
        MockRecognizer::returning("Chakweraa: 500"),
        MockStore::empty(),
    );
    h.send(Event::Start).await;
    h.pick(tokens::MODE_IMAGE).await;

    let reply = h
        .send(Event::Photo {
            url: "https://example.com/sheet.jpg".to_string(),
        })
        .await;

    assert!(reply.text.contains("Chakwera: 500"));
    assert_eq!(h.stage().await, Some(Stage::EditMenu));
}

#[tokio::test]
async fn empty_extraction_falls_back_to_manual_text_entry() {
    let h = Harness::new(
        MockRecognizer::returning("nothing useful here"),
        MockStore::empty(),
    );
    h.send(Event::Start).await;
    h.pick(tokens::MODE_IMAGE).await;

    let reply = h
        .send(Event::Photo {
            url: "https://example.com/sheet.jpg".to_string(),
        })
        .await;

    assert!(reply.text.contains("enter the votes manually"));
    assert_eq!(h.stage().await, Some(Stage::WaitForText));
}

#[tokio::test]
async fn recognition_failure_is_surfaced_and_tears_down() {
    let h = Harness::new(MockRecognizer::failing(), MockStore::empty());
    h.send(Event::Start).await;
    h.pick(tokens::MODE_IMAGE).await;

    let reply = h
        .send(Event::Photo {
            url: "https://example.com/sheet.jpg".to_string(),
        })
        .await;

    assert!(reply.text.contains("Could not read the image"));
    assert!(reply.text.contains("aborted"));
    assert!(!h.engine.registry().contains(&h.user).await);
}

#[tokio::test]
async fn unparseable_text_reprompts_without_advancing() {
    let h = Harness::text_flow(MockStore::empty());
    h.send(Event::Start).await;
    h.pick(tokens::MODE_TEXT).await;

    let reply = h.text("gibberish with no votes").await;

    assert!(reply.text.contains("try again"));
    assert_eq!(h.stage().await, Some(Stage::WaitForText));
}

// ─────────────────────────────────────────────────────────────────────────
// Curation
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bulk_edit_merges_exact_names_only() {
    let h = Harness::text_flow(MockStore::empty());
    h.start_with_tally().await;

    h.pick(tokens::BULK_EDIT).await;
    let reply = h.text("Banda: 10\nBadline\nDube:20").await;

    assert!(reply.text.contains("Updated votes"));
    let session = h.engine.registry().get(&h.user).await.unwrap();
    assert_eq!(session.tally().count("Banda"), Some(10));
    assert_eq!(session.tally().count("Dube"), Some(20));
    // Prior entries survive the merge.
    assert_eq!(session.tally().count("Chakwera"), Some(12345));
    // No fuzzy matching: "Badline" contributed nothing.
    assert!(!session.tally().contains("Badline"));
}

#[tokio::test]
async fn edit_individual_is_a_two_phase_exchange() {
    let h = Harness::text_flow(MockStore::empty());
    h.start_with_tally().await;

    h.pick(tokens::EDIT_INDIVIDUAL).await;
    let reply = h.pick("edit_Chakwera").await;
    assert!(reply.text.contains("new vote count for Chakwera"));

    // Non-integer input re-prompts and keeps the edit target.
    let reply = h.text("lots").await;
    assert!(reply.text.contains("non-negative integer"));
    assert_eq!(h.stage().await, Some(Stage::AwaitCount));

    let reply = h.text("777").await;
    assert!(reply.text.contains("Updated Chakwera to 777"));
    let session = h.engine.registry().get(&h.user).await.unwrap();
    assert_eq!(session.tally().count("Chakwera"), Some(777));
    assert_eq!(session.edit_target(), None);
}

#[tokio::test]
async fn add_candidate_rejects_duplicates_and_starts_at_zero() {
    let h = Harness::text_flow(MockStore::empty());
    h.start_with_tally().await;

    h.pick(tokens::ADD_CANDIDATE).await;
    let reply = h.text("Chakwera").await;
    assert!(reply.text.contains("Invalid or existing"));
    assert_eq!(h.stage().await, Some(Stage::AddEntity));

    let reply = h.text("Phiri").await;
    assert!(reply.text.contains("Added candidate 'Phiri'"));
    let session = h.engine.registry().get(&h.user).await.unwrap();
    assert_eq!(session.tally().count("Phiri"), Some(0));
}

#[tokio::test]
async fn remove_candidate_deletes_and_reports_absence() {
    let h = Harness::text_flow(MockStore::empty());
    h.start_with_tally().await;

    h.pick(tokens::REMOVE_CANDIDATE).await;
    let reply = h.pick("remove_Chakwera").await;
    assert!(reply.text.contains("'Chakwera' removed"));
    let session = h.engine.registry().get(&h.user).await.unwrap();
    assert!(!session.tally().contains("Chakwera"));

    // A stale button for an already-removed candidate is reported.
    h.pick(tokens::REMOVE_CANDIDATE).await;
    let reply = h.pick("remove_Chakwera").await;
    assert!(reply.text.contains("not found"));
    assert_eq!(h.stage().await, Some(Stage::EditMenu));
}

// ─────────────────────────────────────────────────────────────────────────
// Invalid events & cancellation
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_events_leave_session_state_unchanged() {
    let h = Harness::text_flow(MockStore::empty());
    h.start_with_tally().await;

    let before = h.engine.registry().get(&h.user).await.unwrap().snapshot();

    h.pick("bogus_token").await;
    h.send(Event::Photo {
        url: "https://example.com/x.jpg".to_string(),
    })
    .await;
    h.text("stray message").await;

    let after = h.engine.registry().get(&h.user).await.unwrap().snapshot();
    assert_eq!(before, after);
}

/// Fires every invalid event shape plus a bogus token at the current
/// stage and asserts the session snapshot is untouched.
async fn assert_invalid_events_ignored(h: &Harness, extra: &[&str]) {
    let before = h.engine.registry().get(&h.user).await.unwrap().snapshot();

    h.text("stray message").await;
    h.send(Event::Photo {
        url: "https://example.com/x.jpg".to_string(),
    })
    .await;
    h.pick("bogus_token").await;
    for token in extra {
        h.pick(token).await;
    }

    let after = h.engine.registry().get(&h.user).await.unwrap().snapshot();
    assert_eq!(before, after, "at stage {:?}", before.stage);
}

#[tokio::test]
async fn invalid_events_are_ignored_at_every_prompt_stage() {
    let h = Harness::text_flow(MockStore::with_districts(&["Mzimba"]));

    h.send(Event::Start).await;
    assert_invalid_events_ignored(&h, &[]).await;

    h.pick(tokens::MODE_TEXT).await;
    h.text("Chakwera: 12,345\nMutharika 9000").await;

    h.pick(tokens::BULK_EDIT).await;
    assert_invalid_events_ignored(&h, &[]).await;
    h.text("Banda: 1").await;

    h.pick(tokens::EDIT_INDIVIDUAL).await;
    // A stale button for an unknown candidate is invalid too.
    assert_invalid_events_ignored(&h, &["edit_Nobody"]).await;
    h.pick(tokens::BACK_EDIT_MENU).await;

    h.pick(tokens::SUBMIT_VOTES).await;
    assert_invalid_events_ignored(&h, &["region_Atlantis"]).await;

    h.pick("region_Northern").await;
    // Zomba belongs to Southern.
    assert_invalid_events_ignored(&h, &["district_Zomba"]).await;

    h.pick("district_Mzimba").await;
    assert_eq!(h.stage().await, Some(Stage::ConfirmOverride));
    assert_invalid_events_ignored(&h, &[]).await;
}

#[tokio::test]
async fn cancellation_removes_the_session_from_any_stage() {
    let h = Harness::text_flow(MockStore::empty());

    // From the first stage.
    h.send(Event::Start).await;
    h.send(Event::Cancel).await;
    assert!(!h.engine.registry().contains(&h.user).await);

    // From deep in the workflow, via a menu cancel button.
    h.start_with_tally().await;
    h.pick(tokens::SUBMIT_VOTES).await;
    let reply = h.pick(tokens::CANCEL).await;
    assert!(reply.text.contains("cancelled"));
    assert!(!h.engine.registry().contains(&h.user).await);
}

#[tokio::test]
async fn events_without_a_session_report_expiry() {
    let h = Harness::text_flow(MockStore::empty());
    let reply = h.text("hello?").await;
    assert!(reply.text.contains("Session expired"));
}

#[tokio::test]
async fn start_discards_any_prior_session() {
    let h = Harness::text_flow(MockStore::empty());
    h.start_with_tally().await;

    h.send(Event::Start).await;
    let session = h.engine.registry().get(&h.user).await.unwrap();
    assert_eq!(session.stage(), Stage::ChooseInputMode);
    assert_eq!(session.tally().count("Chakwera"), Some(0));
}

// ─────────────────────────────────────────────────────────────────────────
// Location & submission
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn clean_district_submits_directly() {
    let h = Harness::text_flow(MockStore::empty());
    h.start_with_tally().await;

    h.pick(tokens::SUBMIT_VOTES).await;
    h.pick("region_Northern").await;
    let reply = h.pick("district_Mzimba").await;

    assert!(reply.text.contains("Results submitted for Mzimba"));
    assert!(reply.text.contains("Chakwera: 12,345"));
    assert!(!h.engine.registry().contains(&h.user).await);

    let submissions = h.store.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].region, "Northern");
    assert_eq!(submissions[0].district, "Mzimba");
    assert_eq!(submissions[0].sender, "Jane Doe");
    assert_eq!(submissions[0].votes["Mutharika"], 9000);
}

#[tokio::test]
async fn submitted_district_requires_override_confirmation() {
    let h = Harness::text_flow(MockStore::with_districts(&["MZIMBA"]));
    h.start_with_tally().await;

    h.pick(tokens::SUBMIT_VOTES).await;
    let reply = h.pick("region_Northern").await;
    // The district menu annotates the already-submitted entry.
    let menu = reply.menu.unwrap();
    assert!(menu
        .rows()
        .iter()
        .flatten()
        .any(|b| b.label == "Mzimba [has data]"));

    let reply = h.pick("district_Mzimba").await;
    assert!(reply.text.contains("Override?"));
    assert_eq!(h.stage().await, Some(Stage::ConfirmOverride));
    assert!(h.store.submissions().is_empty());
}

#[tokio::test]
async fn declining_override_requeries_and_returns_to_districts() {
    let h = Harness::text_flow(MockStore::with_districts(&["Mzimba"]));
    h.start_with_tally().await;

    h.pick(tokens::SUBMIT_VOTES).await;
    h.pick("region_Northern").await;
    h.pick("district_Mzimba").await;
    let queries_before = h.store.queries();

    let reply = h.pick(tokens::OVERRIDE_NO).await;

    assert!(reply.text.contains("Choose another district"));
    assert_eq!(h.stage().await, Some(Stage::SelectDistrict));
    // The already-submitted set is re-fetched, not reused.
    assert_eq!(h.store.queries(), queries_before + 1);
}

#[tokio::test]
async fn accepting_override_submits() {
    let h = Harness::text_flow(MockStore::with_districts(&["Mzimba"]));
    h.start_with_tally().await;

    h.pick(tokens::SUBMIT_VOTES).await;
    h.pick("region_Northern").await;
    h.pick("district_Mzimba").await;
    let reply = h.pick(tokens::OVERRIDE_YES).await;

    assert!(reply.text.contains("Results submitted for Mzimba"));
    assert_eq!(h.store.submissions().len(), 1);
    assert!(!h.engine.registry().contains(&h.user).await);
}

#[tokio::test]
async fn back_to_regions_reopens_region_menu() {
    let h = Harness::text_flow(MockStore::empty());
    h.start_with_tally().await;

    h.pick(tokens::SUBMIT_VOTES).await;
    h.pick("region_Northern").await;
    let reply = h.pick(tokens::BACK_TO_REGIONS).await;

    assert!(reply.text.contains("Choose the region"));
    assert_eq!(h.stage().await, Some(Stage::SelectRegion));
}

#[tokio::test]
async fn failed_submission_is_not_retried_and_tears_down() {
    let h = Harness::text_flow(MockStore::rejecting_submission());
    h.start_with_tally().await;

    h.pick(tokens::SUBMIT_VOTES).await;
    h.pick("region_Northern").await;
    let reply = h.pick("district_Mzimba").await;

    assert!(reply.text.contains("sheet rejected the row"));
    assert_eq!(h.store.submissions().len(), 1);
    assert!(!h.engine.registry().contains(&h.user).await);
}

#[tokio::test]
async fn store_query_failure_aborts_the_workflow() {
    let h = Harness::text_flow(MockStore::failing_queries());
    h.start_with_tally().await;

    h.pick(tokens::SUBMIT_VOTES).await;
    let reply = h.pick("region_Northern").await;

    assert!(reply.text.contains("Could not reach the tally store"));
    assert!(!h.engine.registry().contains(&h.user).await);
}

#[tokio::test]
async fn wrong_region_district_is_reprompted() {
    let h = Harness::text_flow(MockStore::empty());
    h.start_with_tally().await;

    h.pick(tokens::SUBMIT_VOTES).await;
    h.pick("region_Northern").await;
    // Zomba belongs to Southern.
    let reply = h.pick("district_Zomba").await;

    assert!(reply.text.contains("Please select a district"));
    assert_eq!(h.stage().await, Some(Stage::SelectDistrict));
    assert!(h.store.submissions().is_empty());
}
