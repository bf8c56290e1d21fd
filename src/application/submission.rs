//! Submission workflow: precondition check, record construction, hand-off.
//!
//! At-most-once by design: a failed hand-off is reported and the session is
//! torn down without retry, so a flaky store can never produce duplicate or
//! conflicting writes from this side.

use std::sync::Arc;

use tracing::{error, info};

use crate::domain::foundation::Timestamp;
use crate::domain::session::Session;
use crate::ports::{SubmissionRecord, TallyStore};

use super::reply::Reply;

/// Hands a completed session's tally to the storage collaborator.
pub struct SubmissionWorkflow {
    store: Arc<dyn TallyStore>,
}

impl SubmissionWorkflow {
    pub fn new(store: Arc<dyn TallyStore>) -> Self {
        Self { store }
    }

    /// Submits the session's tally.
    ///
    /// Returns the user-visible reply; the caller discards the session in
    /// every outcome. On success the session is marked completed first.
    pub async fn submit(&self, session: &mut Session, display_name: &str) -> Reply {
        let (Some(region), Some(district)) = (session.region(), session.district()) else {
            return Reply::text("Incomplete data. Please restart with /start.");
        };
        if session.tally().is_empty() {
            return Reply::text("Incomplete data. Please restart with /start.");
        }

        let record = SubmissionRecord {
            region: region.to_string(),
            district: district.to_string(),
            timestamp: Timestamp::now().format_submission(),
            sender: display_name.to_string(),
            votes: session.tally().counts().clone(),
        };

        match self.store.submit(&record).await {
            Ok(ack) if ack.success => {
                info!(user = %session.user_id(), district = %record.district, "tally submitted");
                session.mark_completed();
                Reply::text(format!(
                    "Results submitted for {}.\n\nParsed vote results:\n\n{}",
                    record.district,
                    session.tally().render_grouped()
                ))
            }
            Ok(ack) => {
                let message = ack.message.unwrap_or_else(|| "Unknown error".to_string());
                error!(user = %session.user_id(), message = %message, "store rejected submission");
                Reply::text(format!(
                    "Failed to submit data: {}\nPlease restart with /start.",
                    message
                ))
            }
            Err(e) => {
                error!(user = %session.user_id(), error = %e, "submission call failed");
                Reply::text(format!(
                    "Failed to submit data: {}\nPlease restart with /start.",
                    e
                ))
            }
        }
    }
}
