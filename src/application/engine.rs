//! The conversation engine.
//!
//! Dispatches one inbound event to the handler for the session's current
//! stage. Handlers accept only the event shapes valid in their stage; any
//! other event re-issues the stage's prompt without touching the session.
//! Cancellation (the cancel command or any menu's cancel button) discards
//! the session from every stage.
//!
//! An ended workflow is modelled by removing the session from the registry;
//! a later event for that user hits the session-expiry path, the only fatal
//! local condition.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::catalog::Catalog;
use crate::domain::extraction;
use crate::domain::foundation::{UserId, ValidationError};
use crate::domain::session::{Session, Stage};
use crate::ports::{StoreError, TallyStore, TextRecognizer};

use super::event::{tokens, Event};
use super::menus;
use super::registry::SessionRegistry;
use super::reply::Reply;
use super::submission::SubmissionWorkflow;

/// What a stage handler decided: keep the session alive, or end the
/// workflow (the dispatcher removes the session).
enum Outcome {
    Continue(Reply),
    End(Reply),
}

type HandlerResult = Result<Outcome, ValidationError>;

/// The workflow engine: session registry plus stage handlers.
pub struct Engine {
    catalog: Arc<Catalog>,
    recognizer: Arc<dyn TextRecognizer>,
    store: Arc<dyn TallyStore>,
    submission: SubmissionWorkflow,
    registry: SessionRegistry,
}

impl Engine {
    pub fn new(
        catalog: Arc<Catalog>,
        recognizer: Arc<dyn TextRecognizer>,
        store: Arc<dyn TallyStore>,
    ) -> Self {
        let submission = SubmissionWorkflow::new(store.clone());
        Self {
            catalog,
            recognizer,
            store,
            submission,
            registry: SessionRegistry::new(),
        }
    }

    /// The session registry (exposed for status checks and tests).
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handles one inbound event for a user and produces the reply.
    ///
    /// Events are serialized per user: the user's guard is held for the
    /// whole dispatch, including suspensions on external calls, so two
    /// in-flight events from the same user cannot interleave session
    /// reads and writes.
    pub async fn dispatch(&self, user_id: &UserId, display_name: &str, event: Event) -> Reply {
        let guard = self.registry.user_guard(user_id).await;
        let _held = guard.lock().await;

        // Start and cancel are accepted regardless of stage.
        if event == Event::Start {
            let session = Session::start(user_id.clone(), &self.catalog);
            self.registry.create(session).await;
            info!(user = %user_id, "session started");
            return Reply::with_menu(
                "Welcome to the vote tally bot!\nChoose an input mode:",
                menus::input_mode(),
            );
        }
        if is_cancel(&event) {
            self.registry.remove(user_id).await;
            info!(user = %user_id, "session cancelled");
            return Reply::text("Operation cancelled. Use /start to begin again.");
        }

        let Some(mut session) = self.registry.get(user_id).await else {
            warn!(user = %user_id, "event for missing session");
            return Reply::text("Session expired. Use /start to begin again.");
        };

        let result = match session.stage() {
            Stage::ChooseInputMode => self.choose_input_mode(&mut session, &event),
            Stage::WaitForImage => self.wait_for_image(&mut session, &event).await,
            Stage::WaitForText => self.wait_for_text(&mut session, &event),
            Stage::EditMenu => self.edit_menu(&mut session, &event),
            Stage::BulkEditAll => self.bulk_edit(&mut session, &event),
            Stage::SelectEditTarget => self.select_edit_target(&mut session, &event),
            Stage::AwaitCount => self.await_count(&mut session, &event),
            Stage::AddEntity => self.add_entity(&mut session, &event),
            Stage::RemoveEntity => self.remove_entity(&mut session, &event),
            Stage::SelectRegion => self.select_region(&mut session, &event).await,
            Stage::SelectDistrict => {
                self.select_district(&mut session, &event, display_name).await
            }
            Stage::ConfirmOverride => {
                self.confirm_override(&mut session, &event, display_name).await
            }
            // Terminated sessions are removed on the spot, so nothing is
            // ever dispatched to this stage.
            Stage::Terminated => Ok(Outcome::End(Reply::text(
                "Session expired. Use /start to begin again.",
            ))),
        };

        match result {
            Ok(Outcome::Continue(reply)) => {
                self.registry.update(session).await;
                reply
            }
            Ok(Outcome::End(reply)) => {
                self.registry.remove(user_id).await;
                reply
            }
            Err(e) => {
                error!(user = %user_id, error = %e, "stage transition rejected");
                self.registry.remove(user_id).await;
                Reply::text("Session expired. Use /start to begin again.")
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Stage handlers
    // ─────────────────────────────────────────────────────────────────────

    fn choose_input_mode(&self, session: &mut Session, event: &Event) -> HandlerResult {
        match event {
            Event::Select(t) if t == tokens::MODE_IMAGE => {
                session.advance(Stage::WaitForImage)?;
                Ok(Outcome::Continue(Reply::text(
                    "Please send a photo of the tally sheet.",
                )))
            }
            Event::Select(t) if t == tokens::MODE_TEXT => {
                session.advance(Stage::WaitForText)?;
                Ok(Outcome::Continue(Reply::text(
                    "Please paste the text containing the vote counts.",
                )))
            }
            _ => Ok(Outcome::Continue(Reply::with_menu(
                "Please choose a valid option.",
                menus::input_mode(),
            ))),
        }
    }

    async fn wait_for_image(&self, session: &mut Session, event: &Event) -> HandlerResult {
        let Event::Photo { url } = event else {
            return Ok(Outcome::Continue(Reply::text("Please send a photo.")));
        };

        let text = match self.recognizer.recognize(url).await {
            Ok(text) => text,
            Err(e) => {
                // An unreachable recognizer is an external failure and ends
                // the workflow, like a failed store query. Only an empty
                // extraction result is recoverable, via manual text entry.
                warn!(user = %session.user_id(), error = %e, "recognition failed");
                return Ok(Outcome::End(Reply::text(format!(
                    "Could not read the image: {}\nThe workflow was aborted; use /start to begin again.",
                    e
                ))));
            }
        };

        let votes = extraction::extract(&text, self.catalog.candidates());
        if votes.is_empty() {
            // Human fallback: failed automated extraction routes to manual
            // text entry instead of retrying recognition.
            session.advance(Stage::WaitForText)?;
            return Ok(Outcome::Continue(Reply::text(
                "Could not find votes in the text. Please enter the votes manually.",
            )));
        }

        session.replace_tally(votes);
        session.advance(Stage::EditMenu)?;
        Ok(Outcome::Continue(Reply::with_menu(
            format!("Parsed votes:\n{}", session.tally().render()),
            menus::edit_menu(),
        )))
    }

    fn wait_for_text(&self, session: &mut Session, event: &Event) -> HandlerResult {
        let Event::Text(text) = event else {
            return Ok(Outcome::Continue(Reply::text(
                "Please paste the text containing the vote counts.",
            )));
        };

        let votes = extraction::extract(text, self.catalog.candidates());
        if votes.is_empty() {
            return Ok(Outcome::Continue(Reply::text(
                "Could not parse votes from the text. Please try again.",
            )));
        }

        session.replace_tally(votes);
        session.advance(Stage::EditMenu)?;
        Ok(Outcome::Continue(Reply::with_menu(
            format!("Parsed votes:\n{}", session.tally().render()),
            menus::edit_menu(),
        )))
    }

    fn edit_menu(&self, session: &mut Session, event: &Event) -> HandlerResult {
        let Event::Select(token) = event else {
            return Ok(Outcome::Continue(Reply::with_menu(
                "Please select a valid option.",
                menus::edit_menu(),
            )));
        };

        match token.as_str() {
            tokens::BULK_EDIT => {
                session.advance(Stage::BulkEditAll)?;
                Ok(Outcome::Continue(Reply::text(
                    "Send all candidates and votes, one per line, in the format:\n\
                     Candidate: Votes\n\nExample:\nChakwera: 12345\nMutharika: 67890",
                )))
            }
            tokens::EDIT_INDIVIDUAL => {
                session.advance(Stage::SelectEditTarget)?;
                let picker = menus::entity_picker(session.tally(), tokens::EDIT_PREFIX);
                Ok(Outcome::Continue(Reply::with_menu(
                    "Select a candidate to edit:",
                    picker,
                )))
            }
            tokens::ADD_CANDIDATE => {
                session.advance(Stage::AddEntity)?;
                Ok(Outcome::Continue(Reply::text("Send the new candidate's name:")))
            }
            tokens::REMOVE_CANDIDATE => {
                session.advance(Stage::RemoveEntity)?;
                let picker = menus::entity_picker(session.tally(), tokens::REMOVE_PREFIX);
                Ok(Outcome::Continue(Reply::with_menu(
                    "Select a candidate to remove:",
                    picker,
                )))
            }
            tokens::SUBMIT_VOTES => {
                session.advance(Stage::SelectRegion)?;
                Ok(Outcome::Continue(Reply::with_menu(
                    "Choose the region for this tally:",
                    menus::regions(&self.catalog),
                )))
            }
            tokens::BACK_EDIT_MENU => Ok(Outcome::Continue(Reply::with_menu(
                format!("Current votes:\n{}", session.tally().render()),
                menus::edit_menu(),
            ))),
            _ => Ok(Outcome::Continue(Reply::with_menu(
                "Please select a valid option.",
                menus::edit_menu(),
            ))),
        }
    }

    fn bulk_edit(&self, session: &mut Session, event: &Event) -> HandlerResult {
        let Event::Text(text) = event else {
            return Ok(Outcome::Continue(Reply::text(
                "Send the votes as Candidate: Votes lines.",
            )));
        };

        let pairs = extraction::parse_exact_lines(text);
        if pairs.is_empty() {
            return Ok(Outcome::Continue(Reply::text(
                "No valid candidate votes found. Please try again.",
            )));
        }

        session.merge_counts(pairs);
        session.advance(Stage::EditMenu)?;
        Ok(Outcome::Continue(Reply::with_menu(
            format!("Updated votes:\n{}", session.tally().render()),
            menus::edit_menu(),
        )))
    }

    fn select_edit_target(&self, session: &mut Session, event: &Event) -> HandlerResult {
        let Event::Select(token) = event else {
            return Ok(Outcome::Continue(Reply::with_menu(
                "Please select a candidate or option.",
                menus::entity_picker(session.tally(), tokens::EDIT_PREFIX),
            )));
        };

        if let Some(name) = token.strip_prefix(tokens::EDIT_PREFIX) {
            return match session.set_edit_target(name) {
                Ok(()) => {
                    session.advance(Stage::AwaitCount)?;
                    Ok(Outcome::Continue(Reply::text(format!(
                        "Send the new vote count for {}:",
                        name
                    ))))
                }
                Err(e) => Ok(Outcome::Continue(Reply::with_menu(
                    format!("{}. Pick another.", e),
                    menus::entity_picker(session.tally(), tokens::EDIT_PREFIX),
                ))),
            };
        }
        if token == tokens::BACK_EDIT_MENU {
            session.advance(Stage::EditMenu)?;
            return Ok(Outcome::Continue(Reply::with_menu(
                format!("Current votes:\n{}", session.tally().render()),
                menus::edit_menu(),
            )));
        }
        Ok(Outcome::Continue(Reply::with_menu(
            "Please select a candidate or option.",
            menus::entity_picker(session.tally(), tokens::EDIT_PREFIX),
        )))
    }

    fn await_count(&self, session: &mut Session, event: &Event) -> HandlerResult {
        if session.edit_target().is_none() {
            session.advance(Stage::EditMenu)?;
            return Ok(Outcome::Continue(Reply::with_menu(
                "No candidate selected. Returning to the edit menu.",
                menus::edit_menu(),
            )));
        }

        let Event::Text(text) = event else {
            return Ok(Outcome::Continue(Reply::text(
                "Please send a valid non-negative integer.",
            )));
        };

        let trimmed = text.trim();
        let count = match trimmed.parse::<u64>() {
            Ok(n) if trimmed.chars().all(|c| c.is_ascii_digit()) => n,
            _ => {
                return Ok(Outcome::Continue(Reply::text(
                    "Please send a valid non-negative integer.",
                )));
            }
        };

        // The target is known to be set; consume it only now that the
        // input is valid, so a re-prompt keeps it.
        let Some(name) = session.take_edit_target() else {
            session.advance(Stage::EditMenu)?;
            return Ok(Outcome::Continue(Reply::with_menu(
                "No candidate selected. Returning to the edit menu.",
                menus::edit_menu(),
            )));
        };
        session.set_count(&name, count);
        session.advance(Stage::EditMenu)?;
        Ok(Outcome::Continue(Reply::with_menu(
            format!("Updated {} to {} votes.", name, count),
            menus::edit_menu(),
        )))
    }

    fn add_entity(&self, session: &mut Session, event: &Event) -> HandlerResult {
        let Event::Text(name) = event else {
            return Ok(Outcome::Continue(Reply::text("Send the new candidate's name:")));
        };

        let name = name.trim();
        if session.add_entity(name).is_err() {
            return Ok(Outcome::Continue(Reply::text(
                "Invalid or existing candidate name. Try again.",
            )));
        }

        session.advance(Stage::EditMenu)?;
        Ok(Outcome::Continue(Reply::with_menu(
            format!("Added candidate '{}'. You can now edit their votes.", name),
            menus::edit_menu(),
        )))
    }

    fn remove_entity(&self, session: &mut Session, event: &Event) -> HandlerResult {
        let Event::Select(token) = event else {
            return Ok(Outcome::Continue(Reply::with_menu(
                "Please select a candidate or option.",
                menus::entity_picker(session.tally(), tokens::REMOVE_PREFIX),
            )));
        };

        if let Some(name) = token.strip_prefix(tokens::REMOVE_PREFIX) {
            let text = if session.remove_entity(name) {
                format!("Candidate '{}' removed.", name)
            } else {
                "Candidate not found. Returning to the edit menu.".to_string()
            };
            session.advance(Stage::EditMenu)?;
            return Ok(Outcome::Continue(Reply::with_menu(text, menus::edit_menu())));
        }
        if token == tokens::BACK_EDIT_MENU {
            session.advance(Stage::EditMenu)?;
            return Ok(Outcome::Continue(Reply::with_menu(
                format!("Current votes:\n{}", session.tally().render()),
                menus::edit_menu(),
            )));
        }
        Ok(Outcome::Continue(Reply::with_menu(
            "Please select a candidate or option.",
            menus::entity_picker(session.tally(), tokens::REMOVE_PREFIX),
        )))
    }

    async fn select_region(&self, session: &mut Session, event: &Event) -> HandlerResult {
        let Event::Select(token) = event else {
            return Ok(Outcome::Continue(Reply::with_menu(
                "Please select a region.",
                menus::regions(&self.catalog),
            )));
        };

        let Some(region) = token.strip_prefix(tokens::REGION_PREFIX) else {
            return Ok(Outcome::Continue(Reply::with_menu(
                "Please select a region.",
                menus::regions(&self.catalog),
            )));
        };

        if session.select_region(region, &self.catalog).is_err() {
            return Ok(Outcome::Continue(Reply::with_menu(
                "Please select a region.",
                menus::regions(&self.catalog),
            )));
        }

        let submitted = match self.submitted_lowercase().await {
            Ok(s) => s,
            Err(e) => return Ok(Outcome::End(store_failure_reply(&e))),
        };

        session.advance(Stage::SelectDistrict)?;
        Ok(Outcome::Continue(Reply::with_menu(
            format!("Region '{}' selected.\nNow choose a district:", region),
            menus::districts(&self.catalog, region, &submitted),
        )))
    }

    async fn select_district(
        &self,
        session: &mut Session,
        event: &Event,
        display_name: &str,
    ) -> HandlerResult {
        let token = match event {
            Event::Select(token) => token.as_str(),
            _ => return self.reprompt_district(session).await,
        };

        if token == tokens::BACK_TO_REGIONS {
            session.advance(Stage::SelectRegion)?;
            return Ok(Outcome::Continue(Reply::with_menu(
                "Choose the region for this tally:",
                menus::regions(&self.catalog),
            )));
        }

        let Some(district) = token.strip_prefix(tokens::DISTRICT_PREFIX) else {
            return self.reprompt_district(session).await;
        };
        if session.select_district(district, &self.catalog).is_err() {
            return self.reprompt_district(session).await;
        }

        // Re-fetch at decision time: the submitted set may have changed
        // since the menu was rendered.
        let submitted = match self.submitted_lowercase().await {
            Ok(s) => s,
            Err(e) => return Ok(Outcome::End(store_failure_reply(&e))),
        };

        if submitted.contains(&district.to_lowercase()) {
            session.advance(Stage::ConfirmOverride)?;
            return Ok(Outcome::Continue(Reply::with_menu(
                format!("Data already exists for district '{}'. Override?", district),
                menus::confirm_override(),
            )));
        }

        let reply = self.submission.submit(session, display_name).await;
        Ok(Outcome::End(reply))
    }

    async fn confirm_override(
        &self,
        session: &mut Session,
        event: &Event,
        display_name: &str,
    ) -> HandlerResult {
        match event {
            Event::Select(t) if t == tokens::OVERRIDE_YES => {
                let reply = self.submission.submit(session, display_name).await;
                Ok(Outcome::End(reply))
            }
            Event::Select(t) if t == tokens::OVERRIDE_NO => {
                let submitted = match self.submitted_lowercase().await {
                    Ok(s) => s,
                    Err(e) => return Ok(Outcome::End(store_failure_reply(&e))),
                };
                session.advance(Stage::SelectDistrict)?;
                let region = session.region().unwrap_or_default().to_string();
                Ok(Outcome::Continue(Reply::with_menu(
                    "Choose another district:",
                    menus::districts(&self.catalog, &region, &submitted),
                )))
            }
            _ => Ok(Outcome::Continue(Reply::with_menu(
                "Please choose an option.",
                menus::confirm_override(),
            ))),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    /// Re-issues the district menu for the session's region.
    async fn reprompt_district(&self, session: &mut Session) -> HandlerResult {
        let Some(region) = session.region().map(str::to_string) else {
            // A district prompt with no region means the session state was
            // lost underneath us; fall back to region selection.
            session.advance(Stage::SelectRegion)?;
            return Ok(Outcome::Continue(Reply::with_menu(
                "Please select a region.",
                menus::regions(&self.catalog),
            )));
        };
        let submitted = match self.submitted_lowercase().await {
            Ok(s) => s,
            Err(e) => return Ok(Outcome::End(store_failure_reply(&e))),
        };
        Ok(Outcome::Continue(Reply::with_menu(
            "Please select a district.",
            menus::districts(&self.catalog, &region, &submitted),
        )))
    }

    /// Queries the store for districts already holding data, lower-cased
    /// for case-insensitive comparison.
    async fn submitted_lowercase(&self) -> Result<Vec<String>, StoreError> {
        let districts = self.store.submitted_districts().await?;
        Ok(districts.into_iter().map(|d| d.to_lowercase()).collect())
    }
}

fn is_cancel(event: &Event) -> bool {
    matches!(event, Event::Cancel)
        || matches!(event, Event::Select(t) if t == tokens::CANCEL)
}

fn store_failure_reply(e: &StoreError) -> Reply {
    Reply::text(format!(
        "Could not reach the tally store: {}\nThe workflow was aborted; use /start to begin again.",
        e
    ))
}
