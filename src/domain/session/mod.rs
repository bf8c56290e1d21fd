//! Per-user workflow session aggregate.
//!
//! A session is the volatile state of one user's trip through the capture
//! workflow: the tally under construction, the selected location, the
//! transient edit target, and the current stage. Sessions live only in
//! process memory and are destroyed on cancellation, on submission, or when
//! the workflow otherwise terminates.

mod stage;

pub use stage::Stage;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::catalog::Catalog;
use crate::domain::foundation::{StateMachine, Timestamp, UserId, ValidationError};
use crate::domain::tally::Tally;

/// Errors raised by session mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("'{0}' is not a known region")]
    UnknownRegion(String),

    #[error("'{district}' is not a district of {region}")]
    UnknownDistrict { region: String, district: String },

    #[error("No region selected yet")]
    RegionNotSelected,

    #[error("'{0}' is not in the tally")]
    UnknownEntity(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// One user's in-flight workflow state.
///
/// # Invariants
///
/// - `region`, once set, names a catalog region
/// - `district`, once set, belongs to the selected region
/// - `edit_target`, once set, names an entity present in the tally
/// - stage changes only happen through the validated transition table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    tally: Tally,
    region: Option<String>,
    district: Option<String>,
    edit_target: Option<String>,
    completed: bool,
    stage: Stage,
    created_at: Timestamp,
}

impl Session {
    /// Starts a fresh session with every catalog candidate at count zero.
    pub fn start(user_id: UserId, catalog: &Catalog) -> Self {
        Self {
            user_id,
            tally: Tally::seed(catalog.candidates().iter().cloned()),
            region: None,
            district: None,
            edit_target: None,
            completed: false,
            stage: Stage::ChooseInputMode,
            created_at: Timestamp::now(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn district(&self) -> Option<&str> {
        self.district.as_deref()
    }

    pub fn edit_target(&self) -> Option<&str> {
        self.edit_target.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Advances the session to the given stage.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if the transition is not in the stage table
    pub fn advance(&mut self, target: Stage) -> Result<(), ValidationError> {
        self.stage = self.stage.transition_to(target)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tally mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Replaces the tally wholesale with extracted counts.
    pub fn replace_tally(&mut self, counts: BTreeMap<String, u64>) {
        self.tally.replace(counts);
    }

    /// Merges exact `name -> count` pairs into the tally (key overwrite).
    pub fn merge_counts(&mut self, pairs: Vec<(String, u64)>) {
        self.tally.merge(pairs);
    }

    /// Overwrites a single entity's count.
    pub fn set_count(&mut self, name: &str, count: u64) {
        self.tally.set(name, count);
    }

    /// Adds a new entity at count zero.
    ///
    /// # Errors
    ///
    /// - `EmptyField` / `InvalidFormat` for empty or duplicate names
    pub fn add_entity(&mut self, name: &str) -> Result<(), SessionError> {
        self.tally.add_entity(name)?;
        Ok(())
    }

    /// Removes an entity; returns false if it was not in the tally.
    pub fn remove_entity(&mut self, name: &str) -> bool {
        self.tally.remove(name)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Edit target
    // ─────────────────────────────────────────────────────────────────────

    /// Marks an entity as the one being edited.
    ///
    /// # Errors
    ///
    /// - `UnknownEntity` if the entity is not in the tally
    pub fn set_edit_target(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.tally.contains(name) {
            return Err(SessionError::UnknownEntity(name.to_string()));
        }
        self.edit_target = Some(name.to_string());
        Ok(())
    }

    /// Takes the pending edit target, clearing it.
    pub fn take_edit_target(&mut self) -> Option<String> {
        self.edit_target.take()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Location
    // ─────────────────────────────────────────────────────────────────────

    /// Selects the region; any previously selected district is cleared.
    ///
    /// # Errors
    ///
    /// - `UnknownRegion` if the name is not a catalog region
    pub fn select_region(&mut self, region: &str, catalog: &Catalog) -> Result<(), SessionError> {
        if !catalog.is_region(region) {
            return Err(SessionError::UnknownRegion(region.to_string()));
        }
        self.region = Some(region.to_string());
        self.district = None;
        Ok(())
    }

    /// Selects a district within the already-selected region.
    ///
    /// # Errors
    ///
    /// - `RegionNotSelected` if no region has been selected yet
    /// - `UnknownDistrict` if the district is not in the region's list
    pub fn select_district(
        &mut self,
        district: &str,
        catalog: &Catalog,
    ) -> Result<(), SessionError> {
        let region = self.region.as_deref().ok_or(SessionError::RegionNotSelected)?;
        let canonical = catalog.find_district(region, district).ok_or_else(|| {
            SessionError::UnknownDistrict {
                region: region.to_string(),
                district: district.to_string(),
            }
        })?;
        self.district = Some(canonical.to_string());
        Ok(())
    }

    /// Marks the session as successfully handed off to storage.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }
}

/// Snapshot of the fields a handler may not change on an invalid event.
/// Used by tests to assert invalid-input idempotence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub tally: BTreeMap<String, u64>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub edit_target: Option<String>,
    pub stage: Stage,
}

impl Session {
    /// Captures the state-relevant fields for comparison.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tally: self.tally.counts().clone(),
            region: self.region.clone(),
            district: self.district.clone(),
            edit_target: self.edit_target.clone(),
            stage: self.stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session::start(UserId::new("user-1").unwrap(), Catalog::default_catalog())
    }

    #[test]
    fn start_seeds_catalog_candidates_at_zero() {
        let session = test_session();
        assert_eq!(session.stage(), Stage::ChooseInputMode);
        assert_eq!(session.tally().len(), 17);
        assert_eq!(session.tally().count("Chakwera"), Some(0));
        assert!(!session.is_completed());
    }

    #[test]
    fn advance_rejects_invalid_transition() {
        let mut session = test_session();
        assert!(session.advance(Stage::ConfirmOverride).is_err());
        assert_eq!(session.stage(), Stage::ChooseInputMode);
    }

    #[test]
    fn advance_follows_valid_path() {
        let mut session = test_session();
        session.advance(Stage::WaitForText).unwrap();
        session.advance(Stage::EditMenu).unwrap();
        assert_eq!(session.stage(), Stage::EditMenu);
    }

    #[test]
    fn select_region_rejects_unknown_name() {
        let mut session = test_session();
        let err = session
            .select_region("Atlantis", Catalog::default_catalog())
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownRegion("Atlantis".to_string()));
    }

    #[test]
    fn select_region_clears_prior_district() {
        let catalog = Catalog::default_catalog();
        let mut session = test_session();
        session.select_region("Northern", catalog).unwrap();
        session.select_district("Mzimba", catalog).unwrap();
        session.select_region("Central", catalog).unwrap();
        assert_eq!(session.district(), None);
    }

    #[test]
    fn select_district_requires_region() {
        let mut session = test_session();
        assert_eq!(
            session.select_district("Mzimba", Catalog::default_catalog()),
            Err(SessionError::RegionNotSelected)
        );
    }

    #[test]
    fn select_district_rejects_wrong_region() {
        let catalog = Catalog::default_catalog();
        let mut session = test_session();
        session.select_region("Northern", catalog).unwrap();
        // Zomba is Southern.
        assert!(session.select_district("Zomba", catalog).is_err());
    }

    #[test]
    fn edit_target_must_exist_and_is_taken_once() {
        let mut session = test_session();
        assert!(session.set_edit_target("Nobody").is_err());
        session.set_edit_target("Banda").unwrap();
        assert_eq!(session.take_edit_target(), Some("Banda".to_string()));
        assert_eq!(session.take_edit_target(), None);
    }

    #[test]
    fn snapshot_reflects_mutations() {
        let mut session = test_session();
        let before = session.snapshot();
        session.set_count("Banda", 40);
        assert_ne!(before, session.snapshot());
    }
}
