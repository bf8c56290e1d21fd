//! Workflow stage enumeration.
//!
//! Every stage the conversation can be in, as an explicit tagged variant.
//! Invalid events leave the stage unchanged (handlers re-prompt); actual
//! advances always go through the validated `StateMachine` transition.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Where a session currently is in the capture workflow.
///
/// `Terminated` is the single terminal stage, reached by successful
/// submission, explicit cancellation, or a fatal session-expiry condition.
/// Cancellation is valid from every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Choosing between image upload and pasted text.
    ChooseInputMode,
    /// Waiting for an image to run through recognition.
    WaitForImage,
    /// Waiting for pasted free text.
    WaitForText,
    /// Main curation menu over the current tally.
    EditMenu,
    /// Waiting for a full `name:count` re-entry of the tally.
    BulkEditAll,
    /// Picking which entity to edit.
    SelectEditTarget,
    /// Waiting for the new count for the picked entity.
    AwaitCount,
    /// Waiting for a new entity name.
    AddEntity,
    /// Picking which entity to remove.
    RemoveEntity,
    /// Picking the region to file the tally under.
    SelectRegion,
    /// Picking the district within the selected region.
    SelectDistrict,
    /// Confirming an overwrite of a district that already holds data.
    ConfirmOverride,
    /// Workflow finished; the session no longer exists.
    Terminated,
}

impl StateMachine for Stage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use Stage::*;

        // Cancellation (and the fatal expiry path) may fire anywhere.
        if *target == Terminated {
            return *self != Terminated;
        }

        matches!(
            (self, target),
            (ChooseInputMode, WaitForImage)
                | (ChooseInputMode, WaitForText)
                | (WaitForImage, EditMenu)
                | (WaitForImage, WaitForText)
                | (WaitForText, EditMenu)
                | (EditMenu, BulkEditAll)
                | (EditMenu, SelectEditTarget)
                | (EditMenu, AddEntity)
                | (EditMenu, RemoveEntity)
                | (EditMenu, SelectRegion)
                | (BulkEditAll, EditMenu)
                | (SelectEditTarget, AwaitCount)
                | (SelectEditTarget, EditMenu)
                | (AwaitCount, EditMenu)
                | (AddEntity, EditMenu)
                | (RemoveEntity, EditMenu)
                | (SelectRegion, SelectDistrict)
                | (SelectDistrict, ConfirmOverride)
                | (SelectDistrict, SelectRegion)
                | (ConfirmOverride, SelectDistrict)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use Stage::*;
        let mut targets = match self {
            ChooseInputMode => vec![WaitForImage, WaitForText],
            WaitForImage => vec![EditMenu, WaitForText],
            WaitForText => vec![EditMenu],
            EditMenu => vec![
                BulkEditAll,
                SelectEditTarget,
                AddEntity,
                RemoveEntity,
                SelectRegion,
            ],
            BulkEditAll => vec![EditMenu],
            SelectEditTarget => vec![AwaitCount, EditMenu],
            AwaitCount => vec![EditMenu],
            AddEntity => vec![EditMenu],
            RemoveEntity => vec![EditMenu],
            SelectRegion => vec![SelectDistrict],
            SelectDistrict => vec![ConfirmOverride, SelectRegion],
            ConfirmOverride => vec![SelectDistrict],
            Terminated => vec![],
        };
        if *self != Terminated {
            targets.push(Terminated);
        }
        targets
    }
}
