//! Inbound event model.
//!
//! The conversational transport delivers exactly these shapes; everything
//! else about the transport (rendering, escaping, delivery) stays outside
//! this crate.

/// One inbound event from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The start command; always begins a fresh session.
    Start,
    /// The cancel command; discards the session from any stage.
    Cancel,
    /// A free-text message.
    Text(String),
    /// An image the transport has made reachable by URL.
    Photo { url: String },
    /// A menu selection carrying an opaque token.
    Select(String),
}

/// Stable menu-selection tokens.
///
/// These are wire values the transport echoes back; changing one breaks
/// in-flight menus, so they are collected here rather than inlined.
pub mod tokens {
    pub const MODE_IMAGE: &str = "mode_image";
    pub const MODE_TEXT: &str = "mode_text";
    pub const CANCEL: &str = "cancel";

    pub const BULK_EDIT: &str = "bulk_edit";
    pub const EDIT_INDIVIDUAL: &str = "edit_individual";
    pub const ADD_CANDIDATE: &str = "add_candidate";
    pub const REMOVE_CANDIDATE: &str = "remove_candidate";
    pub const SUBMIT_VOTES: &str = "submit_votes";
    pub const BACK_EDIT_MENU: &str = "back_edit_menu";

    pub const BACK_TO_REGIONS: &str = "back_to_regions";
    pub const OVERRIDE_YES: &str = "override_yes";
    pub const OVERRIDE_NO: &str = "override_no";

    pub const EDIT_PREFIX: &str = "edit_";
    pub const REMOVE_PREFIX: &str = "remove_";
    pub const REGION_PREFIX: &str = "region_";
    pub const DISTRICT_PREFIX: &str = "district_";
}
