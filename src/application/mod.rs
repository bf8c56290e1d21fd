//! Application layer - the conversation workflow engine.
//!
//! This layer owns the session registry, dispatches inbound transport
//! events to the handler for the session's current stage, and drives the
//! submission workflow against the store port.

mod engine;
mod event;
mod menus;
mod registry;
mod reply;
mod submission;

pub use engine::Engine;
pub use event::{tokens, Event};
pub use registry::SessionRegistry;
pub use reply::{Button, Menu, Reply};
pub use submission::SubmissionWorkflow;
