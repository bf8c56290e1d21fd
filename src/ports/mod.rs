//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! workflow and the outside world. Adapters implement these ports.
//!
//! - `TextRecognizer` - image-to-text recognition service
//! - `TallyStore` - the spreadsheet store holding submitted tallies

mod recognizer;
mod tally_store;

pub use recognizer::{RecognitionError, TextRecognizer};
pub use tally_store::{StoreError, SubmissionRecord, SubmitAck, TallyStore};
