//! Adapters - Implementations of ports against real collaborators.
//!
//! - `ocr_space` - `TextRecognizer` against an OCR.space-style HTTP API
//! - `sheet_webhook` - `TallyStore` against an Apps-Script-style webhook
//! - `console` - line-oriented transport driving the engine from stdin

pub mod console;
pub mod ocr_space;
pub mod sheet_webhook;

pub use console::ConsoleTransport;
pub use ocr_space::{OcrSpaceConfig, OcrSpaceRecognizer};
pub use sheet_webhook::{SheetWebhookConfig, SheetWebhookStore};
