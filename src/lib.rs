//! Tallybot - Guided Vote-Tally Capture Workflow
//!
//! This crate walks a user through a multi-step conversation that captures a
//! tally of candidate vote counts (from pasted text or from text recovered
//! out of an image), lets the user curate it interactively, and submits the
//! finalized tally to a spreadsheet store keyed by region and district.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
