//! File format parsing layer for Tecplot binary files.
//!
//! # Module Organization
//!
//! - [`header`]: Parses the header up to the end-of-header marker
//! - [`zone`]: Parses the per-zone records inside the header
//! - [`data`]: Locates every zone's values in the data section
//!
//! # Architecture
//!
//! ```text
//! File Structure:
//! ┌─────────────────┐
//! │  Header         │ ← header::parse()
//! │  (zone records) │ ← zone::parse()
//! ├─────────────────┤
//! │  357.0 marker   │
//! ├─────────────────┤
//! │  Zone data      │ ← data::scan()
//! │  records        │
//! └─────────────────┘
//! ```

pub mod data;
pub mod header;
pub mod zone;
