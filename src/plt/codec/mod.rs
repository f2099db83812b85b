//! Codec layer for numeric value decoding.
//!
//! This module turns raw value bytes located by the data-section scanner
//! into typed arrays.
//!
//! # Submodules
//!
//! - [`values`][]: Per-format decoding (IEEE floats, widened integers, bytes, packed bits)

pub mod values;
