//! # plt-reader
//!
//! A decoder for Tecplot binary data files (`.plt`), dialects `#!TDV102`,
//! `#!TDV111` and `#!TDV112`, little-endian only.
//! Reads the header (zones, variables, auxiliary data) and materializes
//! per-zone value arrays and finite-element connectivity.
//!
//! **Note:** Geometry and text records and face-neighbor connection data
//! are recognized but rejected as unsupported.
pub mod plt;

// Re-export the main types for convenience
pub use plt::{
    read_data, read_data_from, read_data_with, read_header,
    models::{
        Connectivity, FileType, Header, PltData, PltVersion, ValueArray, ValueFormat,
        ValueLocation, Variable, ZoneData, ZoneDescriptor, ZoneType,
    },
    DecodeOptions, PltError, PltReader, Result, ZoneDirectory,
};
