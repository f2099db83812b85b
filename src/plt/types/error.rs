//! Custom error types for the plt-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// Every variant is terminal for the decode call that produced it; nothing
/// is retried and no partial result is returned.
#[derive(Debug, Error)]
pub enum PltError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The 8-byte magic tag does not name a supported dialect.
    #[error("Unsupported Tecplot version tag {found:?}. Only #!TDV102, #!TDV111 and #!TDV112 are supported.")]
    UnsupportedVersion { found: String },

    /// The byte-order word is not the little-endian marker `1`.
    #[error("Unsupported byte order at offset {offset}: expected 1, found {found}")]
    UnsupportedByteOrder { offset: usize, found: i32 },

    /// The word following the byte order is neither the sentinel nor a known file type.
    #[error("Header sentinel mismatch at offset {offset}: expected {expected}, found {found}")]
    HeaderSentinelMismatch { offset: usize, expected: f32, found: f32 },

    /// A header record marker matches none of the recognized section markers.
    #[error("Unknown header marker {found} at offset {offset}")]
    UnknownHeaderMarker { offset: usize, found: f32 },

    /// A read needed more bytes than the buffer holds.
    #[error("Truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A variable or connectivity sharing reference cannot be honored.
    #[error("Invalid share reference in zone {zone}{}: target {target} ({reason})", describe_variable(.variable))]
    InvalidShareReference {
        zone: usize,
        variable: Option<usize>,
        target: i64,
        reason: &'static str,
    },

    /// The data section disagrees with the header about what is shared.
    #[error("Sharing mismatch in zone {zone}{}: header says {header:?}, data section says {data:?}", describe_variable(.variable))]
    SharingMismatch {
        zone: usize,
        variable: Option<usize>,
        header: Option<usize>,
        data: Option<usize>,
    },

    /// A per-variable numeric format code is outside 1..=6.
    #[error("Unsupported format code {code} for variable {variable} of zone {zone} at offset {offset}")]
    UnsupportedFormatCode {
        offset: usize,
        zone: usize,
        variable: usize,
        code: i32,
    },

    /// A data record does not start with the zone marker.
    #[error("Zone marker mismatch for zone {zone} at offset {offset}: expected 299.0, found {found}")]
    ZoneMarkerMismatch { offset: usize, zone: usize, found: f32 },

    /// A header field holds a value outside its allowed range.
    #[error("Invalid value {value} for {field} at offset {offset}")]
    InvalidValue {
        offset: usize,
        field: &'static str,
        value: i64,
    },

    /// The file uses a feature this reader recognizes but does not decode.
    #[error("Unsupported feature at offset {offset}: {feature}")]
    Unsupported { offset: usize, feature: &'static str },
}

fn describe_variable(variable: &Option<usize>) -> String {
    match variable {
        Some(index) => format!(", variable {}", index),
        None => " (connectivity)".to_string(),
    }
}

/// A convenience `Result` type alias using the crate's `PltError` type.
pub type Result<T> = std::result::Result<T, PltError>;
