//! Tecplot binary header parsing.
//!
//! # Header Structure
//! ```text
//! [8 bytes]  Magic tag, e.g. "#!TDV112"
//! [i32]      Byte order, always 1
//! [4 bytes]  File type (i32 0/1/2) or the 299.0 sentinel
//! [string]   Title
//! [i32]      NumVars
//! [string..] NumVars variable names
//! [records]  Marker-prefixed records (zones, aux data, labels, ...)
//! [f32]      357.0 end-of-header marker
//! ```
//! Strings are sequences of 4-byte character codes ending in a zero code.

use log::{debug, info, trace};

use crate::plt::directory::ZoneDirectory;
use crate::plt::types::error::{PltError, Result};
use crate::plt::types::models::{FileType, Header, PltVersion, VariableAuxEntry};
use crate::plt::utils::ByteCursor;

use super::zone;

pub const ZONE_MARKER: f32 = 299.0;
pub const GEOMETRY_MARKER: f32 = 399.0;
pub const TEXT_MARKER: f32 = 499.0;
pub const CUSTOM_LABEL_MARKER: f32 = 599.0;
pub const USER_RECORD_MARKER: f32 = 699.0;
pub const DATASET_AUX_MARKER: f32 = 799.0;
pub const VARIABLE_AUX_MARKER: f32 = 899.0;
pub const END_OF_HEADER_MARKER: f32 = 357.0;

/// The only byte-order value a little-endian writer produces.
const BYTE_ORDER: i32 = 1;

/// Parses the header from the beginning of a `.plt` image.
///
/// Reads up to and including the end-of-header marker and records the
/// position right after it as [`Header::data_offset`]. No data-section byte
/// is touched. Sharing references are validated once all zones are known.
pub fn parse(data: &[u8]) -> Result<Header> {
    info!("Parsing Tecplot header ({} bytes available)", data.len());
    let mut cursor = ByteCursor::new(data);

    // Step 1: Magic tag
    let magic = cursor.read_bytes(8)?;
    let version = PltVersion::try_from(magic)?;
    debug!("Detected dialect {}", version);

    // Step 2: Byte order
    let offset = cursor.position();
    let byte_order = cursor.read_i32()?;
    if byte_order != BYTE_ORDER {
        return Err(PltError::UnsupportedByteOrder { offset, found: byte_order });
    }

    // Step 3: File type, or the bare sentinel some writers emit instead
    let file_type = read_file_type(&mut cursor)?;

    // Step 4: Title and variables
    let title = cursor.read_string()?;
    let offset = cursor.position();
    let num_vars = cursor.read_i32()?;
    if num_vars < 1 {
        return Err(PltError::InvalidValue {
            offset,
            field: "variable count",
            value: num_vars as i64,
        });
    }
    let variable_names = (0..num_vars)
        .map(|_| cursor.read_string())
        .collect::<Result<Vec<_>>>()?;
    debug!("Title '{}', {} variables: {:?}", title, num_vars, variable_names);

    // Step 5: Marker-driven records
    let mut zones = Vec::new();
    let mut aux_data = Vec::new();
    let mut variable_aux_data = Vec::new();
    let mut custom_labels = Vec::new();
    let mut user_records = Vec::new();

    loop {
        let offset = cursor.position();
        let marker = cursor.read_f32()?;
        trace!("Header marker {} at offset {}", marker, offset);

        if marker == ZONE_MARKER {
            let index = zones.len();
            zones.push(zone::parse(&mut cursor, version, variable_names.len(), index)?);
        } else if marker == DATASET_AUX_MARKER {
            aux_data.push(zone::parse_aux_pair(&mut cursor)?);
        } else if marker == VARIABLE_AUX_MARKER {
            let variable = zone::read_count(&mut cursor, "auxiliary variable index")?;
            let entry = zone::parse_aux_pair(&mut cursor)?;
            variable_aux_data.push(VariableAuxEntry {
                variable,
                name: entry.name,
                value: entry.value,
            });
        } else if marker == CUSTOM_LABEL_MARKER {
            let count = zone::read_count(&mut cursor, "custom label count")?;
            let labels = (0..count)
                .map(|_| cursor.read_string())
                .collect::<Result<Vec<_>>>()?;
            custom_labels.push(labels);
        } else if marker == USER_RECORD_MARKER {
            user_records.push(cursor.read_string()?);
        } else if marker == GEOMETRY_MARKER {
            return Err(PltError::Unsupported { offset, feature: "geometry record" });
        } else if marker == TEXT_MARKER {
            return Err(PltError::Unsupported { offset, feature: "text record" });
        } else if marker == END_OF_HEADER_MARKER {
            break;
        } else {
            return Err(PltError::UnknownHeaderMarker { offset, found: marker });
        }
    }

    // Step 6: Sharing references may point forward, so check them last
    let zones = ZoneDirectory::new(zones);
    zones.validate()?;

    let data_offset = cursor.position();
    info!(
        "Header parsed: version={}, title='{}', {} variables, {} zones, data at offset {}",
        version,
        title,
        variable_names.len(),
        zones.len(),
        data_offset
    );

    Ok(Header {
        version,
        byte_order,
        file_type,
        title,
        variable_names,
        zones,
        aux_data,
        variable_aux_data,
        custom_labels,
        user_records,
        data_offset,
    })
}

fn read_file_type(cursor: &mut ByteCursor) -> Result<FileType> {
    let offset = cursor.position();
    let word = cursor.read_bytes(4)?;
    let as_float = f32::from_le_bytes([word[0], word[1], word[2], word[3]]);
    if as_float == ZONE_MARKER {
        return Ok(FileType::Full);
    }
    let as_int = i32::from_le_bytes([word[0], word[1], word[2], word[3]]);
    FileType::try_from(as_int).map_err(|_| PltError::HeaderSentinelMismatch {
        offset,
        expected: ZONE_MARKER,
        found: as_float,
    })
}
