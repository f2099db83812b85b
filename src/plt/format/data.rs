//! # Data Section Scanning
//!
//! Walks the data section that follows the end-of-header marker and records,
//! for every zone, where each variable's values live. Values themselves are
//! not decoded here; that is left to the materializer so it can run in any
//! order (or in parallel) once all record boundaries are known.
//!
//! ## Zone Data Record
//! ```text
//! [f32]     299.0 zone marker
//! [i32..]   NumVars format codes (1 f32, 2 f64, 3 i32, 4 i16, 5 u8, 6 bit)
//! [i32]     Has passive variables; if != 0, NumVars flags   (11.1+)
//! [i32]     Has variable sharing; if != 0, NumVars zone refs (-1 none)
//! [i32]     Zone to share connectivity with (-1 none)
//! [f64..]   (min, max) for each variable neither passive nor shared
//! [bytes]   Values of those variables (block or point packed)
//! [i32..]   Connectivity, FE zones that do not share it
//! ```
//!
//! Record sizes depend on each zone's own format codes, so zones can only
//! be located by walking them in order.

use log::{debug, info, trace};

use crate::plt::types::error::{PltError, Result};
use crate::plt::types::models::{
    Connectivity, DataPacking, FaceMap, Header, ValueFormat, ValueLocation, ZoneDescriptor, ZoneType,
};
use crate::plt::utils::ByteCursor;

use super::header::ZONE_MARKER;
use super::zone::read_share;

/// Location of one variable's values inside the buffer.
///
/// Value `i` starts at `start + i * stride`. Block-packed slots are
/// contiguous (`stride` equals the value width); point-packed slots
/// interleave all stored variables of the zone. Bit slots are always
/// contiguous and `stride` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSlot {
    pub start: usize,
    pub stride: usize,
    pub count: usize,
}

/// Where a variable's values come from in one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableStorage {
    Stored { slot: ValueSlot, min: f64, max: f64 },
    Passive,
    Shared(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub format: ValueFormat,
    pub location: ValueLocation,
    pub storage: VariableStorage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectivityRecord {
    Stored(Connectivity),
    Shared(usize),
}

/// The payload side of one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRecord {
    pub zone: usize,
    /// Offset of the zone marker.
    pub offset: usize,
    pub variables: Vec<VariableRecord>,
    /// `None` for ordered zones.
    pub connectivity: Option<ConnectivityRecord>,
}

/// Scans the data records of every zone, in zone order.
pub fn scan(data: &[u8], header: &Header) -> Result<Vec<ZoneRecord>> {
    info!(
        "Scanning data section at offset {} for {} zones",
        header.data_offset,
        header.zones.len()
    );
    let mut cursor = ByteCursor::at(data, header.data_offset)?;
    let records = header
        .zones
        .iter()
        .enumerate()
        .map(|(index, zone)| scan_zone(&mut cursor, header, index, zone))
        .collect::<Result<Vec<_>>>()?;
    debug!("Data section ends at offset {}", cursor.position());
    Ok(records)
}

fn scan_zone(
    cursor: &mut ByteCursor,
    header: &Header,
    index: usize,
    zone: &ZoneDescriptor,
) -> Result<ZoneRecord> {
    let num_vars = header.num_vars();
    let offset = cursor.position();
    let marker = cursor.read_f32()?;
    if marker != ZONE_MARKER {
        return Err(PltError::ZoneMarkerMismatch { offset, zone: index, found: marker });
    }

    let formats = (0..num_vars)
        .map(|variable| {
            let offset = cursor.position();
            let code = cursor.read_i32()?;
            ValueFormat::from_code(code).ok_or(PltError::UnsupportedFormatCode {
                offset,
                zone: index,
                variable,
                code,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let passive = if header.version.has_passive_variables() && cursor.read_i32()? != 0 {
        (0..num_vars)
            .map(|_| cursor.read_i32().map(|flag| flag != 0))
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![false; num_vars]
    };

    if cursor.read_i32()? != 0 {
        for variable in 0..num_vars {
            let shared = read_share(cursor, index, Some(variable))?;
            if shared != zone.shared_variables[variable] {
                return Err(PltError::SharingMismatch {
                    zone: index,
                    variable: Some(variable),
                    header: zone.shared_variables[variable],
                    data: shared,
                });
            }
        }
    }

    let shared_connectivity = read_share(cursor, index, None)?;
    if shared_connectivity != zone.shared_connectivity {
        return Err(PltError::SharingMismatch {
            zone: index,
            variable: None,
            header: zone.shared_connectivity,
            data: shared_connectivity,
        });
    }

    // Sharing wins over a passive flag: shared values are never stored.
    let stored: Vec<usize> = (0..num_vars)
        .filter(|&v| zone.shared_variables[v].is_none() && !passive[v])
        .collect();

    let mut ranges = Vec::with_capacity(stored.len());
    for _ in &stored {
        let min = cursor.read_f64()?;
        let max = cursor.read_f64()?;
        ranges.push((min, max));
    }

    let slots = match zone.packing {
        DataPacking::Block => block_slots(cursor, zone, &stored, &formats)?,
        DataPacking::Point => point_slots(cursor, zone, &stored, &formats)?,
    };

    let mut variables: Vec<VariableRecord> = (0..num_vars)
        .map(|v| VariableRecord {
            format: formats[v],
            location: zone.locations[v],
            storage: match zone.shared_variables[v] {
                Some(source) => VariableStorage::Shared(source),
                None => VariableStorage::Passive,
            },
        })
        .collect();
    for ((&v, slot), (min, max)) in stored.iter().zip(slots).zip(ranges) {
        variables[v].storage = VariableStorage::Stored { slot, min, max };
    }

    let connectivity = if zone.zone_type.is_finite_element() {
        Some(match zone.shared_connectivity {
            Some(source) => ConnectivityRecord::Shared(source),
            None => ConnectivityRecord::Stored(read_connectivity(cursor, &zone.zone_type)?),
        })
    } else {
        None
    };

    if zone.raw_face_neighbors || zone.misc_face_neighbor_connections > 0 {
        return Err(PltError::Unsupported {
            offset: cursor.position(),
            feature: "face-neighbor connection data",
        });
    }

    debug!(
        "Zone {} ('{}') record at offset {}: {} stored, {} passive, {} shared variables",
        index,
        zone.name,
        offset,
        stored.len(),
        variables.iter().filter(|v| v.storage == VariableStorage::Passive).count(),
        zone.shared_variables.iter().filter(|s| s.is_some()).count()
    );

    Ok(ZoneRecord {
        zone: index,
        offset,
        variables,
        connectivity,
    })
}

/// Each stored variable occupies one contiguous run.
fn block_slots(
    cursor: &mut ByteCursor,
    zone: &ZoneDescriptor,
    stored: &[usize],
    formats: &[ValueFormat],
) -> Result<Vec<ValueSlot>> {
    stored
        .iter()
        .map(|&v| {
            let format = formats[v];
            let count = zone.value_count(v);
            let slot = ValueSlot {
                start: cursor.position(),
                stride: format.byte_width().unwrap_or(0),
                count,
            };
            let len = format.payload_len(count).ok_or(PltError::InvalidValue {
                offset: slot.start,
                field: "point count",
                value: i64::try_from(count).unwrap_or(i64::MAX),
            })?;
            trace!("Variable {} block: {} values ({:?}) in {} bytes at {}", v, count, format, len, slot.start);
            cursor.skip(len)?;
            Ok(slot)
        })
        .collect()
}

/// Stored variables are interleaved point by point.
fn point_slots(
    cursor: &mut ByteCursor,
    zone: &ZoneDescriptor,
    stored: &[usize],
    formats: &[ValueFormat],
) -> Result<Vec<ValueSlot>> {
    let start = cursor.position();
    let mut widths = Vec::with_capacity(stored.len());
    for &v in stored {
        if zone.locations[v] != ValueLocation::Node {
            return Err(PltError::Unsupported {
                offset: start,
                feature: "cell-centered variable in point-packed zone",
            });
        }
        let width = formats[v].byte_width().ok_or(PltError::Unsupported {
            offset: start,
            feature: "bit variable in point-packed zone",
        })?;
        widths.push(width);
    }

    let stride: usize = widths.iter().sum();
    let count = zone.point_count();
    let mut field_offset = 0;
    let slots = widths
        .iter()
        .map(|width| {
            let slot = ValueSlot {
                start: start + field_offset,
                stride,
                count,
            };
            field_offset += *width;
            slot
        })
        .collect();
    let len = stride.checked_mul(count).ok_or(PltError::InvalidValue {
        offset: start,
        field: "point count",
        value: i64::try_from(count).unwrap_or(i64::MAX),
    })?;
    trace!("Point-packed zone: {} points, {} bytes per point", count, stride);
    cursor.skip(len)?;
    Ok(slots)
}

fn read_connectivity(cursor: &mut ByteCursor, zone_type: &ZoneType) -> Result<Connectivity> {
    let offset = cursor.position();
    if let Some(nodes_per_element) = zone_type.nodes_per_element() {
        let count = zone_type
            .element_count()
            .checked_mul(nodes_per_element)
            .ok_or(PltError::InvalidValue {
                offset,
                field: "element count",
                value: i64::try_from(zone_type.element_count()).unwrap_or(i64::MAX),
            })?;
        let nodes = cursor.read_i32_vec(count)?;
        trace!("Read {} connectivity entries at offset {}", nodes.len(), offset);
        return Ok(Connectivity::Elements { nodes_per_element, nodes });
    }

    let faces = zone_type.poly_faces().unwrap_or_default();
    let (face_node_offsets, face_nodes) = match zone_type {
        ZoneType::FePolyhedron { .. } => {
            let offsets = cursor.read_i32_vec(faces.faces.saturating_add(1))?;
            (offsets, cursor.read_i32_vec(faces.face_nodes)?)
        }
        _ => {
            let nodes = cursor.read_i32_vec(faces.faces.saturating_mul(2))?;
            let offsets = (0..=faces.faces as i32).map(|f| f * 2).collect::<Vec<i32>>();
            (offsets, nodes)
        }
    };
    let left_elements = cursor.read_i32_vec(faces.faces)?;
    let right_elements = cursor.read_i32_vec(faces.faces)?;
    let mut map = FaceMap {
        face_node_offsets,
        face_nodes,
        left_elements,
        right_elements,
        ..FaceMap::default()
    };
    if faces.boundary_faces > 0 {
        map.boundary_connection_counts = cursor.read_i32_vec(faces.boundary_faces)?;
        map.boundary_elements = cursor.read_i32_vec(faces.boundary_connections)?;
        map.boundary_zones = cursor.read_i32_vec(faces.boundary_connections)?;
    }
    trace!("Read face map of {} faces at offset {}", faces.faces, offset);
    Ok(Connectivity::Faces(map))
}
