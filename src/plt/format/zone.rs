//! Zone header record parsing.
//!
//! # Record Structure
//! ```text
//! [string]  Zone name
//! [i32]     Parent zone, -1 for none            (11.1+)
//! [i32]     Zone type code, 0..=7
//! [i32]     Data packing, 0 block / 1 point     (before 11.2)
//! [i32]     Specify var location; if 1, NumVars x i32 (0 node, 1 cell)
//! [i32]     Raw local face neighbors supplied
//! [i32]     Misc face-neighbor connections; if != 0: mode [, FE complete]
//! [i32..]   IMax JMax KMax                      (ordered)
//!           NumPts [faces x4] NumElements ICell JCell KCell   (FE)
//! [f64]     Solution time
//! [i32]     Strand id
//! [i32..]   NumVars x zone to share each variable with, -1 for none
//! [i32]     Zone to share connectivity with, -1 for none
//! [i32..]   Aux pairs: 1, name, value format (0), value ... then 0
//! ```
//! The leading 299.0 marker has already been consumed by the caller.

use log::{debug, trace};

use crate::plt::types::error::{PltError, Result};
use crate::plt::types::models::{
    AuxEntry, DataPacking, FaceNeighborMode, PltVersion, PolyFaces, ValueLocation, ZoneDescriptor,
    ZoneType,
};
use crate::plt::utils::ByteCursor;

/// Parses one zone record following its marker.
pub fn parse(
    cursor: &mut ByteCursor,
    version: PltVersion,
    num_vars: usize,
    index: usize,
) -> Result<ZoneDescriptor> {
    let start = cursor.position();
    let name = cursor.read_string()?;

    let parent_zone = if version.has_parent_zone() {
        read_optional_index(cursor, "parent zone")?
    } else {
        None
    };

    let type_offset = cursor.position();
    let type_code = cursor.read_i32()?;
    if !(0..=7).contains(&type_code) {
        return Err(PltError::InvalidValue {
            offset: type_offset,
            field: "zone type",
            value: type_code as i64,
        });
    }

    let packing = if version.has_data_packing() {
        let offset = cursor.position();
        match cursor.read_i32()? {
            0 => DataPacking::Block,
            1 => DataPacking::Point,
            other => {
                return Err(PltError::InvalidValue {
                    offset,
                    field: "data packing",
                    value: other as i64,
                })
            }
        }
    } else {
        DataPacking::Block
    };

    let locations = if cursor.read_i32()? != 0 {
        (0..num_vars)
            .map(|_| {
                let offset = cursor.position();
                match cursor.read_i32()? {
                    0 => Ok(ValueLocation::Node),
                    1 => Ok(ValueLocation::CellCentered),
                    other => Err(PltError::InvalidValue {
                        offset,
                        field: "variable location",
                        value: other as i64,
                    }),
                }
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![ValueLocation::Node; num_vars]
    };

    let raw_face_neighbors = cursor.read_i32()? != 0;
    let misc_connections = read_count(cursor, "face-neighbor connections")?;
    let face_neighbor_mode = if misc_connections > 0 {
        let offset = cursor.position();
        let mode = match cursor.read_i32()? {
            0 => FaceNeighborMode::LocalOneToOne,
            1 => FaceNeighborMode::LocalOneToMany,
            2 | 3 => FaceNeighborMode::Global,
            other => {
                return Err(PltError::InvalidValue {
                    offset,
                    field: "face-neighbor mode",
                    value: other as i64,
                })
            }
        };
        if type_code != 0 {
            let _completely_specified = cursor.read_i32()?;
        }
        mode
    } else {
        FaceNeighborMode::None
    };

    let dims_offset = cursor.position();
    let zone_type = parse_dimensions(cursor, type_code)?;
    check_extent(&zone_type, dims_offset)?;

    let solution_time = cursor.read_f64()?;
    let strand_id = cursor.read_i32()?;
    let shared_variables = (0..num_vars)
        .map(|variable| read_share(cursor, index, Some(variable)))
        .collect::<Result<Vec<_>>>()?;
    let shared_connectivity = read_share(cursor, index, None)?;
    let aux_data = parse_aux_entries(cursor)?;

    debug!(
        "Zone '{}' at offset {}: {} ({} points, {} elements), packing={:?}, strand={}, time={}",
        name,
        start,
        zone_type,
        zone_type.point_count(),
        zone_type.element_count(),
        packing,
        strand_id,
        solution_time
    );
    trace!(
        "Zone '{}' sharing: variables={:?}, connectivity={:?}",
        name, shared_variables, shared_connectivity
    );

    Ok(ZoneDescriptor {
        name,
        parent_zone,
        zone_type,
        packing,
        locations,
        raw_face_neighbors,
        face_neighbor_mode,
        misc_face_neighbor_connections: misc_connections,
        solution_time,
        strand_id,
        shared_variables,
        shared_connectivity,
        aux_data,
    })
}

fn parse_dimensions(cursor: &mut ByteCursor, type_code: i32) -> Result<ZoneType> {
    if type_code == 0 {
        let i_max = read_count(cursor, "IMax")?;
        let j_max = read_count(cursor, "JMax")?;
        let k_max = read_count(cursor, "KMax")?;
        return Ok(ZoneType::Ordered { i_max, j_max, k_max });
    }

    let points = read_count(cursor, "point count")?;
    let faces = if type_code >= 6 {
        PolyFaces {
            faces: read_count(cursor, "face count")?,
            face_nodes: read_count(cursor, "face node count")?,
            boundary_faces: read_count(cursor, "boundary face count")?,
            boundary_connections: read_count(cursor, "boundary connection count")?,
        }
    } else {
        PolyFaces::default()
    };
    let elements = read_count(cursor, "element count")?;
    // ICellDim, JCellDim, KCellDim are reserved.
    cursor.skip(12)?;

    Ok(match type_code {
        1 => ZoneType::FeLineSegment { points, elements },
        2 => ZoneType::FeTriangle { points, elements },
        3 => ZoneType::FeQuadrilateral { points, elements },
        4 => ZoneType::FeTetrahedron { points, elements },
        5 => ZoneType::FeBrick { points, elements },
        6 => ZoneType::FePolygon { points, elements, faces },
        _ => ZoneType::FePolyhedron { points, elements, faces },
    })
}

/// Rejects zones whose value arrays could not be sized in bytes, measured
/// against the widest (8-byte) value format.
fn check_extent(zone_type: &ZoneType, offset: usize) -> Result<()> {
    let counts = [
        ("point count", zone_type.checked_point_count()),
        ("element count", zone_type.checked_element_count()),
    ];
    for (field, count) in counts {
        if count.and_then(|n| n.checked_mul(8)).is_none() {
            return Err(PltError::InvalidValue {
                offset,
                field,
                value: count.and_then(|n| i64::try_from(n).ok()).unwrap_or(i64::MAX),
            });
        }
    }
    Ok(())
}

/// Reads name/value pairs until the zero flag.
///
/// Only string values (format 0) exist in the format.
pub fn parse_aux_entries(cursor: &mut ByteCursor) -> Result<Vec<AuxEntry>> {
    let mut entries = Vec::new();
    while cursor.read_i32()? != 0 {
        entries.push(parse_aux_pair(cursor)?);
    }
    Ok(entries)
}

/// Reads a single `name, value format, value` triple.
pub fn parse_aux_pair(cursor: &mut ByteCursor) -> Result<AuxEntry> {
    let name = cursor.read_string()?;
    let offset = cursor.position();
    let format = cursor.read_i32()?;
    if format != 0 {
        return Err(PltError::InvalidValue {
            offset,
            field: "auxiliary value format",
            value: format as i64,
        });
    }
    let value = cursor.read_string()?;
    trace!("Auxiliary data {} = {:?}", name, value);
    Ok(AuxEntry { name, value })
}

/// Reads a non-negative count.
pub fn read_count(cursor: &mut ByteCursor, field: &'static str) -> Result<usize> {
    let offset = cursor.position();
    let value = cursor.read_i32()?;
    usize::try_from(value).map_err(|_| PltError::InvalidValue {
        offset,
        field,
        value: value as i64,
    })
}

/// Reads a zero-based index where -1 means "none".
fn read_optional_index(cursor: &mut ByteCursor, field: &'static str) -> Result<Option<usize>> {
    let offset = cursor.position();
    match cursor.read_i32()? {
        -1 => Ok(None),
        value if value >= 0 => Ok(Some(value as usize)),
        value => Err(PltError::InvalidValue {
            offset,
            field,
            value: value as i64,
        }),
    }
}

/// Reads a sharing reference: -1 for none, otherwise a zero-based zone index.
///
/// Whether the target exists is only known once every zone has been read.
pub fn read_share(cursor: &mut ByteCursor, zone: usize, variable: Option<usize>) -> Result<Option<usize>> {
    match cursor.read_i32()? {
        -1 => Ok(None),
        target if target >= 0 => Ok(Some(target as usize)),
        target => Err(PltError::InvalidShareReference {
            zone,
            variable,
            target: target as i64,
            reason: "negative zone index",
        }),
    }
}
