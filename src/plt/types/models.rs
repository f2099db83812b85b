//! Core data structures for Tecplot binary format components.
//!
//! This module defines the fundamental types used throughout the library:
//! - Version, file type and zone type enumerations
//! - The parsed header and its zone descriptors
//! - Decoded value arrays, connectivity and the assembled result

use std::fmt;
use std::sync::Arc;

use crate::plt::directory::ZoneDirectory;
use super::error::{PltError, Result};

/// The supported `.plt` dialects, identified by the 8-byte magic tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PltVersion {
    V102,
    V111,
    V112,
}

impl PltVersion {
    /// Returns the magic tag that opens a file of this dialect.
    pub fn magic(&self) -> &'static [u8; 8] {
        match self {
            PltVersion::V102 => b"#!TDV102",
            PltVersion::V111 => b"#!TDV111",
            PltVersion::V112 => b"#!TDV112",
        }
    }

    /// Zone records carry a parent-zone field from 11.1 onwards.
    pub fn has_parent_zone(&self) -> bool {
        *self >= PltVersion::V111
    }

    /// Legacy dialects store an explicit block/point packing code per zone.
    pub fn has_data_packing(&self) -> bool {
        *self < PltVersion::V112
    }

    /// Data records carry passive-variable flags from 11.1 onwards.
    pub fn has_passive_variables(&self) -> bool {
        *self >= PltVersion::V111
    }
}

impl TryFrom<&[u8]> for PltVersion {
    type Error = PltError;
    fn try_from(magic: &[u8]) -> Result<Self> {
        [PltVersion::V102, PltVersion::V111, PltVersion::V112]
            .into_iter()
            .find(|version| version.magic().as_slice() == magic)
            .ok_or_else(|| PltError::UnsupportedVersion {
                found: String::from_utf8_lossy(magic).into_owned(),
            })
    }
}

impl fmt::Display for PltVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.magic()))
    }
}

/// What the file contains: grid and solution, grid only, or solution only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    #[default]
    Full,
    Grid,
    Solution,
}

impl TryFrom<i32> for FileType {
    type Error = i32;
    fn try_from(value: i32) -> std::result::Result<Self, i32> {
        match value {
            0 => Ok(Self::Full),
            1 => Ok(Self::Grid),
            2 => Ok(Self::Solution),
            other => Err(other),
        }
    }
}

/// Face counts of a polygonal or polyhedral zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolyFaces {
    pub faces: usize,
    /// Total number of face nodes over all faces.
    pub face_nodes: usize,
    pub boundary_faces: usize,
    pub boundary_connections: usize,
}

/// Zone geometry, carrying only the dimensions relevant to each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneType {
    Ordered { i_max: usize, j_max: usize, k_max: usize },
    FeLineSegment { points: usize, elements: usize },
    FeTriangle { points: usize, elements: usize },
    FeQuadrilateral { points: usize, elements: usize },
    FeTetrahedron { points: usize, elements: usize },
    FeBrick { points: usize, elements: usize },
    FePolygon { points: usize, elements: usize, faces: PolyFaces },
    FePolyhedron { points: usize, elements: usize, faces: PolyFaces },
}

impl ZoneType {
    /// The on-disk zone type code.
    pub fn code(&self) -> i32 {
        match self {
            ZoneType::Ordered { .. } => 0,
            ZoneType::FeLineSegment { .. } => 1,
            ZoneType::FeTriangle { .. } => 2,
            ZoneType::FeQuadrilateral { .. } => 3,
            ZoneType::FeTetrahedron { .. } => 4,
            ZoneType::FeBrick { .. } => 5,
            ZoneType::FePolygon { .. } => 6,
            ZoneType::FePolyhedron { .. } => 7,
        }
    }

    pub fn is_finite_element(&self) -> bool {
        !matches!(self, ZoneType::Ordered { .. })
    }

    /// Number of node indices per element in classic FE connectivity.
    ///
    /// `None` for ordered zones and for face-based (poly) zones.
    pub fn nodes_per_element(&self) -> Option<usize> {
        match self {
            ZoneType::FeLineSegment { .. } => Some(2),
            ZoneType::FeTriangle { .. } => Some(3),
            ZoneType::FeQuadrilateral { .. } | ZoneType::FeTetrahedron { .. } => Some(4),
            ZoneType::FeBrick { .. } => Some(8),
            ZoneType::Ordered { .. } | ZoneType::FePolygon { .. } | ZoneType::FePolyhedron { .. } => None,
        }
    }

    /// Number of points, `None` when the declared extent overflows `usize`.
    pub fn checked_point_count(&self) -> Option<usize> {
        match *self {
            ZoneType::Ordered { i_max, j_max, k_max } => i_max.checked_mul(j_max)?.checked_mul(k_max),
            ZoneType::FeLineSegment { points, .. }
            | ZoneType::FeTriangle { points, .. }
            | ZoneType::FeQuadrilateral { points, .. }
            | ZoneType::FeTetrahedron { points, .. }
            | ZoneType::FeBrick { points, .. }
            | ZoneType::FePolygon { points, .. }
            | ZoneType::FePolyhedron { points, .. } => Some(points),
        }
    }

    /// Number of cells, `None` when the declared extent overflows `usize`.
    ///
    /// Cells of an ordered zone collapse degenerate directions to one cell.
    pub fn checked_element_count(&self) -> Option<usize> {
        match *self {
            ZoneType::Ordered { i_max, j_max, k_max } => [i_max, j_max, k_max]
                .iter()
                .try_fold(1usize, |acc, &dim| acc.checked_mul(dim.saturating_sub(1).max(1))),
            ZoneType::FeLineSegment { elements, .. }
            | ZoneType::FeTriangle { elements, .. }
            | ZoneType::FeQuadrilateral { elements, .. }
            | ZoneType::FeTetrahedron { elements, .. }
            | ZoneType::FeBrick { elements, .. }
            | ZoneType::FePolygon { elements, .. }
            | ZoneType::FePolyhedron { elements, .. } => Some(elements),
        }
    }

    /// Saturates at `usize::MAX`; zones read from a file never overflow.
    pub fn point_count(&self) -> usize {
        self.checked_point_count().unwrap_or(usize::MAX)
    }

    /// Saturates at `usize::MAX`; zones read from a file never overflow.
    pub fn element_count(&self) -> usize {
        self.checked_element_count().unwrap_or(usize::MAX)
    }

    pub fn poly_faces(&self) -> Option<PolyFaces> {
        match *self {
            ZoneType::FePolygon { faces, .. } | ZoneType::FePolyhedron { faces, .. } => Some(faces),
            _ => None,
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ZoneType::Ordered { .. } => "ORDERED",
            ZoneType::FeLineSegment { .. } => "FELINESEG",
            ZoneType::FeTriangle { .. } => "FETRIANGLE",
            ZoneType::FeQuadrilateral { .. } => "FEQUADRILATERAL",
            ZoneType::FeTetrahedron { .. } => "FETETRAHEDRON",
            ZoneType::FeBrick { .. } => "FEBRICK",
            ZoneType::FePolygon { .. } => "FEPOLYGON",
            ZoneType::FePolyhedron { .. } => "FEPOLYHEDRON",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataPacking {
    #[default]
    Block,
    Point,
}

/// Where a variable's values live on the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueLocation {
    #[default]
    Node,
    CellCentered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaceNeighborMode {
    #[default]
    None,
    LocalOneToOne,
    LocalOneToMany,
    Global,
}

/// Per-variable numeric encoding selected in each zone's data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Float32,
    Float64,
    Int32,
    Int16,
    Byte,
    Bit,
}

impl ValueFormat {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Float32),
            2 => Some(Self::Float64),
            3 => Some(Self::Int32),
            4 => Some(Self::Int16),
            5 => Some(Self::Byte),
            6 => Some(Self::Bit),
            _ => None,
        }
    }

    /// Size of one stored value in bytes; `None` for bit-packed values.
    pub fn byte_width(&self) -> Option<usize> {
        match self {
            ValueFormat::Float32 | ValueFormat::Int32 => Some(4),
            ValueFormat::Float64 => Some(8),
            ValueFormat::Int16 => Some(2),
            ValueFormat::Byte => Some(1),
            ValueFormat::Bit => None,
        }
    }

    /// Number of payload bytes needed for `count` values of this format,
    /// `None` on overflow.
    pub fn payload_len(&self, count: usize) -> Option<usize> {
        match self.byte_width() {
            Some(width) => count.checked_mul(width),
            None => Some(count.div_ceil(8)),
        }
    }
}

/// An opaque auxiliary name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxEntry {
    pub name: String,
    pub value: String,
}

/// An auxiliary pair attached to one variable of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableAuxEntry {
    pub variable: usize,
    pub name: String,
    pub value: String,
}

/// Header-side description of one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDescriptor {
    pub name: String,
    pub parent_zone: Option<usize>,
    pub zone_type: ZoneType,
    pub packing: DataPacking,
    /// One entry per dataset variable.
    pub locations: Vec<ValueLocation>,
    pub raw_face_neighbors: bool,
    pub face_neighbor_mode: FaceNeighborMode,
    pub misc_face_neighbor_connections: usize,
    pub solution_time: f64,
    pub strand_id: i32,
    /// For each variable, the zone its values are shared from.
    pub shared_variables: Vec<Option<usize>>,
    pub shared_connectivity: Option<usize>,
    pub aux_data: Vec<AuxEntry>,
}

impl ZoneDescriptor {
    pub fn point_count(&self) -> usize {
        self.zone_type.point_count()
    }

    pub fn element_count(&self) -> usize {
        self.zone_type.element_count()
    }

    /// Length of a variable's array given its location in this zone.
    pub fn value_count(&self, variable: usize) -> usize {
        match self.locations.get(variable).copied().unwrap_or_default() {
            ValueLocation::Node => self.point_count(),
            ValueLocation::CellCentered => self.element_count(),
        }
    }
}

/// Complete parsed header of a `.plt` file.
///
/// Produced by [`read_header`](crate::read_header) before any data byte is
/// touched. `data_offset` is the absolute position right after the
/// end-of-header marker, where the first zone data record begins.
#[derive(Debug, Clone)]
pub struct Header {
    pub version: PltVersion,
    pub byte_order: i32,
    pub file_type: FileType,
    pub title: String,
    pub variable_names: Vec<String>,
    pub zones: ZoneDirectory,
    pub aux_data: Vec<AuxEntry>,
    pub variable_aux_data: Vec<VariableAuxEntry>,
    pub custom_labels: Vec<Vec<String>>,
    pub user_records: Vec<String>,
    pub data_offset: usize,
}

impl Header {
    pub fn num_vars(&self) -> usize {
        self.variable_names.len()
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_names.iter().position(|n| n == name)
    }
}

/// A typed, fixed-length numeric sequence decoded from one variable.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueArray {
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    /// Int32 values, and Int16 values sign-extended to 32 bits.
    Int(Vec<i32>),
    Byte(Vec<u8>),
    /// Unpacked bits, one 0/1 value per element.
    Bit(Vec<u8>),
}

impl ValueArray {
    /// A zero-filled array in the representation of `format`.
    pub fn zeros(format: ValueFormat, len: usize) -> Self {
        match format {
            ValueFormat::Float32 => ValueArray::Float32(vec![0.0; len]),
            ValueFormat::Float64 => ValueArray::Float64(vec![0.0; len]),
            ValueFormat::Int32 | ValueFormat::Int16 => ValueArray::Int(vec![0; len]),
            ValueFormat::Byte => ValueArray::Byte(vec![0; len]),
            ValueFormat::Bit => ValueArray::Bit(vec![0; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValueArray::Float32(v) => v.len(),
            ValueArray::Float64(v) => v.len(),
            ValueArray::Int(v) => v.len(),
            ValueArray::Byte(v) | ValueArray::Bit(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            ValueArray::Float32(v) => v.get(index).map(|&x| x as f64),
            ValueArray::Float64(v) => v.get(index).copied(),
            ValueArray::Int(v) => v.get(index).map(|&x| x as f64),
            ValueArray::Byte(v) | ValueArray::Bit(v) => v.get(index).map(|&x| x as f64),
        }
    }

    /// Widens every value to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            ValueArray::Float32(v) => v.iter().map(|&x| x as f64).collect(),
            ValueArray::Float64(v) => v.clone(),
            ValueArray::Int(v) => v.iter().map(|&x| x as f64).collect(),
            ValueArray::Byte(v) | ValueArray::Bit(v) => v.iter().map(|&x| x as f64).collect(),
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            ValueArray::Float32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            ValueArray::Float64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&[i32]> {
        match self {
            ValueArray::Int(v) => Some(v),
            _ => None,
        }
    }
}

/// Face-based connectivity of polygonal and polyhedral zones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FaceMap {
    /// Offsets into `face_nodes`, `faces + 1` entries. Polygon faces always
    /// have two nodes, so polygonal zones derive offsets instead of storing them.
    pub face_node_offsets: Vec<i32>,
    pub face_nodes: Vec<i32>,
    pub left_elements: Vec<i32>,
    pub right_elements: Vec<i32>,
    pub boundary_connection_counts: Vec<i32>,
    pub boundary_elements: Vec<i32>,
    pub boundary_zones: Vec<i32>,
}

/// Element-to-node (or face) connectivity of a finite-element zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connectivity {
    Elements {
        nodes_per_element: usize,
        /// Zero-based node indices, `nodes_per_element` per element.
        nodes: Vec<i32>,
    },
    Faces(FaceMap),
}

impl Connectivity {
    /// Node indices of one element of classic FE connectivity.
    pub fn element(&self, index: usize) -> Option<&[i32]> {
        match self {
            Connectivity::Elements { nodes_per_element, nodes } => {
                let start = index * nodes_per_element;
                nodes.get(start..start + nodes_per_element)
            }
            Connectivity::Faces(_) => None,
        }
    }
}

/// One decoded variable of one zone.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub format: ValueFormat,
    pub location: ValueLocation,
    pub passive: bool,
    /// Zone the values were taken from, if shared.
    pub shared_from: Option<usize>,
    /// Stored range; `None` for passive and shared variables.
    pub range: Option<(f64, f64)>,
    pub values: Arc<ValueArray>,
}

/// All decoded arrays of one zone.
#[derive(Debug, Clone)]
pub struct ZoneData {
    pub index: usize,
    pub name: String,
    pub variables: Vec<Variable>,
    pub connectivity: Option<Arc<Connectivity>>,
}

impl ZoneData {
    /// Looks a variable up by name; the first declared match wins.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn values(&self, name: &str) -> Option<&ValueArray> {
        self.variable(name).map(|v| v.values.as_ref())
    }
}

/// The decoded data section: one entry per zone in declaration order.
#[derive(Debug, Clone, Default)]
pub struct PltData {
    pub zones: Vec<ZoneData>,
}

impl PltData {
    pub fn zone(&self, index: usize) -> Option<&ZoneData> {
        self.zones.get(index)
    }

    pub fn zone_by_name(&self, name: &str) -> Option<&ZoneData> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
