use plt_reader::{
    read_data, read_data_from, read_data_with, read_header, Connectivity, DecodeOptions, FileType,
    PltError, PltReader, PltVersion, ValueArray, ValueLocation, ZoneDescriptor, ZoneDirectory,
    ZoneType,
};
use std::io::{Cursor, Write};
use std::sync::Arc;

const ZONE: f32 = 299.0;
const END_OF_HEADER: f32 = 357.0;

struct Plt(Vec<u8>);

impl Plt {
    fn new(magic: &[u8; 8], variables: &[&str]) -> Self {
        let plt = Plt(magic.to_vec()).i32(1).f32(ZONE).string("T");
        variables
            .iter()
            .fold(plt.i32(variables.len() as i32), |p, name| p.string(name))
    }

    fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i32s(self, vs: &[i32]) -> Self {
        vs.iter().fold(self, |p, &v| p.i32(v))
    }

    fn i16s(mut self, vs: &[i16]) -> Self {
        for v in vs {
            self.0.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    fn f32(mut self, v: f32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn f32s(self, vs: &[f32]) -> Self {
        vs.iter().fold(self, |p, &v| p.f32(v))
    }

    fn f64(mut self, v: f64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn f64s(self, vs: &[f64]) -> Self {
        vs.iter().fold(self, |p, &v| p.f64(v))
    }

    fn string(self, s: &str) -> Self {
        s.chars().fold(self, |p, c| p.i32(c as i32)).i32(0)
    }

    fn ranges(self, count: usize) -> Self {
        (0..count).fold(self, |p, _| p.f64(0.0).f64(1.0))
    }

    /// A V112 zone record. `dims` is IJK for ordered zones, points and
    /// elements otherwise.
    fn zone(self, zone: &Zone) -> Self {
        let mut p = self.f32(ZONE).string(zone.name).i32(-1).i32(zone.type_code);
        p = match zone.locations {
            Some(locations) => p.i32(1).i32s(locations),
            None => p.i32(0),
        };
        p = p.i32(0).i32(0).i32s(zone.dims);
        if zone.type_code != 0 {
            p = p.i32s(&[0, 0, 0]);
        }
        p.f64(zone.time)
            .i32(zone.strand)
            .i32s(zone.shared)
            .i32(zone.shared_connectivity)
            .i32(0)
    }

    fn end_header(self) -> Self {
        self.f32(END_OF_HEADER)
    }

    /// Zone marker, formats and a data record without passive or sharing blocks.
    fn plain_record(self, formats: &[i32]) -> Self {
        self.f32(ZONE).i32s(formats).i32(0).i32(0).i32(-1)
    }
}

struct Zone<'a> {
    name: &'a str,
    type_code: i32,
    dims: &'a [i32],
    locations: Option<&'a [i32]>,
    shared: &'a [i32],
    shared_connectivity: i32,
    time: f64,
    strand: i32,
}

impl<'a> Zone<'a> {
    fn ordered(name: &'a str, dims: &'a [i32], shared: &'a [i32]) -> Self {
        Zone {
            name,
            type_code: 0,
            dims,
            locations: None,
            shared,
            shared_connectivity: -1,
            time: 0.0,
            strand: -1,
        }
    }
}

fn minimal() -> Vec<u8> {
    Plt::new(b"#!TDV112", &["X"])
        .zone(&Zone::ordered("Zone 1", &[3, 1, 1], &[-1]))
        .end_header()
        .plain_record(&[1])
        .f64(1.0)
        .f64(3.0)
        .f32s(&[1.0, 2.0, 3.0])
        .0
}

#[test]
fn decodes_minimal_file() {
    let bytes = minimal();
    let header = read_header(&bytes).unwrap();
    assert_eq!(header.version, PltVersion::V112);
    assert_eq!(header.file_type, FileType::Full);
    assert_eq!(header.title, "T");
    assert_eq!(header.num_vars(), 1);
    assert_eq!(header.zones.len(), 1);
    assert_eq!(
        header.zones.get(0).unwrap().zone_type,
        ZoneType::Ordered { i_max: 3, j_max: 1, k_max: 1 }
    );

    let data = read_data(&bytes, &header).unwrap();
    assert_eq!(data.len(), 1);
    let zone = data.zone(0).unwrap();
    assert_eq!(zone.name, "Zone 1");
    assert_eq!(zone.values("X").unwrap().as_f32(), Some(&[1.0f32, 2.0, 3.0][..]));
    assert_eq!(zone.variable("X").unwrap().range, Some((1.0, 3.0)));
}

#[test]
fn header_pass_keeps_zone_metadata() {
    let bytes = Plt::new(b"#!TDV112", &["X", "P"])
        .zone(&Zone {
            locations: Some(&[0, 1]),
            time: 0.25,
            strand: 3,
            ..Zone::ordered("fluid", &[4, 3, 1], &[-1, -1])
        })
        .end_header()
        .0;
    let header = read_header(&bytes).unwrap();
    let zone = header.zones.get(0).unwrap();

    assert_eq!(zone.solution_time, 0.25);
    assert_eq!(zone.strand_id, 3);
    assert_eq!(zone.locations, vec![ValueLocation::Node, ValueLocation::CellCentered]);
    assert_eq!(header.zones.point_count(0), Some(12));
    assert_eq!(header.zones.element_count(0), Some(6));
    assert_eq!(header.zones.value_count(0, 1), Some(6));
    assert_eq!(header.zones.find("fluid"), Some(0));
    assert_eq!(header.data_offset, bytes.len());
}

#[test]
fn forward_sharing_reuses_source_values() {
    let bytes = Plt::new(b"#!TDV112", &["X", "Y"])
        .zone(&Zone::ordered("a", &[2, 1, 1], &[-1, 1]))
        .zone(&Zone::ordered("b", &[2, 1, 1], &[-1, -1]))
        .end_header()
        .f32(ZONE)
        .i32s(&[1, 1])
        .i32(0)
        .i32(1)
        .i32s(&[-1, 1])
        .i32(-1)
        .ranges(1)
        .f32s(&[0.0, 1.0])
        .plain_record(&[1, 1])
        .ranges(2)
        .f32s(&[2.0, 3.0, 7.0, 8.0])
        .0;
    let header = read_header(&bytes).unwrap();
    let data = read_data(&bytes, &header).unwrap();

    let a = data.zone(0).unwrap();
    let b = data.zone(1).unwrap();
    let shared = a.variable("Y").unwrap();
    assert_eq!(shared.shared_from, Some(1));
    assert_eq!(shared.values.as_f32(), Some(&[7.0f32, 8.0][..]));
    assert!(Arc::ptr_eq(&shared.values, &b.variable("Y").unwrap().values));
    assert_eq!(a.values("X").unwrap().as_f32(), Some(&[0.0f32, 1.0][..]));
}

#[test]
fn passive_variables_are_zero() {
    let bytes = Plt::new(b"#!TDV112", &["X", "T"])
        .zone(&Zone::ordered("z", &[4, 1, 1], &[-1, -1]))
        .end_header()
        .f32(ZONE)
        .i32s(&[2, 3])
        .i32(1)
        .i32s(&[0, 1])
        .i32(0)
        .i32(-1)
        .ranges(1)
        .f64s(&[1.0, 2.0, 3.0, 4.0])
        .0;
    let header = read_header(&bytes).unwrap();
    let data = read_data(&bytes, &header).unwrap();

    let t = data.zone(0).unwrap().variable("T").unwrap();
    assert!(t.passive);
    assert_eq!(t.range, None);
    assert_eq!(*t.values, ValueArray::Int(vec![0; 4]));
}

#[test]
fn triangle_zones_share_connectivity() {
    let triangle = |name: &'static str, shared_connectivity: i32| Zone {
        name,
        type_code: 2,
        dims: &[4, 2],
        locations: Some(&[0, 1]),
        shared: &[-1, -1],
        shared_connectivity,
        time: 0.0,
        strand: -1,
    };
    let bytes = Plt::new(b"#!TDV112", &["X", "P"])
        .zone(&triangle("first", -1))
        .zone(&triangle("second", 0))
        .end_header()
        .plain_record(&[1, 1])
        .ranges(2)
        .f32s(&[0.0, 1.0, 0.0, 1.0])
        .f32s(&[10.0, 20.0])
        .i32s(&[0, 1, 2, 1, 3, 2])
        .f32(ZONE)
        .i32s(&[1, 1])
        .i32(0)
        .i32(0)
        .i32(0)
        .ranges(2)
        .f32s(&[0.0, 2.0, 0.0, 2.0])
        .f32s(&[30.0, 40.0])
        .0;
    let header = read_header(&bytes).unwrap();
    let data = read_data(&bytes, &header).unwrap();

    let first = data.zone(0).unwrap();
    let second = data.zone(1).unwrap();
    assert_eq!(first.values("X").unwrap().len(), 4);
    assert_eq!(first.values("P").unwrap().len(), 2);
    assert_eq!(second.values("P").unwrap().as_f32(), Some(&[30.0f32, 40.0][..]));

    let connectivity = first.connectivity.as_ref().unwrap();
    assert_eq!(connectivity.element(1), Some(&[1, 3, 2][..]));
    assert!(matches!(**connectivity, Connectivity::Elements { nodes_per_element: 3, .. }));
    assert!(Arc::ptr_eq(connectivity, second.connectivity.as_ref().unwrap()));
}

#[test]
fn decodes_every_value_format() {
    let bytes = Plt::new(b"#!TDV112", &["F", "D", "L", "S", "B", "BIT"])
        .zone(&Zone::ordered("z", &[3, 1, 1], &[-1; 6]))
        .end_header()
        .plain_record(&[1, 2, 3, 4, 5, 6])
        .ranges(6)
        .f32s(&[1.5, 2.5, 3.5])
        .f64s(&[-0.25, 0.0, 1e10])
        .i32s(&[-1, 0, 7])
        .i16s(&[-2, 300, 5])
        .raw(&[0, 128, 255])
        .raw(&[0b1010_0000])
        .0;
    let header = read_header(&bytes).unwrap();
    let zone = read_data(&bytes, &header).unwrap().zones.remove(0);

    assert_eq!(*zone.values("F").unwrap(), ValueArray::Float32(vec![1.5, 2.5, 3.5]));
    assert_eq!(*zone.values("D").unwrap(), ValueArray::Float64(vec![-0.25, 0.0, 1e10]));
    assert_eq!(*zone.values("L").unwrap(), ValueArray::Int(vec![-1, 0, 7]));
    assert_eq!(*zone.values("S").unwrap(), ValueArray::Int(vec![-2, 300, 5]));
    assert_eq!(*zone.values("B").unwrap(), ValueArray::Byte(vec![0, 128, 255]));
    assert_eq!(*zone.values("BIT").unwrap(), ValueArray::Bit(vec![1, 0, 1]));
    assert_eq!(zone.values("S").unwrap().to_f64_vec(), vec![-2.0, 300.0, 5.0]);
}

#[test]
fn parallel_and_serial_decode_agree() {
    let bytes = Plt::new(b"#!TDV112", &["X", "Y"])
        .zone(&Zone::ordered("a", &[3, 1, 1], &[-1, -1]))
        .zone(&Zone::ordered("b", &[3, 1, 1], &[0, -1]))
        .end_header()
        .plain_record(&[1, 2])
        .ranges(2)
        .f32s(&[1.0, 2.0, 3.0])
        .f64s(&[4.0, 5.0, 6.0])
        .f32(ZONE)
        .i32s(&[1, 2])
        .i32(0)
        .i32(1)
        .i32s(&[0, -1])
        .i32(-1)
        .ranges(1)
        .f64s(&[7.0, 8.0, 9.0])
        .0;
    let header = read_header(&bytes).unwrap();
    let serial = read_data(&bytes, &header).unwrap();
    let parallel = read_data_with(&bytes, &header, &DecodeOptions { parallel: true }).unwrap();

    for (s, p) in serial.zones.iter().zip(&parallel.zones) {
        assert_eq!(s.name, p.name);
        for (sv, pv) in s.variables.iter().zip(&p.variables) {
            assert_eq!(sv.values, pv.values);
            assert_eq!(sv.shared_from, pv.shared_from);
        }
    }
    assert_eq!(
        parallel.zone(1).unwrap().values("X").unwrap().as_f32(),
        Some(&[1.0f32, 2.0, 3.0][..])
    );
}

#[test]
fn truncated_title_is_reported() {
    let bytes = Plt(b"#!TDV112".to_vec()).i32(1).i32(0).i32('a' as i32).i32('b' as i32).0;
    assert!(matches!(
        read_header(&bytes),
        Err(PltError::TruncatedInput { offset: 24, .. })
    ));
}

#[test]
fn share_target_out_of_range() {
    let bytes = Plt::new(b"#!TDV112", &["X"])
        .zone(&Zone::ordered("z", &[2, 1, 1], &[4]))
        .end_header()
        .0;
    match read_header(&bytes) {
        Err(PltError::InvalidShareReference { zone, variable, target, .. }) => {
            assert_eq!(zone, 0);
            assert_eq!(variable, Some(0));
            assert_eq!(target, 4);
        }
        other => panic!("expected InvalidShareReference, got {:?}", other),
    }
}

#[test]
fn data_section_sharing_must_agree() {
    let bytes = Plt::new(b"#!TDV112", &["X"])
        .zone(&Zone::ordered("a", &[2, 1, 1], &[-1]))
        .zone(&Zone::ordered("b", &[2, 1, 1], &[-1]))
        .end_header()
        .plain_record(&[1])
        .ranges(1)
        .f32s(&[0.0, 1.0])
        .f32(ZONE)
        .i32(1)
        .i32(0)
        .i32(1)
        .i32(0)
        .0;
    let header = read_header(&bytes).unwrap();
    assert!(matches!(
        read_data(&bytes, &header),
        Err(PltError::SharingMismatch { zone: 1, variable: Some(0), header: None, data: Some(0) })
    ));
}

#[test]
fn rejects_unknown_format_code() {
    let bytes = Plt::new(b"#!TDV112", &["X", "Y"])
        .zone(&Zone::ordered("z", &[1, 1, 1], &[-1, -1]))
        .end_header()
        .plain_record(&[1, 9])
        .0;
    let header = read_header(&bytes).unwrap();
    let offset = header.data_offset + 8;
    match read_data(&bytes, &header) {
        Err(PltError::UnsupportedFormatCode { offset: at, zone, variable, code }) => {
            assert_eq!((at, zone, variable, code), (offset, 0, 1, 9));
        }
        other => panic!("expected UnsupportedFormatCode, got {:?}", other),
    }
}

#[test]
fn truncated_values_are_reported() {
    let mut bytes = minimal();
    bytes.truncate(bytes.len() - 2);
    let header = read_header(&bytes).unwrap();
    assert!(matches!(read_data(&bytes, &header), Err(PltError::TruncatedInput { .. })));
}

#[test]
fn geometry_records_are_unsupported() {
    let bytes = Plt::new(b"#!TDV112", &["X"]).f32(399.0).0;
    assert!(matches!(
        read_header(&bytes),
        Err(PltError::Unsupported { feature: "geometry record", .. })
    ));
}

#[test]
fn reads_data_from_seekable_source() {
    let bytes = minimal();
    let header = read_header(&bytes).unwrap();
    let mut source = Cursor::new(bytes.clone());

    let data = read_data_from(&mut source, &header).unwrap();
    assert_eq!(data.zone(0).unwrap().values("X").unwrap().to_f64_vec(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn reader_opens_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&minimal()).unwrap();
    file.flush().unwrap();

    let reader = PltReader::open(file.path()).unwrap();
    assert_eq!(reader.path(), file.path());
    assert_eq!(reader.header.variable_names, vec!["X"]);
    let data = reader.read_data().unwrap();
    assert_eq!(data.zone_by_name("Zone 1").unwrap().values("X").unwrap().len(), 3);
}

#[test]
fn reader_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PltReader::open(dir.path().join("missing.plt")),
        Err(PltError::Io(_))
    ));
}

#[test]
fn overflowing_zone_extent_fails_header() {
    let bytes = Plt::new(b"#!TDV112", &["X"])
        .zone(&Zone::ordered("huge", &[4_194_304, 4_194_304, 1_048_576], &[-1]))
        .end_header()
        .0;
    assert!(matches!(
        read_header(&bytes),
        Err(PltError::InvalidValue { field: "point count", .. })
    ));
}

#[test]
fn overflowing_zone_extent_fails_data_pass() {
    let bytes = minimal();
    let mut header = read_header(&bytes).unwrap();
    let huge = ZoneDescriptor {
        zone_type: ZoneType::Ordered { i_max: 4_194_304, j_max: 4_194_304, k_max: 1_048_576 },
        ..header.zones.get(0).unwrap().clone()
    };
    header.zones = ZoneDirectory::new(vec![huge]);

    assert!(matches!(
        read_data(&bytes, &header),
        Err(PltError::InvalidValue { field: "point count", .. })
    ));
}

enum Shape {
    Ordered,
    Elements(usize),
    Faces { offsets: &'static [i32], boundary_connections: usize },
}

struct Case {
    type_code: i32,
    dims: &'static [i32],
    points: usize,
    elements: usize,
    connectivity: &'static [i32],
    shape: Shape,
}

const CASES: &[Case] = &[
    Case {
        type_code: 0,
        dims: &[3, 2, 1],
        points: 6,
        elements: 2,
        connectivity: &[],
        shape: Shape::Ordered,
    },
    Case {
        type_code: 1,
        dims: &[3, 2],
        points: 3,
        elements: 2,
        connectivity: &[0, 1, 1, 2],
        shape: Shape::Elements(2),
    },
    Case {
        type_code: 2,
        dims: &[3, 1],
        points: 3,
        elements: 1,
        connectivity: &[0, 1, 2],
        shape: Shape::Elements(3),
    },
    Case {
        type_code: 3,
        dims: &[6, 2],
        points: 6,
        elements: 2,
        connectivity: &[0, 1, 4, 3, 1, 2, 5, 4],
        shape: Shape::Elements(4),
    },
    Case {
        type_code: 4,
        dims: &[4, 1],
        points: 4,
        elements: 1,
        connectivity: &[0, 1, 2, 3],
        shape: Shape::Elements(4),
    },
    Case {
        type_code: 5,
        dims: &[8, 1],
        points: 8,
        elements: 1,
        connectivity: &[0, 1, 2, 3, 4, 5, 6, 7],
        shape: Shape::Elements(8),
    },
    Case {
        type_code: 6,
        // points, faces, face nodes, boundary faces, boundary connections, elements
        dims: &[3, 3, 6, 0, 0, 1],
        points: 3,
        elements: 1,
        connectivity: &[
            0, 1, 1, 2, 2, 0, // face nodes
            0, 0, 0, // left elements
            -1, -1, -1, // right elements
        ],
        shape: Shape::Faces { offsets: &[0, 2, 4, 6], boundary_connections: 0 },
    },
    Case {
        type_code: 7,
        dims: &[4, 4, 12, 1, 1, 1],
        points: 4,
        elements: 1,
        connectivity: &[
            0, 3, 6, 9, 12, // face node offsets
            0, 1, 2, 0, 1, 3, 1, 2, 3, 0, 2, 3, // face nodes
            0, 0, 0, 0, // left elements
            -1, -1, -1, -2, // right elements
            1, // boundary connection counts
            0, // boundary elements
            1, // boundary zones
        ],
        shape: Shape::Faces { offsets: &[0, 3, 6, 9, 12], boundary_connections: 1 },
    },
];

#[test]
fn every_zone_type_decodes_to_declared_lengths() {
    for case in CASES {
        let zone = Zone {
            name: "z",
            type_code: case.type_code,
            dims: case.dims,
            locations: Some(&[0, 1]),
            shared: &[-1, -1],
            shared_connectivity: -1,
            time: 0.0,
            strand: -1,
        };
        let node_values: Vec<f32> = (0..case.points).map(|i| i as f32).collect();
        let cell_values: Vec<f32> = (0..case.elements).map(|i| i as f32 * 10.0).collect();
        let bytes = Plt::new(b"#!TDV112", &["X", "C"])
            .zone(&zone)
            .end_header()
            .plain_record(&[1, 1])
            .ranges(2)
            .f32s(&node_values)
            .f32s(&cell_values)
            .i32s(case.connectivity)
            .0;

        let header = read_header(&bytes).unwrap();
        assert_eq!(header.zones.get(0).unwrap().zone_type.code(), case.type_code);
        let data = read_data(&bytes, &header).unwrap();
        let zone = data.zone(0).unwrap();
        assert_eq!(zone.values("X").unwrap().len(), case.points, "zone type {}", case.type_code);
        assert_eq!(zone.values("C").unwrap().len(), case.elements, "zone type {}", case.type_code);
        assert_eq!(zone.values("C").unwrap().as_f32(), Some(&cell_values[..]));

        match (&case.shape, zone.connectivity.as_deref()) {
            (Shape::Ordered, None) => {}
            (Shape::Elements(per_element), Some(Connectivity::Elements { nodes_per_element, nodes })) => {
                assert_eq!(nodes_per_element, per_element);
                assert_eq!(nodes.len(), case.elements * per_element);
                assert_eq!(&nodes[..], case.connectivity);
            }
            (Shape::Faces { offsets, boundary_connections }, Some(Connectivity::Faces(map))) => {
                let faces = offsets.len() - 1;
                assert_eq!(&map.face_node_offsets[..], *offsets);
                assert_eq!(map.left_elements.len(), faces);
                assert_eq!(map.right_elements.len(), faces);
                assert_eq!(map.boundary_connection_counts.len(), *boundary_connections);
                assert_eq!(map.boundary_elements.len(), *boundary_connections);
                assert_eq!(map.boundary_zones.len(), *boundary_connections);
            }
            (_, other) => panic!("zone type {}: unexpected connectivity {:?}", case.type_code, other),
        }
    }
}
