//! Core Tecplot binary reader module
//!
//! Decoding runs in two passes over an in-memory image:
//! ```text
//! read_header  -> Header (zone directory, aux data, data offset)
//! read_data    -> scan data records -> materialize arrays -> PltData
//! ```
//! The header pass never touches the data section, so callers can inspect
//! zones and variables before paying for value decoding.

pub mod codec;
pub mod directory;
pub mod format;
pub mod materialize;
pub mod reader;
pub mod types;
pub mod utils;

use std::io::{Read, Seek, SeekFrom};

use log::info;

pub use directory::ZoneDirectory;
pub use materialize::{DecodeOptions, Materializer};
pub use reader::PltReader;
pub use types::error::{PltError, Result};
pub use types::models;

use models::{Header, PltData};

/// Parses the header of a `.plt` image.
pub fn read_header(data: &[u8]) -> Result<Header> {
    format::header::parse(data)
}

/// Decodes every zone of the data section with default options.
///
/// `data` is the same image the header was read from.
pub fn read_data(data: &[u8], header: &Header) -> Result<PltData> {
    read_data_with(data, header, &DecodeOptions::default())
}

/// Decodes every zone of the data section.
pub fn read_data_with(data: &[u8], header: &Header, options: &DecodeOptions) -> Result<PltData> {
    let records = format::data::scan(data, header)?;
    let mut materializer = Materializer::new(data, header, records);
    if options.parallel {
        materializer.decode_stored_parallel()?;
    }
    materializer.finish()
}

/// Decodes the data section from a seekable source.
///
/// Only the bytes from [`Header::data_offset`] on are read. They are placed
/// at their file offsets in the buffer, so the header range stays zeroed.
pub fn read_data_from<R: Read + Seek>(source: &mut R, header: &Header) -> Result<PltData> {
    source.seek(SeekFrom::Start(header.data_offset as u64))?;
    let mut data = vec![0u8; header.data_offset];
    let read = source.read_to_end(&mut data)?;
    info!("Read {} data-section bytes from offset {}", read, header.data_offset);
    read_data(&data, header)
}
