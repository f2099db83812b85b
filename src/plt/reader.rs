use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::materialize::DecodeOptions;
use super::types::error::Result;
use super::types::models::{Header, PltData};

/// A `.plt` file loaded into memory with its header already parsed.
#[derive(Debug)]
pub struct PltReader {
    path: PathBuf,
    data: Vec<u8>,
    pub header: Header,
}

impl PltReader {
    /// Loads the file at `path` and parses its header.
    ///
    /// # Errors
    /// Returns an error if:
    /// - File cannot be opened or read
    /// - Magic tag or byte order is not supported
    /// - Header records are truncated or malformed
    /// - A sharing reference points at an invalid zone
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Tecplot file: {}", path.display());
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        debug!("Loaded {} bytes", data.len());

        let header = super::read_header(&data)?;
        Ok(Self {
            path: path.to_path_buf(),
            data,
            header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the loaded file in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decodes all zones.
    pub fn read_data(&self) -> Result<PltData> {
        self.read_data_with(&DecodeOptions::default())
    }

    pub fn read_data_with(&self, options: &DecodeOptions) -> Result<PltData> {
        super::read_data_with(&self.data, &self.header, options)
    }
}
