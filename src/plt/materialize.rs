//! Turns scanned zone records into typed value arrays.
//!
//! Arrays are built on demand and cached per (zone, variable). A shared
//! variable resolves through the zone directory to its source and reuses
//! the source's `Arc`, building the source first when needed, so zones
//! can share from zones that come later in the file.

use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;

use crate::plt::codec::values;
use crate::plt::format::data::{ConnectivityRecord, VariableStorage, ZoneRecord};
use crate::plt::types::error::{PltError, Result};
use crate::plt::types::models::{Connectivity, Header, PltData, ValueArray, Variable, ZoneData};

/// Knobs for [`read_data_with`](crate::read_data_with).
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Decode stored variables of all zones concurrently before resolving
    /// shared ones.
    pub parallel: bool,
}

/// Builds value arrays for the zones of one data section.
pub struct Materializer<'a> {
    data: &'a [u8],
    header: &'a Header,
    records: Vec<ZoneRecord>,
    arrays: Vec<Vec<Option<Arc<ValueArray>>>>,
}

impl<'a> Materializer<'a> {
    pub fn new(data: &'a [u8], header: &'a Header, records: Vec<ZoneRecord>) -> Self {
        let arrays = records
            .iter()
            .map(|record| vec![None; record.variables.len()])
            .collect();
        Self {
            data,
            header,
            records,
            arrays,
        }
    }

    /// Returns the array of one variable of one zone.
    ///
    /// The array holds exactly the zone's point count for node variables
    /// and its element count for cell-centered ones. Repeated calls return
    /// the same `Arc`.
    pub fn materialize(&mut self, zone: usize, variable: usize) -> Result<Arc<ValueArray>> {
        if let Some(array) = self.cached(zone, variable) {
            return Ok(array);
        }
        let record = self
            .records
            .get(zone)
            .and_then(|r| r.variables.get(variable))
            .ok_or(PltError::InvalidShareReference {
                zone,
                variable: Some(variable),
                target: zone as i64,
                reason: "zone or variable does not exist",
            })?;
        let (format, storage) = (record.format, record.storage);

        let array = match storage {
            VariableStorage::Shared(_) => {
                let (source_zone, source_variable) =
                    self.header.zones.resolve_variable_source(zone, variable)?;
                self.materialize(source_zone, source_variable)?
            }
            VariableStorage::Passive => {
                let len = self.header.zones.value_count(zone, variable).unwrap_or(0);
                Arc::new(ValueArray::zeros(format, len))
            }
            VariableStorage::Stored { slot, .. } => {
                Arc::new(values::decode_slot(self.data, &slot, format)?)
            }
        };

        self.arrays[zone][variable] = Some(Arc::clone(&array));
        Ok(array)
    }

    fn cached(&self, zone: usize, variable: usize) -> Option<Arc<ValueArray>> {
        self.arrays.get(zone)?.get(variable)?.clone()
    }

    /// Decodes every stored, not yet built variable concurrently.
    ///
    /// Each task reads its own byte range and fills its own slot; shared
    /// and passive variables are left for [`materialize`](Self::materialize).
    pub fn decode_stored_parallel(&mut self) -> Result<()> {
        let jobs: Vec<_> = self
            .records
            .iter()
            .enumerate()
            .flat_map(|(zone, record)| {
                record
                    .variables
                    .iter()
                    .enumerate()
                    .filter_map(move |(variable, v)| match v.storage {
                        VariableStorage::Stored { slot, .. } => Some((zone, variable, slot, v.format)),
                        _ => None,
                    })
            })
            .filter(|&(zone, variable, _, _)| self.arrays[zone][variable].is_none())
            .collect();
        debug!("Decoding {} stored variables in parallel", jobs.len());

        let data = self.data;
        let decoded = jobs
            .par_iter()
            .map(|&(zone, variable, slot, format)| {
                values::decode_slot(data, &slot, format).map(|array| (zone, variable, array))
            })
            .collect::<Result<Vec<_>>>()?;

        for (zone, variable, array) in decoded {
            self.arrays[zone][variable] = Some(Arc::new(array));
        }
        Ok(())
    }

    /// Builds every remaining array and assembles the per-zone result.
    pub fn finish(mut self) -> Result<PltData> {
        let mut connectivity: Vec<Option<Arc<Connectivity>>> = self
            .records
            .iter_mut()
            .map(|record| match record.connectivity.take() {
                Some(ConnectivityRecord::Stored(c)) => Some(Arc::new(c)),
                _ => None,
            })
            .collect();
        for zone in 0..self.header.zones.len() {
            if self.header.zones.get(zone).and_then(|z| z.shared_connectivity).is_some() {
                let source = self.header.zones.resolve_connectivity_source(zone)?;
                connectivity[zone] = connectivity[source].clone();
            }
        }

        let mut zones = Vec::with_capacity(self.records.len());
        for zone in 0..self.records.len() {
            let mut variables = Vec::with_capacity(self.header.num_vars());
            for variable in 0..self.records[zone].variables.len() {
                let values = self.materialize(zone, variable)?;
                let record = &self.records[zone].variables[variable];
                let (passive, shared_from, range) = match record.storage {
                    VariableStorage::Stored { min, max, .. } => (false, None, Some((min, max))),
                    VariableStorage::Passive => (true, None, None),
                    VariableStorage::Shared(source) => (false, Some(source), None),
                };
                // Shared values keep the representation of the zone that stores them.
                let format = shared_from
                    .and_then(|source| self.records.get(source)?.variables.get(variable))
                    .map_or(record.format, |source| source.format);
                variables.push(Variable {
                    name: self.header.variable_names[variable].clone(),
                    format,
                    location: record.location,
                    passive,
                    shared_from,
                    range,
                    values,
                });
            }
            zones.push(ZoneData {
                index: zone,
                name: self.header.zones.get(zone).map(|z| z.name.clone()).unwrap_or_default(),
                variables,
                connectivity: connectivity[zone].take(),
            });
        }

        info!("Materialized {} zones", zones.len());
        Ok(PltData { zones })
    }
}
