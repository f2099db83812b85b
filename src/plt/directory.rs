//! The ordered collection of zone descriptors and its sharing rules.
//!
//! Zones may share variable values or connectivity with any other zone,
//! including ones declared later in the header, so references are checked
//! once the whole header has been read rather than zone by zone.

use log::debug;

use crate::plt::types::error::{PltError, Result};
use crate::plt::types::models::ZoneDescriptor;

/// Zone descriptors in file order, addressed by zero-based zone index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneDirectory {
    zones: Vec<ZoneDescriptor>,
}

impl ZoneDirectory {
    pub fn new(zones: Vec<ZoneDescriptor>) -> Self {
        Self { zones }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn get(&self, zone: usize) -> Option<&ZoneDescriptor> {
        self.zones.get(zone)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ZoneDescriptor> {
        self.zones.iter()
    }

    /// Index of the first zone with the given name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.zones.iter().position(|z| z.name == name)
    }

    pub fn point_count(&self, zone: usize) -> Option<usize> {
        self.get(zone).map(ZoneDescriptor::point_count)
    }

    pub fn element_count(&self, zone: usize) -> Option<usize> {
        self.get(zone).map(ZoneDescriptor::element_count)
    }

    pub fn value_count(&self, zone: usize, variable: usize) -> Option<usize> {
        self.get(zone).map(|z| z.value_count(variable))
    }

    /// Follows a variable's sharing reference to the zone that stores it.
    ///
    /// Returns `(zone, variable)` itself when the variable is not shared.
    /// Sharing never chains, so a single hop always lands on stored data.
    pub fn resolve_variable_source(&self, zone: usize, variable: usize) -> Result<(usize, usize)> {
        let descriptor = self.get(zone).ok_or(PltError::InvalidShareReference {
            zone,
            variable: Some(variable),
            target: zone as i64,
            reason: "zone does not exist",
        })?;
        match descriptor.shared_variables.get(variable).copied().flatten() {
            None => Ok((zone, variable)),
            Some(source) => {
                self.check_variable_share(zone, variable, source)?;
                Ok((source, variable))
            }
        }
    }

    /// Zone whose connectivity `zone` uses.
    pub fn resolve_connectivity_source(&self, zone: usize) -> Result<usize> {
        let descriptor = self.get(zone).ok_or(PltError::InvalidShareReference {
            zone,
            variable: None,
            target: zone as i64,
            reason: "zone does not exist",
        })?;
        match descriptor.shared_connectivity {
            None => Ok(zone),
            Some(source) => {
                self.check_connectivity_share(zone, source)?;
                Ok(source)
            }
        }
    }

    /// Checks every sharing reference in the directory.
    pub fn validate(&self) -> Result<()> {
        for (zone, descriptor) in self.zones.iter().enumerate() {
            for (variable, share) in descriptor.shared_variables.iter().enumerate() {
                if let Some(source) = *share {
                    self.check_variable_share(zone, variable, source)?;
                }
            }
            if let Some(source) = descriptor.shared_connectivity {
                self.check_connectivity_share(zone, source)?;
            }
        }
        debug!("Validated sharing references of {} zones", self.zones.len());
        Ok(())
    }

    fn check_variable_share(&self, zone: usize, variable: usize, source: usize) -> Result<()> {
        let invalid = |reason| PltError::InvalidShareReference {
            zone,
            variable: Some(variable),
            target: source as i64,
            reason,
        };
        if source == zone {
            return Err(invalid("zone shares with itself"));
        }
        let target = self.get(source).ok_or_else(|| invalid("target zone does not exist"))?;
        if target.shared_variables.get(variable).copied().flatten().is_some() {
            return Err(invalid("target variable is itself shared"));
        }
        let here = &self.zones[zone];
        if here.locations.get(variable) != target.locations.get(variable) {
            return Err(invalid("value locations differ"));
        }
        if here.value_count(variable) != target.value_count(variable) {
            return Err(invalid("value counts differ"));
        }
        Ok(())
    }

    fn check_connectivity_share(&self, zone: usize, source: usize) -> Result<()> {
        let invalid = |reason| PltError::InvalidShareReference {
            zone,
            variable: None,
            target: source as i64,
            reason,
        };
        let here = &self.zones[zone];
        if !here.zone_type.is_finite_element() {
            return Err(invalid("ordered zones have no connectivity"));
        }
        if source == zone {
            return Err(invalid("zone shares with itself"));
        }
        let target = self.get(source).ok_or_else(|| invalid("target zone does not exist"))?;
        if target.shared_connectivity.is_some() {
            return Err(invalid("target connectivity is itself shared"));
        }
        if target.zone_type.code() != here.zone_type.code()
            || target.zone_type.element_count() != here.zone_type.element_count()
            || target.zone_type.poly_faces() != here.zone_type.poly_faces()
        {
            return Err(invalid("element shapes differ"));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ZoneDirectory {
    type Item = &'a ZoneDescriptor;
    type IntoIter = std::slice::Iter<'a, ZoneDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}
