//! Lazy scan over `thermal_zoneN` directories.

use std::io::ErrorKind;

use serde::Serialize;

use crate::collector::resolver::{
    AttemptFailure, ProbeOutcome, Provenance, ResourceId, SourceResolver, ZoneAttr,
};
use crate::collector::sysfs::parser::{parse_temperature, parse_zone_type};
use crate::collector::traits::FileSystem;

/// One thermal zone reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermalReading {
    pub index: u32,
    /// `None` when the `type` file was unreadable.
    pub zone_type: Option<String>,
    pub celsius: f64,
    pub provenance: Provenance,
    /// Elevated commands that produced this reading.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elevated_via: Vec<String>,
}

/// A zone whose directory exists but whose temperature could not be read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnreadableZone {
    pub index: u32,
    pub attempts: Vec<AttemptFailure>,
}

/// Iterates zones from index 0 upward, stopping at the first index whose
/// directory does not exist or at the configured bound.
///
/// When the thermal class directory cannot be searched, existence is
/// unknown: each index is read anyway (so elevation gets a chance) and the
/// first one that yields nothing ends the scan.
///
/// Cloning yields an independent scan from the same position.
pub struct ThermalScan<'a, F: FileSystem> {
    resolver: &'a SourceResolver<F>,
    next: u32,
    bound: u32,
    done: bool,
    blocked: Option<UnreadableZone>,
}

impl<'a, F: FileSystem> ThermalScan<'a, F> {
    pub fn new(resolver: &'a SourceResolver<F>) -> Self {
        Self {
            resolver,
            next: 0,
            bound: resolver.config().thermal_max_zones,
            done: false,
            blocked: None,
        }
    }

    /// Number of indices looked at so far.
    pub fn scanned(&self) -> u32 {
        self.next
    }

    /// The failed read that ended a scan through an unsearchable directory.
    pub fn blocked(&self) -> Option<&UnreadableZone> {
        self.blocked.as_ref()
    }

    fn read_zone(&self, index: u32) -> Result<ThermalReading, UnreadableZone> {
        let temp = ResourceId::ThermalZone {
            index,
            attr: ZoneAttr::Temp,
        };
        let acquired = match self
            .resolver
            .resolve_with(&temp, |raw| parse_temperature(raw).is_some())
        {
            ProbeOutcome::Success(acquired) => acquired,
            ProbeOutcome::Unavailable(attempts) => return Err(UnreadableZone { index, attempts }),
        };

        let type_id = ResourceId::ThermalZone {
            index,
            attr: ZoneAttr::Type,
        };
        let mut elevated_via = Vec::new();
        if acquired.provenance == Provenance::Elevated {
            elevated_via.push(acquired.source.clone());
        }
        let (zone_type, provenance) = match self.resolver.resolve(&type_id) {
            ProbeOutcome::Success(t) => {
                if t.provenance == Provenance::Elevated {
                    elevated_via.push(t.source);
                }
                (
                    parse_zone_type(&t.raw),
                    acquired.provenance.combine(t.provenance),
                )
            }
            ProbeOutcome::Unavailable(_) => (None, acquired.provenance),
        };

        Ok(ThermalReading {
            index,
            zone_type,
            // Accepted only if it parsed.
            celsius: parse_temperature(&acquired.raw).unwrap_or_default(),
            provenance,
            elevated_via,
        })
    }
}

impl<F: FileSystem> Clone for ThermalScan<'_, F> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver,
            next: self.next,
            bound: self.bound,
            done: self.done,
            blocked: self.blocked.clone(),
        }
    }
}

impl<F: FileSystem> Iterator for ThermalScan<'_, F> {
    type Item = Result<ThermalReading, UnreadableZone>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next >= self.bound {
            return None;
        }
        let index = self.next;
        let config = self.resolver.config();
        let dir = config
            .sys_path("class/thermal")
            .join(format!("thermal_zone{index}"));
        match self.resolver.fs().try_exists(&dir) {
            Ok(true) => {
                self.next += 1;
                Some(self.read_zone(index))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.done = true;
                None
            }
            Err(_) => {
                self.next += 1;
                match self.read_zone(index) {
                    Ok(reading) => Some(Ok(reading)),
                    Err(zone) => {
                        self.done = true;
                        self.blocked = Some(zone);
                        None
                    }
                }
            }
        }
    }
}
