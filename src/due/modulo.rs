//! Fixed-distance rule used by the bus list: service every 10 000 km of
//! odometer, regardless of history.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Bus, BusId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuloUrgency {
    Urgent,
    Upcoming,
    Ok,
}

impl fmt::Display for ModuloUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModuloUrgency::Urgent => "urgent",
            ModuloUrgency::Upcoming => "upcoming",
            ModuloUrgency::Ok => "ok",
        })
    }
}

/// Inclusive upper bounds on kilometres left in the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuloThresholds {
    pub cycle_km: i64,
    pub urgent_km: i64,
    pub upcoming_km: i64,
}

impl Default for ModuloThresholds {
    fn default() -> Self {
        Self {
            cycle_km: 10_000,
            urgent_km: 500,
            upcoming_km: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuloStatus {
    pub odometer: i64,
    pub remaining_km: i64,
    pub next_service_at: i64,
    pub urgency: ModuloUrgency,
}

/// Applies the rule with the default 10 000 km cycle.
pub fn fixed_distance_status(odometer: i64) -> ModuloStatus {
    fixed_distance_status_with(odometer, &ModuloThresholds::default())
}

pub fn fixed_distance_status_with(odometer: i64, thresholds: &ModuloThresholds) -> ModuloStatus {
    // An odometer exactly on a multiple has a full cycle ahead, not zero.
    let cycle = thresholds.cycle_km.max(1);
    let remaining_km = cycle - odometer.rem_euclid(cycle);

    let urgency = if remaining_km <= thresholds.urgent_km {
        ModuloUrgency::Urgent
    } else if remaining_km <= thresholds.upcoming_km {
        ModuloUrgency::Upcoming
    } else {
        ModuloUrgency::Ok
    };

    ModuloStatus {
        odometer,
        remaining_km,
        next_service_at: odometer + remaining_km,
        urgency,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuloEntry {
    pub bus_id: BusId,
    pub license_plate: String,
    #[serde(flatten)]
    pub status: ModuloStatus,
}

/// Applies the rule to every bus, most urgent first.
pub fn assess_buses(buses: &[Bus], thresholds: &ModuloThresholds) -> Vec<ModuloEntry> {
    let mut entries: Vec<ModuloEntry> = buses
        .iter()
        .map(|bus| ModuloEntry {
            bus_id: bus.id,
            license_plate: bus.license_plate.clone(),
            status: fixed_distance_status_with(bus.current_odometer, thresholds),
        })
        .collect();

    entries.sort_by(|a, b| {
        a.status
            .urgency
            .cmp(&b.status.urgency)
            .then(a.status.remaining_km.cmp(&b.status.remaining_km))
            .then(a.bus_id.cmp(&b.bus_id))
    });
    entries
}
