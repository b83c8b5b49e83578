//! Fleet-wide "needs attention" sweep: days since the last completed work
//! order of any kind.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Bus, BusId};

/// Days reported for a bus that has no completed order at all.
pub const NEVER_SERVICED_DAYS: i64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SweepUrgency {
    Urgente,
    Pronto,
    Normal,
}

impl SweepUrgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepUrgency::Urgente => "URGENTE",
            SweepUrgency::Pronto => "PRONTO",
            SweepUrgency::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for SweepUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive lower bounds on days since the last service.
///
/// | Days since | Class   |
/// |------------|---------|
/// | >= 90      | URGENTE |
/// | >= 75      | PRONTO  |
/// | < 75       | NORMAL  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepThresholds {
    pub urgent_days: i64,
    pub soon_days: i64,
}

impl Default for SweepThresholds {
    fn default() -> Self {
        Self {
            urgent_days: 90,
            soon_days: 75,
        }
    }
}

impl SweepThresholds {
    pub fn classify(&self, days_since_last_service: i64) -> SweepUrgency {
        if days_since_last_service >= self.urgent_days {
            SweepUrgency::Urgente
        } else if days_since_last_service >= self.soon_days {
            SweepUrgency::Pronto
        } else {
            SweepUrgency::Normal
        }
    }
}

/// A bus that needs attention. `NORMAL` buses never produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub bus_id: BusId,
    pub license_plate: String,
    pub last_service_date: Option<NaiveDate>,
    pub days_since_last_service: i64,
    pub urgency: SweepUrgency,
}

pub fn days_since_last_service(last_service_date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match last_service_date {
        Some(date) => (today - date).num_days(),
        None => NEVER_SERVICED_DAYS,
    }
}

/// Classifies one bus, returning `None` when it does not need attention.
pub fn assess_bus(
    bus: &Bus,
    last_service_date: Option<NaiveDate>,
    today: NaiveDate,
    thresholds: &SweepThresholds,
) -> Option<SweepEntry> {
    let days = days_since_last_service(last_service_date, today);
    let urgency = thresholds.classify(days);
    if urgency == SweepUrgency::Normal {
        return None;
    }

    Some(SweepEntry {
        bus_id: bus.id,
        license_plate: bus.license_plate.clone(),
        last_service_date,
        days_since_last_service: days,
        urgency,
    })
}

/// Most urgent first, then longest without service, then bus id.
pub fn sort_entries(entries: &mut [SweepEntry]) {
    entries.sort_by(|a, b| {
        a.urgency
            .cmp(&b.urgency)
            .then(b.days_since_last_service.cmp(&a.days_since_last_service))
            .then(a.bus_id.cmp(&b.bus_id))
    });
}
