//! Maintenance due computation.
//!
//! Three rules answer "is this bus due for maintenance" and they disagree on
//! thresholds. Each lives in its own module and is selected by [`DueMode`]:
//!
//! - [`schedule`]: per task, days and kilometres since the last service of
//!   that task (7/30 days, 1000/5000 km).
//! - [`sweep`]: per bus, days since any completed service (75/90 days).
//! - [`modulo`]: per bus, distance to the next multiple of 10 000 km
//!   (500/1000 km).

pub mod modulo;
pub mod schedule;
pub mod sweep;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use modulo::{ModuloStatus, ModuloThresholds, ModuloUrgency, fixed_distance_status};
pub use schedule::{DueStatus, ScheduleThresholds, compute_due_status, compute_due_status_with};
pub use sweep::{NEVER_SERVICED_DAYS, SweepThresholds, SweepUrgency};

/// Urgency of a scheduled task. Variants are ordered most urgent first so
/// that sorting ascending puts overdue work at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Overdue,
    Upcoming,
    Ok,
}

impl Urgency {
    /// The more critical of two signals.
    pub fn escalate(self, other: Urgency) -> Urgency {
        self.min(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Overdue => "overdue",
            Urgency::Upcoming => "upcoming",
            Urgency::Ok => "ok",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overdue" => Ok(Urgency::Overdue),
            "upcoming" => Ok(Urgency::Upcoming),
            "ok" => Ok(Urgency::Ok),
            other => Err(format!("unknown urgency '{other}' (expected overdue, upcoming or ok)")),
        }
    }
}

/// Names the rule a caller wants applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueMode {
    PerTaskSchedule,
    NeverServicedSweep,
    FixedDistanceModulo,
}

impl DueMode {
    pub const ALL: [DueMode; 3] = [
        DueMode::PerTaskSchedule,
        DueMode::NeverServicedSweep,
        DueMode::FixedDistanceModulo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DueMode::PerTaskSchedule => "per-task-schedule",
            DueMode::NeverServicedSweep => "never-serviced-sweep",
            DueMode::FixedDistanceModulo => "fixed-distance-modulo",
        }
    }

    /// Human description of the default thresholds of the mode.
    pub fn describe(&self) -> String {
        match self {
            DueMode::PerTaskSchedule => {
                let t = ScheduleThresholds::default();
                format!(
                    "per task: overdue < {} days or < {} km, upcoming < {} days or < {} km",
                    t.overdue_days, t.overdue_km, t.upcoming_days, t.upcoming_km
                )
            }
            DueMode::NeverServicedSweep => {
                let t = SweepThresholds::default();
                format!(
                    "per bus: URGENTE >= {} days since last service, PRONTO >= {} days, never serviced counts as {} days",
                    t.urgent_days, t.soon_days, NEVER_SERVICED_DAYS
                )
            }
            DueMode::FixedDistanceModulo => {
                let t = ModuloThresholds::default();
                format!(
                    "per bus: every {} km, urgent <= {} km left, upcoming <= {} km left",
                    t.cycle_km, t.urgent_km, t.upcoming_km
                )
            }
        }
    }
}

impl fmt::Display for DueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DueMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown mode '{s}' (expected one of: {})",
                    DueMode::ALL.map(|m| m.as_str()).join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalate_prefers_more_urgent() {
        assert_eq!(Urgency::Ok.escalate(Urgency::Upcoming), Urgency::Upcoming);
        assert_eq!(Urgency::Upcoming.escalate(Urgency::Overdue), Urgency::Overdue);
        assert_eq!(Urgency::Overdue.escalate(Urgency::Ok), Urgency::Overdue);
    }

    #[test]
    fn test_urgency_sort_order() {
        let mut v = vec![Urgency::Ok, Urgency::Overdue, Urgency::Upcoming];
        v.sort();
        assert_eq!(v, vec![Urgency::Overdue, Urgency::Upcoming, Urgency::Ok]);
    }

    #[test]
    fn test_mode_names_parse_back() {
        for mode in DueMode::ALL {
            assert_eq!(mode.as_str().parse::<DueMode>().unwrap(), mode);
        }
        assert!("whatever".parse::<DueMode>().is_err());
    }

    #[test]
    fn test_urgency_parse_is_case_insensitive() {
        assert_eq!("OVERDUE".parse::<Urgency>().unwrap(), Urgency::Overdue);
    }
}
