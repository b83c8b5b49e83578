//! Per-task recurring schedule: whichever of the day or distance interval
//! comes first.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Urgency;
use crate::models::{MaintenanceTask, TaskId};

/// Boundaries are exclusive: a remainder strictly below the value triggers
/// the category.
///
/// | Signal   | Overdue  | Upcoming |
/// |----------|----------|----------|
/// | days     | < 7      | < 30     |
/// | distance | < 1000   | < 5000   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleThresholds {
    pub overdue_days: i64,
    pub upcoming_days: i64,
    pub overdue_km: i64,
    pub upcoming_km: i64,
}

impl Default for ScheduleThresholds {
    fn default() -> Self {
        Self {
            overdue_days: 7,
            upcoming_days: 30,
            overdue_km: 1000,
            upcoming_km: 5000,
        }
    }
}

impl ScheduleThresholds {
    pub fn classify_days(&self, days_remaining: i64) -> Urgency {
        if days_remaining < self.overdue_days {
            Urgency::Overdue
        } else if days_remaining < self.upcoming_days {
            Urgency::Upcoming
        } else {
            Urgency::Ok
        }
    }

    pub fn classify_distance(&self, distance_remaining: i64) -> Urgency {
        if distance_remaining < self.overdue_km {
            Urgency::Overdue
        } else if distance_remaining < self.upcoming_km {
            Urgency::Upcoming
        } else {
            Urgency::Ok
        }
    }
}

/// Where a task stands for one bus. Remainders are signed; negative means
/// past due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueStatus {
    pub task_id: TaskId,
    pub last_service_date: NaiveDate,
    pub last_service_odometer: i64,
    pub next_due_date: NaiveDate,
    pub next_due_odometer: Option<i64>,
    pub days_remaining: i64,
    pub distance_remaining: Option<i64>,
    pub urgency: Urgency,
}

impl DueStatus {
    pub fn days_label(&self) -> String {
        match self.days_remaining {
            0 => "due today".to_string(),
            1 => "due in 1 day".to_string(),
            -1 => "overdue by 1 day".to_string(),
            d if d > 0 => format!("due in {d} days"),
            d => format!("overdue by {} days", -d),
        }
    }

    pub fn distance_label(&self) -> Option<String> {
        self.distance_remaining.map(|km| {
            if km >= 0 {
                format!("{km} km remaining")
            } else {
                format!("{} km past due", -km)
            }
        })
    }
}

/// Computes the due status with the default thresholds.
///
/// Returns `None` when the task is not scheduled, has no positive day
/// interval, or the next due date overflows the calendar.
pub fn compute_due_status(
    last_service_date: NaiveDate,
    last_service_odometer: i64,
    task: &MaintenanceTask,
    current_odometer: i64,
    today: NaiveDate,
) -> Option<DueStatus> {
    compute_due_status_with(
        last_service_date,
        last_service_odometer,
        task,
        current_odometer,
        today,
        &ScheduleThresholds::default(),
    )
}

pub fn compute_due_status_with(
    last_service_date: NaiveDate,
    last_service_odometer: i64,
    task: &MaintenanceTask,
    current_odometer: i64,
    today: NaiveDate,
    thresholds: &ScheduleThresholds,
) -> Option<DueStatus> {
    let day_interval = task.schedulable_day_interval()?;

    let next_due_date = last_service_date.checked_add_days(Days::new(day_interval as u64))?;
    let next_due_odometer = match task.effective_distance_interval() {
        Some(km) => Some(last_service_odometer.checked_add(km)?),
        None => None,
    };

    let days_remaining = (next_due_date - today).num_days();

    // A zero reading on either side means the odometer was never captured.
    let distance_remaining = match next_due_odometer {
        Some(next) if last_service_odometer > 0 && current_odometer > 0 => {
            Some(next.checked_sub(current_odometer)?)
        }
        _ => None,
    };

    let mut urgency = thresholds.classify_days(days_remaining);
    if let Some(km) = distance_remaining {
        urgency = urgency.escalate(thresholds.classify_distance(km));
    }

    Some(DueStatus {
        task_id: task.id,
        last_service_date,
        last_service_odometer,
        next_due_date,
        next_due_odometer,
        days_remaining,
        distance_remaining,
        urgency,
    })
}
