//! Rendering of fleet results: log lines, JSON, and CSV export.

use anyhow::Result;
use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use tracing::{debug, info};

use crate::due::Urgency;
use crate::due::modulo::ModuloEntry;
use crate::fleet::{BusTaskDue, FleetDueReport, SweepReport};

/// Logs any value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Pretty JSON for stdout.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// One flat CSV row per (bus, task) status.
#[derive(Debug, Serialize)]
pub struct DueRow<'a> {
    pub license_plate: &'a str,
    pub bus_id: i64,
    pub task_id: i64,
    pub task_name: &'a str,
    pub urgency: Urgency,
    pub last_service_date: NaiveDate,
    pub last_service_odometer: i64,
    pub next_due_date: NaiveDate,
    pub next_due_odometer: Option<i64>,
    pub days_remaining: i64,
    pub distance_remaining: Option<i64>,
    pub current_odometer: i64,
    pub order_id: i64,
}

impl<'a> From<&'a BusTaskDue> for DueRow<'a> {
    fn from(item: &'a BusTaskDue) -> Self {
        DueRow {
            license_plate: &item.license_plate,
            bus_id: item.bus_id,
            task_id: item.task_id,
            task_name: &item.task_name,
            urgency: item.status.urgency,
            last_service_date: item.status.last_service_date,
            last_service_odometer: item.status.last_service_odometer,
            next_due_date: item.status.next_due_date,
            next_due_odometer: item.status.next_due_odometer,
            days_remaining: item.status.days_remaining,
            distance_remaining: item.status.distance_remaining,
            current_odometer: item.current_odometer,
            order_id: item.service.order_id,
        }
    }
}

/// Writes the rows to `path`, replacing any previous file.
pub fn write_due_csv(path: &str, items: &[&BusTaskDue]) -> Result<()> {
    debug!(path, rows = items.len(), "Writing due status CSV");
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for item in items {
        writer.serialize(DueRow::from(*item))?;
    }
    writer.flush()?;

    Ok(())
}

/// One log line per status plus the summary.
pub fn log_due_report(report: &FleetDueReport, items: &[&BusTaskDue]) {
    for item in items {
        let days = item.status.days_label();
        let distance = item.status.distance_label();
        info!(
            plate = %item.license_plate,
            task = %item.task_name,
            urgency = %item.status.urgency,
            days = %days,
            distance = distance.as_deref(),
            "Due status"
        );
    }

    for issue in &report.task_issues {
        if issue.skips_task() {
            info!(issue = %issue, "Task skipped");
        } else {
            info!(issue = %issue, "Task scheduled on days only");
        }
    }

    info!(
        shown = items.len(),
        urgent = report.summary.urgent_count,
        upcoming = report.summary.upcoming_count,
        ok = report.summary.ok_count,
        failed_lookups = report.lookup_failures.len(),
        "Fleet summary"
    );
}

pub fn log_sweep_report(report: &SweepReport) {
    for entry in &report.entries {
        let last = entry
            .last_service_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "never".to_string());
        info!(
            plate = %entry.license_plate,
            urgency = %entry.urgency,
            days_since = entry.days_since_last_service,
            last_service = %last,
            "Needs attention"
        );
    }
    info!(
        flagged = report.entries.len(),
        failed_lookups = report.lookup_failures.len(),
        "Sweep summary"
    );
}

pub fn log_modulo_entries(entries: &[ModuloEntry]) {
    for entry in entries {
        info!(
            plate = %entry.license_plate,
            odometer = entry.status.odometer,
            remaining_km = entry.status.remaining_km,
            urgency = %entry.status.urgency,
            "Odometer service"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::due::DueStatus;
    use crate::models::ServiceRecord;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn item() -> BusTaskDue {
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        BusTaskDue {
            bus_id: 4,
            license_plate: "ABC-123".to_string(),
            current_odometer: 109_500,
            task_id: 2,
            task_name: "Aceite".to_string(),
            service: ServiceRecord {
                order_id: 9,
                end_date: date,
                odometer: 100_000,
            },
            status: DueStatus {
                task_id: 2,
                last_service_date: date,
                last_service_odometer: 100_000,
                next_due_date: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
                next_due_odometer: Some(110_000),
                days_remaining: 20,
                distance_remaining: Some(500),
                urgency: Urgency::Overdue,
            },
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&item());
    }

    #[test]
    fn test_to_json_contains_urgency() {
        let json = to_json(&item()).unwrap();
        assert!(json.contains("\"overdue\""));
    }

    #[test]
    fn test_write_due_csv_header_and_rows() {
        let path = temp_path("fleet_due_test_rows.csv");
        let _ = fs::remove_file(&path);

        let a = item();
        let b = item();
        write_due_csv(&path, &[&a, &b]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("license_plate,"));
        assert!(lines[1].contains("ABC-123"));
        assert!(lines[1].contains("overdue"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_due_csv_replaces_file() {
        let path = temp_path("fleet_due_test_replace.csv");
        let a = item();
        write_due_csv(&path, &[&a, &a]).unwrap();
        write_due_csv(&path, &[&a]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }
}
