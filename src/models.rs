//! Data contracts shared by the engine, the history selector and the backends.
//!
//! Wire names follow the hosted backend's column names (`empresa_id`, `placa`,
//! `kilometraje_actual`, ...); Rust names are the English equivalents.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::observations::Observations;

pub type TenantId = i64;
pub type BusId = i64;
pub type TaskId = i64;
pub type OrderId = i64;

/// A bus registered to a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    #[serde(rename = "empresa_id")]
    pub tenant_id: TenantId,
    #[serde(rename = "placa")]
    pub license_plate: String,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(rename = "marca", default)]
    pub make: Option<String>,
    #[serde(rename = "modelo", default)]
    pub model: Option<String>,
    #[serde(rename = "anio", default)]
    pub year: Option<i32>,
    /// Kilometres. Expected to grow over time but never checked.
    #[serde(rename = "kilometraje_actual", default)]
    pub current_odometer: i64,
    #[serde(rename = "activo", default = "default_true")]
    pub active: bool,
}

/// A named, potentially recurring kind of service (oil change, brake check...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub id: TaskId,
    #[serde(rename = "empresa_id")]
    pub tenant_id: TenantId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "es_programado", default)]
    pub scheduled: bool,
    #[serde(rename = "intervalo_dias", default)]
    pub day_interval: Option<i64>,
    #[serde(rename = "intervalo_km", default)]
    pub distance_interval: Option<i64>,
    #[serde(rename = "activo", default = "default_true")]
    pub active: bool,
}

/// Why a task that claims to be scheduled cannot take part in due computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskIssue {
    MissingDayInterval { task_id: TaskId, name: String },
    NonPositiveDayInterval { task_id: TaskId, name: String, value: i64 },
    NonPositiveDistanceInterval { task_id: TaskId, name: String, value: i64 },
}

impl fmt::Display for TaskIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskIssue::MissingDayInterval { task_id, name } => {
                write!(f, "task {task_id} ({name}) is scheduled but has no day interval")
            }
            TaskIssue::NonPositiveDayInterval { task_id, name, value } => {
                write!(f, "task {task_id} ({name}) has a non-positive day interval: {value}")
            }
            TaskIssue::NonPositiveDistanceInterval { task_id, name, value } => {
                write!(f, "task {task_id} ({name}) has a non-positive distance interval: {value}")
            }
        }
    }
}

impl TaskIssue {
    /// Whether the task is left out of due computation. A bad distance
    /// interval only drops the distance signal.
    pub fn skips_task(&self) -> bool {
        !matches!(self, TaskIssue::NonPositiveDistanceInterval { .. })
    }
}

impl MaintenanceTask {
    /// Checks the scheduling data of a task.
    ///
    /// Unscheduled tasks are never reported. A missing distance interval is
    /// accepted; only a present but non-positive one is flagged, and such a
    /// task still schedules on days alone.
    pub fn validate(&self) -> Vec<TaskIssue> {
        let mut issues = Vec::new();
        if !self.scheduled {
            return issues;
        }

        match self.day_interval {
            None => issues.push(TaskIssue::MissingDayInterval {
                task_id: self.id,
                name: self.name.clone(),
            }),
            Some(days) if days <= 0 => issues.push(TaskIssue::NonPositiveDayInterval {
                task_id: self.id,
                name: self.name.clone(),
                value: days,
            }),
            Some(_) => {}
        }

        if let Some(km) = self.distance_interval {
            if km <= 0 {
                issues.push(TaskIssue::NonPositiveDistanceInterval {
                    task_id: self.id,
                    name: self.name.clone(),
                    value: km,
                });
            }
        }

        issues
    }

    /// Day interval if the task can be scheduled at all.
    pub fn schedulable_day_interval(&self) -> Option<i64> {
        if !self.scheduled {
            return None;
        }
        self.day_interval.filter(|d| *d > 0)
    }

    /// Distance interval, ignoring non-positive values.
    pub fn effective_distance_interval(&self) -> Option<i64> {
        self.distance_interval.filter(|km| *km > 0)
    }
}

/// Work-order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Pendiente,
    EnProceso,
    Completado,
    Cancelado,
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pendiente => "pendiente",
            WorkOrderStatus::EnProceso => "en_proceso",
            WorkOrderStatus::Completado => "completado",
            WorkOrderStatus::Cancelado => "cancelado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completado | WorkOrderStatus::Cancelado)
    }

    /// Orders start in `pendiente`; `completado` and `cancelado` are final.
    pub fn can_transition_to(&self, next: WorkOrderStatus) -> bool {
        use WorkOrderStatus::*;
        matches!(
            (self, next),
            (Pendiente, EnProceso)
                | (Pendiente, Completado)
                | (Pendiente, Cancelado)
                | (EnProceso, Completado)
                | (EnProceso, Cancelado)
        )
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(WorkOrderStatus::Pendiente),
            "en_proceso" => Ok(WorkOrderStatus::EnProceso),
            "completado" => Ok(WorkOrderStatus::Completado),
            "cancelado" => Ok(WorkOrderStatus::Cancelado),
            other => Err(format!("unknown work order status: {other}")),
        }
    }
}

/// A work order (OT) as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: OrderId,
    #[serde(rename = "empresa_id")]
    pub tenant_id: TenantId,
    pub bus_id: BusId,
    #[serde(rename = "trabajador_id", default)]
    pub worker_id: Option<i64>,
    #[serde(rename = "numero_ot", default)]
    pub number: Option<String>,
    #[serde(rename = "fecha_inicio", deserialize_with = "wire_date::required")]
    pub start_date: NaiveDate,
    #[serde(rename = "fecha_fin", default, deserialize_with = "wire_date::optional")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "estado")]
    pub status: WorkOrderStatus,
    #[serde(rename = "kilometraje", default)]
    pub odometer: Option<i64>,
    #[serde(rename = "trabajos", default)]
    pub task_ids: Vec<TaskId>,
    #[serde(rename = "costo", default)]
    pub cost: Option<f64>,
    #[serde(rename = "observaciones", default)]
    pub observations: Option<String>,
}

impl WorkOrder {
    /// Completed with an end date. The sweep accepts these.
    pub fn is_closed(&self) -> bool {
        self.status == WorkOrderStatus::Completado && self.end_date.is_some()
    }

    /// Baseline for the engine. A missing odometer is recorded as 0.
    pub fn service_record(&self) -> Option<ServiceRecord> {
        if self.status != WorkOrderStatus::Completado {
            return None;
        }
        Some(ServiceRecord {
            order_id: self.id,
            end_date: self.end_date?,
            odometer: self.odometer.unwrap_or(0),
        })
    }

    pub fn performed(&self, task_id: TaskId) -> bool {
        self.task_ids.contains(&task_id)
    }

    pub fn parsed_observations(&self) -> Observations {
        Observations::parse(self.observations.as_deref())
    }
}

/// The baseline a due computation starts from: when and at what odometer a
/// service was last closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub order_id: OrderId,
    pub end_date: NaiveDate,
    pub odometer: i64,
}

fn default_true() -> bool {
    true
}

/// Backend dates arrive as `YYYY-MM-DD`, naive timestamps or RFC 3339
/// timestamps. Only the calendar date is kept.
pub(crate) mod wire_date {
    use super::*;

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(d);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(dt.date());
            }
        }
        None
    }

    pub fn required<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}"))),
        }
    }
}
