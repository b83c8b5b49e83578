use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::FleetBackend;
use crate::error::BackendError;
use crate::history::{select_any_completed, select_latest_end_date, select_per_task};
use crate::models::{Bus, BusId, MaintenanceTask, ServiceRecord, TaskId, TenantId, WorkOrder};
use crate::order_number::OrderNumber;

/// Rows of the three backend tables, as exported to a JSON file:
///
/// ```json
/// {
///   "buses": [{ "id": 1, "empresa_id": 1, "placa": "ABC-123", "kilometraje_actual": 120500 }],
///   "trabajos": [{ "id": 1, "empresa_id": 1, "nombre": "Aceite", "es_programado": true, "intervalo_dias": 90 }],
///   "ordenes_trabajo": []
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub buses: Vec<Bus>,
    #[serde(rename = "trabajos", default)]
    pub tasks: Vec<MaintenanceTask>,
    #[serde(rename = "ordenes_trabajo", default)]
    pub work_orders: Vec<WorkOrder>,
}

/// Backend over rows held in memory. Order numbers continue from the highest
/// sequence already present for each tenant and year.
pub struct MemoryBackend {
    snapshot: Snapshot,
    sequences: Mutex<HashMap<(TenantId, i32), u32>>,
    year: i32,
}

impl MemoryBackend {
    pub fn new(snapshot: Snapshot) -> Self {
        let mut sequences = HashMap::new();
        for order in &snapshot.work_orders {
            let Some(number) = order.number.as_deref().and_then(|n| n.parse::<OrderNumber>().ok())
            else {
                continue;
            };
            let seq = sequences.entry((order.tenant_id, number.year)).or_insert(0);
            *seq = (*seq).max(number.sequence);
        }

        Self {
            snapshot,
            sequences: Mutex::new(sequences),
            year: Utc::now().year(),
        }
    }

    /// Loads a [`Snapshot`] from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self, BackendError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BackendError::Snapshot(format!("cannot read {path}: {e}")))?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        Ok(Self::new(snapshot))
    }

    /// Year stamped on generated order numbers.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn orders_of(&self, bus_id: BusId) -> Vec<WorkOrder> {
        self.snapshot
            .work_orders
            .iter()
            .filter(|o| o.bus_id == bus_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl FleetBackend for MemoryBackend {
    async fn list_active_buses(&self, tenant_id: TenantId) -> Result<Vec<Bus>, BackendError> {
        let mut buses: Vec<Bus> = self
            .snapshot
            .buses
            .iter()
            .filter(|b| b.tenant_id == tenant_id && b.active)
            .cloned()
            .collect();
        buses.sort_by(|a, b| a.license_plate.cmp(&b.license_plate));
        Ok(buses)
    }

    async fn list_scheduled_tasks(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<MaintenanceTask>, BackendError> {
        Ok(self
            .snapshot
            .tasks
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.active && t.scheduled)
            .cloned()
            .collect())
    }

    async fn find_last_completed_service_for_task(
        &self,
        bus_id: BusId,
        task_id: TaskId,
    ) -> Result<Option<ServiceRecord>, BackendError> {
        Ok(select_per_task(&self.orders_of(bus_id), task_id))
    }

    async fn find_last_completed_service_any(
        &self,
        bus_id: BusId,
    ) -> Result<Option<ServiceRecord>, BackendError> {
        Ok(select_any_completed(&self.orders_of(bus_id)))
    }

    async fn latest_completed_end_date(
        &self,
        bus_id: BusId,
    ) -> Result<Option<NaiveDate>, BackendError> {
        Ok(select_latest_end_date(&self.orders_of(bus_id)))
    }

    async fn generate_sequential_order_number(
        &self,
        tenant_id: TenantId,
    ) -> Result<String, BackendError> {
        let mut sequences = self.sequences.lock().await;
        let seq = sequences.entry((tenant_id, self.year)).or_insert(0);
        *seq += 1;
        Ok(OrderNumber::new(self.year, *seq).to_string())
    }
}
