#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde_json::json;

use fleet_due::backend::{FleetBackend, MemoryBackend, Snapshot};
use fleet_due::error::BackendError;
use fleet_due::models::{Bus, BusId, MaintenanceTask, ServiceRecord, TaskId, TenantId};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
}

pub fn days_ago(n: u64) -> String {
    today().checked_sub_days(Days::new(n)).unwrap().to_string()
}

/// Tenant 1 fleet:
///
/// | bus | plate   | km      | history                                   |
/// |-----|---------|---------|-------------------------------------------|
/// | 1   | ABC-101 | 109 500 | oil 19 days ago at 100 000, brakes 199 ago |
/// | 2   | ABD-202 | 50 000  | oil 65 days ago at 45 000, brakes 10 ago   |
/// | 3   | XYZ-303 | 0       | only a cancelled order                     |
/// | 4   | OLD-404 | -       | inactive                                   |
/// | 6   | PRN-606 | 9 600   | generic service 80 days ago, no odometer   |
/// | 7   | NRM-707 | 12 200  | generic service 74 days ago                |
///
/// Bus 5 belongs to tenant 2.
pub fn fleet_snapshot() -> Snapshot {
    serde_json::from_value(json!({
        "buses": [
            { "id": 1, "empresa_id": 1, "placa": "ABC-101", "kilometraje_actual": 109500 },
            { "id": 2, "empresa_id": 1, "placa": "ABD-202", "kilometraje_actual": 50000 },
            { "id": 3, "empresa_id": 1, "placa": "XYZ-303", "kilometraje_actual": 0 },
            { "id": 4, "empresa_id": 1, "placa": "OLD-404", "kilometraje_actual": 300000, "activo": false },
            { "id": 5, "empresa_id": 2, "placa": "OTR-505", "kilometraje_actual": 1000 },
            { "id": 6, "empresa_id": 1, "placa": "PRN-606", "kilometraje_actual": 9600 },
            { "id": 7, "empresa_id": 1, "placa": "NRM-707", "kilometraje_actual": 12200 }
        ],
        "trabajos": [
            { "id": 10, "empresa_id": 1, "nombre": "Cambio de aceite", "es_programado": true,
              "intervalo_dias": 90, "intervalo_km": 10000 },
            { "id": 11, "empresa_id": 1, "nombre": "Revisión de frenos", "es_programado": true,
              "intervalo_dias": 180 },
            { "id": 12, "empresa_id": 1, "nombre": "Lavado", "es_programado": false },
            { "id": 13, "empresa_id": 1, "nombre": "Alineación", "es_programado": true,
              "intervalo_km": 20000 }
        ],
        "ordenes_trabajo": [
            { "id": 100, "empresa_id": 1, "bus_id": 1, "numero_ot": "OT-2026-0007",
              "fecha_inicio": days_ago(20), "fecha_fin": days_ago(19), "estado": "completado",
              "kilometraje": 100000, "trabajos": [10] },
            { "id": 101, "empresa_id": 1, "bus_id": 1, "numero_ot": "OT-2025-0120",
              "fecha_inicio": days_ago(200), "fecha_fin": days_ago(199), "estado": "completado",
              "kilometraje": 60000, "trabajos": [10, 11] },
            { "id": 102, "empresa_id": 1, "bus_id": 2,
              "fecha_inicio": days_ago(66), "fecha_fin": days_ago(65), "estado": "completado",
              "kilometraje": 45000, "trabajos": [10],
              "observaciones": "{\"descripcion\": \"filtro y aceite\"}" },
            { "id": 103, "empresa_id": 1, "bus_id": 2,
              "fecha_inicio": days_ago(10), "fecha_fin": days_ago(10), "estado": "completado",
              "kilometraje": 49000, "trabajos": [11] },
            { "id": 104, "empresa_id": 1, "bus_id": 2,
              "fecha_inicio": days_ago(5), "fecha_fin": null, "estado": "en_proceso",
              "trabajos": [10] },
            { "id": 105, "empresa_id": 1, "bus_id": 3,
              "fecha_inicio": days_ago(30), "fecha_fin": days_ago(30), "estado": "cancelado",
              "trabajos": [10] },
            { "id": 106, "empresa_id": 1, "bus_id": 6,
              "fecha_inicio": days_ago(81), "fecha_fin": days_ago(80), "estado": "completado",
              "trabajos": [] },
            { "id": 107, "empresa_id": 1, "bus_id": 7,
              "fecha_inicio": days_ago(74), "fecha_fin": days_ago(74), "estado": "completado",
              "kilometraje": 12000, "trabajos": [] }
        ]
    }))
    .unwrap()
}

pub fn memory_backend() -> MemoryBackend {
    MemoryBackend::new(fleet_snapshot()).with_year(2026)
}

/// Wraps [`MemoryBackend`] with injected failures and delays.
pub struct FaultyBackend {
    pub inner: MemoryBackend,
    pub fail_buses: bool,
    pub fail_tasks: bool,
    pub failing_buses: HashSet<BusId>,
    pub slow_buses: HashSet<BusId>,
    pub delay: Duration,
    /// Lookups that ran to completion.
    pub completed: Arc<AtomicUsize>,
}

impl FaultyBackend {
    pub fn new() -> Self {
        Self {
            inner: memory_backend(),
            fail_buses: false,
            fail_tasks: false,
            failing_buses: HashSet::new(),
            slow_buses: HashSet::new(),
            delay: Duration::from_secs(5),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn before_lookup(&self, bus_id: BusId) -> Result<(), BackendError> {
        if self.slow_buses.contains(&bus_id) {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing_buses.contains(&bus_id) {
            return Err(BackendError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn done(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FleetBackend for FaultyBackend {
    async fn list_active_buses(&self, tenant_id: TenantId) -> Result<Vec<Bus>, BackendError> {
        if self.fail_buses {
            return Err(BackendError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        self.inner.list_active_buses(tenant_id).await
    }

    async fn list_scheduled_tasks(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<MaintenanceTask>, BackendError> {
        if self.fail_tasks {
            return Err(BackendError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        self.inner.list_scheduled_tasks(tenant_id).await
    }

    async fn find_last_completed_service_for_task(
        &self,
        bus_id: BusId,
        task_id: TaskId,
    ) -> Result<Option<ServiceRecord>, BackendError> {
        self.before_lookup(bus_id).await?;
        let found = self.inner.find_last_completed_service_for_task(bus_id, task_id).await;
        self.done();
        found
    }

    async fn find_last_completed_service_any(
        &self,
        bus_id: BusId,
    ) -> Result<Option<ServiceRecord>, BackendError> {
        self.before_lookup(bus_id).await?;
        let found = self.inner.find_last_completed_service_any(bus_id).await;
        self.done();
        found
    }

    async fn latest_completed_end_date(
        &self,
        bus_id: BusId,
    ) -> Result<Option<NaiveDate>, BackendError> {
        self.before_lookup(bus_id).await?;
        let found = self.inner.latest_completed_end_date(bus_id).await;
        self.done();
        found
    }

    async fn generate_sequential_order_number(
        &self,
        tenant_id: TenantId,
    ) -> Result<String, BackendError> {
        self.inner.generate_sequential_order_number(tenant_id).await
    }
}
