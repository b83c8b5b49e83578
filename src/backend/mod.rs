//! Access to the hosted backend that owns buses, tasks and work orders.
//!
//! [`FleetBackend`] is the async trait the engine consumes.
//! [`RestBackend`] talks to the hosted REST API; [`MemoryBackend`] serves rows
//! held in process (tests, or a JSON snapshot for offline runs).

mod memory;
mod rest;

pub use memory::{MemoryBackend, Snapshot};
pub use rest::RestBackend;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::error::BackendError;
use crate::models::{Bus, BusId, MaintenanceTask, ServiceRecord, TaskId, TenantId};

#[async_trait]
pub trait FleetBackend: Send + Sync {
    /// Buses of the tenant with the active flag set.
    async fn list_active_buses(&self, tenant_id: TenantId) -> Result<Vec<Bus>, BackendError>;

    /// Active tasks of the tenant that take part in the recurring schedule.
    async fn list_scheduled_tasks(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<MaintenanceTask>, BackendError>;

    /// Last completed order of the bus that performed `task_id`.
    async fn find_last_completed_service_for_task(
        &self,
        bus_id: BusId,
        task_id: TaskId,
    ) -> Result<Option<ServiceRecord>, BackendError>;

    /// Last completed order of the bus with an odometer reading, whatever it
    /// performed.
    async fn find_last_completed_service_any(
        &self,
        bus_id: BusId,
    ) -> Result<Option<ServiceRecord>, BackendError>;

    /// End date of the last completed order of the bus, odometer optional.
    async fn latest_completed_end_date(
        &self,
        bus_id: BusId,
    ) -> Result<Option<NaiveDate>, BackendError>;

    /// Next `OT-<year>-<seq>` number for the tenant. Every call consumes a
    /// number; callers must not retry with a previously returned value.
    async fn generate_sequential_order_number(
        &self,
        tenant_id: TenantId,
    ) -> Result<String, BackendError>;
}

#[async_trait]
impl<B: FleetBackend + ?Sized> FleetBackend for Arc<B> {
    async fn list_active_buses(&self, tenant_id: TenantId) -> Result<Vec<Bus>, BackendError> {
        (**self).list_active_buses(tenant_id).await
    }

    async fn list_scheduled_tasks(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<MaintenanceTask>, BackendError> {
        (**self).list_scheduled_tasks(tenant_id).await
    }

    async fn find_last_completed_service_for_task(
        &self,
        bus_id: BusId,
        task_id: TaskId,
    ) -> Result<Option<ServiceRecord>, BackendError> {
        (**self).find_last_completed_service_for_task(bus_id, task_id).await
    }

    async fn find_last_completed_service_any(
        &self,
        bus_id: BusId,
    ) -> Result<Option<ServiceRecord>, BackendError> {
        (**self).find_last_completed_service_any(bus_id).await
    }

    async fn latest_completed_end_date(
        &self,
        bus_id: BusId,
    ) -> Result<Option<NaiveDate>, BackendError> {
        (**self).latest_completed_end_date(bus_id).await
    }

    async fn generate_sequential_order_number(
        &self,
        tenant_id: TenantId,
    ) -> Result<String, BackendError> {
        (**self).generate_sequential_order_number(tenant_id).await
    }
}
