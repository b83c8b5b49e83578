//! Finds the service a due computation starts from.
//!
//! Two policies are supported: the last completed order that performed a
//! given task, and the last completed order of any kind. Equal dates are
//! broken by the higher order id so results do not depend on row order.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Reverse;

use crate::backend::FleetBackend;
use crate::error::BackendError;
use crate::models::{Bus, ServiceRecord, TaskId, WorkOrder, WorkOrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum HistoryPolicy {
    PerTask { task_id: TaskId },
    AnyCompleted,
}

/// Looks up the baseline service for `bus` under `policy`.
///
/// `Ok(None)` means the bus has no matching history. Backend failures are
/// returned as errors and are never folded into `Ok(None)`.
#[tracing::instrument(skip(backend, bus), fields(bus_id = bus.id))]
pub async fn find_last_completed_service<B>(
    backend: &B,
    bus: &Bus,
    policy: HistoryPolicy,
) -> Result<Option<ServiceRecord>, BackendError>
where
    B: FleetBackend + ?Sized,
{
    let found = match policy {
        HistoryPolicy::PerTask { task_id } => {
            backend.find_last_completed_service_for_task(bus.id, task_id).await?
        }
        HistoryPolicy::AnyCompleted => backend.find_last_completed_service_any(bus.id).await?,
    };
    tracing::debug!(found = found.is_some(), "History lookup finished");
    Ok(found)
}

/// Per-task policy over a bus's orders.
///
/// Orders are scanned newest start date first; the first completed order with
/// an end date that lists the task wins. A missing odometer is reported as 0,
/// which the engine reads as "no reading".
pub fn select_per_task(orders: &[WorkOrder], task_id: TaskId) -> Option<ServiceRecord> {
    let mut candidates: Vec<&WorkOrder> = orders.iter().collect();
    candidates.sort_by_key(|o| Reverse((o.start_date, o.id)));

    candidates
        .into_iter()
        .find(|o| o.is_closed() && o.performed(task_id))
        .and_then(WorkOrder::service_record)
}

/// Any-completed policy: latest end date among completed orders that carry an
/// odometer reading.
pub fn select_any_completed(orders: &[WorkOrder]) -> Option<ServiceRecord> {
    orders
        .iter()
        .filter(|o| o.is_closed() && o.odometer.is_some())
        .max_by_key(|o| (o.end_date, o.id))
        .and_then(WorkOrder::service_record)
}

/// Latest end date among completed orders, odometer not required.
pub fn select_latest_end_date(orders: &[WorkOrder]) -> Option<NaiveDate> {
    orders
        .iter()
        .filter(|o| o.status == WorkOrderStatus::Completado)
        .filter_map(|o| o.end_date)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn order(
        id: i64,
        start: NaiveDate,
        end: Option<NaiveDate>,
        status: WorkOrderStatus,
        odometer: Option<i64>,
        tasks: &[TaskId],
    ) -> WorkOrder {
        WorkOrder {
            id,
            tenant_id: 1,
            bus_id: 10,
            worker_id: None,
            number: None,
            start_date: start,
            end_date: end,
            status,
            odometer,
            task_ids: tasks.to_vec(),
            cost: None,
            observations: None,
        }
    }

    use WorkOrderStatus::*;

    #[test]
    fn test_per_task_picks_latest_start_that_performed_task() {
        let orders = vec![
            order(1, date(1, 5), Some(date(1, 6)), Completado, Some(10_000), &[1]),
            order(2, date(3, 1), Some(date(3, 2)), Completado, Some(20_000), &[2]),
            order(3, date(2, 1), Some(date(2, 3)), Completado, Some(15_000), &[1, 2]),
        ];
        let record = select_per_task(&orders, 1).unwrap();
        assert_eq!(record.order_id, 3);
        assert_eq!(record.end_date, date(2, 3));
        assert_eq!(record.odometer, 15_000);
    }

    #[test]
    fn test_per_task_skips_open_and_cancelled_orders() {
        let orders = vec![
            order(1, date(1, 5), Some(date(1, 6)), Completado, Some(10_000), &[1]),
            order(2, date(4, 1), None, EnProceso, None, &[1]),
            order(3, date(5, 1), Some(date(5, 1)), Cancelado, Some(30_000), &[1]),
            order(4, date(6, 1), None, Completado, Some(31_000), &[1]),
        ];
        assert_eq!(select_per_task(&orders, 1).unwrap().order_id, 1);
    }

    #[test]
    fn test_per_task_missing_odometer_reads_as_zero() {
        let orders = vec![order(1, date(1, 5), Some(date(1, 6)), Completado, None, &[1])];
        assert_eq!(select_per_task(&orders, 1).unwrap().odometer, 0);
    }

    #[test]
    fn test_per_task_without_history() {
        let orders = vec![order(1, date(1, 5), Some(date(1, 6)), Completado, Some(1), &[2])];
        assert!(select_per_task(&orders, 1).is_none());
        assert!(select_per_task(&[], 1).is_none());
    }

    #[test]
    fn test_any_completed_orders_by_end_date_and_requires_odometer() {
        let orders = vec![
            order(1, date(1, 1), Some(date(3, 10)), Completado, Some(10_000), &[]),
            order(2, date(3, 1), Some(date(3, 20)), Completado, None, &[]),
            order(3, date(3, 5), Some(date(3, 15)), Completado, Some(12_000), &[]),
        ];
        assert_eq!(select_any_completed(&orders).unwrap().order_id, 3);
    }

    #[test]
    fn test_per_task_same_start_date_prefers_higher_id() {
        let orders = vec![
            order(4, date(3, 1), Some(date(3, 2)), Completado, Some(12_000), &[1]),
            order(6, date(3, 1), Some(date(3, 3)), Completado, Some(12_200), &[1]),
            order(5, date(3, 1), Some(date(3, 2)), Completado, Some(12_100), &[1]),
        ];
        let record = select_per_task(&orders, 1).unwrap();
        assert_eq!(record.order_id, 6);
        assert_eq!(record.odometer, 12_200);
    }

    #[test]
    fn test_any_completed_tie_broken_by_higher_id() {
        let orders = vec![
            order(8, date(3, 1), Some(date(3, 15)), Completado, Some(12_000), &[]),
            order(9, date(3, 2), Some(date(3, 15)), Completado, Some(12_100), &[]),
            order(7, date(3, 3), Some(date(3, 15)), Completado, Some(12_050), &[]),
        ];
        assert_eq!(select_any_completed(&orders).unwrap().order_id, 9);
    }

    #[test]
    fn test_latest_end_date_ignores_odometer() {
        let orders = vec![
            order(1, date(1, 1), Some(date(3, 10)), Completado, Some(10_000), &[]),
            order(2, date(3, 1), Some(date(3, 20)), Completado, None, &[]),
            order(3, date(4, 1), Some(date(4, 2)), Cancelado, None, &[]),
        ];
        assert_eq!(select_latest_end_date(&orders), Some(date(3, 20)));
    }
}
