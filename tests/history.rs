mod common;

use chrono::{Days, NaiveDate};
use common::{FaultyBackend, fleet_snapshot, memory_backend, today};
use fleet_due::error::BackendError;
use fleet_due::history::{HistoryPolicy, find_last_completed_service};
use fleet_due::models::Bus;
use fleet_due::observations::Observations;

fn bus(id: i64) -> Bus {
    fleet_snapshot()
        .buses
        .into_iter()
        .find(|b| b.id == id)
        .unwrap()
}

fn days_ago(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).unwrap()
}

#[tokio::test]
async fn test_per_task_policy_skips_orders_without_the_task() {
    let backend = memory_backend();

    let policy = HistoryPolicy::PerTask { task_id: 11 };
    let brakes = find_last_completed_service(&backend, &bus(1), policy)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(brakes.order_id, 101);
    assert_eq!(brakes.end_date, days_ago(199));
    assert_eq!(brakes.odometer, 60_000);
}

#[tokio::test]
async fn test_per_task_policy_ignores_open_and_cancelled_orders() {
    let backend = memory_backend();

    // Bus 2 has an open oil order 5 days ago; the completed one 65 days ago wins.
    let oil_policy = HistoryPolicy::PerTask { task_id: 10 };
    let oil = find_last_completed_service(&backend, &bus(2), oil_policy)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(oil.order_id, 102);

    // Bus 3 only has a cancelled order.
    let none = find_last_completed_service(&backend, &bus(3), oil_policy)
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_any_completed_policy_takes_latest_end_date() {
    let backend = memory_backend();

    let latest = find_last_completed_service(&backend, &bus(2), HistoryPolicy::AnyCompleted)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.order_id, 103);
    assert_eq!(latest.end_date, days_ago(10));
    assert_eq!(latest.odometer, 49_000);
}

#[tokio::test]
async fn test_any_completed_policy_needs_an_odometer() {
    let backend = memory_backend();

    // Bus 6's only completed order has no odometer reading.
    let found = find_last_completed_service(&backend, &bus(6), HistoryPolicy::AnyCompleted)
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_backend_failure_is_not_no_history() {
    let mut faulty = FaultyBackend::new();
    faulty.failing_buses.insert(1);

    let err = find_last_completed_service(&faulty, &bus(1), HistoryPolicy::AnyCompleted)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 503, .. }));
}

#[test]
fn test_order_observations_from_snapshot() {
    let snapshot = fleet_snapshot();
    let order = snapshot.work_orders.iter().find(|o| o.id == 102).unwrap();

    match order.parsed_observations() {
        Observations::StructuredDetails(details) => {
            assert_eq!(details["descripcion"], "filtro y aceite");
        }
        other => panic!("expected structured details, got {other:?}"),
    }

    let plain = snapshot.work_orders.iter().find(|o| o.id == 103).unwrap();
    assert_eq!(plain.parsed_observations(), Observations::Empty);
}
