//! Fleet-wide due computation for one tenant.
//!
//! [`aggregate_fleet_due_status`] runs the per-task schedule for every
//! (bus, scheduled task) pair, [`sweep_never_serviced`] runs the sweep for
//! every bus and [`fixed_distance_view`] applies the 10 000 km rule to the bus
//! list. [`assess_fleet`] picks one of them by [`DueMode`].

mod fan_out;
mod filter;

pub use fan_out::{FanOut, LookupFailureKind};
pub use filter::DueFilter;

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::FleetBackend;
use crate::due::modulo::{self, ModuloEntry, ModuloThresholds};
use crate::due::schedule::{DueStatus, ScheduleThresholds, compute_due_status_with};
use crate::due::sweep::{self, SweepEntry, SweepThresholds};
use crate::due::{DueMode, Urgency};
use crate::error::FleetError;
use crate::history::{HistoryPolicy, find_last_completed_service};
use crate::models::{Bus, BusId, MaintenanceTask, ServiceRecord, TaskId, TaskIssue, TenantId};
use fan_out::run_bounded;

/// Due status of one task on one bus, with the service record it was
/// computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusTaskDue {
    pub bus_id: BusId,
    pub license_plate: String,
    pub current_odometer: i64,
    pub task_id: TaskId,
    pub task_name: String,
    pub service: ServiceRecord,
    pub status: DueStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DueSummary {
    pub urgent_count: usize,
    pub upcoming_count: usize,
    pub ok_count: usize,
}

impl DueSummary {
    pub fn from_statuses<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a BusTaskDue>,
    {
        let mut summary = DueSummary::default();
        for item in items {
            match item.status.urgency {
                Urgency::Overdue => summary.urgent_count += 1,
                Urgency::Upcoming => summary.upcoming_count += 1,
                Urgency::Ok => summary.ok_count += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.urgent_count + self.upcoming_count + self.ok_count
    }
}

/// A lookup that produced no data because it failed, not because the bus has
/// no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupFailure {
    pub bus_id: BusId,
    pub task_id: Option<TaskId>,
    pub kind: LookupFailureKind,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetDueReport {
    pub tenant_id: TenantId,
    pub today: NaiveDate,
    /// Most urgent first.
    pub statuses: Vec<BusTaskDue>,
    pub summary: DueSummary,
    pub task_issues: Vec<TaskIssue>,
    pub lookup_failures: Vec<LookupFailure>,
}

impl FleetDueReport {
    pub fn filtered(&self, filter: &DueFilter) -> Vec<&BusTaskDue> {
        filter.apply(&self.statuses)
    }

    pub fn is_complete(&self) -> bool {
        self.lookup_failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub tenant_id: TenantId,
    pub today: NaiveDate,
    /// Buses needing attention, most urgent first. Buses below the lower
    /// threshold are absent.
    pub entries: Vec<SweepEntry>,
    pub lookup_failures: Vec<LookupFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum FleetAssessment {
    PerTaskSchedule(FleetDueReport),
    NeverServicedSweep(SweepReport),
    FixedDistanceModulo { tenant_id: TenantId, entries: Vec<ModuloEntry> },
}

/// Per-mode thresholds; each mode only reads its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Thresholds {
    pub schedule: ScheduleThresholds,
    pub sweep: SweepThresholds,
    pub modulo: ModuloThresholds,
}

/// Runs the rule named by `mode` across the tenant's fleet.
pub async fn assess_fleet<B>(
    backend: Arc<B>,
    tenant_id: TenantId,
    mode: DueMode,
    today: NaiveDate,
    fan_out: &FanOut,
    thresholds: &Thresholds,
) -> Result<FleetAssessment, FleetError>
where
    B: FleetBackend + ?Sized + 'static,
{
    match mode {
        DueMode::PerTaskSchedule => aggregate_fleet_due_status_with(
            backend,
            tenant_id,
            today,
            fan_out,
            &thresholds.schedule,
        )
        .await
        .map(FleetAssessment::PerTaskSchedule),
        DueMode::NeverServicedSweep => {
            sweep_never_serviced(backend, tenant_id, today, fan_out, &thresholds.sweep)
                .await
                .map(FleetAssessment::NeverServicedSweep)
        }
        DueMode::FixedDistanceModulo => {
            let entries =
                fixed_distance_view(backend.as_ref(), tenant_id, &thresholds.modulo).await?;
            Ok(FleetAssessment::FixedDistanceModulo { tenant_id, entries })
        }
    }
}

/// Per-task due status for every active bus and scheduled task of the tenant.
///
/// Failing to load buses or tasks is an error. A single history lookup that
/// fails or times out only removes that pair and is listed in
/// [`FleetDueReport::lookup_failures`].
pub async fn aggregate_fleet_due_status<B>(
    backend: Arc<B>,
    tenant_id: TenantId,
    today: NaiveDate,
    fan_out: &FanOut,
) -> Result<FleetDueReport, FleetError>
where
    B: FleetBackend + ?Sized + 'static,
{
    aggregate_fleet_due_status_with(
        backend,
        tenant_id,
        today,
        fan_out,
        &ScheduleThresholds::default(),
    )
    .await
}

#[tracing::instrument(
    skip(backend, fan_out, thresholds),
    fields(concurrency = fan_out.concurrency)
)]
pub async fn aggregate_fleet_due_status_with<B>(
    backend: Arc<B>,
    tenant_id: TenantId,
    today: NaiveDate,
    fan_out: &FanOut,
    thresholds: &ScheduleThresholds,
) -> Result<FleetDueReport, FleetError>
where
    B: FleetBackend + ?Sized + 'static,
{
    let buses = backend
        .list_active_buses(tenant_id)
        .await
        .map_err(|source| FleetError::LoadBuses { tenant_id, source })?;
    let tasks = backend
        .list_scheduled_tasks(tenant_id)
        .await
        .map_err(|source| FleetError::LoadTasks { tenant_id, source })?;

    let (tasks, task_issues) = schedulable_tasks(tasks);

    let pairs: Vec<(usize, usize)> = (0..buses.len())
        .flat_map(|b| (0..tasks.len()).map(move |t| (b, t)))
        .collect();

    info!(
        buses = buses.len(),
        tasks = tasks.len(),
        lookups = pairs.len(),
        "Computing fleet due status"
    );

    let outcomes = run_bounded(pairs, fan_out, |&(b, t)| {
        let backend = backend.clone();
        let bus = buses[b].clone();
        let policy = HistoryPolicy::PerTask { task_id: tasks[t].id };
        async move { find_last_completed_service(backend.as_ref(), &bus, policy).await }
    })
    .await;

    let mut statuses = Vec::new();
    let mut lookup_failures = Vec::new();

    for ((b, t), outcome) in outcomes {
        let (bus, task) = (&buses[b], &tasks[t]);
        match outcome.into_result() {
            Ok(Some(service)) => {
                if let Some(status) = compute_due_status_with(
                    service.end_date,
                    service.odometer,
                    task,
                    bus.current_odometer,
                    today,
                    thresholds,
                ) {
                    statuses.push(BusTaskDue {
                        bus_id: bus.id,
                        license_plate: bus.license_plate.clone(),
                        current_odometer: bus.current_odometer,
                        task_id: task.id,
                        task_name: task.name.clone(),
                        service,
                        status,
                    });
                }
            }
            Ok(None) => {}
            Err((kind, detail)) => {
                warn!(
                    bus_id = bus.id,
                    task_id = task.id,
                    ?kind,
                    detail = detail.as_deref(),
                    "History lookup produced no data"
                );
                lookup_failures.push(LookupFailure {
                    bus_id: bus.id,
                    task_id: Some(task.id),
                    kind,
                    detail,
                });
            }
        }
    }

    sort_statuses(&mut statuses);
    lookup_failures.sort_by_key(|f| (f.bus_id, f.task_id));
    let summary = DueSummary::from_statuses(&statuses);

    info!(
        urgent = summary.urgent_count,
        upcoming = summary.upcoming_count,
        ok = summary.ok_count,
        failed_lookups = lookup_failures.len(),
        "Fleet due status computed"
    );

    Ok(FleetDueReport {
        tenant_id,
        today,
        statuses,
        summary,
        task_issues,
        lookup_failures,
    })
}

/// Keeps tasks the engine can schedule and reports the rest.
pub fn schedulable_tasks(tasks: Vec<MaintenanceTask>) -> (Vec<MaintenanceTask>, Vec<TaskIssue>) {
    let mut kept = Vec::with_capacity(tasks.len());
    let mut issues = Vec::new();

    for task in tasks {
        let task_issues = task.validate();
        for issue in &task_issues {
            warn!(task_id = task.id, issue = %issue, "Scheduled task has invalid interval data");
        }
        issues.extend(task_issues);

        if task.schedulable_day_interval().is_some() {
            kept.push(task);
        }
    }

    (kept, issues)
}

/// Urgency first, then least time left, then plate and task for stable output.
pub fn sort_statuses(statuses: &mut [BusTaskDue]) {
    statuses.sort_by(|a, b| {
        a.status
            .urgency
            .cmp(&b.status.urgency)
            .then(a.status.days_remaining.cmp(&b.status.days_remaining))
            .then_with(|| a.license_plate.cmp(&b.license_plate))
            .then(a.task_id.cmp(&b.task_id))
    });
}

/// Buses whose last completed service is old enough to need attention.
///
/// A bus whose lookup fails is left out of `entries` and listed as a failure;
/// it is not reported as never serviced.
#[tracing::instrument(skip(backend, fan_out, thresholds))]
pub async fn sweep_never_serviced<B>(
    backend: Arc<B>,
    tenant_id: TenantId,
    today: NaiveDate,
    fan_out: &FanOut,
    thresholds: &SweepThresholds,
) -> Result<SweepReport, FleetError>
where
    B: FleetBackend + ?Sized + 'static,
{
    let buses = backend
        .list_active_buses(tenant_id)
        .await
        .map_err(|source| FleetError::LoadBuses { tenant_id, source })?;

    info!(buses = buses.len(), "Running never-serviced sweep");

    let bus_ids: Vec<BusId> = buses.iter().map(|b| b.id).collect();
    let outcomes = run_bounded((0..buses.len()).collect(), fan_out, |&b| {
        let backend = backend.clone();
        let bus_id = bus_ids[b];
        async move { backend.latest_completed_end_date(bus_id).await }
    })
    .await;

    let mut entries = Vec::new();
    let mut lookup_failures = Vec::new();

    for (b, outcome) in outcomes {
        let bus: &Bus = &buses[b];
        match outcome.into_result() {
            Ok(last) => entries.extend(sweep::assess_bus(bus, last, today, thresholds)),
            Err((kind, detail)) => {
                warn!(
                    bus_id = bus.id,
                    ?kind,
                    detail = detail.as_deref(),
                    "Sweep lookup produced no data"
                );
                lookup_failures.push(LookupFailure {
                    bus_id: bus.id,
                    task_id: None,
                    kind,
                    detail,
                });
            }
        }
    }

    sweep::sort_entries(&mut entries);
    lookup_failures.sort_by_key(|f| f.bus_id);

    info!(flagged = entries.len(), failed_lookups = lookup_failures.len(), "Sweep finished");

    Ok(SweepReport {
        tenant_id,
        today,
        entries,
        lookup_failures,
    })
}

/// The 10 000 km list-view rule over the tenant's active buses.
pub async fn fixed_distance_view<B>(
    backend: &B,
    tenant_id: TenantId,
    thresholds: &ModuloThresholds,
) -> Result<Vec<ModuloEntry>, FleetError>
where
    B: FleetBackend + ?Sized,
{
    let buses = backend
        .list_active_buses(tenant_id)
        .await
        .map_err(|source| FleetError::LoadBuses { tenant_id, source })?;
    Ok(modulo::assess_buses(&buses, thresholds))
}
