use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, Request, Url};
use serde_json::json;
use tracing::debug;

use super::FleetBackend;
use crate::error::BackendError;
use crate::fetch::{HttpClient, fetch_json};
use crate::history::{select_any_completed, select_latest_end_date, select_per_task};
use crate::models::{Bus, BusId, MaintenanceTask, ServiceRecord, TaskId, TenantId, WorkOrder};

const BUSES: &str = "buses";
const TASKS: &str = "trabajos";
const WORK_ORDERS: &str = "ordenes_trabajo";
const ORDER_NUMBER_RPC: &str = "generar_numero_ot";

/// Client for the hosted backend's REST interface (PostgREST conventions:
/// one path per table, `column=op.value` filters, `rpc/<fn>` for functions).
pub struct RestBackend<C> {
    client: C,
    base_url: Url,
}

impl<C: HttpClient> RestBackend<C> {
    /// `base_url` is the project URL, e.g. `https://xyz.example.co`.
    pub fn new(client: C, base_url: &str) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            BackendError::InvalidRequest(format!("invalid backend URL '{base_url}': {e}"))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (column, filter) in filters {
                query.append_pair(column, filter);
            }
        }
        Ok(url)
    }

    async fn select<T>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.table_url(table, filters)?;
        debug!(%url, "Backend select");
        fetch_json(&self.client, Request::new(Method::GET, url)).await
    }

    async fn completed_orders(
        &self,
        bus_id: BusId,
        extra: &[(&str, String)],
    ) -> Result<Vec<WorkOrder>, BackendError> {
        let mut filters = vec![
            ("bus_id", format!("eq.{bus_id}")),
            ("estado", "eq.completado".to_string()),
            ("fecha_fin", "not.is.null".to_string()),
        ];
        filters.extend(extra.iter().cloned());
        self.select(WORK_ORDERS, &filters).await
    }
}

#[async_trait]
impl<C: HttpClient> FleetBackend for RestBackend<C> {
    async fn list_active_buses(&self, tenant_id: TenantId) -> Result<Vec<Bus>, BackendError> {
        self.select(
            BUSES,
            &[
                ("empresa_id", format!("eq.{tenant_id}")),
                ("activo", "eq.true".to_string()),
                ("order", "placa.asc".to_string()),
            ],
        )
        .await
    }

    async fn list_scheduled_tasks(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<MaintenanceTask>, BackendError> {
        self.select(
            TASKS,
            &[
                ("empresa_id", format!("eq.{tenant_id}")),
                ("activo", "eq.true".to_string()),
                ("es_programado", "eq.true".to_string()),
                ("order", "nombre.asc".to_string()),
            ],
        )
        .await
    }

    async fn find_last_completed_service_for_task(
        &self,
        bus_id: BusId,
        task_id: TaskId,
    ) -> Result<Option<ServiceRecord>, BackendError> {
        let orders = self
            .completed_orders(
                bus_id,
                &[
                    ("trabajos", format!("cs.{{{task_id}}}")),
                    ("order", "fecha_inicio.desc,id.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(select_per_task(&orders, task_id))
    }

    async fn find_last_completed_service_any(
        &self,
        bus_id: BusId,
    ) -> Result<Option<ServiceRecord>, BackendError> {
        let orders = self
            .completed_orders(
                bus_id,
                &[
                    ("kilometraje", "not.is.null".to_string()),
                    ("order", "fecha_fin.desc,id.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(select_any_completed(&orders))
    }

    async fn latest_completed_end_date(
        &self,
        bus_id: BusId,
    ) -> Result<Option<NaiveDate>, BackendError> {
        let orders = self
            .completed_orders(
                bus_id,
                &[
                    ("order", "fecha_fin.desc,id.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(select_latest_end_date(&orders))
    }

    async fn generate_sequential_order_number(
        &self,
        tenant_id: TenantId,
    ) -> Result<String, BackendError> {
        let url = self
            .base_url
            .join(&format!("rest/v1/rpc/{ORDER_NUMBER_RPC}"))
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;

        let body = serde_json::to_vec(&json!({ "p_empresa_id": tenant_id }))?;
        let mut req = Request::new(Method::POST, url);
        req.headers_mut().insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        *req.body_mut() = Some(body.into());

        debug!(tenant_id, "Requesting order number");
        fetch_json(&self.client, req).await
    }
}
