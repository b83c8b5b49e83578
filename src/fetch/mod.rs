mod api_key;
mod basic;

pub use api_key::ApiKey;
pub use basic::BasicClient;

use async_trait::async_trait;
use reqwest::{Request, Response};
use serde::de::DeserializeOwned;

use crate::error::BackendError;

/// Seam between the backend client and the network. Wrappers such as
/// [`ApiKey`] decorate requests before handing them to the inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// Sends `req` and decodes a JSON body, turning non-2xx answers into
/// [`BackendError::Status`].
pub async fn fetch_json<C, T>(client: &C, req: Request) -> Result<T, BackendError>
where
    C: HttpClient + ?Sized,
    T: DeserializeOwned,
{
    let resp = client.execute(req).await?;
    let status = resp.status();
    let body = resp.bytes().await?;

    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    Ok(serde_json::from_slice(&body)?)
}
