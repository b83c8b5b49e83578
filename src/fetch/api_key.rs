use super::HttpClient;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};

use crate::error::BackendError;

/// An [`HttpClient`] wrapper that authenticates against the hosted backend.
///
/// The backend expects the project key twice: raw in the `apikey` header and
/// as a bearer token in `Authorization`.
pub struct ApiKey<C> {
    inner: C,
    key: HeaderValue,
    bearer: HeaderValue,
}

const API_KEY_HEADER: HeaderName = HeaderName::from_static("apikey");

impl<C> ApiKey<C> {
    pub fn new(inner: C, key: &str) -> Result<Self, BackendError> {
        let invalid =
            |_| BackendError::InvalidRequest("API key contains invalid header characters".into());
        let mut key_value = HeaderValue::from_str(key).map_err(invalid)?;
        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?;
        key_value.set_sensitive(true);
        bearer.set_sensitive(true);

        Ok(Self {
            inner,
            key: key_value,
            bearer,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let headers = req.headers_mut();
        headers.insert(API_KEY_HEADER, self.key.clone());
        headers.insert(AUTHORIZATION, self.bearer.clone());
        self.inner.execute(req).await
    }
}
