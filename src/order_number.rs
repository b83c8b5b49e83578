//! Work-order numbers of the form `OT-<year>-<sequence>`.
//!
//! The sequence is owned by the backend, which hands out numbers atomically
//! per tenant and year. Numbers are parsed here for display and validation
//! only; a new number always comes from the backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::backend::FleetBackend;
use crate::error::BackendError;
use crate::models::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber {
    pub year: i32,
    pub sequence: u32,
}

impl OrderNumber {
    pub fn new(year: i32, sequence: u32) -> Self {
        Self { year, sequence }
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OT-{}-{:04}", self.year, self.sequence)
    }
}

impl FromStr for OrderNumber {
    type Err = String;

    /// Accepts at least four sequence digits; sequences past 9999 simply
    /// widen.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid order number '{s}' (expected OT-YYYY-NNNN)");

        let rest = s.trim().strip_prefix("OT-").ok_or_else(invalid)?;
        let (year, sequence) = rest.split_once('-').ok_or_else(invalid)?;

        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if sequence.len() < 4 || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        Ok(OrderNumber {
            year: year.parse().map_err(|_| invalid())?,
            sequence: sequence.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.to_string()
    }
}

/// Asks the backend for a fresh number and checks its shape.
///
/// Each call is a new request: a failed attempt is never replaced by a
/// number remembered from an earlier call.
#[tracing::instrument(skip(backend))]
pub async fn next_order_number<B>(
    backend: &B,
    tenant_id: TenantId,
) -> Result<OrderNumber, BackendError>
where
    B: FleetBackend + ?Sized,
{
    let raw = backend.generate_sequential_order_number(tenant_id).await?;
    let number: OrderNumber = raw.parse().map_err(BackendError::InvalidOrderNumber)?;
    tracing::info!(%number, "Order number issued");
    Ok(number)
}
