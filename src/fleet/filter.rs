use super::BusTaskDue;
use crate::due::Urgency;

/// Post-filter over an aggregated list. Filtering never recomputes anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DueFilter {
    /// Case-insensitive substring of the license plate.
    pub plate: Option<String>,
    pub urgency: Option<Urgency>,
}

impl DueFilter {
    pub fn is_empty(&self) -> bool {
        self.plate.as_deref().is_none_or(|p| p.trim().is_empty()) && self.urgency.is_none()
    }

    pub fn matches(&self, item: &BusTaskDue) -> bool {
        if let Some(urgency) = self.urgency {
            if item.status.urgency != urgency {
                return false;
            }
        }

        match self.plate.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => item
                .license_plate
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply<'a>(&self, items: &'a [BusTaskDue]) -> Vec<&'a BusTaskDue> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}
