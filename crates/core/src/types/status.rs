//! Status and kind enums for user requests.

use serde::{Deserialize, Serialize};

/// Lifecycle status shared by orders and service requests.
///
/// There is no transition table: an admin may move a request from any status
/// to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl RequestStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Completed,
        Self::Cancelled,
    ];

    /// The serialized value (`pending`, `confirmed`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label for templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid request status: {s}")),
        }
    }
}

/// Kind of service request, which is also its subtree name under
/// `users/<id>/services`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    /// A custom product the shop does not list yet.
    #[serde(rename = "product-requests")]
    ProductRequest,
    /// Repair or maintenance of a customer's device.
    #[serde(rename = "maintenance-requests")]
    Maintenance,
}

impl ServiceKind {
    /// Both kinds, product requests first.
    pub const ALL: [Self; 2] = [Self::ProductRequest, Self::Maintenance];

    /// Database subtree name.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::ProductRequest => "product-requests",
            Self::Maintenance => "maintenance-requests",
        }
    }

    /// Human-readable label for templates and WhatsApp messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProductRequest => "Product request",
            Self::Maintenance => "Maintenance request",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product-requests" | "product" => Ok(Self::ProductRequest),
            "maintenance-requests" | "maintenance" => Ok(Self::Maintenance),
            _ => Err(format!("invalid service kind: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        let parsed: RequestStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, RequestStatus::Cancelled);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("Completed".parse(), Ok(RequestStatus::Completed));
        assert_eq!("canceled".parse(), Ok(RequestStatus::Cancelled));
        assert!("shipped".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_status_round_trips_through_as_str() {
        for status in RequestStatus::ALL {
            assert_eq!(status.as_str().parse(), Ok(status));
        }
    }

    #[test]
    fn test_service_kind_paths() {
        assert_eq!(ServiceKind::ProductRequest.path_segment(), "product-requests");
        assert_eq!(
            serde_json::to_string(&ServiceKind::Maintenance).unwrap(),
            "\"maintenance-requests\""
        );
        assert_eq!("maintenance".parse(), Ok(ServiceKind::Maintenance));
    }
}
