//! Users and the requests they submit.
//!
//! A user lives at `users/<id>`, with orders under `users/<id>/orders/<key>`
//! and service requests under `users/<id>/services/<kind>/<key>`. Orders and
//! service requests keep unknown fields in `extra`, so a whole-record rewrite
//! never drops data written by another client. A malformed order or request
//! is skipped on read instead of failing its whole profile.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::list::{deserialize_keyed_lenient, deserialize_list};
use crate::types::{RequestStatus, ServiceKind, timestamp};

/// A storefront customer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "deserialize_keyed_lenient",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub orders: BTreeMap<String, Order>,
    #[serde(default, skip_serializing_if = "Services::is_empty")]
    pub services: Services,
}

/// Service requests grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Services {
    #[serde(
        rename = "product-requests",
        default,
        deserialize_with = "deserialize_keyed_lenient",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub product_requests: BTreeMap<String, ServiceRequest>,
    #[serde(
        rename = "maintenance-requests",
        default,
        deserialize_with = "deserialize_keyed_lenient",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub maintenance_requests: BTreeMap<String, ServiceRequest>,
}

impl Services {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_requests.is_empty() && self.maintenance_requests.is_empty()
    }

    #[must_use]
    pub const fn of_kind(&self, kind: ServiceKind) -> &BTreeMap<String, ServiceRequest> {
        match kind {
            ServiceKind::ProductRequest => &self.product_requests,
            ServiceKind::Maintenance => &self.maintenance_requests,
        }
    }
}

impl UserProfile {
    /// A freshly registered profile with no orders or requests.
    #[must_use]
    pub fn new(name: &str, email: &str, phone: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.trim().to_owned(),
            email: email.trim().to_owned(),
            phone: phone.trim().to_owned(),
            created_at,
            orders: BTreeMap::new(),
            services: Services::default(),
        }
    }

    /// Orders newest first, with their keys.
    #[must_use]
    pub fn orders_newest_first(&self) -> Vec<(&str, &Order)> {
        let mut orders: Vec<(&str, &Order)> =
            self.orders.iter().map(|(k, o)| (k.as_str(), o)).collect();
        orders.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));
        orders
    }

    /// Service requests of both kinds, newest first.
    #[must_use]
    pub fn requests_newest_first(&self) -> Vec<(ServiceKind, &str, &ServiceRequest)> {
        let mut requests: Vec<(ServiceKind, &str, &ServiceRequest)> = ServiceKind::ALL
            .iter()
            .flat_map(|&kind| {
                self.services
                    .of_kind(kind)
                    .iter()
                    .map(move |(k, r)| (kind, k.as_str(), r))
            })
            .collect();
        requests.sort_by(|a, b| b.2.created_at.cmp(&a.2.created_at));
        requests
    }
}

/// One line of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub line: String,
    pub product: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// A customer order, handed off to WhatsApp after it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Order {
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Order input before it is stamped and stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub notes: String,
}

impl NewOrder {
    /// Build the stored record: status `pending`, zero-quantity items dropped.
    #[must_use]
    pub fn into_order(self, created_at: DateTime<Utc>) -> Order {
        Order {
            status: RequestStatus::Pending,
            items: self
                .items
                .into_iter()
                .filter(|i| i.quantity > 0 && !i.product.trim().is_empty())
                .collect(),
            notes: self.notes.trim().to_owned(),
            created_at,
            extra: serde_json::Map::new(),
        }
    }
}

/// A maintenance or custom-product inquiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub description: String,
    /// Device to repair (maintenance requests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Product being asked for (product requests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Service request input before it is stamped and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServiceRequest {
    pub kind: ServiceKind,
    pub description: String,
    pub device: Option<String>,
    pub product: Option<String>,
}

impl NewServiceRequest {
    /// Build the stored record with status `pending`; blank optionals become `None`.
    #[must_use]
    pub fn into_request(self, created_at: DateTime<Utc>) -> ServiceRequest {
        let non_blank = |s: Option<String>| {
            s.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
        };
        ServiceRequest {
            status: RequestStatus::Pending,
            description: self.description.trim().to_owned(),
            device: non_blank(self.device),
            product: non_blank(self.product),
            created_at,
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_profile_decodes_nested_requests() {
        let profile: UserProfile = serde_json::from_value(json!({
            "name": "Ana",
            "email": "ana@example.com",
            "phone": "3001234567",
            "createdAt": 1_700_000_000_000_i64,
            "orders": {
                "-a": { "status": "pending", "items": [{ "product": "Mint Ice", "quantity": 2 }], "createdAt": 1_700_000_000_000_i64 },
                "-b": { "status": "completed", "items": [], "createdAt": 1_700_000_100_000_i64 }
            },
            "services": {
                "maintenance-requests": {
                    "-m": { "description": "Coil burnt", "device": "Xros 3", "createdAt": "2024-01-01T00:00:00Z" }
                }
            }
        }))
        .unwrap();

        let orders = profile.orders_newest_first();
        assert_eq!(orders[0].0, "-b");
        assert_eq!(orders[1].1.total_quantity(), 2);

        let requests = profile.requests_newest_first();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, ServiceKind::Maintenance);
        assert_eq!(requests[0].2.device.as_deref(), Some("Xros 3"));
    }

    #[test]
    fn test_profile_skips_malformed_requests() {
        let profile: UserProfile = serde_json::from_value(json!({
            "name": "Ana",
            "createdAt": 1_700_000_000_000_i64,
            "orders": {
                "-good": { "status": "pending", "items": [{ "product": "Mint Ice" }], "createdAt": 1_700_000_000_000_i64 },
                "-legacy": { "status": "pending", "items": [] },
                "-odd": { "status": "shipped", "items": [], "createdAt": 1_700_000_000_000_i64 }
            },
            "services": {
                "product-requests": {
                    "-p": { "description": "Salt 50", "product": "Salt 50", "createdAt": "2024-01-01T00:00:00Z" },
                    "-broken": "free text"
                }
            }
        }))
        .unwrap();

        assert_eq!(profile.orders.keys().collect::<Vec<_>>(), ["-good"]);
        assert_eq!(profile.services.product_requests.len(), 1);
        assert!(profile.services.product_requests.contains_key("-p"));
    }

    #[test]
    fn test_order_preserves_unknown_fields() {
        let raw = json!({
            "status": "confirmed",
            "items": [{ "product": "Pod", "quantity": 1 }],
            "createdAt": "2024-05-01T10:00:00Z",
            "deliveryAddress": "Calle 1",
            "total": 42
        });
        let order: Order = serde_json::from_value(raw).unwrap();
        assert_eq!(order.extra["deliveryAddress"], "Calle 1");

        let back = serde_json::to_value(&order).unwrap();
        assert_eq!(back["total"], 42);
        assert_eq!(back["status"], "confirmed");
    }

    #[test]
    fn test_new_order_is_pending_and_filters_items() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let order = NewOrder {
            items: vec![
                OrderItem {
                    product: "Mint Ice".to_string(),
                    quantity: 1,
                    ..OrderItem::default()
                },
                OrderItem {
                    product: "Skip".to_string(),
                    quantity: 0,
                    ..OrderItem::default()
                },
            ],
            notes: "  deliver after 5pm ".to_string(),
        }
        .into_order(at);

        assert_eq!(order.status, RequestStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.notes, "deliver after 5pm");
        assert_eq!(order.created_at, at);
    }

    #[test]
    fn test_new_profile_serializes_without_subtrees() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let value = serde_json::to_value(UserProfile::new("Ana", "a@b.co", "300", at)).unwrap();
        assert!(value.get("orders").is_none());
        assert!(value.get("services").is_none());
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_service_request_blank_optionals() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let request = NewServiceRequest {
            kind: ServiceKind::ProductRequest,
            description: "Looking for 50mg salts".to_string(),
            device: Some("  ".to_string()),
            product: Some("Salt 50".to_string()),
        }
        .into_request(at);
        assert_eq!(request.device, None);
        assert_eq!(request.product.as_deref(), Some("Salt 50"));
        assert_eq!(request.status, RequestStatus::Pending);
    }
}
