//! Customer, order and service request repository.
//!
//! Users are written by the storefront and by the browser client, so records
//! are decoded one at a time and malformed users are skipped rather than
//! failing the whole listing.

use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};
use vapeshop_core::{Order, RequestStatus, ServiceKind, ServiceRequest, UserId, UserProfile};
use vapeshop_firebase::{RealtimeDatabase, paths};

use super::RepositoryError;

/// A customer together with their key.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub profile: UserProfile,
}

/// An order with the customer who placed it.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub user_id: UserId,
    pub customer: String,
    pub phone: String,
    pub key: String,
    pub order: Order,
}

/// A service request with the customer who filed it.
#[derive(Debug, Clone)]
pub struct ServiceRecord {
    pub user_id: UserId,
    pub customer: String,
    pub phone: String,
    pub kind: ServiceKind,
    pub key: String,
    pub request: ServiceRequest,
}

/// Repository for user-owned records.
pub struct UserRepository<'a> {
    db: &'a RealtimeDatabase,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a RealtimeDatabase) -> Self {
        Self { db }
    }

    /// All decodable users, newest account first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database call fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let raw: Map<String, Value> = self.db.get(&paths::users()).await?.unwrap_or_default();
        let mut users = decode_users(raw);
        users.sort_by(|a, b| b.profile.created_at.cmp(&a.profile.created_at));
        Ok(users)
    }

    /// Load one user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    #[instrument(skip(self), fields(user = %id))]
    pub async fn get(&self, id: &UserId) -> Result<UserProfile, RepositoryError> {
        self.db
            .get(&paths::user(id))
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
    }

    /// Every order across all users, newest first, optionally filtered by
    /// status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database call fails.
    #[instrument(skip(self))]
    pub async fn orders(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<OrderRecord>, RepositoryError> {
        Ok(collect_orders(self.list().await?, status))
    }

    /// Every service request across all users, newest first, optionally
    /// filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database call fails.
    #[instrument(skip(self))]
    pub async fn service_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ServiceRecord>, RepositoryError> {
        Ok(collect_requests(self.list().await?, status))
    }

    /// Change an order's status, leaving every other field untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist, or `InvalidKey` for a
    /// malformed order key.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn set_order_status(
        &self,
        user: &UserId,
        key: &str,
        status: RequestStatus,
    ) -> Result<(), RepositoryError> {
        let path = paths::order(user, key)?;
        self.patch_status(&path, status, &format!("order {key}"))
            .await?;
        info!(order = key, status = status.as_str(), "order status updated");
        Ok(())
    }

    /// Change a service request's status, leaving every other field untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the request does not exist, or `InvalidKey` for a
    /// malformed request key.
    #[instrument(skip(self), fields(user = %user, kind = %kind))]
    pub async fn set_service_status(
        &self,
        user: &UserId,
        kind: ServiceKind,
        key: &str,
        status: RequestStatus,
    ) -> Result<(), RepositoryError> {
        let path = paths::service(user, kind, key)?;
        self.patch_status(&path, status, &format!("{kind} request {key}"))
            .await?;
        info!(request = key, status = status.as_str(), "service request status updated");
        Ok(())
    }

    async fn patch_status(
        &self,
        path: &vapeshop_firebase::DbPath,
        status: RequestStatus,
        what: &str,
    ) -> Result<(), RepositoryError> {
        // A PATCH on a missing node would create it with only a status.
        if self.db.get::<Value>(path).await?.is_none() {
            return Err(RepositoryError::NotFound(what.to_string()));
        }
        let mut updates = Map::new();
        updates.insert("status".to_string(), json!(status.as_str()));
        self.db.update(path, &updates).await?;
        Ok(())
    }
}

fn decode_users(raw: Map<String, Value>) -> Vec<UserRecord> {
    raw.into_iter()
        .filter_map(|(key, value)| {
            let id = match UserId::parse(&key) {
                Ok(id) => id,
                Err(e) => {
                    warn!(user = %key, error = %e, "skipping user with invalid key");
                    return None;
                }
            };
            match serde_json::from_value::<UserProfile>(value) {
                Ok(profile) => Some(UserRecord { id, profile }),
                Err(e) => {
                    warn!(user = %key, error = %e, "skipping malformed user record");
                    None
                }
            }
        })
        .collect()
}

fn collect_orders(users: Vec<UserRecord>, status: Option<RequestStatus>) -> Vec<OrderRecord> {
    let mut orders: Vec<OrderRecord> = users
        .into_iter()
        .flat_map(|user| {
            let UserRecord { id, profile } = user;
            profile.orders.into_iter().map(move |(key, order)| OrderRecord {
                user_id: id.clone(),
                customer: profile.name.clone(),
                phone: profile.phone.clone(),
                key,
                order,
            })
        })
        .filter(|record| status.is_none_or(|s| record.order.status == s))
        .collect();
    orders.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
    orders
}

fn collect_requests(users: Vec<UserRecord>, status: Option<RequestStatus>) -> Vec<ServiceRecord> {
    let mut requests = Vec::new();
    for UserRecord { id, profile } in users {
        for kind in ServiceKind::ALL {
            for (key, request) in profile.services.of_kind(kind) {
                if status.is_some_and(|s| request.status != s) {
                    continue;
                }
                requests.push(ServiceRecord {
                    user_id: id.clone(),
                    customer: profile.name.clone(),
                    phone: profile.phone.clone(),
                    kind,
                    key: key.clone(),
                    request: request.clone(),
                });
            }
        }
    }
    requests.sort_by(|a, b| b.request.created_at.cmp(&a.request.created_at));
    requests
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn users() -> Map<String, Value> {
        let raw = json!({
            "uid-ana": {
                "name": "Ana",
                "phone": "3001234567",
                "createdAt": "2024-01-01T00:00:00Z",
                "orders": {
                    "-o1": { "status": "pending", "items": [{ "product": "Mint", "quantity": 1 }], "createdAt": "2024-02-01T00:00:00Z" },
                    "-o2": { "status": "completed", "items": [], "createdAt": "2024-03-01T00:00:00Z" }
                },
                "services": {
                    "product-requests": {
                        "-p1": { "description": "Blue razz 50ml", "product": "Blue Razz", "createdAt": "2024-02-15T00:00:00Z" }
                    }
                }
            },
            "uid-luis": {
                "name": "Luis",
                "createdAt": 1_706_745_600_000_i64,
                "orders": {
                    "-o3": { "status": "pending", "items": [], "createdAt": "2024-02-20T00:00:00Z" }
                },
                "services": {
                    "maintenance-requests": {
                        "-m1": { "status": "confirmed", "description": "No fire", "device": "Xros", "createdAt": "2024-03-05T00:00:00Z" }
                    }
                }
            },
            "uid-broken": { "name": "No timestamp" }
        });
        match raw {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_malformed_users_are_skipped() {
        let decoded = decode_users(users());
        assert_eq!(decoded.len(), 2);
        assert!(decoded.iter().all(|u| u.id.as_str() != "uid-broken"));
    }

    #[test]
    fn test_orders_are_flattened_newest_first() {
        let orders = collect_orders(decode_users(users()), None);
        let keys: Vec<&str> = orders.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["-o2", "-o3", "-o1"]);
        assert_eq!(orders[1].customer, "Luis");
    }

    #[test]
    fn test_orders_filter_by_status() {
        let orders = collect_orders(decode_users(users()), Some(RequestStatus::Pending));
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.order.status == RequestStatus::Pending));
    }

    #[test]
    fn test_requests_span_both_kinds() {
        let requests = collect_requests(decode_users(users()), None);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].kind, ServiceKind::Maintenance);
        assert_eq!(requests[1].kind, ServiceKind::ProductRequest);

        let confirmed = collect_requests(decode_users(users()), Some(RequestStatus::Confirmed));
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].key, "-m1");
    }

    #[test]
    fn test_bad_order_does_not_hide_the_customer() {
        let raw = json!({
            "uid-rosa": {
                "name": "Rosa",
                "createdAt": "2024-01-01T00:00:00Z",
                "orders": {
                    "-good": { "status": "pending", "items": [{ "product": "Mint", "quantity": 1 }], "createdAt": "2024-02-01T00:00:00Z" },
                    "-legacy": { "status": "pending", "items": [] },
                    "-foreign": { "status": "shipped", "items": [], "createdAt": "2024-02-02T00:00:00Z" }
                },
                "services": {
                    "maintenance-requests": {
                        "-m1": { "description": "Leaks", "device": "Xros", "createdAt": "2024-03-05T00:00:00Z" },
                        "-m2": { "description": "No date" }
                    }
                }
            }
        });
        let Value::Object(map) = raw else {
            unreachable!()
        };

        let decoded = decode_users(map);
        assert_eq!(decoded.len(), 1);

        let orders = collect_orders(decoded.clone(), None);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].key, "-good");

        let requests = collect_requests(decoded, None);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, "-m1");
    }
}
