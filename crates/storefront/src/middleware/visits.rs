//! Visit counting.
//!
//! The first page view of each browser session bumps `stats/totalVisits` and
//! today's `dailyStats/<YYYY-MM-DD>` counter (UTC date) in a single
//! server-side increment. Counting failures are logged and never fail the page.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use chrono::{NaiveDate, Utc};
use tower_sessions::Session;
use tracing::{debug, warn};
use vapeshop_firebase::{DbPath, paths};

use crate::models::session_keys;
use crate::state::AppState;

/// Counters bumped for a visit on `date`.
#[must_use]
pub fn visit_counters(date: NaiveDate) -> [DbPath; 2] {
    [paths::total_visits(), paths::daily_visits(date)]
}

/// Only page views count; assets, health checks and form posts do not.
fn is_page_view(request: &Request) -> bool {
    let path = request.uri().path();
    request.method() == Method::GET && !path.starts_with("/static/") && !path.starts_with("/health")
}

/// Count the first page view of each session.
pub async fn count_visits(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if is_page_view(&request) {
        let counted = session
            .get::<bool>(session_keys::VISIT_COUNTED)
            .await
            .ok()
            .flatten()
            .unwrap_or(false);

        if !counted {
            match session.insert(session_keys::VISIT_COUNTED, true).await {
                Ok(()) => {
                    let counters = visit_counters(Utc::now().date_naive());
                    match state.database().increment(&counters, 1).await {
                        Ok(()) => debug!("visit counted"),
                        Err(e) => warn!(error = %e, "failed to count visit"),
                    }
                }
                Err(e) => warn!(error = %e, "failed to mark session as counted"),
            }
        }
    }

    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(method: Method, path: &str) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_page_views() {
        assert!(is_page_view(&request(Method::GET, "/")));
        assert!(is_page_view(&request(Method::GET, "/sections/liquids")));
        assert!(!is_page_view(&request(Method::GET, "/static/css/site.css")));
        assert!(!is_page_view(&request(Method::GET, "/health/ready")));
        assert!(!is_page_view(&request(Method::POST, "/orders")));
    }

    #[test]
    fn test_visit_counters() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let [total, daily] = visit_counters(date);
        assert_eq!(total.to_string(), "/stats/totalVisits");
        assert_eq!(daily.to_string(), "/dailyStats/2024-12-31");
    }
}
