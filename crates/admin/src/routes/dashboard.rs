//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::instrument;
use vapeshop_core::RequestStatus;

use crate::db::stats::DailyVisits;
use crate::db::{CatalogRepository, StatsRepository, UserRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// One bar of the visits chart.
pub struct DayView {
    pub label: String,
    pub visits: u64,
    /// Bar height as a percentage of the busiest day, in steps of ten so it
    /// maps onto a fixed set of CSS classes.
    pub level: u64,
}

/// Count of records in one status.
pub struct StatusCount {
    pub status: &'static str,
    pub label: &'static str,
    pub orders: usize,
    pub requests: usize,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin: CurrentAdmin,
    pub total_visits: u64,
    pub week_visits: u64,
    pub days: Vec<DayView>,
    pub statuses: Vec<StatusCount>,
    pub customers: usize,
    pub sections: usize,
    pub brands: usize,
    pub products: usize,
}

fn day_views(days: &[DailyVisits]) -> Vec<DayView> {
    let max = days.iter().map(|d| d.visits).max().unwrap_or(0);
    days.iter()
        .map(|d| DayView {
            label: d.date.format("%a %d").to_string(),
            visits: d.visits,
            level: if max == 0 {
                0
            } else {
                // Round up so any non-zero day gets a visible bar
                d.visits.saturating_mul(10).div_ceil(max) * 10
            },
        })
        .collect()
}

/// Dashboard overview page.
#[instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<impl IntoResponse> {
    let db = state.database();
    let stats = StatsRepository::new(db);
    let users = UserRepository::new(db);
    let catalog_repo = CatalogRepository::new(db);

    let (total_visits, last_week, customers, catalog) = tokio::try_join!(
        stats.total_visits(),
        stats.last_7_days(Utc::now().date_naive()),
        users.list(),
        catalog_repo.catalog(),
    )?;

    let statuses = RequestStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status: status.as_str(),
            label: status.label(),
            orders: customers
                .iter()
                .flat_map(|u| u.profile.orders.values())
                .filter(|o| o.status == status)
                .count(),
            requests: customers
                .iter()
                .flat_map(|u| u.profile.requests_newest_first())
                .filter(|(_, _, r)| r.status == status)
                .count(),
        })
        .collect();

    Ok(DashboardTemplate {
        admin,
        total_visits,
        week_visits: last_week.iter().map(|d| d.visits).sum(),
        days: day_views(&last_week),
        statuses,
        customers: customers.len(),
        sections: catalog.sections.len(),
        brands: catalog.brand_count(),
        products: catalog.product_count(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_day_levels_scale_to_busiest_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let days = [
            DailyVisits { date, visits: 0 },
            DailyVisits { date, visits: 1 },
            DailyVisits { date, visits: 40 },
        ];
        let views = day_views(&days);
        assert_eq!(views[0].level, 0);
        assert_eq!(views[1].level, 10);
        assert_eq!(views[2].level, 100);
        assert_eq!(views[2].label, "Mon 04");
    }

    #[test]
    fn test_day_levels_all_zero() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let views = day_views(&[DailyVisits { date, visits: 0 }]);
        assert_eq!(views[0].level, 0);
    }
}
