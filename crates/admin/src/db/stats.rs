//! Visit counters written by the storefront.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use tracing::instrument;
use vapeshop_firebase::{RealtimeDatabase, paths};

use super::RepositoryError;

/// Visits recorded for one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyVisits {
    pub date: NaiveDate,
    pub visits: u64,
}

/// Repository for visit statistics.
pub struct StatsRepository<'a> {
    db: &'a RealtimeDatabase,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(db: &'a RealtimeDatabase) -> Self {
        Self { db }
    }

    /// Total visits since the counter was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database call fails.
    #[instrument(skip(self))]
    pub async fn total_visits(&self) -> Result<u64, RepositoryError> {
        Ok(self.db.get(&paths::total_visits()).await?.unwrap_or(0))
    }

    /// The seven days ending at `today`, oldest first. Days without a
    /// counter report zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the database call fails.
    #[instrument(skip(self))]
    pub async fn last_7_days(&self, today: NaiveDate) -> Result<Vec<DailyVisits>, RepositoryError> {
        let counters: BTreeMap<String, u64> =
            self.db.get(&paths::daily_stats()).await?.unwrap_or_default();
        Ok(window(&counters, today, 7))
    }
}

fn window(counters: &BTreeMap<String, u64>, today: NaiveDate, days: u64) -> Vec<DailyVisits> {
    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| DailyVisits {
            date,
            visits: counters
                .get(&date.format("%Y-%m-%d").to_string())
                .copied()
                .unwrap_or(0),
        })
        .collect()
}
