//! Process-wide holiday cache with background refill.
//!
//! The cache only grows. A year is marked loaded after a successful fetch;
//! failed fetches leave no trace and are retried by the next caller. One
//! boolean guards the whole process against overlapping fetches, so a
//! caller arriving while a refill is outstanding simply returns.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::HolidayError;

/// Public holiday-cn dataset, one JSON document per year.
pub const DEFAULT_HOLIDAY_URL: &str =
    "https://cdn.jsdelivr.net/gh/NateScarlet/holiday-cn@master/{year}.json";

static GLOBAL: LazyLock<HolidayCache> = LazyLock::new(HolidayCache::new);

#[derive(Debug, Deserialize)]
struct HolidayYear {
    #[serde(default)]
    days: Vec<HolidayDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HolidayDay {
    date: String,
    is_off_day: bool,
}

/// Where holiday data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidaySource {
    /// URL with a `{year}` placeholder.
    pub url_template: String,
    pub timeout: Duration,
}

impl Default for HolidaySource {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_HOLIDAY_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl HolidaySource {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            ..Self::default()
        }
    }

    pub fn url_for(&self, year: i32) -> String {
        self.url_template.replace("{year}", &year.to_string())
    }

    /// Fetch the off-day keys ("YYYY-MM-DD") published for `year`.
    pub async fn fetch_year(&self, year: i32) -> Result<Vec<String>, HolidayError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|source| HolidayError::Http { year, source })?;

        let resp = client
            .get(self.url_for(year))
            .send()
            .await
            .map_err(|source| HolidayError::Http { year, source })?;

        if !resp.status().is_success() {
            return Err(HolidayError::Status {
                year,
                status: resp.status().as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|source| HolidayError::Http { year, source })?;
        let parsed: HolidayYear = serde_json::from_str(&body).map_err(|e| HolidayError::Decode {
            year,
            message: e.to_string(),
        })?;

        Ok(parsed
            .days
            .into_iter()
            .filter(|d| d.is_off_day)
            .map(|d| d.date)
            .collect())
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    off_days: HashSet<String>,
    loaded_years: HashSet<i32>,
    in_flight: bool,
    source: HolidaySource,
}

/// Cheaply cloneable handle; clones share the same cache.
#[derive(Debug, Clone, Default)]
pub struct HolidayCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl HolidayCache {
    /// A fresh, empty cache using the default source.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(source: HolidaySource) -> Self {
        let cache = Self::new();
        cache.set_source(source);
        cache
    }

    /// The process-scoped cache. Lives for the whole process.
    pub fn global() -> &'static HolidayCache {
        &GLOBAL
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_source(&self, source: HolidaySource) {
        self.lock().source = source;
    }

    pub fn is_off_day(&self, key: &str) -> bool {
        self.lock().off_days.contains(key)
    }

    pub fn is_year_loaded(&self, year: i32) -> bool {
        self.lock().loaded_years.contains(&year)
    }

    pub fn is_fetching(&self) -> bool {
        self.lock().in_flight
    }

    /// Merge off-day keys and mark `year` loaded.
    pub fn merge_year(&self, year: i32, days: impl IntoIterator<Item = String>) {
        let mut inner = self.lock();
        inner.off_days.extend(days);
        inner.loaded_years.insert(year);
    }

    /// Years that still need fetching. December also wants next year,
    /// since holiday data is usually published late.
    fn missing_years(inner: &CacheInner, year: i32, month: u32) -> Vec<i32> {
        let mut years = vec![year];
        if month == 12 {
            years.push(year + 1);
        }
        years.retain(|y| !inner.loaded_years.contains(y));
        years
    }

    /// Take the in-flight flag for the missing years, if any.
    fn claim(&self, year: i32, month: u32) -> Option<(Vec<i32>, HolidaySource)> {
        let mut inner = self.lock();
        let years = Self::missing_years(&inner, year, month);
        if years.is_empty() || inner.in_flight {
            return None;
        }
        inner.in_flight = true;
        Some((years, inner.source.clone()))
    }

    /// Fire-and-forget refill on the ambient tokio runtime.
    ///
    /// No-op when the years are loaded, a fetch is outstanding, or no
    /// runtime is available (a later call retries).
    pub fn ensure_year(&self, year: i32, month: u32) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(year, "no async runtime, holiday refill deferred");
            return;
        };
        let Some((years, source)) = self.claim(year, month) else {
            return;
        };
        let cache = self.clone();
        handle.spawn(async move {
            if let Err(e) = cache.refill(&source, &years).await {
                warn!("holiday refill failed, will retry: {e}");
            }
        });
    }

    /// Awaitable variant of [`ensure_year`](Self::ensure_year).
    ///
    /// Returns `Ok(())` without fetching when there is nothing to do or
    /// another refill holds the in-flight flag.
    pub async fn ensure_year_now(&self, year: i32, month: u32) -> Result<(), HolidayError> {
        match self.claim(year, month) {
            Some((years, source)) => self.refill(&source, &years).await,
            None => Ok(()),
        }
    }

    /// Fetch each year in turn; always releases the in-flight flag.
    async fn refill(&self, source: &HolidaySource, years: &[i32]) -> Result<(), HolidayError> {
        let mut first_err = None;
        for &year in years {
            match source.fetch_year(year).await {
                Ok(days) => {
                    info!(year, off_days = days.len(), "holiday data loaded");
                    self.merge_year(year, days);
                }
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        self.lock().in_flight = false;
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
