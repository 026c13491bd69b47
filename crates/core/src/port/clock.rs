// Clock Port (for testability)

use chrono::{DateTime, NaiveDate, Utc};

/// Clock interface (allows pinning the analysis date in tests)
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current calendar date in UTC
    fn today(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }
}

/// System clock (production)
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
