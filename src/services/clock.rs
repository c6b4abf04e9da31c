//! The single place where business-local time is derived.
//!
//! All "today", "is this in the past" and "how long until this booking"
//! questions go through [`BusinessClock`], which pins one IANA timezone.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
pub struct FixedTimeSource(pub DateTime<Utc>);

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct BusinessClock {
    tz: Tz,
    source: Box<dyn TimeSource>,
}

impl BusinessClock {
    pub fn new(timezone: &str, source: Box<dyn TimeSource>) -> anyhow::Result<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid business timezone: {timezone}"))?;
        Ok(Self { tz, source })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.source.now()
    }

    /// Current civil date-time at the business.
    pub fn now_local(&self) -> NaiveDateTime {
        self.source.now().with_timezone(&self.tz).naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date()
    }

    /// The instant a business-local date and time refers to.
    ///
    /// Fall-back (repeated) times resolve to the earlier instant; times
    /// skipped by a spring-forward transition have no instant and yield `None`.
    pub fn localize(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
