use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tokio::time::Instant;

/// Source of wall-clock time, which dates and credited seconds come from, and of monotonic instants
/// that pace the tick loop. Swapping it out is how tests move across midnight or skip seconds
/// without waiting.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);

    /// Calendar date of the current moment as seen in `zone`.
    fn civil_date(&self, zone: Tz) -> NaiveDate {
        self.time().with_timezone(&zone).date_naive()
    }
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}


#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::America::Los_Angeles;

    use super::{test_clock::TestClock, Clock};

    #[tokio::test]
    async fn civil_date_uses_zone_not_utc() {
        // 2024-03-10 05:30 UTC is still the evening of March 9th in Los Angeles.
        let clock = TestClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 5, 30, 0).unwrap());
        assert_eq!(
            clock.civil_date(Los_Angeles),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
        assert_eq!(
            clock.civil_date(chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }
}
