use std::collections::BTreeMap;

use async_trait::async_trait;
use time::{Date, Duration, OffsetDateTime, Time, UtcOffset};

mod client;
pub mod types;

pub use client::NewtonClient;
pub use types::{
    Assessment, Assignment, Course, CourseDetails, LectureSlot, Performance, Playground, Question,
};

/// Cookie name → value, as captured from the browser after sign-in.
pub type CookieJar = BTreeMap<String, String>;

/// Read-only view of the learning platform for one authenticated student.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn user_info(&self, cookies: &CookieJar) -> anyhow::Result<serde_json::Value>;
    async fn courses(&self, cookies: &CookieJar) -> anyhow::Result<Vec<Course>>;
    async fn course_details(&self, cookies: &CookieJar, course: &str) -> anyhow::Result<CourseDetails>;
    async fn assignments(
        &self,
        cookies: &CookieJar,
        course: &str,
        limit: u32,
        offset: u32,
    ) -> anyhow::Result<Vec<Assignment>>;
    async fn assignment_details(
        &self,
        cookies: &CookieJar,
        course: &str,
        assignment: &str,
    ) -> anyhow::Result<Assignment>;
    async fn assessment_questions(
        &self,
        cookies: &CookieJar,
        course: &str,
        assessment: &str,
    ) -> anyhow::Result<Assessment>;
    async fn lecture_slots(
        &self,
        cookies: &CookieJar,
        course: &str,
        window: TimeWindow,
    ) -> anyhow::Result<Vec<LectureSlot>>;
    async fn coding_playground(
        &self,
        cookies: &CookieJar,
        course: &str,
        playground: &str,
    ) -> anyhow::Result<Playground>;
    async fn frontend_playground(
        &self,
        cookies: &CookieJar,
        course: &str,
        playground: &str,
    ) -> anyhow::Result<Playground>;
    async fn performance(&self, cookies: &CookieJar, course: &str) -> anyhow::Result<Performance>;
}

/// Unix-second bounds for a lecture slot query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    /// `days` whole days starting at local midnight of `date`. `None` when the
    /// end falls outside the representable calendar.
    pub fn days_from(date: Date, days: i64, offset: UtcOffset) -> Option<Self> {
        let start = date.with_time(Time::MIDNIGHT).assume_offset(offset);
        let end = start.checked_add(Duration::days(days))?;
        Some(Self {
            start: start.unix_timestamp(),
            end: end.unix_timestamp(),
        })
    }

    pub fn today(now: OffsetDateTime, offset: UtcOffset) -> Option<Self> {
        Self::days_from(now.checked_to_offset(offset)?.date(), 1, offset)
    }

    pub fn week(start: Date, offset: UtcOffset) -> Option<Self> {
        Self::days_from(start, 7, offset)
    }

    /// Slots that are running or start within the next half day.
    pub fn around(now: OffsetDateTime) -> Self {
        Self {
            start: (now - Duration::hours(2)).unix_timestamp(),
            end: (now + Duration::hours(12)).unix_timestamp(),
        }
    }
}

pub fn offset_from_minutes(minutes: i32) -> UtcOffset {
    UtcOffset::from_whole_seconds(minutes.saturating_mul(60)).unwrap_or(UtcOffset::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};

    #[test]
    fn today_window_is_local_midnight_to_midnight() {
        let w = TimeWindow::today(datetime!(2024-03-10 20:00 UTC), offset!(+5:30)).unwrap();
        // 20:00 UTC is already 01:30 on the 11th in +05:30
        assert_eq!(w.start, datetime!(2024-03-11 0:00 +5:30).unix_timestamp());
        assert_eq!(w.end - w.start, 86_400);
    }

    #[test]
    fn week_window_spans_seven_days() {
        let w = TimeWindow::week(date!(2024-03-11), UtcOffset::UTC).unwrap();
        assert_eq!(w.start, datetime!(2024-03-11 0:00 UTC).unix_timestamp());
        assert_eq!(w.end, datetime!(2024-03-18 0:00 UTC).unix_timestamp());
    }

    #[test]
    fn week_at_the_end_of_the_calendar_is_none() {
        assert_eq!(TimeWindow::week(Date::MAX, UtcOffset::UTC), None);
        assert_eq!(TimeWindow::week(date!(9999-12-31), offset!(-5:00)), None);
        assert!(TimeWindow::week(date!(9999-12-24), UtcOffset::UTC).is_some());
    }

    #[test]
    fn around_window() {
        let now = datetime!(2024-03-11 10:00 UTC);
        let w = TimeWindow::around(now);
        assert_eq!(w.start, datetime!(2024-03-11 8:00 UTC).unix_timestamp());
        assert_eq!(w.end, datetime!(2024-03-11 22:00 UTC).unix_timestamp());
    }

    #[test]
    fn bad_offset_falls_back_to_utc() {
        assert_eq!(offset_from_minutes(330), offset!(+5:30));
        assert_eq!(offset_from_minutes(i32::MAX), UtcOffset::UTC);
    }
}
