use time::{Date, Duration};
use tracing::{error, instrument};

use super::dto::{CoursePerformance, PerformanceOverview};
use crate::{
    error::ApiError,
    platform::{CookieJar, Performance, PlatformApi},
};

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn course_performance(course_hash: &str, course_name: Option<String>, p: Performance) -> CoursePerformance {
    CoursePerformance {
        course_hash: course_hash.to_string(),
        course_name: course_name.unwrap_or_else(|| "Unknown".into()),
        attendance: p.attendance,
        assignments: p.assignments_completed,
        quizzes: p.quizzes_completed,
    }
}

/// Averages only count courses that answered; XP is a plain sum.
pub fn summarize(performances: &[Performance], streak_days: u32) -> PerformanceOverview {
    let count = performances.len();
    let (attendance, assignments, xp) = performances.iter().fold((0.0, 0.0, 0), |acc, p| {
        (acc.0 + p.attendance, acc.1 + p.assignments_completed, acc.2 + p.total_xp)
    });
    let avg = |total: f64| if count == 0 { 0.0 } else { round1(total / count as f64) };
    PerformanceOverview {
        lecture_attendance: avg(attendance),
        assignments_completed: avg(assignments),
        total_xp: xp,
        streak_days,
    }
}

/// Consecutive active days ending today, or yesterday if today has nothing yet.
pub fn streak_days(active: &[Date], today: Date) -> u32 {
    let mut days = active.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut days = days.into_iter().skip_while(|d| *d > today).peekable();
    let mut expected = match days.peek() {
        Some(&d) if d == today || Some(d) == today.previous_day() => d,
        _ => return 0,
    };

    let mut streak = 0;
    for day in days {
        if day != expected {
            break;
        }
        streak += 1;
        expected = day - Duration::days(1);
    }
    streak
}

#[instrument(skip(platform, cookies))]
pub async fn course_performances(
    platform: &dyn PlatformApi,
    cookies: &CookieJar,
) -> Result<Vec<(CoursePerformance, Performance)>, ApiError> {
    let courses = platform.courses(cookies).await?;

    let mut out = Vec::new();
    for course in courses {
        let Some(hash) = course.hash else { continue };
        match platform.performance(cookies, &hash).await {
            Ok(p) => out.push((course_performance(&hash, course.name, p.clone()), p)),
            Err(e) => error!(course = %hash, error = %e, "fetching performance failed; skipping course"),
        }
    }
    Ok(out)
}

#[instrument(skip(platform, cookies))]
pub async fn single_course(
    platform: &dyn PlatformApi,
    cookies: &CookieJar,
    course_hash: &str,
) -> Result<CoursePerformance, ApiError> {
    let details = platform.course_details(cookies, course_hash).await?;
    let performance = platform.performance(cookies, course_hash).await?;
    Ok(course_performance(course_hash, details.name, performance))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use time::macros::date;

    use super::*;
    use crate::platform::fakes::FakePlatform;

    fn perf(attendance: f64, assignments: f64, xp: i64) -> Performance {
        Performance {
            attendance,
            assignments_completed: assignments,
            total_xp: xp,
            quizzes_completed: None,
        }
    }

    #[test]
    fn summary_averages_and_rounds() {
        let s = summarize(&[perf(80.0, 10.0, 100), perf(91.0, 5.0, 250), perf(70.0, 4.0, 0)], 3);
        assert_eq!(s.lecture_attendance, 80.3);
        assert_eq!(s.assignments_completed, 6.3);
        assert_eq!(s.total_xp, 350);
        assert_eq!(s.streak_days, 3);
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let s = summarize(&[], 0);
        assert_eq!(s.lecture_attendance, 0.0);
        assert_eq!(s.assignments_completed, 0.0);
        assert_eq!(s.total_xp, 0);
    }

    #[test]
    fn streak_counting() {
        let today = date!(2024 - 03 - 11);
        assert_eq!(streak_days(&[], today), 0);
        assert_eq!(
            streak_days(&[date!(2024 - 03 - 11), date!(2024 - 03 - 10), date!(2024 - 03 - 09)], today),
            3
        );
        // yesterday still counts as an unbroken streak
        assert_eq!(streak_days(&[date!(2024 - 03 - 10), date!(2024 - 03 - 09)], today), 2);
        assert_eq!(streak_days(&[date!(2024 - 03 - 09), date!(2024 - 03 - 08)], today), 0);
        // gap ends the streak; order and duplicates don't matter
        assert_eq!(
            streak_days(
                &[date!(2024 - 03 - 08), date!(2024 - 03 - 11), date!(2024 - 03 - 10), date!(2024 - 03 - 11)],
                today
            ),
            2
        );
    }

    #[tokio::test]
    async fn failing_courses_are_left_out() {
        let mut platform = FakePlatform::with_courses(&["c1", "c2", "c3"]);
        platform.performance = HashMap::from([
            ("c1".to_string(), perf(90.0, 8.0, 120)),
            ("c3".to_string(), perf(60.0, 3.0, 30)),
        ]);

        let rows = course_performances(&platform, &CookieJar::new()).await.unwrap();
        let hashes: Vec<_> = rows.iter().map(|(c, _)| c.course_hash.as_str()).collect();
        assert_eq!(hashes, ["c1", "c3"]);
        assert_eq!(rows[0].0.course_name, "Course c1");

        let perfs: Vec<_> = rows.into_iter().map(|(_, p)| p).collect();
        let s = summarize(&perfs, 0);
        assert_eq!(s.lecture_attendance, 75.0);
        assert_eq!(s.assignments_completed, 5.5);
        assert_eq!(s.total_xp, 150);
    }

    #[tokio::test]
    async fn single_course_uses_details_name() {
        let mut platform = FakePlatform::default();
        platform.course_names.insert("c1".into(), "DSA".into());
        platform.performance.insert(
            "c1".into(),
            Performance {
                quizzes_completed: Some(4.0),
                ..perf(88.0, 7.0, 0)
            },
        );
        let c = single_course(&platform, &CookieJar::new(), "c1").await.unwrap();
        assert_eq!(c.course_name, "DSA");
        assert_eq!(c.quizzes, Some(4.0));

        let missing = single_course(&platform, &CookieJar::new(), "c2").await;
        assert!(missing.is_err());
    }
}
