use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
};
use tracing::{error, instrument};

use super::dto::ClassSession;
use crate::{
    error::ApiError,
    platform::{CookieJar, LectureSlot, PlatformApi, TimeWindow},
};

const DAY_TIME: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
const WEEK_TIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const ISO_LOCAL: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
);

/// Which clock format the `time` field of a [`ClassSession`] uses.
#[derive(Debug, Clone, Copy)]
pub enum TimeLabel {
    Day,
    Week,
}

fn label(timestamp: i64, offset: UtcOffset, kind: TimeLabel) -> String {
    let format = match kind {
        TimeLabel::Day => DAY_TIME,
        TimeLabel::Week => WEEK_TIME,
    };
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|t| t.checked_to_offset(offset))
        .and_then(|t| t.format(format).ok())
        .unwrap_or_default()
}

pub fn class_session(slot: LectureSlot, offset: UtcOffset, kind: TimeLabel) -> ClassSession {
    let name = |n: Option<crate::platform::types::Named>| n.and_then(|n| n.name);
    ClassSession {
        time: label(slot.start_timestamp, offset, kind),
        subject: name(slot.lecture).unwrap_or_else(|| "Unknown".into()),
        room: name(slot.room),
        instructor: name(slot.instructor),
        hash: slot.hash,
        join_url: slot.join_url,
        start_timestamp: slot.start_timestamp,
        end_timestamp: slot.end_timestamp,
    }
}

/// Accepts RFC 3339, a local `YYYY-MM-DDTHH:MM[:SS[.fff]]` with or without a
/// trailing `Z`, or a bare `YYYY-MM-DD`. The calendar date is taken as written.
pub fn parse_start_date(raw: &str) -> Result<Date, ApiError> {
    let raw = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(dt.date());
    }
    let local = raw.strip_suffix(['Z', 'z']).unwrap_or(raw);
    if let Ok(dt) = PrimitiveDateTime::parse(local, ISO_LOCAL) {
        return Ok(dt.date());
    }
    Date::parse(raw, ISO_DATE)
        .map_err(|_| ApiError::BadRequest(format!("Invalid start_date: {raw}")))
}

/// Seven days from `start`, rejecting dates whose week runs off the calendar.
pub fn week_window(start: Date, offset: UtcOffset) -> Result<TimeWindow, ApiError> {
    TimeWindow::week(start, offset).ok_or_else(|| ApiError::BadRequest("Invalid start_date".into()))
}

/// Lecture slots of every enrolled course inside `window`, earliest first.
/// Ties keep course order.
#[instrument(skip(platform, cookies))]
pub async fn collect_classes(
    platform: &dyn PlatformApi,
    cookies: &CookieJar,
    window: TimeWindow,
    offset: UtcOffset,
    kind: TimeLabel,
) -> Result<Vec<ClassSession>, ApiError> {
    let courses = platform.courses(cookies).await?;

    let mut classes = Vec::new();
    for course in courses.iter().filter_map(|c| c.hash.as_deref()) {
        match platform.lecture_slots(cookies, course, window).await {
            Ok(slots) => classes.extend(
                slots
                    .into_iter()
                    .map(|slot| class_session(slot, offset, kind)),
            ),
            Err(e) => error!(course, error = %e, "fetching schedule failed; skipping course"),
        }
    }

    classes.sort_by_key(|c| c.start_timestamp);
    Ok(classes)
}

/// First slot with this hash and a join link, looking through every course.
#[instrument(skip(platform, cookies))]
pub async fn find_join_url(
    platform: &dyn PlatformApi,
    cookies: &CookieJar,
    slot_hash: &str,
    now: OffsetDateTime,
) -> Result<String, ApiError> {
    let window = TimeWindow::around(now);
    let courses = platform.courses(cookies).await?;

    for course in courses.iter().filter_map(|c| c.hash.as_deref()) {
        let slots = match platform.lecture_slots(cookies, course, window).await {
            Ok(slots) => slots,
            Err(e) => {
                error!(course, error = %e, "searching for slot failed; skipping course");
                continue;
            }
        };
        if let Some(url) = slots
            .into_iter()
            .filter(|s| s.hash == slot_hash)
            .find_map(|s| s.join_url)
        {
            return Ok(url);
        }
    }

    Err(ApiError::NotFound("Lecture slot not found".into()))
}
