use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Human-readable label for how long ago `instant` was, relative to `now`.
///
/// Calendar fields (weekday, day of month, year) are taken in `now`'s offset.
pub fn format_relative(instant: OffsetDateTime, now: OffsetDateTime) -> String {
    let diff = (now - instant).whole_seconds();
    if diff < 10 {
        return "just now".to_string();
    }
    if diff < MINUTE {
        return format!("{} ago", pluralize(diff, "second"));
    }
    let minutes = diff / MINUTE;
    if minutes < 60 {
        return format!("{} ago", pluralize(minutes, "minute"));
    }
    let hours = diff / HOUR;
    if hours < 24 {
        return format!("{} ago", pluralize(hours, "hour"));
    }

    let local = instant.to_offset(now.offset());
    match diff / DAY {
        1 => "yesterday".to_string(),
        7 => "last week".to_string(),
        days if days < 7 => local.weekday().to_string(),
        _ if local.year() == now.year() => local
            .format(format_description!("[day padding:none] [month repr:short]"))
            .unwrap_or_else(|_| format_absolute(instant)),
        _ => local
            .format(format_description!(
                "[day padding:none] [month repr:short], [year]"
            ))
            .unwrap_or_else(|_| format_absolute(instant)),
    }
}

pub fn format_absolute(instant: OffsetDateTime) -> String {
    instant
        .format(&Rfc3339)
        .unwrap_or_else(|_| instant.unix_timestamp().to_string())
}

fn pluralize(value: i64, unit: &str) -> String {
    if value == 1 {
        format!("{value} {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    // Wednesday
    const NOW: OffsetDateTime = datetime!(2024-06-12 15:00:00 UTC);

    fn label(ago: Duration) -> String {
        format_relative(NOW - ago, NOW)
    }

    #[test]
    fn recent_edits_are_just_now() {
        assert_eq!(label(Duration::ZERO), "just now");
        assert_eq!(label(Duration::seconds(9)), "just now");
        assert_eq!(format_relative(NOW + Duration::minutes(5), NOW), "just now");
    }

    #[test]
    fn seconds_minutes_and_hours_pluralize() {
        assert_eq!(label(Duration::seconds(10)), "10 seconds ago");
        assert_eq!(label(Duration::seconds(59)), "59 seconds ago");
        assert_eq!(label(Duration::seconds(61)), "1 minute ago");
        assert_eq!(label(Duration::minutes(2)), "2 minutes ago");
        assert_eq!(label(Duration::minutes(61)), "1 hour ago");
        assert_eq!(label(Duration::hours(23)), "23 hours ago");
    }

    #[test]
    fn tier_boundaries_round_into_the_next_tier() {
        assert_eq!(label(Duration::seconds(60)), "1 minute ago");
        assert_eq!(label(Duration::seconds(3_600)), "1 hour ago");
        assert_eq!(label(Duration::seconds(86_400)), "yesterday");
    }

    #[test]
    fn day_tiers_use_weekday_names_then_last_week() {
        assert_eq!(label(Duration::hours(47)), "yesterday");
        assert_eq!(label(Duration::days(2)), "Monday");
        assert_eq!(label(Duration::days(6)), "Thursday");
        assert_eq!(label(Duration::days(7)), "last week");
    }

    #[test]
    fn older_dates_show_day_and_month() {
        assert_eq!(label(Duration::days(9)), "3 Jun");
        let last_year = datetime!(2023-11-21 08:00:00 UTC);
        assert_eq!(format_relative(last_year, NOW), "21 Nov, 2023");
    }

    #[test]
    fn calendar_fields_follow_the_reference_offset() {
        let now = datetime!(2024-06-12 01:00:00 +02:00);
        // Saturday 23:30 UTC is already Sunday 01:30 at +02:00.
        let instant = datetime!(2024-06-08 23:30:00 UTC);
        assert_eq!(format_relative(instant, now), "Sunday");
    }

    #[test]
    fn absolute_format_is_rfc3339() {
        assert_eq!(format_absolute(NOW), "2024-06-12T15:00:00Z");
    }
}
