use chrono::{Datelike, Months, NaiveDate};
use tracing::warn;

pub const BIRTHDATE_FORMAT: &str = "%m/%d/%y";

/// Human age line such as `"2 months, 1 day old"`.
///
/// `birthdate` is `MM/DD/YY`. Unset gives "Age unavailable"; anything
/// unparsable, or a date after `today`, gives "Age error".
pub fn describe_age(birthdate: Option<&str>, today: NaiveDate) -> String {
    let Some(raw) = birthdate.map(str::trim).filter(|s| !s.is_empty()) else {
        return "Age unavailable".to_string();
    };

    let birth = match NaiveDate::parse_from_str(raw, BIRTHDATE_FORMAT) {
        Ok(date) => date,
        Err(e) => {
            warn!("Failed to parse birthdate '{}': {}", raw, e);
            return "Age error".to_string();
        }
    };

    match months_and_days(birth, today) {
        Some((months, days)) => format!(
            "{} month{}, {} day{} old",
            months,
            if months != 1 { "s" } else { "" },
            days,
            if days != 1 { "s" } else { "" }
        ),
        None => {
            warn!("Birthdate {} is after {}", birth, today);
            "Age error".to_string()
        }
    }
}

/// Whole months since `birth`, then leftover days. Month ends clamp, so
/// Jan 31 plus one month is Feb 28/29.
fn months_and_days(birth: NaiveDate, today: NaiveDate) -> Option<(u32, i64)> {
    if today < birth {
        return None;
    }

    let mut months =
        (today.year() - birth.year()) * 12 + today.month() as i32 - birth.month() as i32;
    if today.day() < birth.day() {
        months -= 1;
    }
    let mut months = u32::try_from(months.max(0)).ok()?;

    let mut anchor = birth.checked_add_months(Months::new(months))?;
    while anchor > today && months > 0 {
        months -= 1;
        anchor = birth.checked_add_months(Months::new(months))?;
    }

    Some((months, (today - anchor).num_days()))
}
