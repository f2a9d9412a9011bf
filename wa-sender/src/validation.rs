//! Input checks used by the interactive single-send path.
//!
//! The batch path does not call these: a row is eligible as soon as its
//! status is `Not Send` and its name and phone are present.

use tracing::debug;

pub const MIN_PHONE_DIGITS: usize = 10;
pub const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=50;

/// `+` followed by at least ten digits. Spaces after the `+` are ignored.
pub fn validate_phone_number(phone: &str) -> bool {
    let phone = phone.trim();
    let Some(rest) = phone.strip_prefix('+') else {
        debug!("phone '{}' rejected: missing leading '+'", phone);
        return false;
    };

    let digits: Vec<char> = rest.chars().filter(|c| *c != ' ').collect();
    let valid = digits.len() >= MIN_PHONE_DIGITS && digits.iter().all(|c| c.is_ascii_digit());
    if !valid {
        debug!("phone '{}' rejected: needs {} digits after '+'", phone, MIN_PHONE_DIGITS);
    }
    valid
}

pub fn validate_name(name: &str) -> bool {
    NAME_LEN.contains(&name.trim().chars().count())
}

pub fn validate_time(hour: i64, minute: i64) -> bool {
    (0..=23).contains(&hour) && (0..=59).contains(&minute)
}
