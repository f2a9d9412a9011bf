//! Waiting for a wall-clock send time.

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use std::time::Duration;

use crate::errors::SenderError;
use crate::validation::validate_time;

/// Time from `now` until the next `hour:minute`.
///
/// A time later today waits until then, an earlier one rolls over to
/// tomorrow, and the current minute (or any time within it) sends at once.
pub fn delay_until(hour: u32, minute: u32, now: NaiveDateTime) -> Result<Duration, SenderError> {
    if !validate_time(i64::from(hour), i64::from(minute)) {
        return Err(SenderError::Validation(format!(
            "{hour:02}:{minute:02} is not a valid time of day"
        )));
    }
    let at = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| SenderError::Validation(format!("{hour:02}:{minute:02} is not a valid time")))?;

    let mut target = now.date().and_time(at);
    if target + ChronoDuration::minutes(1) <= now {
        target += ChronoDuration::days(1);
    }
    let delay = (target - now).to_std().unwrap_or(Duration::ZERO);
    Ok(delay)
}

pub fn delay_until_local(hour: u32, minute: u32) -> Result<Duration, SenderError> {
    delay_until(hour, minute, Local::now().naive_local())
}
