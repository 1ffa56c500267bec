//! Thin wrapper around `cron`/`chrono-tz` (C6): parses and validates a
//! standard 5-field cron expression (minute hour day-of-month month
//! day-of-week) against a named timezone and computes the next fire time
//! relative to an instant.
//!
//! The underlying `cron` crate only parses 6-or-7-field expressions with a
//! leading seconds field, so a 5-field expression is normalized by
//! prepending a `"0"` seconds field before handing it to `Schedule`. A
//! caller who already passes 6 or 7 fields is left untouched.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::error::QueueError;

#[derive(Clone)]
pub struct CronExpr {
    schedule: Schedule,
    tz: Tz,
    raw: String,
}

/// Prepend a `"0"` seconds field to a 5-field expression so `cron::Schedule`
/// (which requires 6 or 7 fields) can parse it. Expressions with 6+ fields
/// already, or anything malformed, pass through unchanged and let
/// `Schedule::from_str` report the error.
fn with_seconds_field(expression: &str) -> String {
    match expression.split_whitespace().count() {
        5 => format!("0 {expression}"),
        _ => expression.to_string(),
    }
}

impl CronExpr {
    pub fn parse(expression: &str, timezone: &str) -> Result<Self, QueueError> {
        let normalized = with_seconds_field(expression);
        let schedule = Schedule::from_str(&normalized)
            .map_err(|e| QueueError::InvalidExpression { expression: expression.to_string(), reason: e.to_string() })?;
        let tz: Tz = timezone.parse().map_err(|_| QueueError::UnknownTimezone(timezone.to_string()))?;
        Ok(Self { schedule, tz, raw: expression.to_string() })
    }

    pub fn expression(&self) -> &str {
        &self.raw
    }

    /// The next fire time strictly after `after`, expressed in UTC.
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, QueueError> {
        let local = after.with_timezone(&self.tz);
        self.schedule.after(&local).next().map(|dt| dt.with_timezone(&Utc)).ok_or(QueueError::NoUpcomingFire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_expression() {
        assert!(CronExpr::parse("not a cron expression", "UTC").is_err());
    }

    #[test]
    fn rejects_unknown_timezone() {
        assert!(CronExpr::parse("* * * * *", "Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn computes_next_fire_in_the_future() {
        let expr = CronExpr::parse("* * * * *", "UTC").unwrap();
        let now = Utc::now();
        let next = expr.next_after(now).unwrap();
        assert!(next > now);
    }

    #[test]
    fn accepts_standard_five_field_expressions() {
        assert!(CronExpr::parse("5 19 * * *", "UTC").is_ok());
        assert!(CronExpr::parse("* * * * *", "UTC").is_ok());
    }

    #[test]
    fn six_field_expressions_with_seconds_still_work() {
        assert!(CronExpr::parse("0 0 0 * * *", "UTC").is_ok());
    }
}
