//! Time-of-day handling for surveillance slots.
//!
//! Start times reach us either as a PostgreSQL `time`, an `interval` since
//! midnight, or plain `HH:MM[:SS]` text. All three are decoded straight into
//! [`ClockMinutes`], so the arithmetic below only ever sees one shape.

use std::{fmt, str::FromStr};

use sqlx::{
    error::BoxDynError,
    postgres::{types::PgInterval, PgTypeInfo, PgValueRef, Postgres},
    Decode, Type, ValueRef,
};
use thiserror::Error;
use time::{macros::format_description, Time};

/// Minutes elapsed since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockMinutes(i64);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid time of day: {0:?}")]
pub struct ClockParseError(String);

impl ClockMinutes {
    pub fn new(minutes: i64) -> Self {
        Self(minutes)
    }

    pub fn from_time(t: Time) -> Self {
        Self::new(i64::from(t.hour()) * 60 + i64::from(t.minute()))
    }

    /// Seconds are truncated; `months` has no fixed length and is ignored.
    pub fn from_interval(iv: &PgInterval) -> Self {
        let seconds = i64::from(iv.days) * 86_400 + iv.microseconds.div_euclid(1_000_000);
        Self::new(seconds.div_euclid(60))
    }

    pub fn plus_minutes(self, minutes: i64) -> Self {
        Self(self.0 + minutes)
    }

    /// Hour and minute on a 24h clock, wrapping past midnight.
    pub fn wall_clock(self) -> (i64, i64) {
        (
            self.0.div_euclid(60).rem_euclid(24),
            self.0.rem_euclid(60),
        )
    }

    /// `HH:MM` counted from midnight without wrapping, so a 25h30 interval reads `25:30`.
    pub fn elapsed_label(self) -> String {
        format!("{:02}:{:02}", self.0.div_euclid(60), self.0.rem_euclid(60))
    }
}

impl fmt::Display for ClockMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m) = self.wall_clock();
        write!(f, "{h:02}:{m:02}")
    }
}

impl FromStr for ClockMinutes {
    type Err = ClockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Time::parse(s, format_description!("[hour]:[minute]:[second].[subsecond]"))
            .or_else(|_| Time::parse(s, format_description!("[hour]:[minute]:[second]")))
            .or_else(|_| Time::parse(s, format_description!("[hour]:[minute]")))
            .map(Self::from_time)
            .map_err(|_| ClockParseError(s.to_string()))
    }
}

impl Type<Postgres> for ClockMinutes {
    fn type_info() -> PgTypeInfo {
        <Time as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <Time as Type<Postgres>>::compatible(ty)
            || <PgInterval as Type<Postgres>>::compatible(ty)
            || <&str as Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for ClockMinutes {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let ty = value.type_info().into_owned();
        if <Time as Type<Postgres>>::compatible(&ty) {
            let t = <Time as Decode<Postgres>>::decode(value)?;
            Ok(Self::from_time(t))
        } else if <PgInterval as Type<Postgres>>::compatible(&ty) {
            let iv = <PgInterval as Decode<Postgres>>::decode(value)?;
            Ok(Self::from_interval(&iv))
        } else {
            let text = <&str as Decode<Postgres>>::decode(value)?;
            Ok(text.parse::<ClockMinutes>()?)
        }
    }
}

/// `"HH:MM - HH:MM"` for a slot, or `"-"` when the start is unknown.
///
/// Only the end is folded onto a 24h clock.
pub fn time_range(start: Option<ClockMinutes>, duration_minutes: i64) -> String {
    match start {
        Some(start) => format!(
            "{} - {}",
            start.elapsed_label(),
            start.plus_minutes(duration_minutes)
        ),
        None => "-".to_string(),
    }
}
