use chrono::{DateTime, Datelike, TimeZone as _, Utc};
use serde::Serialize;

use crate::bytes::is_digits;
use crate::error::DecodeError;

/// Reference zone of a packet timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeZone {
    Utc,
    /// Wall-clock local to the sending station; the receiver cannot know
    /// which zone that is.
    LocalToSender,
}

/// A partial wire timestamp. The frame never carries a year, so the record
/// keeps exactly the fields that were transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum Timestamp {
    /// `DDHHMM` day/hour/minute.
    DayHourMinute {
        day: u8,
        hour: u8,
        minute: u8,
        time_zone: TimeZone,
    },
    /// `HHMMSS` hour/minute/second, always zulu.
    HourMinuteSecond { hour: u8, minute: u8, second: u8 },
    /// `MMDDHHMM` month/day/hour/minute, always zulu (positionless weather).
    MonthDayHourMinute {
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
    },
}

/// Time source for expanding partial timestamps, injectable so tests can pin
/// the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A pinned clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Timestamp {
    /// Parse the 7-byte `DDHHMMz` / `DDHHMM/` / `HHMMSSh` group of a
    /// timestamped position. Real feeds carry indicators beyond the
    /// specified `z`; anything that is not `/` or `h` is treated as zulu.
    pub(crate) fn parse(bytes: &[u8; 7]) -> Result<Timestamp, DecodeError> {
        let digits = &bytes[..6];
        if !is_digits(digits) {
            return Err(DecodeError::InvalidTimestamp(
                String::from_utf8_lossy(bytes).into_owned(),
            ));
        }
        let a = two_digits(&digits[0..2]);
        let b = two_digits(&digits[2..4]);
        let c = two_digits(&digits[4..6]);
        Ok(match bytes[6] {
            b'h' => Timestamp::HourMinuteSecond {
                hour: a,
                minute: b,
                second: c,
            },
            b'/' => Timestamp::DayHourMinute {
                day: a,
                hour: b,
                minute: c,
                time_zone: TimeZone::LocalToSender,
            },
            _ => Timestamp::DayHourMinute {
                day: a,
                hour: b,
                minute: c,
                time_zone: TimeZone::Utc,
            },
        })
    }

    /// Parse the 8-digit `MMDDHHMM` group of a positionless weather report.
    pub(crate) fn parse_mdhm(bytes: &[u8; 8]) -> Result<Timestamp, DecodeError> {
        if !is_digits(bytes) {
            return Err(DecodeError::InvalidTimestamp(
                String::from_utf8_lossy(bytes).into_owned(),
            ));
        }
        Ok(Timestamp::MonthDayHourMinute {
            month: two_digits(&bytes[0..2]),
            day: two_digits(&bytes[2..4]),
            hour: two_digits(&bytes[4..6]),
            minute: two_digits(&bytes[6..8]),
        })
    }

    /// Expand this partial timestamp into an absolute instant, filling the
    /// missing year/month/day from the injected clock. Returns `None` for
    /// calendar-impossible values and for sender-local timestamps, whose
    /// zone the receiver cannot resolve.
    pub fn to_datetime(&self, clock: &impl Clock) -> Option<DateTime<Utc>> {
        let now = clock.now();
        match *self {
            Timestamp::DayHourMinute {
                day,
                hour,
                minute,
                time_zone,
            } => {
                if time_zone == TimeZone::LocalToSender {
                    return None;
                }
                Utc.with_ymd_and_hms(
                    now.year(),
                    now.month(),
                    u32::from(day),
                    u32::from(hour),
                    u32::from(minute),
                    0,
                )
                .single()
            }
            Timestamp::HourMinuteSecond {
                hour,
                minute,
                second,
            } => Utc
                .with_ymd_and_hms(
                    now.year(),
                    now.month(),
                    now.day(),
                    u32::from(hour),
                    u32::from(minute),
                    u32::from(second),
                )
                .single(),
            Timestamp::MonthDayHourMinute {
                month,
                day,
                hour,
                minute,
            } => Utc
                .with_ymd_and_hms(
                    now.year(),
                    u32::from(month),
                    u32::from(day),
                    u32::from(hour),
                    u32::from(minute),
                    0,
                )
                .single(),
        }
    }
}

fn two_digits(bytes: &[u8]) -> u8 {
    (bytes[0] - b'0') * 10 + (bytes[1] - b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dhm_zulu() {
        assert_eq!(
            Timestamp::parse(b"092345z"),
            Ok(Timestamp::DayHourMinute {
                day: 9,
                hour: 23,
                minute: 45,
                time_zone: TimeZone::Utc
            })
        );
    }

    #[test]
    fn parse_dhm_local() {
        assert_eq!(
            Timestamp::parse(b"092345/"),
            Ok(Timestamp::DayHourMinute {
                day: 9,
                hour: 23,
                minute: 45,
                time_zone: TimeZone::LocalToSender
            })
        );
    }

    #[test]
    fn parse_hms() {
        assert_eq!(
            Timestamp::parse(b"074849h"),
            Ok(Timestamp::HourMinuteSecond {
                hour: 7,
                minute: 48,
                second: 49
            })
        );
    }

    #[test]
    fn unknown_indicator_is_zulu() {
        for indicator in [b'a', b' ', b'Z'] {
            let mut bytes = *b"3123590";
            bytes[6] = indicator;
            assert_eq!(
                Timestamp::parse(&bytes),
                Ok(Timestamp::DayHourMinute {
                    day: 31,
                    hour: 23,
                    minute: 59,
                    time_zone: TimeZone::Utc
                })
            );
        }
    }

    #[test]
    fn non_digits_fail() {
        assert!(Timestamp::parse(b"09a345z").is_err());
        assert!(Timestamp::parse_mdhm(b"0312i5zz").is_err());
    }

    #[test]
    fn parse_mdhm() {
        assert_eq!(
            Timestamp::parse_mdhm(b"10090556"),
            Ok(Timestamp::MonthDayHourMinute {
                month: 10,
                day: 9,
                hour: 5,
                minute: 56
            })
        );
    }

    #[test]
    fn expansion_with_pinned_clock() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
        let ts = Timestamp::DayHourMinute {
            day: 9,
            hour: 23,
            minute: 45,
            time_zone: TimeZone::Utc,
        };
        assert_eq!(
            ts.to_datetime(&clock),
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 23, 45, 0).unwrap())
        );

        let local = Timestamp::DayHourMinute {
            day: 9,
            hour: 23,
            minute: 45,
            time_zone: TimeZone::LocalToSender,
        };
        assert_eq!(local.to_datetime(&clock), None);

        let impossible = Timestamp::MonthDayHourMinute {
            month: 2,
            day: 31,
            hour: 0,
            minute: 0,
        };
        assert_eq!(impossible.to_datetime(&clock), None);
    }
}
