//! Temporal consistency of usage restriction periods.
//!
//! A period has an optional start date `S`, duration `D` and end date `E`.
//! Which comparison runs depends on which of the three are present:
//!
//! | S | D | E | finding |
//! |---|---|---|---------|
//! | ✓ | ✓ | ✓ | `E` compared with `S + D`, one of three messages |
//! | ✓ | ✗ | ✓ | `S` compared with `E` (silent when earlier), plus "duration missing" |
//! | ✗ | ✓ | ✗ | start and end missing |
//! | ✓ | ✓ | ✗ | end missing |
//! | any other | | | nothing |
//!
//! The `✗ ✓ ✓` combination is not evaluated.

use chrono::{DateTime, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use super::record::names;
use crate::xml::XmlElement;

static DURATION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .ok()
});

/// An ISO-8601 duration such as `P1Y6M` or `PT12H`.
///
/// Calendar parts (years, months) are kept apart from exact parts so that
/// adding `P1Y` to 29 February lands on 28 February.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IsoDuration {
    /// Years plus months, in months.
    pub months: u32,
    /// Weeks plus days, in days.
    pub days: i64,
    /// Time part, in milliseconds.
    pub millis: i64,
}

impl IsoDuration {
    /// Parses a duration; returns `None` for anything that is not one.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let caps = DURATION_PATTERN.as_ref()?.captures(text)?;
        if caps.iter().skip(1).all(|c| c.is_none()) {
            return None;
        }
        let int = |i: usize| -> Option<i64> {
            caps.get(i).map_or(Some(0), |m| m.as_str().parse::<i64>().ok())
        };

        let months = int(1)?.checked_mul(12)?.checked_add(int(2)?)?;
        let days = int(3)?.checked_mul(7)?.checked_add(int(4)?)?;
        let seconds = caps
            .get(7)
            .map_or(Some(0.0), |m| m.as_str().parse::<f64>().ok())?;
        let millis = int(5)?
            .checked_mul(3_600_000)?
            .checked_add(int(6)?.checked_mul(60_000)?)?
            .checked_add(seconds_to_millis(seconds)?)?;

        Some(Self {
            months: u32::try_from(months).ok()?,
            days,
            millis,
        })
    }

    /// Adds the duration to an instant; `None` on overflow.
    #[must_use]
    pub fn add_to(&self, instant: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        instant
            .checked_add_months(Months::new(self.months))?
            .checked_add_signed(TimeDelta::try_days(self.days)?)?
            .checked_add_signed(TimeDelta::try_milliseconds(self.millis)?)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn seconds_to_millis(seconds: f64) -> Option<i64> {
    let millis = (seconds * 1000.0).round();
    (millis.is_finite() && millis < 9.0e15).then_some(millis as i64)
}

/// Parses an `xs:date` or `xs:dateTime`; values without zone are taken as UTC.
#[must_use]
pub fn parse_instant(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    if text.len() < 10 || !text.is_char_boundary(10) {
        return None;
    }
    let (date, zone) = text.split_at(10);
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    if zone.is_empty() {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).fixed_offset());
    }
    DateTime::parse_from_rfc3339(&format!("{date}T00:00:00{zone}")).ok()
}

/// A restriction period as declared, with the parsed values alongside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionPeriod {
    start: Option<(String, DateTime<FixedOffset>)>,
    duration: Option<(String, IsoDuration)>,
    end: Option<(String, DateTime<FixedOffset>)>,
}

impl RestrictionPeriod {
    /// Builds a period from raw values; unparsable values count as absent.
    #[must_use]
    pub fn from_raw(start: Option<&str>, duration: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: start.and_then(|s| parse_instant(s).map(|v| (s.trim().to_string(), v))),
            duration: duration
                .and_then(|s| IsoDuration::parse(s).map(|v| (s.trim().to_string(), v))),
            end: end.and_then(|s| parse_instant(s).map(|v| (s.trim().to_string(), v))),
        }
    }

    /// Reads a `beperkingGebruikTermijn` element.
    #[must_use]
    pub fn from_element(term: &XmlElement) -> Self {
        let text = |name: &str| term.child(name).map(|e| e.text.as_str());
        Self::from_raw(
            text(names::TERMIJN_STARTDATUM),
            text(names::TERMIJN_LOOPTIJD),
            text(names::TERMIJN_EINDDATUM),
        )
    }

    /// Evaluates the period and returns its findings.
    #[must_use]
    pub fn findings(&self) -> Vec<TemporalFinding> {
        match (&self.start, &self.duration, &self.end) {
            (Some((s_raw, s)), Some((d_raw, d)), Some((e_raw, e))) => {
                // Start plus duration past the calendar's range lies after any end date.
                let ordering = match d.add_to(*s).map(|expected| e.cmp(&expected)) {
                    Some(Ordering::Less) | None => EndOrdering::Earlier,
                    Some(Ordering::Equal) => EndOrdering::Equal,
                    Some(Ordering::Greater) => EndOrdering::Later,
                };
                vec![TemporalFinding::EndVersusStartPlusDuration {
                    ordering,
                    start: s_raw.clone(),
                    duration: d_raw.clone(),
                    end: e_raw.clone(),
                }]
            }
            (Some((s_raw, s)), None, Some((e_raw, e))) => {
                let mut findings = Vec::new();
                match s.cmp(e) {
                    Ordering::Less => {}
                    Ordering::Equal => findings.push(TemporalFinding::StartEqualsEnd {
                        start: s_raw.clone(),
                        end: e_raw.clone(),
                    }),
                    Ordering::Greater => findings.push(TemporalFinding::StartLaterThanEnd {
                        start: s_raw.clone(),
                        end: e_raw.clone(),
                    }),
                }
                findings.push(TemporalFinding::DurationMissing);
                findings
            }
            (None, Some(_), None) => vec![TemporalFinding::StartAndEndMissing],
            (Some(_), Some(_), None) => vec![TemporalFinding::EndMissing],
            _ => Vec::new(),
        }
    }
}

/// How the end date relates to start plus duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOrdering {
    /// End is before start plus duration.
    Earlier,
    /// End is exactly start plus duration.
    Equal,
    /// End is after start plus duration.
    Later,
}

/// One informational finding of the temporal rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporalFinding {
    /// All three present; reports the comparison of end with start plus duration.
    EndVersusStartPlusDuration {
        /// Comparison result.
        ordering: EndOrdering,
        /// Start as declared.
        start: String,
        /// Duration as declared.
        duration: String,
        /// End as declared.
        end: String,
    },
    /// Start and end present and equal.
    StartEqualsEnd {
        /// Start as declared.
        start: String,
        /// End as declared.
        end: String,
    },
    /// Start and end present, start after end.
    StartLaterThanEnd {
        /// Start as declared.
        start: String,
        /// End as declared.
        end: String,
    },
    /// Start and end present without duration.
    DurationMissing,
    /// Duration present without start and end.
    StartAndEndMissing,
    /// Start and duration present without end.
    EndMissing,
}

impl fmt::Display for TemporalFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndVersusStartPlusDuration {
                ordering,
                start,
                duration,
                end,
            } => {
                let relation = match ordering {
                    EndOrdering::Earlier => "eerder dan",
                    EndOrdering::Equal => "gelijk aan",
                    EndOrdering::Later => "later dan",
                };
                write!(
                    f,
                    "Einddatum '{end}' is {relation} startdatum '{start}' plus looptijd '{duration}'."
                )
            }
            Self::StartEqualsEnd { start, end } => {
                write!(f, "Startdatum '{start}' is gelijk aan einddatum '{end}'.")
            }
            Self::StartLaterThanEnd { start, end } => {
                write!(f, "Startdatum '{start}' is later dan einddatum '{end}'.")
            }
            Self::DurationMissing => {
                f.write_str("Looptijd ontbreekt terwijl startdatum en einddatum aanwezig zijn.")
            }
            Self::StartAndEndMissing => {
                f.write_str("Startdatum en einddatum ontbreken terwijl looptijd aanwezig is.")
            }
            Self::EndMissing => {
                f.write_str("Einddatum ontbreekt terwijl startdatum en looptijd aanwezig zijn.")
            }
        }
    }
}

/// Findings for every restriction period of an information object body.
#[must_use]
pub fn check_restriction_periods(object: &XmlElement) -> Vec<String> {
    object
        .children_named(names::BEPERKING_GEBRUIK)
        .filter_map(|restriction| restriction.child(names::BEPERKING_GEBRUIK_TERMIJN))
        .flat_map(|term| RestrictionPeriod::from_element(term).findings())
        .map(|finding| finding.to_string())
        .collect()
}
