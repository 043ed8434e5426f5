//! Fair operating hours
//!
//! The backend stores a fair's schedule as a JSON object keyed by the
//! Portuguese weekday name, each value an `[opening, closing]` pair:
//!
//! ```json
//! {"domingo": ["08:00", "12:00"], "sábado": ["07:00", "13:00"]}
//! ```
//!
//! Entries that do not parse (a half-filled day such as `["08:00", ""]`,
//! `null`, an unknown key) are kept verbatim and written back on save, so an
//! edit never drops data it could not read.

use crate::error::{Error, ErrorCode, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Day of the week, in the order fairs are listed
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Domingo,
    Segunda,
    Terca,
    Quarta,
    Quinta,
    Sexta,
    Sabado,
}

impl Weekday {
    /// All days, Sunday first
    pub const ALL: [Weekday; 7] = [
        Weekday::Domingo,
        Weekday::Segunda,
        Weekday::Terca,
        Weekday::Quarta,
        Weekday::Quinta,
        Weekday::Sexta,
        Weekday::Sabado,
    ];

    /// Key used by the backend
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Weekday::Domingo => "domingo",
            Weekday::Segunda => "segunda-feira",
            Weekday::Terca => "terca-feira",
            Weekday::Quarta => "quarta-feira",
            Weekday::Quinta => "quinta-feira",
            Weekday::Sexta => "sexta-feira",
            Weekday::Sabado => "sábado",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Weekday {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let day = match s.trim().to_lowercase().as_str() {
            "domingo" | "dom" => Weekday::Domingo,
            "segunda-feira" | "segunda" | "seg" => Weekday::Segunda,
            "terca-feira" | "terça-feira" | "terca" | "terça" | "ter" => Weekday::Terca,
            "quarta-feira" | "quarta" | "qua" => Weekday::Quarta,
            "quinta-feira" | "quinta" | "qui" => Weekday::Quinta,
            "sexta-feira" | "sexta" | "sex" => Weekday::Sexta,
            "sábado" | "sabado" | "sab" | "sáb" => Weekday::Sabado,
            other => {
                return Err(Error::new(
                    ErrorCode::InvalidFormat,
                    format!("Unknown weekday: {other}"),
                ));
            }
        };
        Ok(day)
    }
}

/// Opening and closing time for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    /// Opening time
    pub opening: NaiveTime,
    /// Closing time
    pub closing: NaiveTime,
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| Error::new(ErrorCode::InvalidFormat, format!("Invalid time: {value:?}")))
}

/// Parse a calendar date typed as `dd/mm/yyyy` or `yyyy-mm-dd`
///
/// Forms show dates the Brazilian way; the backend stores ISO dates.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    // full timestamps as returned by the API keep only the date part
    let iso = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(value, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(iso, "%Y-%m-%d"))
        .map_err(|_| Error::new(ErrorCode::InvalidFormat, format!("Invalid date: {value:?}")))
}

impl DayHours {
    /// Parse an `HH:MM` pair
    pub fn parse(opening: &str, closing: &str) -> Result<Self> {
        Ok(Self {
            opening: parse_time(opening)?,
            closing: parse_time(closing)?,
        })
    }

    fn wire(self) -> [String; 2] {
        [
            self.opening.format("%H:%M").to_string(),
            self.closing.format("%H:%M").to_string(),
        ]
    }
}

/// Weekly schedule of a fair
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct OperatingHours {
    days: BTreeMap<Weekday, DayHours>,
    unparsed: BTreeMap<String, Value>,
}

impl OperatingHours {
    /// Create an empty schedule
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hours for a day, replacing any previous entry
    pub fn set(&mut self, day: Weekday, hours: DayHours) {
        self.unparsed
            .retain(|key, _| key.parse::<Weekday>().ok() != Some(day));
        self.days.insert(day, hours);
    }

    /// Builder-style variant of [`OperatingHours::set`]
    #[must_use]
    pub fn with(mut self, day: Weekday, hours: DayHours) -> Self {
        self.set(day, hours);
        self
    }

    /// Hours for a day
    #[must_use]
    pub fn get(&self, day: Weekday) -> Option<&DayHours> {
        self.days.get(&day)
    }

    /// Days with hours, Sunday first
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DayHours)> {
        self.days.iter().map(|(d, h)| (*d, h))
    }

    /// Stored entries that could not be read as a day with two times
    pub fn unparsed(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.unparsed.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the schedule holds no entry at all, readable or not
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.unparsed.is_empty()
    }

    /// Parse command-line entries of the form `segunda-feira=08:00-12:00`
    pub fn parse_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut hours = Self::new();
        for entry in entries {
            let entry = entry.as_ref();
            let (day, range) = entry.split_once('=').ok_or_else(|| {
                Error::new(
                    ErrorCode::InvalidFormat,
                    format!("Expected DAY=HH:MM-HH:MM, got {entry:?}"),
                )
            })?;
            let (opening, closing) = range.split_once('-').ok_or_else(|| {
                Error::new(
                    ErrorCode::InvalidFormat,
                    format!("Expected HH:MM-HH:MM, got {range:?}"),
                )
            })?;
            hours.set(day.parse()?, DayHours::parse(opening, closing)?);
        }
        Ok(hours)
    }

    /// Reject days whose closing time is not after the opening time
    pub fn validate(&self) -> Result<()> {
        for (day, h) in self.iter() {
            if h.closing <= h.opening {
                return Err(Error::validation(format!(
                    "{day}: closing time {} must be after opening time {}",
                    h.closing.format("%H:%M"),
                    h.opening.format("%H:%M"),
                )));
            }
        }
        Ok(())
    }

    /// Compact one-line summary, e.g. `domingo 08:00-12:00, sábado 07:00-13:00`
    #[must_use]
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(day, h)| {
                format!(
                    "{day} {}-{}",
                    h.opening.format("%H:%M"),
                    h.closing.format("%H:%M")
                )
            })
            .chain(self.unparsed().map(|(key, _)| format!("{key} (incomplete)")))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn parse_entry(key: &str, value: &Value) -> Result<(Weekday, DayHours)> {
    let day = key.parse::<Weekday>()?;
    match value.as_array().map(Vec::as_slice) {
        Some([Value::String(opening), Value::String(closing)]) => {
            Ok((day, DayHours::parse(opening, closing)?))
        }
        _ => Err(Error::invalid_format("expected [opening, closing]")),
    }
}

impl From<BTreeMap<String, Value>> for OperatingHours {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut hours = Self::new();
        for (key, value) in raw {
            match parse_entry(&key, &value) {
                Ok((day, h)) => {
                    hours.days.insert(day, h);
                }
                Err(e) => {
                    tracing::debug!(day = %key, error = %e.message, "Keeping schedule entry as stored");
                    hours.unparsed.insert(key, value);
                }
            }
        }
        hours
    }
}

impl Serialize for OperatingHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len() + self.unparsed.len()))?;
        for (day, h) in self.iter() {
            map.serialize_entry(day.key(), &h.wire())?;
        }
        for (key, value) in &self.unparsed {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let hours =
            OperatingHours::parse_entries(&["sabado=07:00-13:00", "domingo=08:00-12:00"]).unwrap();

        let days: Vec<Weekday> = hours.iter().map(|(d, _)| d).collect();
        assert_eq!(days, vec![Weekday::Domingo, Weekday::Sabado]);
        assert_eq!(hours.summary(), "domingo 08:00-12:00, sábado 07:00-13:00");
    }

    #[test]
    fn test_parse_entries_rejects_garbage() {
        assert!(OperatingHours::parse_entries(&["feriado=08:00-12:00"]).is_err());
        assert!(OperatingHours::parse_entries(&["domingo"]).is_err());
        assert!(OperatingHours::parse_entries(&["domingo=08:00"]).is_err());
        assert!(OperatingHours::parse_entries(&["domingo=8h-12h"]).is_err());
    }

    #[test]
    fn test_validate_closing_after_opening() {
        let ok = OperatingHours::parse_entries(&["quarta=06:00-11:30"]).unwrap();
        assert!(ok.validate().is_ok());

        let bad = OperatingHours::parse_entries(&["quarta=11:30-06:00"]).unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_wire_format() {
        let hours = OperatingHours::new()
            .with(Weekday::Sabado, DayHours::parse("07:00", "13:00").unwrap())
            .with(Weekday::Terca, DayHours::parse("16:00", "20:00").unwrap());

        let json = serde_json::to_string(&hours).unwrap();
        assert_eq!(json, r#"{"terca-feira":["16:00","20:00"],"sábado":["07:00","13:00"]}"#);
    }

    #[test]
    fn test_broken_entries_survive_a_round_trip() {
        let json = r#"{"domingo":["08:00","12:00"],"feriado":["1","2"],"quinta-feira":["08:00",""],"sexta-feira":null}"#;
        let hours: OperatingHours = serde_json::from_str(json).unwrap();

        assert_eq!(hours.iter().count(), 1);
        assert!(hours.get(Weekday::Domingo).is_some());
        assert_eq!(hours.unparsed().count(), 3);

        let back = serde_json::to_value(&hours).unwrap();
        let expected: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(back, expected);
    }

    #[test]
    fn test_set_replaces_unparsed_day() {
        let mut hours: OperatingHours =
            serde_json::from_str(r#"{"sabado": ["07:00", ""]}"#).unwrap();
        assert!(!hours.is_empty());

        hours.set(Weekday::Sabado, DayHours::parse("07:00", "13:00").unwrap());
        assert_eq!(hours.unparsed().count(), 0);
        assert_eq!(
            serde_json::to_string(&hours).unwrap(),
            r#"{"sábado":["07:00","13:00"]}"#
        );
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2019, 3, 25).unwrap();
        assert_eq!(parse_date("25/03/2019").unwrap(), expected);
        assert_eq!(parse_date("2019-03-25").unwrap(), expected);
        assert_eq!(parse_date("2019-03-25T00:00:00.000000Z").unwrap(), expected);
        assert!(parse_date("31/02/2019").is_err());
        assert!(parse_date("ontem").is_err());
    }

    #[test]
    fn test_deserialize_accepts_seconds() {
        let json = r#"{"sexta-feira": ["08:00:00", "12:30:00"]}"#;
        let hours: OperatingHours = serde_json::from_str(json).unwrap();
        assert_eq!(hours.summary(), "sexta-feira 08:00-12:30");
    }
}
