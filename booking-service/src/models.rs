use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use common_http_errors::ApiError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::countries::resolve_country;

pub const MAX_REQUESTED_BY_LEN: u64 = 100;
pub const MAX_DURATION_MINUTES: i64 = i16::MAX as i64;

const NAIVE_EVENT_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "street must not be empty"))]
    pub street: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "city must not be empty"))]
    pub city: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, message = "state must not be empty when given"))]
    pub state: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_country"))]
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "accepted" => Ok(BookingStatus::Accepted),
            "rejected" => Ok(BookingStatus::Rejected),
            other => Err(format!("unknown booking status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub id: i32,
    pub event_time: DateTime<Utc>,
    pub address: Address,
    pub topic: String,
    pub duration_minutes: i16,
    pub requested_by: String,
    pub status: BookingStatus,
}

/// Validated submission, ready to persist with status `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub event_time: DateTime<Utc>,
    pub address: Address,
    pub topic: String,
    pub duration_minutes: i16,
    pub requested_by: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmissionRequest {
    /// RFC 3339, or a naive timestamp taken as UTC.
    #[serde(deserialize_with = "event_time")]
    pub event_time: DateTime<Utc>,
    #[validate(nested)]
    pub address: Address,
    #[serde(deserialize_with = "trimmed")]
    pub topic: String,
    #[validate(range(min = 1, max = 32767, message = "duration_minutes must be between 1 and 32767"))]
    pub duration_minutes: i64,
    #[serde(deserialize_with = "trimmed")]
    #[validate(
        email(message = "requested_by must be a valid email address"),
        length(max = 100, message = "requested_by must be at most 100 characters"),
        custom(function = "validate_email_domain")
    )]
    pub requested_by: String,
}

impl SubmissionRequest {
    /// Runs field validation and replaces the country with its official name.
    pub fn into_new_booking(self) -> Result<NewBooking, ApiError> {
        self.validate()
            .map_err(|errors| ApiError::validation(errors.to_string()))?;

        let country = resolve_country(&self.address.country).ok_or_else(|| {
            ApiError::validation(format!(
                "'{}' cannot be matched to any country",
                self.address.country
            ))
        })?;
        let duration_minutes = i16::try_from(self.duration_minutes)
            .map_err(|_| ApiError::validation("duration_minutes is out of range"))?;

        Ok(NewBooking {
            event_time: self.event_time,
            address: Address {
                country: country.name().to_string(),
                ..self.address
            },
            topic: self.topic,
            duration_minutes,
            requested_by: self.requested_by,
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BookingId {
    pub id: i32,
}

#[derive(Debug, Serialize)]
pub struct BookingList {
    pub bookings: Vec<Booking>,
}

fn validate_country(country: &str) -> Result<(), ValidationError> {
    if resolve_country(country).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_country")
            .with_message(format!("'{country}' cannot be matched to any country").into()))
    }
}

/// The `email` rule accepts bare or numeric domains; require an alphabetic top-level label.
fn validate_email_domain(email: &str) -> Result<(), ValidationError> {
    let tld = email
        .rsplit_once('@')
        .and_then(|(_, domain)| domain.rsplit_once('.'))
        .map(|(_, tld)| tld);
    match tld {
        Some(tld) if tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()) => Ok(()),
        _ => Err(ValidationError::new("email_domain")
            .with_message("requested_by must use a domain with a valid top-level label".into())),
    }
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|value| value.trim().to_string()))
}

fn event_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_event_time(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid event_time '{raw}'")))
}

pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_EVENT_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(overrides: serde_json::Value) -> SubmissionRequest {
        let mut base = json!({
            "event_time": "2030-05-01T10:00:00Z",
            "address": {
                "street": " 1 Main St ",
                "city": "Springfield",
                "country": "United States"
            },
            "topic": "  Rust intro  ",
            "duration_minutes": 60,
            "requested_by": "someone@example.com"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(base).expect("submission json")
    }

    #[test]
    fn valid_submission_is_trimmed_and_country_is_canonical() {
        let booking = submission(json!({})).into_new_booking().expect("valid");
        assert_eq!(booking.address.street, "1 Main St");
        assert_eq!(booking.address.country, "United States of America");
        assert_eq!(booking.topic, "Rust intro");
        assert_eq!(booking.duration_minutes, 60);
        assert_eq!(booking.address.state, None);
    }

    #[test]
    fn blank_address_fields_are_rejected() {
        for address in [
            json!({ "street": "  ", "city": "X", "country": "FR" }),
            json!({ "street": "S", "city": "", "country": "FR" }),
            json!({ "street": "S", "city": "X", "country": " " }),
            json!({ "street": "S", "city": "X", "state": " ", "country": "FR" }),
        ] {
            let err = submission(json!({ "address": address }))
                .into_new_booking()
                .expect_err("blank field");
            assert!(matches!(err, ApiError::Validation { .. }));
        }
    }

    #[test]
    fn unknown_country_is_rejected() {
        let address = json!({ "street": "S", "city": "Cair Paravel", "country": "Narnia" });
        let err = submission(json!({ "address": address }))
            .into_new_booking()
            .expect_err("no such country");
        match err {
            ApiError::Validation { message } => assert!(message.contains("Narnia"), "{message}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duration_must_fit_smallint_and_be_positive() {
        for duration in [0, -5, 32768] {
            let err = submission(json!({ "duration_minutes": duration }))
                .into_new_booking()
                .expect_err("bad duration");
            assert!(matches!(err, ApiError::Validation { .. }));
        }
        let ok = submission(json!({ "duration_minutes": 32767 }))
            .into_new_booking()
            .expect("max duration");
        assert_eq!(ok.duration_minutes, i16::MAX);
    }

    #[test]
    fn requested_by_must_be_a_real_email() {
        for email in [
            "",
            "plain",
            "@example.com",
            "a@b",
            "a b@example.com",
            "a@@b.com",
            "<script>@example.com",
            "a@-.-",
            "a\"b@ex_ample.com",
            "x@1.2",
        ] {
            let result = submission(json!({ "requested_by": email })).into_new_booking();
            assert!(result.is_err(), "{email:?} should be rejected");
        }
        let long = format!("{}@example.com", "a".repeat(MAX_REQUESTED_BY_LEN as usize));
        assert!(submission(json!({ "requested_by": long }))
            .into_new_booking()
            .is_err());
    }

    #[test]
    fn naive_event_time_is_read_as_utc() {
        let booking = submission(json!({ "event_time": "2030-05-01T10:00:00" }))
            .into_new_booking()
            .expect("naive timestamp");
        assert_eq!(booking.event_time.to_rfc3339(), "2030-05-01T10:00:00+00:00");

        let offset = parse_event_time("2030-05-01T12:00:00+02:00").expect("offset");
        assert_eq!(offset, booking.event_time);
        assert!(parse_event_time("next tuesday").is_none());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert!("approved".parse::<BookingStatus>().is_err());
    }
}
