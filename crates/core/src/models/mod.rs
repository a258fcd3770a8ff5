//! Record types held by the store.

mod fields;

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RecordError;

pub use fields::{
    AirlinePatch, ClientPatch, FieldMap, FlightPatch, NewFlight, NewRecord, RecordPatch,
};

/// Column headings used when listing records of mixed kinds.
pub const SUMMARY_COLUMNS: [&str; 6] = [
    "ID",
    "Type",
    "Name",
    "Address Line 1",
    "City",
    "Phone Number",
];

static DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("failed to compile record id regex"));

/// Store-assigned identifier for clients and airlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Identifier given to the first record of an empty collection.
    pub const FIRST: RecordId = RecordId(1);

    /// Wrap a raw identifier.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The identifier following this one, or `None` past `u64::MAX`.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Validate user input: surrounding whitespace is ignored, the rest must be
    /// decimal digits that fit in a `u64`. `field` names the input in errors.
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, RecordError> {
        let invalid = || RecordError::InvalidId {
            field,
            value: raw.to_string(),
        };
        let trimmed = raw.trim();
        if !DIGITS_RE.is_match(trimmed) {
            return Err(invalid());
        }
        trimmed.parse::<u64>().map(Self).map_err(|_| invalid())
    }

    /// Validate an optional input, treating absence as an invalid (empty) id.
    pub fn require(field: &'static str, raw: Option<&str>) -> Result<Self, RecordError> {
        Self::parse(field, raw.unwrap_or_default())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three record categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A customer.
    Client,
    /// A carrier.
    Airline,
    /// A booking linking a client to an airline.
    Flight,
}

impl RecordKind {
    /// Every kind, in collection order.
    pub const ALL: [RecordKind; 3] = [RecordKind::Client, RecordKind::Airline, RecordKind::Flight];

    /// Name used in the `Type` field and as the collection key.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Client => "Client",
            RecordKind::Airline => "Airline",
            RecordKind::Flight => "Flight",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = RecordError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| RecordError::UnknownRecordKind(value.to_string()))
    }
}

// Single-variant tags so each stored record carries its own `Type` and a
// record filed under the wrong collection fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum ClientTag {
    #[default]
    Client,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum AirlineTag {
    #[default]
    Airline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum FlightTag {
    #[default]
    Flight,
}

/// Caller-supplied client fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    /// Full name.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// First address line.
    #[serde(rename = "Address Line 1", default)]
    pub address_line1: String,
    /// Second address line.
    #[serde(rename = "Address Line 2", default)]
    pub address_line2: String,
    /// Third address line.
    #[serde(rename = "Address Line 3", default)]
    pub address_line3: String,
    /// City or town.
    #[serde(rename = "City", default)]
    pub city: String,
    /// State or region.
    #[serde(rename = "State", default)]
    pub state: String,
    /// Postal code, kept as text.
    #[serde(rename = "Zip Code", default)]
    pub zip_code: String,
    /// Country name.
    #[serde(rename = "Country", default)]
    pub country: String,
    /// Contact number, kept as text.
    #[serde(rename = "Phone Number", default)]
    pub phone_number: String,
}

/// A stored client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Store-assigned identifier.
    #[serde(rename = "ID")]
    pub id: RecordId,
    #[serde(rename = "Type", default)]
    record_type: ClientTag,
    /// Caller-supplied fields.
    #[serde(flatten)]
    pub details: ClientDetails,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Client {
    pub(crate) fn new(id: RecordId, details: ClientDetails) -> Self {
        Self {
            id,
            record_type: ClientTag::Client,
            details,
            extra: Map::new(),
        }
    }

    /// Keys found in the file that are not client fields; written back unchanged.
    pub fn extra_fields(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Caller-supplied airline fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirlineDetails {
    /// Carrier name.
    #[serde(rename = "Company Name", default)]
    pub company_name: String,
}

/// A stored airline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    /// Store-assigned identifier.
    #[serde(rename = "ID")]
    pub id: RecordId,
    #[serde(rename = "Type", default)]
    record_type: AirlineTag,
    /// Caller-supplied fields.
    #[serde(flatten)]
    pub details: AirlineDetails,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Airline {
    pub(crate) fn new(id: RecordId, details: AirlineDetails) -> Self {
        Self {
            id,
            record_type: AirlineTag::Airline,
            details,
            extra: Map::new(),
        }
    }

    /// Keys found in the file that are not airline fields; written back unchanged.
    pub fn extra_fields(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Editable flight fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightDetails {
    /// ISO-8601 timestamp, kept as entered.
    #[serde(rename = "Date", default)]
    pub date: String,
    /// Departure city.
    #[serde(rename = "Start City", default)]
    pub start_city: String,
    /// Arrival city.
    #[serde(rename = "End City", default)]
    pub end_city: String,
}

/// A stored flight, identified by its `(client_id, airline_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Client the flight is booked for.
    #[serde(rename = "Client_ID")]
    pub client_id: RecordId,
    /// Operating airline.
    #[serde(rename = "Airline_ID")]
    pub airline_id: RecordId,
    #[serde(rename = "Type", default)]
    record_type: FlightTag,
    /// Date and route.
    #[serde(flatten)]
    pub details: FlightDetails,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Flight {
    pub(crate) fn new(client_id: RecordId, airline_id: RecordId, details: FlightDetails) -> Self {
        Self {
            client_id,
            airline_id,
            record_type: FlightTag::Flight,
            details,
            extra: Map::new(),
        }
    }

    /// Keys found in the file that are not flight fields; written back unchanged.
    pub fn extra_fields(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// True when the flight belongs to exactly this client/airline pair.
    pub fn is_pair(&self, client_id: RecordId, airline_id: RecordId) -> bool {
        self.client_id == client_id && self.airline_id == airline_id
    }

    /// True when either side of the pair equals `id`.
    pub fn references(&self, id: RecordId) -> bool {
        self.client_id == id || self.airline_id == id
    }

    /// Parsed departure time, if `Date` is a full timestamp or a plain date.
    pub fn departure(&self) -> Option<NaiveDateTime> {
        let raw = self.details.date.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
    }
}

/// Any stored record, as returned by search and listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    /// A stored client.
    Client(Client),
    /// A stored airline.
    Airline(Airline),
    /// A stored flight.
    Flight(Flight),
}

impl Record {
    /// Kind of the wrapped record.
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Client(_) => RecordKind::Client,
            Record::Airline(_) => RecordKind::Airline,
            Record::Flight(_) => RecordKind::Flight,
        }
    }

    /// Values for [`SUMMARY_COLUMNS`].
    pub fn summary_row(&self) -> [String; 6] {
        let kind = self.kind().to_string();
        match self {
            Record::Client(client) => [
                client.id.to_string(),
                kind,
                client.details.name.clone(),
                client.details.address_line1.clone(),
                client.details.city.clone(),
                client.details.phone_number.clone(),
            ],
            Record::Airline(airline) => [
                airline.id.to_string(),
                kind,
                airline.details.company_name.clone(),
                String::new(),
                String::new(),
                String::new(),
            ],
            Record::Flight(flight) => {
                let date = flight
                    .departure()
                    .map(|when| when.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| flight.details.date.clone());
                [
                    format!("{}/{}", flight.client_id, flight.airline_id),
                    kind,
                    date,
                    flight.details.start_city.clone(),
                    flight.details.end_city.clone(),
                    String::new(),
                ]
            }
        }
    }
}
