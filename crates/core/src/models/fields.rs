//! Field labels and the create/update requests built from them.

use std::collections::BTreeMap;

use crate::error::RecordError;

use super::{AirlineDetails, ClientDetails, FlightDetails, RecordId, RecordKind};

/// Label to value map, as collected by a form.
pub type FieldMap = BTreeMap<String, String>;

const ID: &str = "ID";
const TYPE: &str = "Type";
const NAME: &str = "Name";
const ADDRESS_LINE1: &str = "Address Line 1";
const ADDRESS_LINE2: &str = "Address Line 2";
const ADDRESS_LINE3: &str = "Address Line 3";
const CITY: &str = "City";
const STATE: &str = "State";
const ZIP_CODE: &str = "Zip Code";
const COUNTRY: &str = "Country";
const PHONE_NUMBER: &str = "Phone Number";
const COMPANY_NAME: &str = "Company Name";
const CLIENT_ID: &str = "Client_ID";
const AIRLINE_ID: &str = "Airline_ID";
const DATE: &str = "Date";
const START_CITY: &str = "Start City";
const END_CITY: &str = "End City";

const CLIENT_FIELDS: &[&str] = &[
    NAME,
    ADDRESS_LINE1,
    ADDRESS_LINE2,
    ADDRESS_LINE3,
    CITY,
    STATE,
    ZIP_CODE,
    COUNTRY,
    PHONE_NUMBER,
];
const AIRLINE_FIELDS: &[&str] = &[COMPANY_NAME];
const FLIGHT_FIELDS: &[&str] = &[CLIENT_ID, AIRLINE_ID, DATE, START_CITY, END_CITY];
const FLIGHT_EDITABLE_FIELDS: &[&str] = &[DATE, START_CITY, END_CITY];

impl RecordKind {
    /// Labels a create form asks for, in display order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Client => CLIENT_FIELDS,
            RecordKind::Airline => AIRLINE_FIELDS,
            RecordKind::Flight => FLIGHT_FIELDS,
        }
    }

    /// Labels an update may change. Identity fields are never editable.
    pub fn editable_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Client => CLIENT_FIELDS,
            RecordKind::Airline => AIRLINE_FIELDS,
            RecordKind::Flight => FLIGHT_EDITABLE_FIELDS,
        }
    }
}

/// A flight to be created. References are checked by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFlight {
    /// Client the flight is booked for.
    pub client_id: RecordId,
    /// Operating airline.
    pub airline_id: RecordId,
    /// Date and route.
    pub details: FlightDetails,
}

/// A create request. Clients and airlines carry no ID; the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewRecord {
    /// New client.
    Client(ClientDetails),
    /// New airline.
    Airline(AirlineDetails),
    /// New flight between an existing client and airline.
    Flight(NewFlight),
}

impl NewRecord {
    /// Kind of record this request creates.
    pub fn kind(&self) -> RecordKind {
        match self {
            NewRecord::Client(_) => RecordKind::Client,
            NewRecord::Airline(_) => RecordKind::Airline,
            NewRecord::Flight(_) => RecordKind::Flight,
        }
    }

    /// Build a create request from form input. `ID` and `Type` entries are
    /// ignored; any other unknown label is rejected. Missing labels are empty.
    pub fn from_fields(kind: RecordKind, fields: &FieldMap) -> Result<Self, RecordError> {
        let supplied = fields
            .iter()
            .filter(|(label, _)| !matches!(label.as_str(), ID | TYPE));

        match kind {
            RecordKind::Client => {
                let mut details = ClientDetails::default();
                for (label, value) in supplied {
                    *details.slot(label).ok_or_else(|| unknown(kind, label))? = value.clone();
                }
                Ok(NewRecord::Client(details))
            }
            RecordKind::Airline => {
                let mut details = AirlineDetails::default();
                for (label, value) in supplied {
                    *details.slot(label).ok_or_else(|| unknown(kind, label))? = value.clone();
                }
                Ok(NewRecord::Airline(details))
            }
            RecordKind::Flight => {
                let client_id =
                    RecordId::require("Client ID", fields.get(CLIENT_ID).map(String::as_str))?;
                let airline_id =
                    RecordId::require("Airline ID", fields.get(AIRLINE_ID).map(String::as_str))?;
                let mut details = FlightDetails::default();
                for (label, value) in
                    supplied.filter(|(label, _)| !matches!(label.as_str(), CLIENT_ID | AIRLINE_ID))
                {
                    *details.slot(label).ok_or_else(|| unknown(kind, label))? = value.clone();
                }
                Ok(NewRecord::Flight(NewFlight {
                    client_id,
                    airline_id,
                    details,
                }))
            }
        }
    }
}

/// Fields to overwrite on a client; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPatch {
    /// New `Name`.
    pub name: Option<String>,
    /// New `Address Line 1`.
    pub address_line1: Option<String>,
    /// New `Address Line 2`.
    pub address_line2: Option<String>,
    /// New `Address Line 3`.
    pub address_line3: Option<String>,
    /// New `City`.
    pub city: Option<String>,
    /// New `State`.
    pub state: Option<String>,
    /// New `Zip Code`.
    pub zip_code: Option<String>,
    /// New `Country`.
    pub country: Option<String>,
    /// New `Phone Number`.
    pub phone_number: Option<String>,
}

/// Fields to overwrite on an airline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirlinePatch {
    /// New `Company Name`.
    pub company_name: Option<String>,
}

/// Fields to overwrite on a flight. The client/airline pair is fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightPatch {
    /// New `Date`.
    pub date: Option<String>,
    /// New `Start City`.
    pub start_city: Option<String>,
    /// New `End City`.
    pub end_city: Option<String>,
}

// One label table per kind; it drives both the details and the patch type.
macro_rules! field_table {
    ($details:ty, $patch:ty { $($label:ident => $field:ident),+ $(,)? }) => {
        impl $details {
            fn slot(&mut self, label: &str) -> Option<&mut String> {
                match label {
                    $($label => Some(&mut self.$field),)+
                    _ => None,
                }
            }
        }

        impl $patch {
            /// True when no field would change.
            pub fn is_empty(&self) -> bool {
                *self == Self::default()
            }

            pub(crate) fn apply(&self, target: &mut $details) {
                $(merge(&mut target.$field, &self.$field);)+
            }

            fn slot(&mut self, label: &str) -> Option<&mut Option<String>> {
                match label {
                    $($label => Some(&mut self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

field_table!(ClientDetails, ClientPatch {
    NAME => name,
    ADDRESS_LINE1 => address_line1,
    ADDRESS_LINE2 => address_line2,
    ADDRESS_LINE3 => address_line3,
    CITY => city,
    STATE => state,
    ZIP_CODE => zip_code,
    COUNTRY => country,
    PHONE_NUMBER => phone_number,
});

field_table!(AirlineDetails, AirlinePatch {
    COMPANY_NAME => company_name,
});

field_table!(FlightDetails, FlightPatch {
    DATE => date,
    START_CITY => start_city,
    END_CITY => end_city,
});

/// An update request: the kind plus the fields to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPatch {
    /// Changes to a client.
    Client(ClientPatch),
    /// Changes to an airline.
    Airline(AirlinePatch),
    /// Changes to every flight with one client/airline pair.
    Flight(FlightPatch),
}

impl RecordPatch {
    /// Kind of record this patch targets.
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordPatch::Client(_) => RecordKind::Client,
            RecordPatch::Airline(_) => RecordKind::Airline,
            RecordPatch::Flight(_) => RecordKind::Flight,
        }
    }

    /// True when applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            RecordPatch::Client(patch) => patch.is_empty(),
            RecordPatch::Airline(patch) => patch.is_empty(),
            RecordPatch::Flight(patch) => patch.is_empty(),
        }
    }

    /// Build an update from form input. Every label must be one of
    /// [`RecordKind::editable_fields`]; identity labels are rejected.
    pub fn from_fields(kind: RecordKind, fields: &FieldMap) -> Result<Self, RecordError> {
        match kind {
            RecordKind::Client => {
                let mut patch = ClientPatch::default();
                for (label, value) in fields {
                    *patch.slot(label).ok_or_else(|| unknown(kind, label))? = Some(value.clone());
                }
                Ok(RecordPatch::Client(patch))
            }
            RecordKind::Airline => {
                let mut patch = AirlinePatch::default();
                for (label, value) in fields {
                    *patch.slot(label).ok_or_else(|| unknown(kind, label))? = Some(value.clone());
                }
                Ok(RecordPatch::Airline(patch))
            }
            RecordKind::Flight => {
                let mut patch = FlightPatch::default();
                for (label, value) in fields {
                    *patch.slot(label).ok_or_else(|| unknown(kind, label))? = Some(value.clone());
                }
                Ok(RecordPatch::Flight(patch))
            }
        }
    }
}

fn merge(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

fn unknown(kind: RecordKind, label: &str) -> RecordError {
    RecordError::UnknownField {
        kind,
        field: label.to_string(),
    }
}
