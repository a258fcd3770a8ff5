//! In-memory record collections and the create/search/update/delete rules.
//!
//! The store never logs and never touches the filesystem; persistence and
//! locking live in [`crate::storage`] and [`crate::session`].

use serde::{Deserialize, Serialize};

use crate::{
    error::{RecordError, Reference},
    models::{
        Airline, Client, Flight, NewFlight, NewRecord, Record, RecordId, RecordKind, RecordPatch,
    },
};

const CLIENT_ID: &str = "Client ID";
const AIRLINE_ID: &str = "Airline ID";
const SEARCH_ID: &str = "ID";

/// The three record collections, serialized as one document with
/// `Client`, `Airline` and `Flight` arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStore {
    #[serde(rename = "Client", default)]
    clients: Vec<Client>,
    #[serde(rename = "Airline", default)]
    airlines: Vec<Airline>,
    #[serde(rename = "Flight", default)]
    flights: Vec<Flight>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clients in insertion order.
    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Airlines in insertion order.
    pub fn airlines(&self) -> &[Airline] {
        &self.airlines
    }

    /// Flights in insertion order.
    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    /// Number of records of one kind.
    pub fn len(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Client => self.clients.len(),
            RecordKind::Airline => self.airlines.len(),
            RecordKind::Flight => self.flights.len(),
        }
    }

    /// True when all three collections are empty.
    pub fn is_empty(&self) -> bool {
        RecordKind::ALL.into_iter().all(|kind| self.len(kind) == 0)
    }

    /// All records of one kind.
    pub fn records(&self, kind: RecordKind) -> Vec<Record> {
        match kind {
            RecordKind::Client => self.clients.iter().cloned().map(Record::Client).collect(),
            RecordKind::Airline => self.airlines.iter().cloned().map(Record::Airline).collect(),
            RecordKind::Flight => self.flights.iter().cloned().map(Record::Flight).collect(),
        }
    }

    /// Number of stored keys outside the known record fields, across all records.
    pub fn unrecognised_fields(&self) -> usize {
        self.clients.iter().map(|client| client.extra_fields().len()).sum::<usize>()
            + self.airlines.iter().map(|airline| airline.extra_fields().len()).sum::<usize>()
            + self.flights.iter().map(|flight| flight.extra_fields().len()).sum::<usize>()
    }

    /// Every record, clients first, then airlines, then flights.
    pub fn all_records(&self) -> Vec<Record> {
        RecordKind::ALL
            .into_iter()
            .flat_map(|kind| self.records(kind))
            .collect()
    }

    /// Add a record and return it as stored.
    ///
    /// Clients and airlines get `max(existing IDs) + 1`, or 1 for an empty
    /// collection, or [`RecordError::IdsExhausted`] once `u64::MAX` is
    /// taken. Flights must reference an existing client and airline; the
    /// client is checked first. Nothing is appended on failure.
    pub fn create(&mut self, request: NewRecord) -> Result<Record, RecordError> {
        match request {
            NewRecord::Client(details) => {
                let id = next_id(RecordKind::Client, self.clients.iter().map(|client| client.id))?;
                let client = Client::new(id, details);
                self.clients.push(client.clone());
                Ok(Record::Client(client))
            }
            NewRecord::Airline(details) => {
                let id = next_id(RecordKind::Airline, self.airlines.iter().map(|airline| airline.id))?;
                let airline = Airline::new(id, details);
                self.airlines.push(airline.clone());
                Ok(Record::Airline(airline))
            }
            NewRecord::Flight(NewFlight {
                client_id,
                airline_id,
                details,
            }) => {
                if !self.clients.iter().any(|client| client.id == client_id) {
                    return Err(RecordError::InvalidReference(Reference::Client(client_id)));
                }
                if !self.airlines.iter().any(|airline| airline.id == airline_id) {
                    return Err(RecordError::InvalidReference(Reference::Airline(airline_id)));
                }
                let flight = Flight::new(client_id, airline_id, details);
                self.flights.push(flight.clone());
                Ok(Record::Flight(flight))
            }
        }
    }

    /// Look records up by identifier.
    ///
    /// Clients and airlines match on `ID`; flights match when either side of
    /// their pair equals `id`. With `kind` set only that collection is
    /// scanned, otherwise all three are, in collection order. An empty
    /// result is [`RecordError::NotFound`].
    pub fn search(&self, kind: Option<RecordKind>, id: &str) -> Result<Vec<Record>, RecordError> {
        let id = RecordId::parse(SEARCH_ID, id)?;
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => RecordKind::ALL.to_vec(),
        };

        let mut found = Vec::new();
        for kind in kinds {
            match kind {
                RecordKind::Client => found.extend(
                    self.clients
                        .iter()
                        .filter(|client| client.id == id)
                        .cloned()
                        .map(Record::Client),
                ),
                RecordKind::Airline => found.extend(
                    self.airlines
                        .iter()
                        .filter(|airline| airline.id == id)
                        .cloned()
                        .map(Record::Airline),
                ),
                RecordKind::Flight => found.extend(
                    self.flights
                        .iter()
                        .filter(|flight| flight.references(id))
                        .cloned()
                        .map(Record::Flight),
                ),
            }
        }

        if found.is_empty() {
            let target = match kind {
                Some(kind) => format!("{kind} {id}"),
                None => format!("record {id}"),
            };
            return Err(RecordError::NotFound(target));
        }
        Ok(found)
    }

    /// Merge `patch` into an existing record, leaving unlisted fields as they are.
    ///
    /// Clients are located by `client_id`, airlines by `airline_id`, flights
    /// by both. Every flight with the pair receives the patch. An empty
    /// patch validates the target and changes nothing.
    pub fn update(
        &mut self,
        patch: &RecordPatch,
        client_id: Option<&str>,
        airline_id: Option<&str>,
    ) -> Result<(), RecordError> {
        match patch {
            RecordPatch::Client(patch) => {
                let id = RecordId::require(CLIENT_ID, client_id)?;
                let client = self
                    .clients
                    .iter_mut()
                    .find(|client| client.id == id)
                    .ok_or_else(|| RecordError::NotFound(format!("Client {id}")))?;
                patch.apply(&mut client.details);
            }
            RecordPatch::Airline(patch) => {
                let id = RecordId::require(AIRLINE_ID, airline_id)?;
                let airline = self
                    .airlines
                    .iter_mut()
                    .find(|airline| airline.id == id)
                    .ok_or_else(|| RecordError::NotFound(format!("Airline {id}")))?;
                patch.apply(&mut airline.details);
            }
            RecordPatch::Flight(patch) => {
                let (client_id, airline_id) = flight_pair(client_id, airline_id)?;
                let mut matched = false;
                for flight in self
                    .flights
                    .iter_mut()
                    .filter(|flight| flight.is_pair(client_id, airline_id))
                {
                    patch.apply(&mut flight.details);
                    matched = true;
                }
                if !matched {
                    return Err(RecordError::NotFound(format!(
                        "Flight for client {client_id} with airline {airline_id}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Remove records by identity.
    ///
    /// Clients and airlines are removed by ID; flights only when both sides of
    /// the pair match. Removing nothing is not an error, and flights that
    /// reference a removed client or airline are left in place.
    pub fn delete(
        &mut self,
        kind: RecordKind,
        client_id: Option<&str>,
        airline_id: Option<&str>,
    ) -> Result<(), RecordError> {
        match kind {
            RecordKind::Client => {
                let id = RecordId::require(CLIENT_ID, client_id)?;
                self.clients.retain(|client| client.id != id);
            }
            RecordKind::Airline => {
                let id = RecordId::require(AIRLINE_ID, airline_id)?;
                self.airlines.retain(|airline| airline.id != id);
            }
            RecordKind::Flight => {
                let (client_id, airline_id) = flight_pair(client_id, airline_id)?;
                self.flights
                    .retain(|flight| !flight.is_pair(client_id, airline_id));
            }
        }
        Ok(())
    }
}

fn next_id(
    kind: RecordKind,
    ids: impl Iterator<Item = RecordId>,
) -> Result<RecordId, RecordError> {
    match ids.max() {
        Some(max) => max.next().ok_or(RecordError::IdsExhausted(kind)),
        None => Ok(RecordId::FIRST),
    }
}

fn flight_pair(
    client_id: Option<&str>,
    airline_id: Option<&str>,
) -> Result<(RecordId, RecordId), RecordError> {
    Ok((
        RecordId::require(CLIENT_ID, client_id)?,
        RecordId::require(AIRLINE_ID, airline_id)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AirlineDetails, AirlinePatch, ClientDetails, ClientPatch, FlightDetails, FlightPatch,
    };
    use proptest::prelude::*;

    fn client(name: &str) -> NewRecord {
        NewRecord::Client(ClientDetails {
            name: name.to_string(),
            address_line1: "1 Flag Lane".to_string(),
            city: "Leeds".to_string(),
            state: "West Yorkshire".to_string(),
            zip_code: "LS1 6PT".to_string(),
            country: "England".to_string(),
            phone_number: "0789153458".to_string(),
            ..ClientDetails::default()
        })
    }

    fn airline(name: &str) -> NewRecord {
        NewRecord::Airline(AirlineDetails {
            company_name: name.to_string(),
        })
    }

    fn flight(client_id: u64, airline_id: u64, end_city: &str) -> NewRecord {
        NewRecord::Flight(NewFlight {
            client_id: RecordId::new(client_id),
            airline_id: RecordId::new(airline_id),
            details: FlightDetails {
                date: "2025-10-01T10:00:00".to_string(),
                start_city: "Berlin".to_string(),
                end_city: end_city.to_string(),
            },
        })
    }

    /// Two clients, two airlines, flights (1,1) and (2,2).
    fn sample_store() -> RecordStore {
        let mut store = RecordStore::new();
        for request in [
            client("John Doe"),
            client("Nic Moe"),
            airline("British Airways"),
            airline("American Airlines"),
            flight(1, 1, "London"),
            flight(2, 2, "El Paso"),
        ] {
            store.create(request).expect("sample record is valid");
        }
        store
    }

    #[test]
    fn create_refuses_to_reuse_the_largest_id() -> anyhow::Result<()> {
        let mut store: RecordStore = serde_json::from_value(serde_json::json!({
            "Client": [{"ID": u64::MAX, "Type": "Client", "Name": "Last"}],
            "Airline": [],
            "Flight": []
        }))?;
        assert_eq!(
            store.create(client("Overflow")),
            Err(RecordError::IdsExhausted(RecordKind::Client))
        );
        assert_eq!(store.len(RecordKind::Client), 1);
        assert!(store.create(airline("Delta")).is_ok());
        Ok(())
    }

    #[test]
    fn ids_restart_per_collection() -> Result<(), RecordError> {
        let mut store = RecordStore::new();
        let Record::Client(ann) = store.create(client("Ann"))? else {
            panic!("expected client");
        };
        let Record::Airline(delta) = store.create(airline("Delta"))? else {
            panic!("expected airline");
        };
        assert_eq!(ann.id, RecordId::new(1));
        assert_eq!(delta.id, RecordId::new(1));
        Ok(())
    }

    #[test]
    fn ids_follow_the_current_maximum() -> Result<(), RecordError> {
        let mut store = sample_store();
        store.delete(RecordKind::Client, Some("1"), None)?;
        let Record::Client(created) = store.create(client("Third"))? else {
            panic!("expected client");
        };
        assert_eq!(created.id, RecordId::new(3));
        Ok(())
    }

    #[test]
    fn flight_with_unknown_client_is_rejected_without_mutation() {
        let mut store = sample_store();
        let before = store.len(RecordKind::Flight);

        let err = store.create(flight(9, 1, "Paris")).unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidReference(Reference::Client(RecordId::new(9)))
        );

        let err = store.create(flight(1, 52, "Paris")).unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidReference(Reference::Airline(RecordId::new(52)))
        );

        assert_eq!(store.len(RecordKind::Flight), before);
    }

    #[test]
    fn client_reference_is_checked_before_airline() {
        let mut store = RecordStore::new();
        let err = store.create(flight(1, 1, "Paris")).unwrap_err();
        assert!(matches!(
            err,
            RecordError::InvalidReference(Reference::Client(_))
        ));
    }

    #[test]
    fn scoped_search_returns_the_submitted_client() -> Result<(), RecordError> {
        let mut store = sample_store();
        let NewRecord::Client(submitted) = client("Nicola Smith") else {
            unreachable!();
        };
        let Record::Client(created) = store.create(NewRecord::Client(submitted.clone()))? else {
            panic!("expected client");
        };

        let found = store.search(Some(RecordKind::Client), &created.id.to_string())?;
        assert_eq!(found.len(), 1);
        let Record::Client(found) = &found[0] else {
            panic!("expected client");
        };
        assert_eq!(found.id, RecordId::new(3));
        assert_eq!(found.details, submitted);
        Ok(())
    }

    #[test]
    fn search_validates_id_before_scanning() {
        let store = RecordStore::new();
        for raw in ["", "abc", "-1", "1e3"] {
            assert!(matches!(
                store.search(Some(RecordKind::Client), raw),
                Err(RecordError::InvalidId { .. })
            ));
        }
    }

    #[test]
    fn scoped_search_reports_missing_records() {
        let store = sample_store();
        assert_eq!(
            store.search(Some(RecordKind::Flight), "17"),
            Err(RecordError::NotFound("Flight 17".to_string()))
        );
        assert_eq!(
            store.search(None, "13"),
            Err(RecordError::NotFound("record 13".to_string()))
        );
    }

    #[test]
    fn unscoped_search_spans_all_collections() -> Result<(), RecordError> {
        let store = sample_store();
        let found = store.search(None, "1")?;
        let kinds: Vec<_> = found.iter().map(Record::kind).collect();
        assert_eq!(
            kinds,
            vec![RecordKind::Client, RecordKind::Airline, RecordKind::Flight]
        );
        Ok(())
    }

    #[test]
    fn flight_search_matches_either_side_of_the_pair() -> Result<(), RecordError> {
        let mut store = sample_store();
        store.create(flight(1, 2, "Madrid"))?;
        let found = store.search(Some(RecordKind::Flight), "2")?;
        assert_eq!(found.len(), 2);
        Ok(())
    }

    #[test]
    fn update_changes_only_supplied_fields() -> Result<(), RecordError> {
        let mut store = sample_store();
        let before = store.clients()[0].clone();
        let patch = RecordPatch::Client(ClientPatch {
            name: Some("New".to_string()),
            ..ClientPatch::default()
        });
        store.update(&patch, Some("1"), None)?;

        let after = &store.clients()[0];
        assert_eq!(after.details.name, "New");
        let mut expected = before.details.clone();
        expected.name = "New".to_string();
        assert_eq!(after.details, expected);
        assert_eq!(after.id, before.id);
        Ok(())
    }

    #[test]
    fn update_requires_a_valid_existing_target() {
        let mut store = sample_store();
        let patch = RecordPatch::Airline(AirlinePatch {
            company_name: Some("Lufthansa".to_string()),
        });
        assert!(matches!(
            store.update(&patch, Some("1"), None),
            Err(RecordError::InvalidId { field: "Airline ID", .. })
        ));
        assert_eq!(
            store.update(&patch, None, Some("43")),
            Err(RecordError::NotFound("Airline 43".to_string()))
        );
        assert_eq!(store.airlines()[0].details.company_name, "British Airways");
    }

    #[test]
    fn flight_update_needs_both_ids_and_exact_pair() -> Result<(), RecordError> {
        let mut store = sample_store();
        let patch = RecordPatch::Flight(FlightPatch {
            end_city: Some("Paris".to_string()),
            ..FlightPatch::default()
        });
        assert!(matches!(
            store.update(&patch, Some("1"), None),
            Err(RecordError::InvalidId { field: "Airline ID", .. })
        ));
        assert!(matches!(
            store.update(&patch, Some("1"), Some("2")),
            Err(RecordError::NotFound(_))
        ));

        store.update(&patch, Some("1"), Some("1"))?;
        assert_eq!(store.flights()[0].details.end_city, "Paris");
        assert_eq!(store.flights()[0].details.start_city, "Berlin");
        assert_eq!(store.flights()[1].details.end_city, "El Paso");
        Ok(())
    }

    #[test]
    fn flight_update_applies_to_every_duplicate_pair() -> Result<(), RecordError> {
        let mut store = sample_store();
        store.create(flight(1, 1, "Rome"))?;
        let patch = RecordPatch::Flight(FlightPatch {
            date: Some("2026-01-01T09:00:00".to_string()),
            ..FlightPatch::default()
        });
        store.update(&patch, Some("1"), Some("1"))?;
        let dates: Vec<_> = store
            .flights()
            .iter()
            .filter(|flight| flight.is_pair(RecordId::new(1), RecordId::new(1)))
            .map(|flight| flight.details.date.as_str())
            .collect();
        assert_eq!(dates, vec!["2026-01-01T09:00:00", "2026-01-01T09:00:00"]);
        Ok(())
    }

    #[test]
    fn empty_patch_is_a_no_op() -> Result<(), RecordError> {
        let mut store = sample_store();
        let before = store.clone();
        store.update(&RecordPatch::Client(ClientPatch::default()), Some("2"), None)?;
        assert_eq!(store, before);
        Ok(())
    }

    #[test]
    fn deleting_missing_ids_is_silent() -> Result<(), RecordError> {
        let mut store = sample_store();
        let before = store.clone();
        store.delete(RecordKind::Client, Some("42"), None)?;
        store.delete(RecordKind::Flight, Some("1"), Some("2"))?;
        assert_eq!(store, before);
        Ok(())
    }

    #[test]
    fn delete_validates_ids() {
        let mut store = sample_store();
        assert!(matches!(
            store.delete(RecordKind::Client, Some("x"), None),
            Err(RecordError::InvalidId { field: "Client ID", .. })
        ));
        assert!(matches!(
            store.delete(RecordKind::Flight, None, Some("1")),
            Err(RecordError::InvalidId { field: "Client ID", .. })
        ));
        assert_eq!(store, sample_store());
    }

    #[test]
    fn flight_delete_removes_only_the_exact_pair() -> Result<(), RecordError> {
        let mut store = sample_store();
        store.create(flight(1, 2, "Madrid"))?;
        store.create(flight(1, 1, "Rome"))?;

        store.delete(RecordKind::Flight, Some("1"), Some("1"))?;

        let pairs: Vec<_> = store
            .flights()
            .iter()
            .map(|flight| (flight.client_id.get(), flight.airline_id.get()))
            .collect();
        assert_eq!(pairs, vec![(2, 2), (1, 2)]);
        Ok(())
    }

    #[test]
    fn deleting_a_client_leaves_its_flights() -> Result<(), RecordError> {
        let mut store = RecordStore::new();
        store.create(client("Ann"))?;
        store.create(airline("Delta"))?;
        store.create(NewRecord::Flight(NewFlight {
            client_id: RecordId::new(1),
            airline_id: RecordId::new(1),
            details: FlightDetails {
                date: "2025-01-01".to_string(),
                start_city: "NYC".to_string(),
                end_city: "LAX".to_string(),
            },
        }))?;

        let found = store.search(Some(RecordKind::Flight), "1")?;
        assert!(matches!(found.as_slice(), [Record::Flight(_)]));

        store.delete(RecordKind::Client, Some("1"), None)?;
        assert_eq!(store.len(RecordKind::Client), 0);
        assert_eq!(store.len(RecordKind::Flight), 1);
        assert_eq!(store.flights()[0].client_id, RecordId::new(1));
        Ok(())
    }

    proptest! {
        #[test]
        fn sequential_creates_assign_one_to_n(count in 1usize..50) {
            let mut store = RecordStore::new();
            for index in 0..count {
                let created = store.create(airline(&format!("Airline {index}"))).unwrap();
                let Record::Airline(created) = created else {
                    panic!("expected airline");
                };
                prop_assert_eq!(created.id, RecordId::new(index as u64 + 1));
            }
            let ids: Vec<u64> = store.airlines().iter().map(|a| a.id.get()).collect();
            prop_assert_eq!(ids, (1..=count as u64).collect::<Vec<_>>());
        }

        #[test]
        fn pair_delete_keeps_partial_matches(
            pairs in proptest::collection::vec((1u64..4, 1u64..4), 0..20),
            target in (1u64..4, 1u64..4),
        ) {
            let mut store = RecordStore::new();
            for index in 0..3 {
                store.create(client(&format!("Client {index}"))).unwrap();
                store.create(airline(&format!("Airline {index}"))).unwrap();
            }
            for (client_id, airline_id) in &pairs {
                store.create(flight(*client_id, *airline_id, "Anywhere")).unwrap();
            }

            store
                .delete(
                    RecordKind::Flight,
                    Some(&target.0.to_string()),
                    Some(&target.1.to_string()),
                )
                .unwrap();

            let expected: Vec<_> = pairs.iter().copied().filter(|pair| *pair != target).collect();
            let remaining: Vec<_> = store
                .flights()
                .iter()
                .map(|flight| (flight.client_id.get(), flight.airline_id.get()))
                .collect();
            prop_assert_eq!(remaining, expected);
        }
    }
}
