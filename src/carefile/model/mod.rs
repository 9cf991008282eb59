//! # Domain Model
//!
//! Every persisted hospital entity is a plain struct that embeds a [`Record`]:
//! the identifier plus the creation and last-update timestamps. There is no
//! inheritance. A type becomes storable by implementing [`Entity`] (so the
//! repository can find its key) and by having a [`Mapper`](crate::codec::Mapper)
//! that turns it into a row and back.
//!
//! Composite "detail" values (an appointment together with its doctor and
//! patient, for example) live in [`crate::views`]. They are assembled in memory
//! and never written to disk.
//!
//! ## Timestamps
//!
//! Timestamps are naive (zone-less) and kept at whole-second precision, which is
//! exactly what the row format can hold. [`now`] is the only clock the model uses.
//!
//! ## Identity
//!
//! - [`Record::new`] generates a UUID v4 identifier.
//! - [`Record::with_id`] keeps a caller supplied identifier (imports, fixtures).
//!
//! Changing the identifier or any mutable field refreshes `updated_at`. Use the
//! typed setters, or [`Entity::edit`] for arbitrary changes.

use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub mod account;
pub mod appointment;
pub mod people;
pub mod pharmacy;

pub use account::{Account, Role};
pub use appointment::{Appointment, AppointmentStatus};
pub use people::{Doctor, Gender, Patient, Pharmacist};
pub use pharmacy::{Medicine, MedicineRequest, RequestStatus};

/// Current UTC time truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    whole_seconds(Utc::now().naive_utc())
}

/// Drops the sub-second part, which the row format cannot hold.
pub fn whole_seconds(value: NaiveDateTime) -> NaiveDateTime {
    value.trunc_subsecs(0)
}

/// Identity and timestamps shared by every stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Record {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a record as it was stored, at whole-second precision.
    pub fn restore(
        id: impl Into<String>,
        created_at: NaiveDateTime,
        updated_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: whole_seconds(created_at),
            updated_at: whole_seconds(updated_at),
        }
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// A stored domain object.
pub trait Entity {
    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    fn id(&self) -> &str {
        &self.record().id
    }

    /// Applies `change` and refreshes `updated_at`.
    fn edit<F>(&mut self, change: F)
    where
        F: FnOnce(&mut Self),
        Self: Sized,
    {
        change(self);
        self.record_mut().touch();
    }
}

/// An enumerated field stored as its canonical label text.
pub trait Label: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn from_label(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.label() == value)
    }
}

/// The entity collections, one Collection File each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Patients,
    Doctors,
    Pharmacists,
    Medicines,
    MedicineRequests,
    Appointments,
    Accounts,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Patients,
        Collection::Doctors,
        Collection::Pharmacists,
        Collection::Medicines,
        Collection::MedicineRequests,
        Collection::Appointments,
        Collection::Accounts,
    ];

    /// File stem of the collection (`medicines` -> `medicines.csv`).
    pub fn name(self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::Doctors => "doctors",
            Collection::Pharmacists => "pharmacists",
            Collection::Medicines => "medicines",
            Collection::MedicineRequests => "medicine_requests",
            Collection::Appointments => "appointments",
            Collection::Accounts => "accounts",
        }
    }

    pub fn file_name(self, file_ext: &str) -> String {
        format!("{}{}", self.name(), file_ext)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Collection::ALL
            .iter()
            .copied()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("Unknown collection: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_starts_with_equal_timestamps() {
        let record = Record::new();
        assert_eq!(record.created_at, record.updated_at);
        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn set_id_refreshes_updated_at() {
        let old = NaiveDateTime::parse_from_str("2020-01-01T00:00:00", "%Y-%m-%dT%H:%M:%S")
            .unwrap();
        let mut record = Record::restore("P1", old, old);
        record.set_id("P2");
        assert_eq!(record.id, "P2");
        assert_eq!(record.created_at, old);
        assert!(record.updated_at > old);
    }

    #[test]
    fn now_has_no_subsecond_part() {
        use chrono::Timelike;
        assert_eq!(now().nanosecond(), 0);
    }

    #[test]
    fn restore_drops_subsecond_part() {
        use chrono::Timelike;
        let at = NaiveDateTime::parse_from_str("2024-05-01T09:00:00.500", "%Y-%m-%dT%H:%M:%S%.f")
            .unwrap();
        let record = Record::restore("P1", at, at);
        assert_eq!(record.created_at.nanosecond(), 0);
        assert_eq!(record.updated_at, whole_seconds(at));
    }

    #[test]
    fn collection_parses_loosely() {
        assert_eq!(
            "Medicine-Requests".parse::<Collection>().unwrap(),
            Collection::MedicineRequests
        );
        assert_eq!(" doctors ".parse::<Collection>().unwrap(), Collection::Doctors);
        assert!("wards".parse::<Collection>().is_err());
    }

    #[test]
    fn file_name_uses_extension() {
        assert_eq!(Collection::Medicines.file_name(".csv"), "medicines.csv");
    }
}
