use super::{Entity, Label, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Doctor,
    Patient,
    Pharmacist,
}

impl Label for Role {
    const ALL: &'static [Self] = &[Role::Admin, Role::Doctor, Role::Patient, Role::Pharmacist];

    fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
            Role::Patient => "Patient",
            Role::Pharmacist => "Pharmacist",
        }
    }
}

/// Login account of a staff member or patient.
///
/// `password_hash` is produced elsewhere and stored as an opaque string.
/// `owner_id` points at the doctor, patient or pharmacist row the account
/// belongs to and is empty for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub record: Record,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub owner_id: String,
}

impl Account {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            record: Record::new(),
            username: username.into(),
            password_hash: password_hash.into(),
            role,
            owner_id: String::new(),
        }
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = record;
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.record.touch();
    }
}

impl Entity for Account {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
