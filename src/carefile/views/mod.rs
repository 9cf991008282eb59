//! # Detail Views
//!
//! Read-only composites that join a stored entity with the entities its
//! foreign keys point at. They are built in memory from several
//! [`Repository`] lookups and have no Collection File of their own.
//!
//! ## Dangling References
//!
//! A foreign key that resolves to nothing is an error
//! ([`CarefileError::MissingReference`]) unless the view documents otherwise:
//!
//! | View | Missing reference |
//! |---|---|
//! | [`AppointmentDetail`] | doctor or patient: error |
//! | [`MedicineRequestDetail`] | medicine or pharmacist: error |
//! | [`MedicineDetail`] | no pending request: `None`; pending request whose pharmacist is gone: `pharmacist: None` plus a warning |
//! | [`AccountDetail`] | owner row: error |

use crate::error::{CarefileError, Result};
use crate::model::Entity;
use crate::repo::Repository;
use std::collections::HashMap;

pub mod account;
pub mod appointment;
pub mod pharmacy;

pub use account::{AccountDetail, Owner};
pub use appointment::AppointmentDetail;
pub use pharmacy::{MedicineDetail, MedicineRequestDetail, PendingRequest};

/// Looks up a referenced entity, failing on a dangling key.
///
/// `owner` names the referring row in the error, e.g. ``appointment `A1` ``.
fn require<T: Entity>(
    repo: &Repository<T>,
    id: &str,
    owner: &str,
    kind: &'static str,
) -> Result<T> {
    repo.find_one(id)?.ok_or_else(|| missing(owner, kind, id))
}

fn missing(owner: &str, kind: &'static str, id: &str) -> CarefileError {
    CarefileError::MissingReference {
        owner: owner.to_string(),
        kind,
        id: id.to_string(),
    }
}

/// Loads a whole collection keyed by trimmed id, for joins over many rows.
///
/// With duplicated ids the first row in file order wins, as with `find_one`.
fn index_by_id<T: Entity>(repo: &Repository<T>) -> Result<HashMap<String, T>> {
    let mut index = HashMap::new();
    for entity in repo.find_all()? {
        index
            .entry(entity.id().trim().to_string())
            .or_insert(entity);
    }
    Ok(index)
}
