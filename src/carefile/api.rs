//! # API Facade
//!
//! The single entry point for callers above the storage layer: menus,
//! controllers, the bundled CLI. It owns one [`Repository`] per collection
//! (through [`Repositories`]) and forwards to the detail views.
//!
//! ## Typed vs. Collection-Generic Access
//!
//! Code that knows which entity it wants goes through [`CarefileApi::repos`]
//! and gets typed results. Code that only has a [`Collection`] value (the CLI
//! with `carefile list medicines`) uses the table operations, which decode
//! through the collection's mapper and hand back rows as text columns.
//!
//! ## What the API Does NOT Do
//!
//! - No printing. Everything returns data.
//! - No business rules (slot overlap, stock thresholds, role checks).

use crate::codec::mappers::header_of;
use crate::config::CarefileConfig;
use crate::error::{CarefileError, Result};
use crate::model::{Collection, Entity};
use crate::repo::{MalformedRow, Repositories, Repository};
use crate::store::Row;
use crate::views::{
    self, AccountDetail, AppointmentDetail, MedicineDetail, MedicineRequestDetail,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Rows of one collection rendered as text columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub malformed: Vec<MalformedRow>,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: usize,
    /// Lines that did not decode; `line` is the 1-based line of the input.
    pub rejected: Vec<MalformedRow>,
}

/// Per-collection operations that do not need the entity type.
trait CollectionOps {
    fn table(&self) -> Result<Table>;
    fn find_table(&self, column: &str, value: &str) -> Result<Table>;
    fn show_json(&self, id: &str) -> Result<Option<serde_json::Value>>;
    fn show_fields(&self, id: &str) -> Result<Option<Vec<(&'static str, String)>>>;
    fn delete(&self, id: &str) -> Result<()>;
    fn import(&self, text: &str) -> Result<ImportReport>;
    fn count(&self) -> Result<usize>;
}

impl<T: Entity + Serialize> CollectionOps for Repository<T> {
    fn table(&self) -> Result<Table> {
        let scan = self.scan_all()?;
        let mut table = self.render(&scan.entities);
        table.malformed = scan.malformed;
        Ok(table)
    }

    fn find_table(&self, column: &str, value: &str) -> Result<Table> {
        Ok(self.render(&self.find_many(column, value)?))
    }

    fn show_json(&self, id: &str) -> Result<Option<serde_json::Value>> {
        match self.find_one(id)? {
            Some(entity) => Ok(Some(serde_json::to_value(&entity)?)),
            None => Ok(None),
        }
    }

    fn show_fields(&self, id: &str) -> Result<Option<Vec<(&'static str, String)>>> {
        let mapper = self.mapper();
        Ok(self.find_one(id)?.map(|entity| {
            let row = mapper.encode(&entity);
            mapper
                .header
                .iter()
                .copied()
                .zip(row.fields().into_iter().map(str::to_string))
                .collect()
        }))
    }

    fn delete(&self, id: &str) -> Result<()> {
        Repository::delete(self, id)
    }

    fn import(&self, text: &str) -> Result<ImportReport> {
        let mapper = self.mapper();
        let header_line = mapper.header_line();
        let mut report = ImportReport::default();
        let mut accepted = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let row = Row::from(line);
            if row.is_blank() || (i == 0 && row.as_str().trim() == header_line) {
                continue;
            }
            match mapper.decode(&row) {
                Ok(entity) => accepted.push(entity),
                Err(error) => report.rejected.push(MalformedRow {
                    line: i + 1,
                    key: row.key().to_string(),
                    error,
                }),
            }
        }

        self.save_all(&accepted)?;
        report.imported = accepted.len();
        Ok(report)
    }

    fn count(&self) -> Result<usize> {
        Repository::count(self)
    }
}

impl<T: Entity> Repository<T> {
    fn render(&self, entities: &[T]) -> Table {
        let mapper = self.mapper();
        Table {
            header: mapper.header.iter().map(|h| h.to_string()).collect(),
            rows: entities
                .iter()
                .map(|e| {
                    mapper
                        .encode(e)
                        .fields()
                        .into_iter()
                        .map(str::to_string)
                        .collect()
                })
                .collect(),
            malformed: Vec::new(),
        }
    }
}

/// The main API facade for carefile operations.
pub struct CarefileApi {
    repos: Repositories,
    data_dir: PathBuf,
}

impl CarefileApi {
    /// Opens every collection under `data_dir`, creating missing files.
    pub fn open(data_dir: impl Into<PathBuf>, config: &CarefileConfig) -> Result<Self> {
        let data_dir = data_dir.into();
        let repos = Repositories::open(&data_dir, config)?;
        Ok(Self { repos, data_dir })
    }

    pub fn repos(&self) -> &Repositories {
        &self.repos
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn ops(&self, collection: Collection) -> &dyn CollectionOps {
        match collection {
            Collection::Patients => &self.repos.patients,
            Collection::Doctors => &self.repos.doctors,
            Collection::Pharmacists => &self.repos.pharmacists,
            Collection::Medicines => &self.repos.medicines,
            Collection::MedicineRequests => &self.repos.medicine_requests,
            Collection::Appointments => &self.repos.appointments,
            Collection::Accounts => &self.repos.accounts,
        }
    }

    // --- Collection-generic operations ---

    pub fn columns(&self, collection: Collection) -> &'static [&'static str] {
        header_of(collection)
    }

    pub fn list(&self, collection: Collection) -> Result<Table> {
        self.ops(collection).table()
    }

    pub fn find(&self, collection: Collection, column: &str, value: &str) -> Result<Table> {
        self.ops(collection).find_table(column, value)
    }

    /// One entity as JSON, or `NotFound`.
    pub fn show(&self, collection: Collection, id: &str) -> Result<serde_json::Value> {
        self.ops(collection)
            .show_json(id)?
            .ok_or_else(|| CarefileError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    /// One entity as `(column, value)` pairs in stored column order, or
    /// `NotFound`. A malformed row is a `Decode` error.
    pub fn show_fields(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Vec<(&'static str, String)>> {
        self.ops(collection)
            .show_fields(id)?
            .ok_or_else(|| CarefileError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    pub fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.ops(collection).delete(id)
    }

    /// Bulk-saves rows exported from a spreadsheet or another data directory.
    ///
    /// A leading header line is skipped. Lines that fail to decode are
    /// reported and not written; the rest are appended in input order.
    pub fn import(&self, collection: Collection, text: &str) -> Result<ImportReport> {
        self.ops(collection).import(text)
    }

    /// Row count per collection, in catalogue order.
    pub fn summary(&self) -> Result<Vec<(Collection, usize)>> {
        Collection::ALL
            .iter()
            .map(|&c| Ok((c, self.ops(c).count()?)))
            .collect()
    }

    // --- Detail views ---

    pub fn appointment_detail(&self, id: &str) -> Result<Option<AppointmentDetail>> {
        views::appointment::detail(&self.repos, id)
    }

    pub fn appointment_details(&self) -> Result<Vec<AppointmentDetail>> {
        views::appointment::all(&self.repos)
    }

    pub fn appointments_for_doctor(&self, doctor_id: &str) -> Result<Vec<AppointmentDetail>> {
        views::appointment::for_doctor(&self.repos, doctor_id)
    }

    pub fn appointments_for_patient(&self, patient_id: &str) -> Result<Vec<AppointmentDetail>> {
        views::appointment::for_patient(&self.repos, patient_id)
    }

    pub fn medicine_detail(&self, id: &str) -> Result<Option<MedicineDetail>> {
        views::pharmacy::medicine_detail(&self.repos, id)
    }

    pub fn medicine_details(&self) -> Result<Vec<MedicineDetail>> {
        views::pharmacy::medicine_details(&self.repos)
    }

    pub fn medicine_request_detail(&self, id: &str) -> Result<Option<MedicineRequestDetail>> {
        views::pharmacy::request_detail(&self.repos, id)
    }

    pub fn pending_requests(&self) -> Result<Vec<MedicineRequestDetail>> {
        views::pharmacy::pending_requests(&self.repos)
    }

    pub fn account_detail(&self, username: &str) -> Result<Option<AccountDetail>> {
        views::account::account_detail(&self.repos, username)
    }
}
