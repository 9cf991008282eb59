use super::Repository;
use crate::codec::mappers;
use crate::config::CarefileConfig;
use crate::error::Result;
use crate::model::{
    Account, Appointment, Doctor, Medicine, MedicineRequest, Patient, Pharmacist,
};
use std::path::Path;

/// One repository per collection, all rooted in the same data directory.
pub struct Repositories {
    pub patients: Repository<Patient>,
    pub doctors: Repository<Doctor>,
    pub pharmacists: Repository<Pharmacist>,
    pub medicines: Repository<Medicine>,
    pub medicine_requests: Repository<MedicineRequest>,
    pub appointments: Repository<Appointment>,
    pub accounts: Repository<Account>,
}

impl Repositories {
    /// Opens (and if needed creates) every collection file under `data_dir`.
    pub fn open(data_dir: &Path, config: &CarefileConfig) -> Result<Self> {
        let ext = config.file_ext();
        let unique = config.unique_ids;
        Ok(Self {
            patients: Repository::open(data_dir, mappers::PATIENTS, ext)?.with_unique_ids(unique),
            doctors: Repository::open(data_dir, mappers::DOCTORS, ext)?.with_unique_ids(unique),
            pharmacists: Repository::open(data_dir, mappers::PHARMACISTS, ext)?
                .with_unique_ids(unique),
            medicines: Repository::open(data_dir, mappers::MEDICINES, ext)?
                .with_unique_ids(unique),
            medicine_requests: Repository::open(data_dir, mappers::MEDICINE_REQUESTS, ext)?
                .with_unique_ids(unique),
            appointments: Repository::open(data_dir, mappers::APPOINTMENTS, ext)?
                .with_unique_ids(unique),
            accounts: Repository::open(data_dir, mappers::ACCOUNTS, ext)?.with_unique_ids(unique),
        })
    }
}
