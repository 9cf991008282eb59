//! One [`Mapper`] per stored entity type.
//!
//! Column order here is the on-disk contract. `id` always comes first and the
//! `createdAt,updatedAt` pair always comes last.

use super::{Fields, Mapper, RowWriter};
use crate::error::DecodeError;
use crate::model::{
    Account, Appointment, Collection, Doctor, Medicine, MedicineRequest, Patient, Pharmacist,
};
use crate::store::Row;

pub const PATIENTS: Mapper<Patient> = Mapper {
    collection: Collection::Patients,
    header: &[
        "id",
        "name",
        "email",
        "phone",
        "gender",
        "address",
        "createdAt",
        "updatedAt",
    ],
    encode: encode_patient,
    decode: decode_patient,
};

pub const DOCTORS: Mapper<Doctor> = Mapper {
    collection: Collection::Doctors,
    header: &[
        "id",
        "name",
        "email",
        "phone",
        "specialization",
        "createdAt",
        "updatedAt",
    ],
    encode: encode_doctor,
    decode: decode_doctor,
};

pub const PHARMACISTS: Mapper<Pharmacist> = Mapper {
    collection: Collection::Pharmacists,
    header: &["id", "name", "email", "phone", "createdAt", "updatedAt"],
    encode: encode_pharmacist,
    decode: decode_pharmacist,
};

pub const MEDICINES: Mapper<Medicine> = Mapper {
    collection: Collection::Medicines,
    header: &[
        "id",
        "name",
        "stock",
        "lowStockAlert",
        "createdAt",
        "updatedAt",
    ],
    encode: encode_medicine,
    decode: decode_medicine,
};

pub const MEDICINE_REQUESTS: Mapper<MedicineRequest> = Mapper {
    collection: Collection::MedicineRequests,
    header: &[
        "id",
        "medicineId",
        "pharmacistId",
        "quantity",
        "status",
        "createdAt",
        "updatedAt",
    ],
    encode: encode_medicine_request,
    decode: decode_medicine_request,
};

pub const APPOINTMENTS: Mapper<Appointment> = Mapper {
    collection: Collection::Appointments,
    header: &[
        "id",
        "patientId",
        "doctorId",
        "startsAt",
        "endsAt",
        "reason",
        "status",
        "createdAt",
        "updatedAt",
    ],
    encode: encode_appointment,
    decode: decode_appointment,
};

pub const ACCOUNTS: Mapper<Account> = Mapper {
    collection: Collection::Accounts,
    header: &[
        "id",
        "username",
        "passwordHash",
        "role",
        "ownerId",
        "createdAt",
        "updatedAt",
    ],
    encode: encode_account,
    decode: decode_account,
};

/// Header of any collection, for callers that only know the collection.
pub fn header_of(collection: Collection) -> &'static [&'static str] {
    match collection {
        Collection::Patients => PATIENTS.header,
        Collection::Doctors => DOCTORS.header,
        Collection::Pharmacists => PHARMACISTS.header,
        Collection::Medicines => MEDICINES.header,
        Collection::MedicineRequests => MEDICINE_REQUESTS.header,
        Collection::Appointments => APPOINTMENTS.header,
        Collection::Accounts => ACCOUNTS.header,
    }
}

fn encode_patient(p: &Patient) -> Row {
    RowWriter::start(&p.record)
        .text(&p.name)
        .text(&p.email)
        .text(&p.phone)
        .label(p.gender)
        .text(&p.address)
        .finish(&p.record)
}

fn decode_patient(f: &mut Fields<'_>) -> Result<Patient, DecodeError> {
    let id = f.text();
    let name = f.text();
    let email = f.text();
    let phone = f.text();
    let gender = f.label()?;
    let address = f.text();
    Ok(Patient {
        record: f.record(id)?,
        name,
        email,
        phone,
        gender,
        address,
    })
}

fn encode_doctor(d: &Doctor) -> Row {
    RowWriter::start(&d.record)
        .text(&d.name)
        .text(&d.email)
        .text(&d.phone)
        .text(&d.specialization)
        .finish(&d.record)
}

fn decode_doctor(f: &mut Fields<'_>) -> Result<Doctor, DecodeError> {
    let id = f.text();
    let name = f.text();
    let email = f.text();
    let phone = f.text();
    let specialization = f.text();
    Ok(Doctor {
        record: f.record(id)?,
        name,
        email,
        phone,
        specialization,
    })
}

fn encode_pharmacist(p: &Pharmacist) -> Row {
    RowWriter::start(&p.record)
        .text(&p.name)
        .text(&p.email)
        .text(&p.phone)
        .finish(&p.record)
}

fn decode_pharmacist(f: &mut Fields<'_>) -> Result<Pharmacist, DecodeError> {
    let id = f.text();
    let name = f.text();
    let email = f.text();
    let phone = f.text();
    Ok(Pharmacist {
        record: f.record(id)?,
        name,
        email,
        phone,
    })
}

fn encode_medicine(m: &Medicine) -> Row {
    RowWriter::start(&m.record)
        .text(&m.name)
        .integer(m.stock)
        .integer(m.low_stock_alert)
        .finish(&m.record)
}

fn decode_medicine(f: &mut Fields<'_>) -> Result<Medicine, DecodeError> {
    let id = f.text();
    let name = f.text();
    let stock = f.integer()?;
    let low_stock_alert = f.integer()?;
    Ok(Medicine {
        record: f.record(id)?,
        name,
        stock,
        low_stock_alert,
    })
}

fn encode_medicine_request(r: &MedicineRequest) -> Row {
    RowWriter::start(&r.record)
        .text(&r.medicine_id)
        .text(&r.pharmacist_id)
        .integer(r.quantity)
        .label(r.status)
        .finish(&r.record)
}

fn decode_medicine_request(f: &mut Fields<'_>) -> Result<MedicineRequest, DecodeError> {
    let id = f.text();
    let medicine_id = f.text();
    let pharmacist_id = f.text();
    let quantity = f.integer()?;
    let status = f.label()?;
    Ok(MedicineRequest {
        record: f.record(id)?,
        medicine_id,
        pharmacist_id,
        quantity,
        status,
    })
}

fn encode_appointment(a: &Appointment) -> Row {
    RowWriter::start(&a.record)
        .text(&a.patient_id)
        .text(&a.doctor_id)
        .timestamp(&a.starts_at)
        .timestamp(&a.ends_at)
        .text(&a.reason)
        .label(a.status)
        .finish(&a.record)
}

fn decode_appointment(f: &mut Fields<'_>) -> Result<Appointment, DecodeError> {
    let id = f.text();
    let patient_id = f.text();
    let doctor_id = f.text();
    let starts_at = f.timestamp()?;
    let ends_at = f.timestamp()?;
    let reason = f.text();
    let status = f.label()?;
    Ok(Appointment {
        record: f.record(id)?,
        patient_id,
        doctor_id,
        starts_at,
        ends_at,
        reason,
        status,
    })
}

fn encode_account(a: &Account) -> Row {
    RowWriter::start(&a.record)
        .text(&a.username)
        .text(&a.password_hash)
        .label(a.role)
        .text(&a.owner_id)
        .finish(&a.record)
}

fn decode_account(f: &mut Fields<'_>) -> Result<Account, DecodeError> {
    let id = f.text();
    let username = f.text();
    let password_hash = f.text();
    let role = f.label()?;
    let owner_id = f.text();
    Ok(Account {
        record: f.record(id)?,
        username,
        password_hash,
        role,
        owner_id,
    })
}
