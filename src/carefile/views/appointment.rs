use super::{index_by_id, missing, require};
use crate::error::Result;
use crate::model::{Appointment, Doctor, Entity, Patient};
use crate::repo::Repositories;
use serde::Serialize;
use std::collections::HashMap;

/// An appointment joined with the doctor and patient it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub doctor: Doctor,
    pub patient: Patient,
}

fn owner_label(appointment: &Appointment) -> String {
    format!("appointment `{}`", appointment.id())
}

/// Detail for one appointment; `Ok(None)` when the appointment does not exist.
pub fn detail(repos: &Repositories, id: &str) -> Result<Option<AppointmentDetail>> {
    let Some(appointment) = repos.appointments.find_one(id)? else {
        return Ok(None);
    };
    let owner = owner_label(&appointment);
    let doctor = require(&repos.doctors, &appointment.doctor_id, &owner, "doctor")?;
    let patient = require(&repos.patients, &appointment.patient_id, &owner, "patient")?;
    Ok(Some(AppointmentDetail {
        appointment,
        doctor,
        patient,
    }))
}

/// Every appointment in file order.
pub fn all(repos: &Repositories) -> Result<Vec<AppointmentDetail>> {
    join_all(repos, repos.appointments.find_all()?)
}

/// A doctor's appointments, earliest first.
pub fn for_doctor(repos: &Repositories, doctor_id: &str) -> Result<Vec<AppointmentDetail>> {
    let mut details = join_all(repos, repos.appointments.find_many("doctorId", doctor_id)?)?;
    details.sort_by(|a, b| a.appointment.starts_at.cmp(&b.appointment.starts_at));
    Ok(details)
}

/// A patient's appointments, earliest first.
pub fn for_patient(repos: &Repositories, patient_id: &str) -> Result<Vec<AppointmentDetail>> {
    let mut details = join_all(repos, repos.appointments.find_many("patientId", patient_id)?)?;
    details.sort_by(|a, b| a.appointment.starts_at.cmp(&b.appointment.starts_at));
    Ok(details)
}

fn join_all(
    repos: &Repositories,
    appointments: Vec<Appointment>,
) -> Result<Vec<AppointmentDetail>> {
    if appointments.is_empty() {
        return Ok(Vec::new());
    }
    let doctors = index_by_id(&repos.doctors)?;
    let patients = index_by_id(&repos.patients)?;
    appointments
        .into_iter()
        .map(|appointment| join(appointment, &doctors, &patients))
        .collect()
}

fn join(
    appointment: Appointment,
    doctors: &HashMap<String, Doctor>,
    patients: &HashMap<String, Patient>,
) -> Result<AppointmentDetail> {
    let owner = owner_label(&appointment);
    let doctor = doctors
        .get(appointment.doctor_id.trim())
        .cloned()
        .ok_or_else(|| missing(&owner, "doctor", &appointment.doctor_id))?;
    let patient = patients
        .get(appointment.patient_id.trim())
        .cloned()
        .ok_or_else(|| missing(&owner, "patient", &appointment.patient_id))?;
    Ok(AppointmentDetail {
        appointment,
        doctor,
        patient,
    })
}
