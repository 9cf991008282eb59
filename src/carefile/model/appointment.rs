use super::{whole_seconds, Entity, Label, Record};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl Label for AppointmentStatus {
    const ALL: &'static [Self] = &[
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    fn label(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }
}

/// A booked slot between one patient and one doctor.
///
/// Only the foreign keys are stored; see
/// [`AppointmentDetail`](crate::views::AppointmentDetail) for the joined view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub record: Record,
    pub patient_id: String,
    pub doctor_id: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub reason: String,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn new(
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        starts_at: NaiveDateTime,
        ends_at: NaiveDateTime,
    ) -> Self {
        Self {
            record: Record::new(),
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            starts_at: whole_seconds(starts_at),
            ends_at: whole_seconds(ends_at),
            reason: String::new(),
            status: AppointmentStatus::Pending,
        }
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = record;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Moves the slot. Times are kept at whole-second precision.
    pub fn reschedule(&mut self, starts_at: NaiveDateTime, ends_at: NaiveDateTime) {
        self.starts_at = whole_seconds(starts_at);
        self.ends_at = whole_seconds(ends_at);
        self.record.touch();
    }

    pub fn set_status(&mut self, status: AppointmentStatus) {
        self.status = status;
        self.record.touch();
    }
}

impl Entity for Appointment {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
