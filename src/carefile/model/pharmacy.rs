use super::{Entity, Label, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub record: Record,
    pub name: String,
    pub stock: i64,
    /// Stock level at which pharmacists are asked to replenish.
    pub low_stock_alert: i64,
}

impl Medicine {
    pub fn new(name: impl Into<String>, stock: i64, low_stock_alert: i64) -> Self {
        Self {
            record: Record::new(),
            name: name.into(),
            stock,
            low_stock_alert,
        }
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = record;
        self
    }

    pub fn set_stock(&mut self, stock: i64) {
        self.stock = stock;
        self.record.touch();
    }
}

impl Entity for Medicine {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl Label for RequestStatus {
    const ALL: &'static [Self] = &[
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
    ];

    fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }
}

/// A pharmacist's replenishment request for one medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineRequest {
    pub record: Record,
    pub medicine_id: String,
    pub pharmacist_id: String,
    pub quantity: i64,
    pub status: RequestStatus,
}

impl MedicineRequest {
    pub fn new(
        medicine_id: impl Into<String>,
        pharmacist_id: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Self {
            record: Record::new(),
            medicine_id: medicine_id.into(),
            pharmacist_id: pharmacist_id.into(),
            quantity,
            status: RequestStatus::Pending,
        }
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = record;
        self
    }

    pub fn set_status(&mut self, status: RequestStatus) {
        self.status = status;
        self.record.touch();
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

impl Entity for MedicineRequest {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
