use super::{index_by_id, missing, require};
use crate::error::Result;
use crate::model::{Entity, Medicine, MedicineRequest, Pharmacist};
use crate::repo::Repositories;
use log::warn;
use serde::Serialize;
use std::collections::HashMap;

/// A pending replenishment request and, when still on file, who filed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRequest {
    pub request: MedicineRequest,
    pub pharmacist: Option<Pharmacist>,
}

/// A medicine with its open replenishment request, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicineDetail {
    pub medicine: Medicine,
    pub pending_request: Option<PendingRequest>,
}

/// A replenishment request joined with its medicine and pharmacist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicineRequestDetail {
    pub request: MedicineRequest,
    pub medicine: Medicine,
    pub pharmacist: Pharmacist,
}

fn owner_label(request: &MedicineRequest) -> String {
    format!("medicine request `{}`", request.id())
}

/// Detail for one medicine; `Ok(None)` when the medicine does not exist.
///
/// The pending request is the first `Pending` request for the medicine in file
/// order. A pharmacist that no longer exists is tolerated (`pharmacist: None`).
pub fn medicine_detail(repos: &Repositories, id: &str) -> Result<Option<MedicineDetail>> {
    let Some(medicine) = repos.medicines.find_one(id)? else {
        return Ok(None);
    };
    let pending = repos
        .medicine_requests
        .find_many("medicineId", medicine.id())?
        .into_iter()
        .find(MedicineRequest::is_pending);

    let pending_request = match pending {
        Some(request) => {
            let pharmacist = repos.pharmacists.find_one(&request.pharmacist_id)?;
            Some(tolerate_missing_pharmacist(request, pharmacist))
        }
        None => None,
    };
    Ok(Some(MedicineDetail {
        medicine,
        pending_request,
    }))
}

/// Every medicine in file order, each with its pending request.
pub fn medicine_details(repos: &Repositories) -> Result<Vec<MedicineDetail>> {
    let medicines = repos.medicines.find_all()?;
    if medicines.is_empty() {
        return Ok(Vec::new());
    }

    let mut pending: HashMap<String, MedicineRequest> = HashMap::new();
    for request in repos.medicine_requests.find_all()? {
        if request.is_pending() {
            pending
                .entry(request.medicine_id.trim().to_string())
                .or_insert(request);
        }
    }
    let pharmacists = if pending.is_empty() {
        HashMap::new()
    } else {
        index_by_id(&repos.pharmacists)?
    };

    Ok(medicines
        .into_iter()
        .map(|medicine| {
            let pending_request = pending.remove(medicine.id().trim()).map(|request| {
                let pharmacist = pharmacists.get(request.pharmacist_id.trim()).cloned();
                tolerate_missing_pharmacist(request, pharmacist)
            });
            MedicineDetail {
                medicine,
                pending_request,
            }
        })
        .collect())
}

fn tolerate_missing_pharmacist(
    request: MedicineRequest,
    pharmacist: Option<Pharmacist>,
) -> PendingRequest {
    if pharmacist.is_none() {
        warn!(
            "event=dangling_reference module=views status=tolerated request={} pharmacist={}",
            request.id(),
            request.pharmacist_id
        );
    }
    PendingRequest {
        request,
        pharmacist,
    }
}

/// Detail for one request; `Ok(None)` when the request does not exist.
pub fn request_detail(repos: &Repositories, id: &str) -> Result<Option<MedicineRequestDetail>> {
    let Some(request) = repos.medicine_requests.find_one(id)? else {
        return Ok(None);
    };
    let owner = owner_label(&request);
    let medicine = require(&repos.medicines, &request.medicine_id, &owner, "medicine")?;
    let pharmacist = require(
        &repos.pharmacists,
        &request.pharmacist_id,
        &owner,
        "pharmacist",
    )?;
    Ok(Some(MedicineRequestDetail {
        request,
        medicine,
        pharmacist,
    }))
}

/// Every pending request in file order, fully joined.
pub fn pending_requests(repos: &Repositories) -> Result<Vec<MedicineRequestDetail>> {
    let requests: Vec<MedicineRequest> = repos
        .medicine_requests
        .find_many("status", "Pending")?;
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let medicines = index_by_id(&repos.medicines)?;
    let pharmacists = index_by_id(&repos.pharmacists)?;
    requests
        .into_iter()
        .map(|request| {
            let owner = owner_label(&request);
            let medicine = medicines
                .get(request.medicine_id.trim())
                .cloned()
                .ok_or_else(|| missing(&owner, "medicine", &request.medicine_id))?;
            let pharmacist = pharmacists
                .get(request.pharmacist_id.trim())
                .cloned()
                .ok_or_else(|| missing(&owner, "pharmacist", &request.pharmacist_id))?;
            Ok(MedicineRequestDetail {
                request,
                medicine,
                pharmacist,
            })
        })
        .collect()
}
