use super::require;
use crate::error::Result;
use crate::model::{Account, Doctor, Entity, Patient, Pharmacist, Role};
use crate::repo::Repositories;
use serde::Serialize;

/// The person an account logs in as, resolved through the account's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "profile")]
pub enum Owner {
    Doctor(Doctor),
    Patient(Patient),
    Pharmacist(Pharmacist),
    /// Admin accounts have no profile row.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountDetail {
    pub account: Account,
    pub owner: Owner,
}

/// Detail for the account with `username`; `Ok(None)` when there is none.
pub fn account_detail(repos: &Repositories, username: &str) -> Result<Option<AccountDetail>> {
    let Some(account) = repos.accounts.find_by("username", username)? else {
        return Ok(None);
    };
    let owner = resolve_owner(repos, &account)?;
    Ok(Some(AccountDetail { account, owner }))
}

fn resolve_owner(repos: &Repositories, account: &Account) -> Result<Owner> {
    let label = format!("account `{}`", account.id());
    let id = account.owner_id.as_str();
    Ok(match account.role {
        Role::Admin => Owner::None,
        Role::Doctor => Owner::Doctor(require(&repos.doctors, id, &label, "doctor")?),
        Role::Patient => Owner::Patient(require(&repos.patients, id, &label, "patient")?),
        Role::Pharmacist => {
            Owner::Pharmacist(require(&repos.pharmacists, id, &label, "pharmacist")?)
        }
    })
}
