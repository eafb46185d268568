//! Slot ledger: the only code allowed to touch `Doctor::booked_slots`.
//!
//! Both operations read and rewrite a single doctor record inside one
//! contract invocation, so the availability/conflict check and the slot
//! mutation commit together or not at all. A competing reservation for the
//! same slot lands in its own invocation and sees the committed map.

use soroban_sdk::{Address, Env, String, Vec};

use crate::types::{DataKey, Doctor, Error};

pub fn reserve(env: &Env, doctor: &Address, date: &String, time: &String) -> Result<(), Error> {
    let key = DataKey::Doctor(doctor.clone());
    let mut record: Doctor = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::DoctorNotFound)?;

    if !record.available {
        return Err(Error::DoctorUnavailable);
    }

    let mut times: Vec<String> = record
        .booked_slots
        .get(date.clone())
        .unwrap_or(Vec::new(env));

    if times.contains(time.clone()) {
        return Err(Error::SlotTaken);
    }

    times.push_back(time.clone());
    record.booked_slots.set(date.clone(), times);
    env.storage().persistent().set(&key, &record);

    Ok(())
}

/// Idempotent: removing an absent slot is still a success, only a missing
/// doctor record is an error.
pub fn release(env: &Env, doctor: &Address, date: &String, time: &String) -> Result<(), Error> {
    let key = DataKey::Doctor(doctor.clone());
    let mut record: Doctor = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::DoctorNotFound)?;

    if let Some(mut times) = record.booked_slots.get(date.clone()) {
        if let Some(index) = times.first_index_of(time.clone()) {
            let _ = times.remove(index);
            record.booked_slots.set(date.clone(), times);
            env.storage().persistent().set(&key, &record);
        }
    }

    Ok(())
}
