#![no_std]

mod ledger;
mod types;

use soroban_sdk::{contract, contractimpl, symbol_short, Address, Env, Map, String, Vec};

pub use types::{DataKey, Doctor, Error};

#[contract]
pub struct DoctorDirectory;

#[contractimpl]
impl DoctorDirectory {
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .persistent()
            .set(&DataKey::DoctorList, &Vec::<Address>::new(&env));

        Ok(())
    }

    /// Wire the one contract address allowed to drive the slot ledger.
    pub fn set_booking(env: Env, booking: Address) -> Result<(), Error> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        admin.require_auth();

        env.storage().instance().set(&DataKey::Booking, &booking);
        Ok(())
    }

    pub fn register_doctor(
        env: Env,
        admin: Address,
        doctor: Address,
        name: String,
        specialty: String,
        fee: i128,
    ) -> Result<(), Error> {
        admin.require_auth();

        let stored_admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        if admin != stored_admin {
            return Err(Error::NotAuthorized);
        }

        if fee <= 0 {
            return Err(Error::InvalidFee);
        }

        let key = DataKey::Doctor(doctor.clone());
        if env.storage().persistent().has(&key) {
            return Err(Error::AlreadyRegistered);
        }

        let record = Doctor {
            address: doctor.clone(),
            name,
            specialty,
            fee,
            available: true,
            booked_slots: Map::new(&env),
            registered_at: env.ledger().timestamp(),
        };
        env.storage().persistent().set(&key, &record);

        let mut list: Vec<Address> = env
            .storage()
            .persistent()
            .get(&DataKey::DoctorList)
            .unwrap_or(Vec::new(&env));
        list.push_back(doctor.clone());
        env.storage().persistent().set(&DataKey::DoctorList, &list);

        env.events()
            .publish((symbol_short!("DOC_REG"),), (doctor, fee));

        Ok(())
    }

    pub fn set_availability(env: Env, doctor: Address, available: bool) -> Result<(), Error> {
        doctor.require_auth();

        let key = DataKey::Doctor(doctor.clone());
        let mut record: Doctor = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(Error::DoctorNotFound)?;

        record.available = available;
        env.storage().persistent().set(&key, &record);

        env.events()
            .publish((symbol_short!("DOC_AVL"),), (doctor, available));

        Ok(())
    }

    /// Changes the fee charged for new bookings. Existing appointments keep
    /// the fee snapshotted when they were created.
    pub fn update_fee(env: Env, doctor: Address, fee: i128) -> Result<(), Error> {
        doctor.require_auth();

        if fee <= 0 {
            return Err(Error::InvalidFee);
        }

        let key = DataKey::Doctor(doctor.clone());
        let mut record: Doctor = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(Error::DoctorNotFound)?;

        record.fee = fee;
        env.storage().persistent().set(&key, &record);

        env.events()
            .publish((symbol_short!("DOC_FEE"),), (doctor, fee));

        Ok(())
    }

    pub fn get_doctor(env: Env, doctor: Address) -> Result<Doctor, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Doctor(doctor))
            .ok_or(Error::DoctorNotFound)
    }

    pub fn list_doctors(env: Env) -> Vec<Doctor> {
        let list: Vec<Address> = env
            .storage()
            .persistent()
            .get(&DataKey::DoctorList)
            .unwrap_or(Vec::new(&env));

        let mut results = Vec::new(&env);
        for doctor in list.iter() {
            if let Some(record) = env
                .storage()
                .persistent()
                .get::<DataKey, Doctor>(&DataKey::Doctor(doctor))
            {
                results.push_back(record);
            }
        }
        results
    }

    /// Reserve a (date, time) slot. Only the wired booking contract may
    /// call this; the conflict check and the append commit atomically.
    pub fn reserve_slot(
        env: Env,
        doctor: Address,
        date: String,
        time: String,
    ) -> Result<(), Error> {
        Self::require_booking(&env)?;

        ledger::reserve(&env, &doctor, &date, &time)?;

        env.events()
            .publish((symbol_short!("SLOT_RSV"),), (doctor, date, time));

        Ok(())
    }

    /// Release a previously reserved slot. Idempotent.
    pub fn release_slot(
        env: Env,
        doctor: Address,
        date: String,
        time: String,
    ) -> Result<(), Error> {
        Self::require_booking(&env)?;

        ledger::release(&env, &doctor, &date, &time)?;

        env.events()
            .publish((symbol_short!("SLOT_REL"),), (doctor, date, time));

        Ok(())
    }

    /// Time labels already taken for a doctor on a given date.
    pub fn booked_slots(env: Env, doctor: Address, date: String) -> Result<Vec<String>, Error> {
        let record: Doctor = env
            .storage()
            .persistent()
            .get(&DataKey::Doctor(doctor))
            .ok_or(Error::DoctorNotFound)?;
        Ok(record.booked_slots.get(date).unwrap_or(Vec::new(&env)))
    }

    fn require_booking(env: &Env) -> Result<(), Error> {
        let booking: Address = env
            .storage()
            .instance()
            .get(&DataKey::Booking)
            .ok_or(Error::NotInitialized)?;
        booking.require_auth();
        Ok(())
    }
}
