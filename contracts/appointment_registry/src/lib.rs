#![no_std]

mod types;

use soroban_sdk::{contract, contractimpl, symbol_short, Address, Env, String, Vec};

use doctor_directory::{DoctorDirectoryClient, Error as DirectoryError};
use identity_gateway::{IdentityGatewayClient, Role};

pub use types::{Appointment, Config, DataKey, Error};

#[contract]
pub struct AppointmentRegistry;

#[contractimpl]
impl AppointmentRegistry {
    pub fn initialize(
        env: Env,
        admin: Address,
        directory: Address,
        gateway: Address,
        max_active_per_patient: u32,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Config) {
            return Err(Error::AlreadyInitialized);
        }
        if max_active_per_patient == 0 {
            return Err(Error::InvalidInput);
        }

        let config = Config {
            admin,
            directory,
            gateway,
            max_active_per_patient,
        };
        env.storage().instance().set(&DataKey::Config, &config);
        env.storage().instance().set(&DataKey::ApptCount, &0u64);

        Ok(())
    }

    /// Wire the one contract address allowed to flip `paid`.
    pub fn set_reconciler(env: Env, reconciler: Address) -> Result<(), Error> {
        let config = Self::config(&env)?;
        config.admin.require_auth();

        env.storage()
            .instance()
            .set(&DataKey::Reconciler, &reconciler);
        Ok(())
    }

    /// Reserve a slot with the directory and persist the appointment
    /// record. If the record cannot be stored after the slot was taken,
    /// the slot is released again before the error is surfaced.
    pub fn book_appointment(
        env: Env,
        patient: Address,
        doctor: Address,
        slot_date: String,
        slot_time: String,
    ) -> Result<u64, Error> {
        patient.require_auth();

        let config = Self::config(&env)?;

        if slot_date.len() == 0 || slot_time.len() == 0 {
            return Err(Error::InvalidInput);
        }

        let gateway = IdentityGatewayClient::new(&env, &config.gateway);
        if !gateway.has_role(&patient, &Role::Patient) {
            return Err(Error::NotAuthorized);
        }

        let directory = DoctorDirectoryClient::new(&env, &config.directory);

        // Fee and name are snapshotted here; the authoritative availability
        // and conflict checks happen inside reserve_slot.
        let doctor_record = match directory.try_get_doctor(&doctor) {
            Ok(Ok(record)) => record,
            Err(Ok(DirectoryError::DoctorNotFound)) => return Err(Error::DoctorNotFound),
            _ => return Err(Error::UpstreamFailure),
        };

        match directory.try_reserve_slot(&doctor, &slot_date, &slot_time) {
            Ok(_) => {}
            Err(Ok(DirectoryError::DoctorUnavailable)) => return Err(Error::DoctorUnavailable),
            Err(Ok(DirectoryError::SlotTaken)) => return Err(Error::SlotTaken),
            Err(Ok(DirectoryError::DoctorNotFound)) => return Err(Error::DoctorNotFound),
            Err(_) => return Err(Error::UpstreamFailure),
        }

        let mut appointment_id: u64 = env
            .storage()
            .instance()
            .get(&DataKey::ApptCount)
            .unwrap_or(0);
        appointment_id += 1;
        env.storage()
            .instance()
            .set(&DataKey::ApptCount, &appointment_id);

        let appointment = Appointment {
            id: appointment_id,
            patient: patient.clone(),
            doctor: doctor.clone(),
            doctor_name: doctor_record.name,
            slot_date: slot_date.clone(),
            slot_time: slot_time.clone(),
            fee: doctor_record.fee,
            created_at: env.ledger().timestamp(),
            cancelled: false,
            paid: false,
        };

        if let Err(err) = Self::persist(&env, &config, &appointment) {
            // Compensating release: the reservation above must not outlive
            // a record that was never stored.
            let _ = directory.try_release_slot(&doctor, &slot_date, &slot_time);
            return Err(err);
        }

        env.events().publish(
            (symbol_short!("BOOKED"),),
            (appointment_id, patient, doctor),
        );

        Ok(appointment_id)
    }

    pub fn list_appointments(env: Env, patient: Address) -> Vec<Appointment> {
        patient.require_auth();

        let ids: Vec<u64> = env
            .storage()
            .persistent()
            .get(&DataKey::PatientAppts(patient))
            .unwrap_or(Vec::new(&env));

        let mut appointments = Vec::new(&env);
        for id in ids.iter() {
            if let Some(appointment) = env
                .storage()
                .persistent()
                .get::<DataKey, Appointment>(&DataKey::Appt(id))
            {
                appointments.push_back(appointment);
            }
        }
        appointments
    }

    pub fn get_appointment(env: Env, appointment_id: u64) -> Result<Appointment, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Appt(appointment_id))
            .ok_or(Error::AppointmentNotFound)
    }

    pub fn cancel_appointment(env: Env, patient: Address, appointment_id: u64) -> Result<(), Error> {
        patient.require_auth();

        let config = Self::config(&env)?;

        let mut appointment: Appointment = env
            .storage()
            .persistent()
            .get(&DataKey::Appt(appointment_id))
            .ok_or(Error::AppointmentNotFound)?;

        if appointment.patient != patient {
            return Err(Error::NotAuthorized);
        }
        if appointment.cancelled {
            return Err(Error::AlreadyCancelled);
        }

        // Flag first: if the release below fails, the record must already
        // read as cancelled so the held slot cannot back an active booking.
        appointment.cancelled = true;
        env.storage()
            .persistent()
            .set(&DataKey::Appt(appointment_id), &appointment);

        let directory = DoctorDirectoryClient::new(&env, &config.directory);
        if directory
            .try_release_slot(
                &appointment.doctor,
                &appointment.slot_date,
                &appointment.slot_time,
            )
            .is_err()
        {
            // Slot stays held until offline reconciliation picks this up.
            env.events().publish(
                (symbol_short!("REL_FAIL"),),
                (appointment_id, appointment.doctor.clone()),
            );
        }

        env.events()
            .publish((symbol_short!("CANCELLED"),), (appointment_id, patient));

        Ok(())
    }

    /// Flip `paid`, reconciler only. Idempotent: a repeat confirmation of
    /// an already-paid appointment is a no-op success.
    pub fn mark_paid(env: Env, appointment_id: u64) -> Result<(), Error> {
        let reconciler: Address = env
            .storage()
            .instance()
            .get(&DataKey::Reconciler)
            .ok_or(Error::NotInitialized)?;
        reconciler.require_auth();

        let mut appointment: Appointment = env
            .storage()
            .persistent()
            .get(&DataKey::Appt(appointment_id))
            .ok_or(Error::AppointmentNotFound)?;

        if appointment.paid {
            return Ok(());
        }

        appointment.paid = true;
        env.storage()
            .persistent()
            .set(&DataKey::Appt(appointment_id), &appointment);

        env.events()
            .publish((symbol_short!("APPT_PAID"),), appointment_id);

        Ok(())
    }

    fn config(env: &Env) -> Result<Config, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(Error::NotInitialized)
    }

    fn persist(env: &Env, config: &Config, appointment: &Appointment) -> Result<(), Error> {
        let patient_key = DataKey::PatientAppts(appointment.patient.clone());
        let mut ids: Vec<u64> = env
            .storage()
            .persistent()
            .get(&patient_key)
            .unwrap_or(Vec::new(env));

        let mut active: u32 = 0;
        for id in ids.iter() {
            if let Some(existing) = env
                .storage()
                .persistent()
                .get::<DataKey, Appointment>(&DataKey::Appt(id))
            {
                if !existing.cancelled {
                    active += 1;
                }
            }
        }
        if active >= config.max_active_per_patient {
            return Err(Error::PatientLimitReached);
        }

        env.storage()
            .persistent()
            .set(&DataKey::Appt(appointment.id), appointment);
        ids.push_back(appointment.id);
        env.storage().persistent().set(&patient_key, &ids);

        Ok(())
    }
}

#[cfg(test)]
mod test;
