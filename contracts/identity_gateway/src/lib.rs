#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Env,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    NotAuthorized = 3,
    AlreadyRegistered = 4,
    UnknownSubject = 5,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub enum Role {
    Patient = 0,
    Doctor = 1,
    Admin = 2,
}

#[derive(Clone)]
#[contracttype]
pub struct Grant {
    pub subject: Address,
    pub role: Role,
    pub issued_at: u64,
}

#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    Admin,
    Grant(Address),
}

#[contract]
pub struct IdentityGateway;

#[contractimpl]
impl IdentityGateway {
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }

        env.storage().instance().set(&DataKey::Admin, &admin);

        let grant = Grant {
            subject: admin.clone(),
            role: Role::Admin,
            issued_at: env.ledger().timestamp(),
        };
        env.storage()
            .persistent()
            .set(&DataKey::Grant(admin), &grant);

        Ok(())
    }

    /// Self-service patient enrollment.
    pub fn register_patient(env: Env, subject: Address) -> Result<(), Error> {
        subject.require_auth();

        if env
            .storage()
            .persistent()
            .has(&DataKey::Grant(subject.clone()))
        {
            return Err(Error::AlreadyRegistered);
        }

        let grant = Grant {
            subject: subject.clone(),
            role: Role::Patient,
            issued_at: env.ledger().timestamp(),
        };
        env.storage()
            .persistent()
            .set(&DataKey::Grant(subject.clone()), &grant);

        env.events()
            .publish((symbol_short!("ID_GRANT"),), (subject, Role::Patient));

        Ok(())
    }

    /// Doctor enrollment, admin only.
    pub fn register_doctor(env: Env, admin: Address, subject: Address) -> Result<(), Error> {
        admin.require_auth();

        let stored_admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        if admin != stored_admin {
            return Err(Error::NotAuthorized);
        }

        if env
            .storage()
            .persistent()
            .has(&DataKey::Grant(subject.clone()))
        {
            return Err(Error::AlreadyRegistered);
        }

        let grant = Grant {
            subject: subject.clone(),
            role: Role::Doctor,
            issued_at: env.ledger().timestamp(),
        };
        env.storage()
            .persistent()
            .set(&DataKey::Grant(subject.clone()), &grant);

        env.events()
            .publish((symbol_short!("ID_GRANT"),), (subject, Role::Doctor));

        Ok(())
    }

    /// Resolve a subject to its granted role. Pure read.
    pub fn verify(env: Env, subject: Address) -> Result<Role, Error> {
        let grant: Grant = env
            .storage()
            .persistent()
            .get(&DataKey::Grant(subject))
            .ok_or(Error::UnknownSubject)?;
        Ok(grant.role)
    }

    pub fn has_role(env: Env, subject: Address, role: Role) -> bool {
        match env
            .storage()
            .persistent()
            .get::<DataKey, Grant>(&DataKey::Grant(subject))
        {
            Some(grant) => grant.role == role,
            None => false,
        }
    }
}
