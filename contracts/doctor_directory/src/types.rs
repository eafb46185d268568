use soroban_sdk::{contracterror, contracttype, Address, Map, String, Vec};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    NotAuthorized = 3,
    AlreadyRegistered = 4,
    DoctorNotFound = 5,
    DoctorUnavailable = 6,
    SlotTaken = 7,
    InvalidFee = 8,
}

/// A doctor record. `booked_slots` maps a slot date (e.g. "2024-06-01") to
/// the time labels already taken on that date; it is mutated only through
/// the slot ledger entry points.
#[contracttype]
#[derive(Clone)]
pub struct Doctor {
    pub address: Address,
    pub name: String,
    pub specialty: String,
    pub fee: i128,
    pub available: bool,
    pub booked_slots: Map<String, Vec<String>>,
    pub registered_at: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Booking,
    Doctor(Address),
    DoctorList,
}
