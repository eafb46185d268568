use soroban_sdk::{contracterror, contracttype, Address, String};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    NotAuthorized = 3,
    InvalidInput = 4,
    DoctorNotFound = 5,
    DoctorUnavailable = 6,
    SlotTaken = 7,
    AppointmentNotFound = 8,
    AlreadyCancelled = 9,
    PatientLimitReached = 10,
    UpstreamFailure = 11,
}

/// An appointment record. The doctor's name and fee are snapshotted at
/// booking time; later edits to the doctor record never reach back here.
/// `cancelled` and `paid` only ever go false -> true.
#[contracttype]
#[derive(Clone)]
pub struct Appointment {
    pub id: u64,
    pub patient: Address,
    pub doctor: Address,
    pub doctor_name: String,
    pub slot_date: String,
    pub slot_time: String,
    pub fee: i128,
    pub created_at: u64,
    pub cancelled: bool,
    pub paid: bool,
}

#[contracttype]
#[derive(Clone)]
pub struct Config {
    pub admin: Address,
    pub directory: Address,
    pub gateway: Address,
    pub max_active_per_patient: u32,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    Reconciler,
    ApptCount,
    Appt(u64),
    PatientAppts(Address),
}
