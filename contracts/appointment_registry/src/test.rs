#![cfg(test)]

use super::*;
use soroban_sdk::testutils::{Address as _, MockAuth, MockAuthInvoke};
use soroban_sdk::{Env, IntoVal, String};

use doctor_directory::DoctorDirectory;
use identity_gateway::IdentityGateway;

struct Fixture {
    env: Env,
    admin: Address,
    doctor: Address,
    patient_a: Address,
    patient_b: Address,
    directory: DoctorDirectoryClient<'static>,
    gateway: IdentityGatewayClient<'static>,
    registry: AppointmentRegistryClient<'static>,
}

fn setup(max_active_per_patient: u32) -> Fixture {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let doctor = Address::generate(&env);
    let patient_a = Address::generate(&env);
    let patient_b = Address::generate(&env);

    let gateway_id = env.register_contract(None, IdentityGateway);
    let gateway = IdentityGatewayClient::new(&env, &gateway_id);
    gateway.initialize(&admin);
    gateway.register_patient(&patient_a);
    gateway.register_patient(&patient_b);

    let directory_id = env.register_contract(None, DoctorDirectory);
    let directory = DoctorDirectoryClient::new(&env, &directory_id);
    directory.initialize(&admin);
    directory.register_doctor(
        &admin,
        &doctor,
        &String::from_str(&env, "Dr. Achieng"),
        &String::from_str(&env, "Cardiology"),
        &500,
    );

    let registry_id = env.register_contract(None, AppointmentRegistry);
    let registry = AppointmentRegistryClient::new(&env, &registry_id);
    registry.initialize(&admin, &directory_id, &gateway_id, &max_active_per_patient);
    directory.set_booking(&registry_id);

    Fixture {
        env,
        admin,
        doctor,
        patient_a,
        patient_b,
        directory,
        gateway,
        registry,
    }
}

fn date(env: &Env) -> String {
    String::from_str(env, "2024-06-01")
}

fn ten(env: &Env) -> String {
    String::from_str(env, "10:00")
}

#[test]
fn test_book_conflict_cancel_rebook() {
    let f = setup(3);
    let date = date(&f.env);
    let ten = ten(&f.env);

    let id = f
        .registry
        .book_appointment(&f.patient_a, &f.doctor, &date, &ten);

    let booked = f.directory.booked_slots(&f.doctor, &date);
    assert_eq!(booked.len(), 1);
    assert_eq!(booked.get(0).unwrap(), ten);

    // The slot is taken: a second patient must be turned away.
    let result = f
        .registry
        .try_book_appointment(&f.patient_b, &f.doctor, &date, &ten);
    assert_eq!(result, Err(Ok(Error::SlotTaken)));

    // Cancellation releases the slot...
    f.registry.cancel_appointment(&f.patient_a, &id);
    assert_eq!(f.directory.booked_slots(&f.doctor, &date).len(), 0);
    assert!(f.registry.get_appointment(&id).cancelled);

    // ...and the other patient can take it.
    let second = f
        .registry
        .book_appointment(&f.patient_b, &f.doctor, &date, &ten);
    assert_ne!(second, id);
    assert_eq!(f.directory.booked_slots(&f.doctor, &date).len(), 1);
}

#[test]
fn test_booking_snapshots_fee_and_name() {
    let f = setup(3);

    let id = f
        .registry
        .book_appointment(&f.patient_a, &f.doctor, &date(&f.env), &ten(&f.env));
    assert_eq!(f.registry.get_appointment(&id).fee, 500);

    f.directory.update_fee(&f.doctor, &750);

    // The existing appointment keeps the fee it was booked at.
    assert_eq!(f.registry.get_appointment(&id).fee, 500);

    let second = f.registry.book_appointment(
        &f.patient_a,
        &f.doctor,
        &date(&f.env),
        &String::from_str(&f.env, "11:00"),
    );
    assert_eq!(f.registry.get_appointment(&second).fee, 750);
}

#[test]
fn test_booking_requires_patient_role() {
    let f = setup(3);
    let stranger = Address::generate(&f.env);

    let result = f
        .registry
        .try_book_appointment(&stranger, &f.doctor, &date(&f.env), &ten(&f.env));
    assert_eq!(result, Err(Ok(Error::NotAuthorized)));

    // Doctors are not patients either.
    f.gateway.register_doctor(&f.admin, &f.doctor);
    let result = f
        .registry
        .try_book_appointment(&f.doctor, &f.doctor, &date(&f.env), &ten(&f.env));
    assert_eq!(result, Err(Ok(Error::NotAuthorized)));
}

#[test]
fn test_booking_validates_slot_fields() {
    let f = setup(3);
    let empty = String::from_str(&f.env, "");

    let result = f
        .registry
        .try_book_appointment(&f.patient_a, &f.doctor, &empty, &ten(&f.env));
    assert_eq!(result, Err(Ok(Error::InvalidInput)));

    let result = f
        .registry
        .try_book_appointment(&f.patient_a, &f.doctor, &date(&f.env), &empty);
    assert_eq!(result, Err(Ok(Error::InvalidInput)));
}

#[test]
fn test_booking_surfaces_directory_errors() {
    let f = setup(3);
    let unknown = Address::generate(&f.env);

    let result = f
        .registry
        .try_book_appointment(&f.patient_a, &unknown, &date(&f.env), &ten(&f.env));
    assert_eq!(result, Err(Ok(Error::DoctorNotFound)));

    f.directory.set_availability(&f.doctor, &false);
    let result = f
        .registry
        .try_book_appointment(&f.patient_a, &f.doctor, &date(&f.env), &ten(&f.env));
    assert_eq!(result, Err(Ok(Error::DoctorUnavailable)));
}

#[test]
fn test_compensating_release_on_persist_failure() {
    let f = setup(1);
    let date = date(&f.env);
    let eleven = String::from_str(&f.env, "11:00");

    f.registry
        .book_appointment(&f.patient_a, &f.doctor, &date, &ten(&f.env));

    // The cap forces record persistence to fail after the slot was already
    // reserved; the booking must hand the slot back on its way out.
    let result = f
        .registry
        .try_book_appointment(&f.patient_a, &f.doctor, &date, &eleven);
    assert_eq!(result, Err(Ok(Error::PatientLimitReached)));
    assert_eq!(f.directory.booked_slots(&f.doctor, &date).len(), 1);

    // The slot that was briefly held is re-bookable by someone else.
    f.registry
        .book_appointment(&f.patient_b, &f.doctor, &date, &eleven);
    assert_eq!(f.directory.booked_slots(&f.doctor, &date).len(), 2);
}

#[test]
fn test_cancelled_appointments_do_not_count_toward_cap() {
    let f = setup(1);

    for label in ["10:00", "11:00", "12:00"] {
        let time = String::from_str(&f.env, label);
        let id = f
            .registry
            .book_appointment(&f.patient_a, &f.doctor, &date(&f.env), &time);
        f.registry.cancel_appointment(&f.patient_a, &id);
    }

    assert_eq!(f.registry.list_appointments(&f.patient_a).len(), 3);
}

#[test]
fn test_cancel_authorization() {
    let f = setup(3);

    let id = f
        .registry
        .book_appointment(&f.patient_a, &f.doctor, &date(&f.env), &ten(&f.env));

    // Only the booking patient may cancel.
    let result = f.registry.try_cancel_appointment(&f.patient_b, &id);
    assert_eq!(result, Err(Ok(Error::NotAuthorized)));
    assert!(!f.registry.get_appointment(&id).cancelled);

    let result = f.registry.try_cancel_appointment(&f.patient_a, &9999);
    assert_eq!(result, Err(Ok(Error::AppointmentNotFound)));

    f.registry.cancel_appointment(&f.patient_a, &id);
    let result = f.registry.try_cancel_appointment(&f.patient_a, &id);
    assert_eq!(result, Err(Ok(Error::AlreadyCancelled)));
}

#[test]
fn test_list_appointments() {
    let f = setup(3);

    let first = f
        .registry
        .book_appointment(&f.patient_a, &f.doctor, &date(&f.env), &ten(&f.env));
    let second = f.registry.book_appointment(
        &f.patient_a,
        &f.doctor,
        &date(&f.env),
        &String::from_str(&f.env, "11:00"),
    );
    f.registry
        .book_appointment(&f.patient_b, &f.doctor, &date(&f.env), &String::from_str(&f.env, "12:00"));

    let mine = f.registry.list_appointments(&f.patient_a);
    assert_eq!(mine.len(), 2);
    assert_eq!(mine.get(0).unwrap().id, first);
    assert_eq!(mine.get(1).unwrap().id, second);
    assert_eq!(f.registry.list_appointments(&f.patient_b).len(), 1);
}

#[test]
fn test_mark_paid_is_reconciler_gated_and_idempotent() {
    let f = setup(3);
    let reconciler = Address::generate(&f.env);

    let id = f
        .registry
        .book_appointment(&f.patient_a, &f.doctor, &date(&f.env), &ten(&f.env));

    // No reconciler wired yet: that is a configuration gap, not a caller
    // problem.
    let result = f.registry.try_mark_paid(&id);
    assert_eq!(result, Err(Ok(Error::NotInitialized)));

    f.registry.set_reconciler(&reconciler);

    f.registry.mark_paid(&id);
    assert!(f.registry.get_appointment(&id).paid);

    // Confirming again changes nothing and does not error.
    f.registry.mark_paid(&id);
    assert!(f.registry.get_appointment(&id).paid);

    let result = f.registry.try_mark_paid(&9999);
    assert_eq!(result, Err(Ok(Error::AppointmentNotFound)));
}

#[test]
fn test_mark_paid_rejects_unwired_callers() {
    let env = Env::default();

    let admin = Address::generate(&env);
    let reconciler = Address::generate(&env);

    let registry_id = env.register_contract(None, AppointmentRegistry);
    let registry = AppointmentRegistryClient::new(&env, &registry_id);
    registry.initialize(
        &admin,
        &Address::generate(&env),
        &Address::generate(&env),
        &3u32,
    );

    registry
        .mock_auths(&[MockAuth {
            address: &admin,
            invoke: &MockAuthInvoke {
                contract: &registry_id,
                fn_name: "set_reconciler",
                args: (reconciler.clone(),).into_val(&env),
                sub_invokes: &[],
            },
        }])
        .set_reconciler(&reconciler);

    // No caller here is authorized as the wired reconciler: the gate must
    // fire before the record lookup.
    let result = registry.try_mark_paid(&1);
    assert!(result.is_err());
    assert_ne!(result, Err(Ok(Error::AppointmentNotFound)));

    // With the reconciler's authorization the same call reaches the lookup.
    let result = registry
        .mock_auths(&[MockAuth {
            address: &reconciler,
            invoke: &MockAuthInvoke {
                contract: &registry_id,
                fn_name: "mark_paid",
                args: (1u64,).into_val(&env),
                sub_invokes: &[],
            },
        }])
        .try_mark_paid(&1);
    assert_eq!(result, Err(Ok(Error::AppointmentNotFound)));
}
