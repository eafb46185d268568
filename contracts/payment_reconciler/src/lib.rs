#![no_std]

mod provider;

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Env, Symbol,
};

use appointment_registry::{AppointmentRegistryClient, Error as RegistryError};

pub use provider::{OrderStatus, PaymentProvider, ProviderClient, ProviderOrder};

/// Fees are quoted in whole currency units; provider orders are opened in
/// minor units (cents).
const MINOR_UNITS_PER_FEE_UNIT: i128 = 100;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    NotAuthorized = 3,
    AppointmentNotFound = 4,
    InvalidState = 5,
    OrderNotFound = 6,
    PaymentPending = 7,
    UpstreamFailure = 8,
    InvalidAmount = 9,
}

/// What the caller gets back from `create_order`: enough to hand to the
/// provider's checkout. Nothing here is kept locally; the provider-side
/// receipt field ties the order back to the appointment.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaymentOrder {
    pub provider_order_id: u64,
    pub appointment_id: u64,
    pub amount: i128,
    pub currency: Symbol,
}

#[contracttype]
#[derive(Clone)]
pub struct Config {
    pub admin: Address,
    pub registry: Address,
    pub provider: Address,
    pub currency: Symbol,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
}

#[contract]
pub struct PaymentReconciler;

#[contractimpl]
impl PaymentReconciler {
    pub fn initialize(
        env: Env,
        admin: Address,
        registry: Address,
        provider: Address,
        currency: Symbol,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Config) {
            return Err(Error::AlreadyInitialized);
        }

        let config = Config {
            admin,
            registry,
            provider,
            currency,
        };
        env.storage().instance().set(&DataKey::Config, &config);

        Ok(())
    }

    /// Open a provider order for an appointment's fee. Marks nothing paid;
    /// settlement only ever lands through `verify_order`.
    pub fn create_order(
        env: Env,
        patient: Address,
        appointment_id: u64,
    ) -> Result<PaymentOrder, Error> {
        patient.require_auth();

        let config = Self::config(&env)?;

        let registry = AppointmentRegistryClient::new(&env, &config.registry);
        let appointment = match registry.try_get_appointment(&appointment_id) {
            Ok(Ok(appointment)) => appointment,
            Err(Ok(RegistryError::AppointmentNotFound)) => {
                return Err(Error::AppointmentNotFound)
            }
            _ => return Err(Error::UpstreamFailure),
        };

        if appointment.patient != patient {
            return Err(Error::NotAuthorized);
        }
        if appointment.cancelled || appointment.paid {
            return Err(Error::InvalidState);
        }

        let amount = appointment
            .fee
            .checked_mul(MINOR_UNITS_PER_FEE_UNIT)
            .ok_or(Error::InvalidAmount)?;

        let provider = ProviderClient::new(&env, &config.provider);
        let provider_order_id =
            match provider.try_create_order(&amount, &config.currency, &appointment_id) {
                Ok(Ok(id)) => id,
                _ => return Err(Error::UpstreamFailure),
            };

        env.events().publish(
            (symbol_short!("ORD_NEW"),),
            (provider_order_id, appointment_id, amount),
        );

        Ok(PaymentOrder {
            provider_order_id,
            appointment_id,
            amount,
            currency: config.currency,
        })
    }

    /// Settle an order. The order's status is re-fetched from the provider;
    /// a caller's claim of having paid is never taken at face value. Safe to
    /// call repeatedly: re-verifying a paid order is a no-op success.
    pub fn verify_order(env: Env, provider_order_id: u64) -> Result<(), Error> {
        let config = Self::config(&env)?;

        let provider = ProviderClient::new(&env, &config.provider);
        let order = match provider.try_fetch_order(&provider_order_id) {
            Ok(Ok(order)) => order,
            _ => return Err(Error::OrderNotFound),
        };

        if order.status != OrderStatus::Paid {
            return Err(Error::PaymentPending);
        }

        let registry = AppointmentRegistryClient::new(&env, &config.registry);
        match registry.try_mark_paid(&order.receipt) {
            Ok(_) => {}
            Err(Ok(RegistryError::AppointmentNotFound)) => return Err(Error::AppointmentNotFound),
            Err(_) => return Err(Error::UpstreamFailure),
        }

        env.events().publish(
            (symbol_short!("ORD_PAID"),),
            (provider_order_id, order.receipt),
        );

        Ok(())
    }

    fn config(env: &Env) -> Result<Config, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(Error::NotInitialized)
    }
}
