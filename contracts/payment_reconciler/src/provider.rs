//! Boundary to the external payment provider. The reconciler only ever
//! talks to it through this client; the provider's answer to `fetch_order`
//! is the sole authority on whether anything was paid.

use soroban_sdk::{contractclient, contracttype, Env, Symbol};

/// Lifecycle of a provider order.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OrderStatus {
    Created = 0,
    Attempted = 1,
    Paid = 2,
}

/// Order descriptor as the provider reports it. `receipt` carries the
/// appointment id the order was opened for and is the only link back from
/// provider state to a local record.
#[contracttype]
#[derive(Clone)]
pub struct ProviderOrder {
    pub id: u64,
    pub amount: i128,
    pub currency: Symbol,
    pub receipt: u64,
    pub status: OrderStatus,
}

#[contractclient(name = "ProviderClient")]
pub trait PaymentProvider {
    /// Open an order for `amount` minor units; returns the order id.
    fn create_order(env: Env, amount: i128, currency: Symbol, receipt: u64) -> u64;

    /// Current state of an order. Traps if the order is unknown.
    fn fetch_order(env: Env, order_id: u64) -> ProviderOrder;
}
