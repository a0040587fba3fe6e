//! Quorum-gated data oracle
//!
//! Anyone may read the current value by paying exactly the configured price.
//! Owners update the value, change the price, and withdraw collected fees,
//! each only after a quorum of owners has issued the same call.
//!
//! Updates carry the current nonce so that a stale confirmation for an old
//! value can never combine with fresh ones; the nonce advances on every
//! applied update.

use crate::config::OracleConfig;
use multiowned_common::{
    Address, EventJournal, OperationId, OracleError, RecordedEvent, Result,
};
use multiowned_quorum::QuorumEngine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Oracle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OracleEvent {
    /// Value replaced at `timestamp` (Unix millis)
    DataUpdate { timestamp: i64 },
    Withdraw { receiver: Address, amount: Decimal },
    ChangePrice { price: Decimal },
}

/// Paid data feed owned by a quorum
#[derive(Debug, Clone)]
pub struct Oracle<D> {
    engine: QuorumEngine,
    data: D,
    price: Decimal,
    nonce: u64,
    last_data_update: Option<i64>,
    balance: Decimal,
    journal: EventJournal<OracleEvent>,
}

impl<D> Oracle<D>
where
    D: Clone + Serialize + std::fmt::Debug,
{
    /// Create an oracle holding `initial` until the first update
    pub fn with_data(config: &OracleConfig, initial: D) -> Result<Self> {
        check_amount(config.price)?;
        let engine = QuorumEngine::new(&config.quorum())?;

        info!(price = %config.price, owners = engine.num_owners(), "Oracle created");

        Ok(Self {
            engine,
            data: initial,
            price: config.price,
            nonce: 0,
            last_data_update: None,
            balance: Decimal::ZERO,
            journal: EventJournal::with_max_events(config.max_events),
        })
    }

    /// Confirm a new price; applies once a quorum agrees.
    ///
    /// Returns true when this call applied the change.
    #[instrument(skip(self))]
    pub fn set_price(&mut self, caller: Address, price: Decimal, nonce: u64) -> Result<bool> {
        self.check_nonce(nonce)?;
        check_amount(price)?;
        let price = price.normalize();
        let operation = OperationId::for_call("setPrice(uint256,uint256)", &(price, nonce))?;

        let applied = self.engine.execute_if_confirmed(operation, caller, || {
            self.price = price;
            self.nonce += 1;
            self.journal.record(OracleEvent::ChangePrice { price });
            Ok(())
        })?;

        if applied.is_some() {
            info!(price = %price, nonce = self.nonce, "Price changed");
        }
        Ok(applied.is_some())
    }

    /// Confirm a new value; applies once a quorum agrees.
    ///
    /// Returns true when this call applied the change.
    #[instrument(skip(self, data))]
    pub fn update_data(&mut self, caller: Address, data: D, nonce: u64) -> Result<bool> {
        self.check_nonce(nonce)?;
        let operation = OperationId::for_call("updateData(bytes,uint256)", &(&data, nonce))?;

        let applied = self.engine.execute_if_confirmed(operation, caller, || {
            let timestamp = chrono::Utc::now().timestamp_millis();
            self.data = data;
            self.last_data_update = Some(timestamp);
            self.nonce += 1;
            self.journal.record(OracleEvent::DataUpdate { timestamp });
            Ok(())
        })?;

        if applied.is_some() {
            info!(nonce = self.nonce, "Data updated");
        }
        Ok(applied.is_some())
    }

    /// Confirm paying `amount` of collected fees to `receiver`.
    ///
    /// The balance is checked on the decisive confirmation; if it falls
    /// short the call fails and that confirmation is not recorded.
    #[instrument(skip(self))]
    pub fn withdraw(&mut self, caller: Address, receiver: Address, amount: Decimal) -> Result<bool> {
        check_amount(amount)?;
        let amount = amount.normalize();
        let operation = OperationId::for_call("withdraw(address,uint256)", &(receiver, amount))?;

        let applied = self.engine.execute_if_confirmed(operation, caller, || {
            if amount > self.balance {
                return Err(OracleError::InsufficientBalance {
                    requested: amount,
                    available: self.balance,
                }
                .into());
            }
            self.balance -= amount;
            self.journal.record(OracleEvent::Withdraw { receiver, amount });
            Ok(())
        })?;

        if applied.is_some() {
            info!(receiver = %receiver, amount = %amount, balance = %self.balance, "Withdrawal paid");
        }
        Ok(applied.is_some())
    }

    /// Read the current value, paying exactly the price
    pub fn get_data(&mut self, payment: Decimal) -> Result<D> {
        if payment != self.price {
            return Err(OracleError::IncorrectPayment {
                expected: self.price,
                got: payment,
            }
            .into());
        }
        self.balance += payment;
        debug!(payment = %payment, balance = %self.balance, "Data purchased");
        Ok(self.data.clone())
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Nonce the next update must carry
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Time of the last applied update (Unix millis)
    pub fn last_data_update(&self) -> Option<i64> {
        self.last_data_update
    }

    /// Collected fees not yet withdrawn
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Owner queries and confirmation state
    pub fn engine(&self) -> &QuorumEngine {
        &self.engine
    }

    /// Owner administration and revocation
    pub fn engine_mut(&mut self) -> &mut QuorumEngine {
        &mut self.engine
    }

    pub fn events(&self) -> impl Iterator<Item = &OracleEvent> {
        self.journal.events()
    }

    pub fn drain_events(&mut self) -> Vec<RecordedEvent<OracleEvent>> {
        self.journal.drain()
    }

    fn check_nonce(&self, nonce: u64) -> std::result::Result<(), OracleError> {
        if nonce != self.nonce {
            return Err(OracleError::InvalidNonce {
                expected: self.nonce,
                got: nonce,
            });
        }
        Ok(())
    }
}

impl<D> Oracle<D>
where
    D: Clone + Default + Serialize + std::fmt::Debug,
{
    /// Create an oracle holding `D::default()` until the first update
    pub fn new(config: &OracleConfig) -> Result<Self> {
        Self::with_data(config, D::default())
    }
}

fn check_amount(amount: Decimal) -> std::result::Result<(), OracleError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(OracleError::InvalidAmount);
    }
    Ok(())
}
