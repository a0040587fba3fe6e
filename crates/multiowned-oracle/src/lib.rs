//! # Multiowned Oracle
//!
//! A paid data feed built on the quorum engine. Readers pay the current
//! price for each read; the collected fees accrue to the oracle's balance.
//! Changing the value, the price, or paying out fees requires the same call
//! from `required` distinct owners.
//!
//! ```
//! use multiowned_common::Address;
//! use multiowned_oracle::{Oracle, OracleConfig};
//! use rust_decimal::Decimal;
//!
//! let owners: Vec<_> = (1..=3).map(Address::from_low_u64).collect();
//! let config = OracleConfig { owners: owners.clone(), ..OracleConfig::default() };
//! let mut oracle: Oracle<String> = Oracle::new(&config).unwrap();
//!
//! assert!(!oracle.update_data(owners[0], "42".into(), 0).unwrap());
//! assert!(oracle.update_data(owners[1], "42".into(), 0).unwrap());
//! assert_eq!(oracle.get_data(Decimal::ONE).unwrap(), "42");
//! ```

pub mod config;
pub mod oracle;

pub use config::OracleConfig;
pub use oracle::{Oracle, OracleEvent};
