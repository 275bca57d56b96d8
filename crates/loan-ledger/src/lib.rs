//! Peer-to-peer loan ledger secured by non-fungible collateral.
//!
//! A borrower escrows an asset and proposes terms, a lender funds the offer,
//! and the ledger settles repayment or default through the
//! [`CollateralService`] and [`CurrencyService`] it is built with.

pub mod accrual;
pub mod admin;
pub mod clock;
pub mod config;
pub mod custody;
pub mod error;
pub mod events;
pub mod ledger;
pub mod memory;
pub mod offer;
pub mod records;
pub mod shared;
pub mod snapshot;
pub mod types;

// Re-export the main public API
pub use accrual::compute_yield;
pub use admin::AdminGate;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use custody::{CollateralService, CurrencyService};
pub use error::{
    AddressError, ConfigError, CustodyError, ErrorCategory, LoanError, SnapshotError,
};
pub use events::{EventRecord, LedgerEvent};
pub use ledger::LoanLedger;
pub use memory::{MemoryCollections, MemoryTokens};
pub use offer::{CollateralRelease, ControlFlags, Offer, OfferState};
pub use shared::SharedLedger;
pub use snapshot::{LedgerSnapshot, OfferEntry};
pub use types::{Address, Amount, AssetId, LoanTerms, OfferKey};
