use serde::Serialize;

use crate::offer::CollateralRelease;
use crate::types::{Address, Amount, AssetId};

/// Domain event emitted after a successful ledger call, for observers and indexers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    OfferCreated {
        collection: Address,
        asset_id: AssetId,
        borrower: Address,
    },
    OfferWithdrawn {
        collection: Address,
        asset_id: AssetId,
        borrower: Address,
    },
    OfferAccepted {
        collection: Address,
        asset_id: AssetId,
        lender: Address,
    },
    PrincipalBorrowed {
        collection: Address,
        asset_id: AssetId,
        borrower: Address,
        amount: Amount,
    },
    LoanRepaid {
        collection: Address,
        asset_id: AssetId,
        borrower: Address,
        amount: Amount,
    },
    CollateralReleased {
        collection: Address,
        asset_id: AssetId,
        to: Address,
        reason: CollateralRelease,
    },
    DepositReleased {
        collection: Address,
        asset_id: AssetId,
        lender: Address,
        amount: Amount,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::OfferCreated { .. } => "offer_created",
            LedgerEvent::OfferWithdrawn { .. } => "offer_withdrawn",
            LedgerEvent::OfferAccepted { .. } => "offer_accepted",
            LedgerEvent::PrincipalBorrowed { .. } => "principal_borrowed",
            LedgerEvent::LoanRepaid { .. } => "loan_repaid",
            LedgerEvent::CollateralReleased { .. } => "collateral_released",
            LedgerEvent::DepositReleased { .. } => "deposit_released",
        }
    }

    /// The party other than the ledger the event concerns
    pub fn counterparty(&self) -> &Address {
        match self {
            LedgerEvent::OfferCreated { borrower, .. }
            | LedgerEvent::OfferWithdrawn { borrower, .. }
            | LedgerEvent::PrincipalBorrowed { borrower, .. }
            | LedgerEvent::LoanRepaid { borrower, .. } => borrower,
            LedgerEvent::OfferAccepted { lender, .. }
            | LedgerEvent::DepositReleased { lender, .. } => lender,
            LedgerEvent::CollateralReleased { to, .. } => to,
        }
    }
}

/// Event stamped with the ledger time and a sequence number
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: LedgerEvent,
}
