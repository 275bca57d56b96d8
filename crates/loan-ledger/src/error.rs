use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Address, Amount, AssetId};

/// Coarse class of a ledger error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authorization,
    StatePrecondition,
    InputValidation,
    Existence,
    Administrative,
    Custody,
    Arithmetic,
}

/// Every way a ledger call can be rejected. A rejected call never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    #[error("caller is not the borrower")]
    NotBorrower,

    #[error("caller is not the lender")]
    NotLender,

    #[error("caller is not the owner")]
    NotOwner,

    #[error("the borrower cannot fund their own offer")]
    BorrowerCannotLend,

    #[error("the offer already started")]
    AlreadyStarted,

    #[error("the offer has not started")]
    NotStarted,

    #[error("the amount has already been borrowed")]
    AlreadyBorrowed,

    #[error("the principal has not been borrowed")]
    NotBorrowed,

    #[error("the offer has already been repaid")]
    AlreadyRepaid,

    #[error("the offer has already expired and the collateral has been transferred to the lender")]
    AlreadyExpiredAndClaimed,

    #[error("the offer has been withdrawn")]
    OfferWithdrawn,

    #[error("the loan term has not ended")]
    TermNotEnded,

    #[error("the offer has not been repaid yet by the borrower")]
    NotRepaidYet,

    #[error("the collateral has already been released")]
    CollateralAlreadyReleased,

    #[error("the deposit has already been withdrawn")]
    DepositAlreadyWithdrawn,

    #[error("an open offer already exists for {collection}#{asset_id}")]
    OfferAlreadyExists { collection: Address, asset_id: AssetId },

    #[error("the collection {0} is not whitelisted")]
    InvalidCollateral(Address),

    #[error("the currency {0} is not whitelisted")]
    InvalidCurrency(Address),

    #[error("the loan is too small: {amount} < {minimum}")]
    AmountTooSmall { amount: Amount, minimum: Amount },

    #[error("the loan duration can't be 0")]
    ZeroDuration,

    #[error("no offer exists for {collection}#{asset_id}")]
    OfferNotFound { collection: Address, asset_id: AssetId },

    #[error("the ledger is paused")]
    Paused,

    #[error("the ledger is not paused")]
    NotPaused,

    #[error("transfer refused: {0}")]
    Transfer(#[from] CustodyError),

    #[error("arithmetic overflow computing the yield")]
    ArithmeticOverflow,
}

impl LoanError {
    pub fn category(&self) -> ErrorCategory {
        use LoanError::*;

        match self {
            NotBorrower | NotLender | NotOwner | BorrowerCannotLend => ErrorCategory::Authorization,
            AlreadyStarted
            | NotStarted
            | AlreadyBorrowed
            | NotBorrowed
            | AlreadyRepaid
            | AlreadyExpiredAndClaimed
            | OfferWithdrawn
            | TermNotEnded
            | NotRepaidYet
            | CollateralAlreadyReleased
            | DepositAlreadyWithdrawn
            | OfferAlreadyExists { .. } => ErrorCategory::StatePrecondition,
            InvalidCollateral(_) | InvalidCurrency(_) | AmountTooSmall { .. } | ZeroDuration => {
                ErrorCategory::InputValidation
            }
            OfferNotFound { .. } => ErrorCategory::Existence,
            Paused | NotPaused => ErrorCategory::Administrative,
            Transfer(_) => ErrorCategory::Custody,
            ArithmeticOverflow => ErrorCategory::Arithmetic,
        }
    }
}

/// Failure reported by a collateral or currency collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("asset {collection}#{asset_id} does not exist")]
    UnknownAsset { collection: Address, asset_id: AssetId },

    #[error("asset {collection}#{asset_id} has already been minted")]
    AssetAlreadyMinted { collection: Address, asset_id: AssetId },

    #[error("{from} does not own {collection}#{asset_id}")]
    NotAssetOwner {
        collection: Address,
        asset_id: AssetId,
        from: Address,
    },

    #[error("{operator} is not approved for {collection}#{asset_id}")]
    NotApproved {
        collection: Address,
        asset_id: AssetId,
        operator: Address,
    },

    #[error("insufficient balance of {currency} for {owner}: {available} < {required}")]
    InsufficientBalance {
        currency: Address,
        owner: Address,
        available: Amount,
        required: Amount,
    },

    #[error(
        "insufficient allowance of {currency} from {owner} to {spender}: {available} < {required}"
    )]
    InsufficientAllowance {
        currency: Address,
        owner: Address,
        spender: Address,
        available: Amount,
        required: Amount,
    },

    #[error("balance overflow crediting {currency} to {owner}")]
    BalanceOverflow { currency: Address, owner: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address '{0}' must start with 0x")]
    MissingPrefix(String),

    #[error("address '{0}' is not valid hex: {1}")]
    InvalidHex(String, String),

    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
}

/// Snapshot content a ledger cannot be rebuilt from
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("offer {collection}#{asset_id} is inconsistent: {reason}")]
    InconsistentOffer {
        collection: Address,
        asset_id: AssetId,
        reason: String,
    },
}
