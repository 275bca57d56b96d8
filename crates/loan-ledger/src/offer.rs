use serde::{Deserialize, Serialize};

use crate::accrual::{compute_yield, term_seconds};
use crate::error::LoanError;
use crate::types::{Address, Amount, LoanTerms};

/// ```text
/// Created --withdraw--> Withdrawn
/// Created --accept----> Accepted --borrow--> Borrowed --repay--> Repaid
/// Repaid  --collateral to borrower + deposit to lender--> SettledRepaid
/// Accepted | Borrowed --term over, collateral to lender--> Defaulted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OfferState {
    /// Collateral escrowed, waiting for a lender
    Created,
    /// Borrower took the collateral back before anyone lent
    Withdrawn,
    /// Lender's principal is escrowed, term is running
    Accepted,
    /// Principal paid out to the borrower
    Borrowed,
    /// Yield escrowed; the two claims are tracked separately
    Repaid {
        collateral_returned: bool,
        deposit_released: bool,
    },
    /// Both claims of a repaid loan have been made
    SettledRepaid,
    /// Term ended unpaid and the lender took the collateral. When the
    /// principal was never drawn it is owed back to the lender.
    Defaulted {
        principal_drawn: bool,
        principal_refund_pending: bool,
    },
}

impl OfferState {
    /// No further movement of value can happen from this state
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            OfferState::Withdrawn
                | OfferState::SettledRepaid
                | OfferState::Defaulted {
                    principal_refund_pending: false,
                    ..
                }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            OfferState::Created => "created",
            OfferState::Withdrawn => "withdrawn",
            OfferState::Accepted => "accepted",
            OfferState::Borrowed => "borrowed",
            OfferState::Repaid { .. } => "repaid",
            OfferState::SettledRepaid => "settled_repaid",
            OfferState::Defaulted { .. } => "defaulted",
        }
    }
}

/// Flag view of an offer's state. Each flag only ever goes from false to true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlags {
    pub withdrawn: bool,
    pub borrowed: bool,
    pub repaid: bool,
}

/// Where a collateral release sends the asset, and why
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollateralRelease {
    /// Loan repaid, back to the borrower
    Repaid,
    /// Term over without repayment, to the lender
    Default,
}

/// Transition methods only accept their valid source states and return the
/// successor record without touching `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub borrower: Address,
    pub lender: Option<Address>,
    pub loan_amount: Amount,
    pub loan_apr: u32,
    pub loan_duration_days: u32,
    pub loan_time_start: Option<u64>,
    pub currency: Address,
    pub state: OfferState,
}

impl Offer {
    pub fn new(borrower: Address, terms: LoanTerms) -> Self {
        Self {
            borrower,
            lender: None,
            loan_amount: terms.amount,
            loan_apr: terms.apr,
            loan_duration_days: terms.duration_days,
            loan_time_start: None,
            currency: terms.currency,
            state: OfferState::Created,
        }
    }

    pub fn flags(&self) -> ControlFlags {
        match self.state {
            OfferState::Created | OfferState::Accepted => ControlFlags::default(),
            OfferState::Withdrawn => ControlFlags {
                withdrawn: true,
                ..ControlFlags::default()
            },
            OfferState::Borrowed => ControlFlags {
                borrowed: true,
                ..ControlFlags::default()
            },
            OfferState::Repaid { .. } | OfferState::SettledRepaid => ControlFlags {
                borrowed: true,
                repaid: true,
                ..ControlFlags::default()
            },
            OfferState::Defaulted { principal_drawn, .. } => ControlFlags {
                borrowed: principal_drawn,
                ..ControlFlags::default()
            },
        }
    }

    pub fn is_borrower(&self, caller: &Address) -> bool {
        &self.borrower == caller
    }

    pub fn is_lender(&self, caller: &Address) -> bool {
        self.lender.as_ref() == Some(caller)
    }

    /// Principal plus accrued interest for the full term
    pub fn yield_amount(&self) -> Result<Amount, LoanError> {
        compute_yield(self.loan_amount, self.loan_apr, self.loan_duration_days)
            .ok_or(LoanError::ArithmeticOverflow)
    }

    /// First instant at which the loan counts as expired
    pub fn term_end(&self, seconds_per_day: u64) -> Option<u64> {
        self.loan_time_start
            .map(|start| {
                start.saturating_add(term_seconds(self.loan_duration_days, seconds_per_day))
            })
    }

    pub fn withdraw(&self) -> Result<Offer, LoanError> {
        match self.state {
            OfferState::Created => Ok(self.with_state(OfferState::Withdrawn)),
            OfferState::Withdrawn => Err(LoanError::OfferWithdrawn),
            _ => Err(LoanError::AlreadyStarted),
        }
    }

    pub fn accept(&self, lender: &Address, now: u64) -> Result<Offer, LoanError> {
        match self.state {
            OfferState::Created => {}
            OfferState::Withdrawn => return Err(LoanError::OfferWithdrawn),
            _ => return Err(LoanError::AlreadyStarted),
        }
        if self.is_borrower(lender) {
            return Err(LoanError::BorrowerCannotLend);
        }

        let mut next = self.with_state(OfferState::Accepted);
        next.lender = Some(lender.clone());
        next.loan_time_start = Some(now);
        Ok(next)
    }

    pub fn borrow(&self) -> Result<Offer, LoanError> {
        match self.state {
            OfferState::Accepted => Ok(self.with_state(OfferState::Borrowed)),
            OfferState::Created => Err(LoanError::NotStarted),
            OfferState::Withdrawn => Err(LoanError::OfferWithdrawn),
            _ => Err(LoanError::AlreadyBorrowed),
        }
    }

    pub fn repay(&self) -> Result<Offer, LoanError> {
        match self.state {
            OfferState::Borrowed => Ok(self.with_state(OfferState::Repaid {
                collateral_returned: false,
                deposit_released: false,
            })),
            OfferState::Repaid { .. } | OfferState::SettledRepaid => Err(LoanError::AlreadyRepaid),
            OfferState::Defaulted { .. } => Err(LoanError::AlreadyExpiredAndClaimed),
            OfferState::Withdrawn => Err(LoanError::OfferWithdrawn),
            OfferState::Created => Err(LoanError::NotStarted),
            OfferState::Accepted => Err(LoanError::NotBorrowed),
        }
    }

    /// Decide which collateral branch applies and check the caller's role.
    /// Returns the successor record and the release kind.
    pub fn release_collateral(
        &self,
        caller: &Address,
        now: u64,
        seconds_per_day: u64,
    ) -> Result<(Offer, CollateralRelease), LoanError> {
        match self.state {
            OfferState::Repaid {
                collateral_returned: false,
                deposit_released,
            } => {
                if !self.is_borrower(caller) {
                    return Err(LoanError::NotBorrower);
                }
                let next = if deposit_released {
                    OfferState::SettledRepaid
                } else {
                    OfferState::Repaid {
                        collateral_returned: true,
                        deposit_released,
                    }
                };
                Ok((self.with_state(next), CollateralRelease::Repaid))
            }
            OfferState::Accepted | OfferState::Borrowed => {
                let expired = self
                    .term_end(seconds_per_day)
                    .is_some_and(|end| now >= end);
                if !expired {
                    return Err(LoanError::TermNotEnded);
                }
                if !self.is_lender(caller) {
                    return Err(LoanError::NotLender);
                }
                let next = OfferState::Defaulted {
                    principal_drawn: self.state == OfferState::Borrowed,
                    principal_refund_pending: self.state == OfferState::Accepted,
                };
                Ok((self.with_state(next), CollateralRelease::Default))
            }
            OfferState::Created => Err(LoanError::NotStarted),
            OfferState::Withdrawn => Err(LoanError::OfferWithdrawn),
            OfferState::Repaid { .. }
            | OfferState::SettledRepaid
            | OfferState::Defaulted { .. } => {
                Err(LoanError::CollateralAlreadyReleased)
            }
        }
    }

    /// Lender's claim on escrowed currency. Returns the successor record and the
    /// amount owed: the yield after repayment, or the untouched principal after
    /// a default on a loan that was never drawn.
    pub fn release_deposit(&self, caller: &Address) -> Result<(Offer, Amount), LoanError> {
        if !self.is_lender(caller) {
            return Err(LoanError::NotLender);
        }

        match self.state {
            OfferState::Repaid {
                collateral_returned,
                deposit_released: false,
            } => {
                let next = if collateral_returned {
                    OfferState::SettledRepaid
                } else {
                    OfferState::Repaid {
                        collateral_returned,
                        deposit_released: true,
                    }
                };
                Ok((self.with_state(next), self.yield_amount()?))
            }
            OfferState::Defaulted {
                principal_refund_pending: true,
                ..
            } => {
                let next = OfferState::Defaulted {
                    principal_drawn: false,
                    principal_refund_pending: false,
                };
                Ok((self.with_state(next), self.loan_amount))
            }
            OfferState::Repaid { .. }
            | OfferState::SettledRepaid
            | OfferState::Defaulted {
                principal_drawn: false,
                ..
            } => Err(LoanError::DepositAlreadyWithdrawn),
            // a drawn loan that defaulted has nothing left in escrow
            _ => Err(LoanError::NotRepaidYet),
        }
    }

    /// Reason the record could not have been produced by the transitions
    /// above, if any
    pub fn inconsistency(&self) -> Option<&'static str> {
        let accepted = !matches!(self.state, OfferState::Created | OfferState::Withdrawn);
        if self.lender.is_some() != self.loan_time_start.is_some() {
            Some("lender and start time must be set together")
        } else if accepted && self.lender.is_none() {
            Some("started offer has no lender")
        } else if !accepted && self.lender.is_some() {
            Some("unaccepted offer has a lender")
        } else if self.loan_duration_days == 0 {
            Some("zero duration")
        } else {
            None
        }
    }

    fn with_state(&self, state: OfferState) -> Offer {
        Offer {
            state,
            ..self.clone()
        }
    }
}
