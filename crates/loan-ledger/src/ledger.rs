use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::admin::AdminGate;
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::custody::{CollateralService, CurrencyService};
use crate::error::LoanError;
use crate::events::{EventRecord, LedgerEvent};
use crate::offer::{CollateralRelease, Offer};
use crate::records::OfferRecords;
use crate::types::{Address, Amount, AssetId, LoanTerms, OfferKey};

/// Offer book plus the custody calls that back it.
///
/// Every mutating call validates, stages the successor record, performs its
/// single transfer and only then commits, so a rejected call (including one
/// refused by a collaborator) leaves offers, counters and events untouched.
pub struct LoanLedger<C, T, K = SystemClock> {
    config: LedgerConfig,
    admin: AdminGate,
    offers: BTreeMap<OfferKey, Offer>,
    records: OfferRecords,
    events: Vec<EventRecord>,
    next_sequence: u64,
    collateral: C,
    currency: T,
    clock: K,
}

impl<C, T, K> LoanLedger<C, T, K>
where
    C: CollateralService,
    T: CurrencyService,
    K: Clock,
{
    /// Create an empty, unpaused ledger administered by `owner`
    pub fn new(config: LedgerConfig, owner: Address, collateral: C, currency: T, clock: K) -> Self {
        info!(
            owner = %owner,
            escrow = %config.escrow,
            min_loan_amount = config.min_loan_amount,
            "Loan ledger created"
        );
        Self::from_parts(
            config,
            AdminGate::new(owner),
            BTreeMap::new(),
            OfferRecords::default(),
            collateral,
            currency,
            clock,
        )
    }

    pub(crate) fn from_parts(
        config: LedgerConfig,
        admin: AdminGate,
        offers: BTreeMap<OfferKey, Offer>,
        records: OfferRecords,
        collateral: C,
        currency: T,
        clock: K,
    ) -> Self {
        Self {
            config,
            admin,
            offers,
            records,
            events: Vec::new(),
            next_sequence: 0,
            collateral,
            currency,
            clock,
        }
    }

    /// Continue event numbering after `next_sequence`
    pub(crate) fn resume_sequence(mut self, next_sequence: u64) -> Self {
        self.next_sequence = next_sequence;
        self
    }

    pub(crate) fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    // ───────────────────────── lifecycle ─────────────────────────

    /// List `asset_id` of `collection` as collateral for a loan on `terms`.
    /// The asset moves into escrow; the caller becomes the borrower.
    pub fn create_offer(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_id: AssetId,
        terms: LoanTerms,
    ) -> Result<(), LoanError> {
        let key = OfferKey::new(collection.clone(), asset_id);
        let result = self.try_create_offer(caller, &key, terms);
        log_outcome("create_offer", caller, &key, result)
    }

    fn try_create_offer(
        &mut self,
        caller: &Address,
        key: &OfferKey,
        terms: LoanTerms,
    ) -> Result<(), LoanError> {
        self.admin.ensure_running()?;
        if !self.admin.is_collection_allowed(&key.collection) {
            return Err(LoanError::InvalidCollateral(key.collection.clone()));
        }
        if !self.admin.is_currency_allowed(&terms.currency) {
            return Err(LoanError::InvalidCurrency(terms.currency.clone()));
        }
        let minimum = self.config.min_loan_amount();
        if terms.amount < minimum {
            return Err(LoanError::AmountTooSmall {
                amount: terms.amount,
                minimum,
            });
        }
        if terms.duration_days == 0 {
            return Err(LoanError::ZeroDuration);
        }
        if self.offers.get(key).is_some_and(|existing| !existing.state.is_closed()) {
            return Err(LoanError::OfferAlreadyExists {
                collection: key.collection.clone(),
                asset_id: key.asset_id,
            });
        }

        let offer = Offer::new(caller.clone(), terms);
        // Terms whose repayment cannot be represented are refused up front
        offer.yield_amount()?;

        let escrow = self.config.escrow.clone();
        self.collateral
            .transfer_from(&key.collection, &escrow, caller, &escrow, key.asset_id)?;

        self.offers.insert(key.clone(), offer);
        self.records.record(caller, &key.collection, key.asset_id);
        self.emit(LedgerEvent::OfferCreated {
            collection: key.collection.clone(),
            asset_id: key.asset_id,
            borrower: caller.clone(),
        });
        Ok(())
    }

    /// Borrower takes the collateral back before any lender accepted
    pub fn withdraw_offer(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_id: AssetId,
    ) -> Result<(), LoanError> {
        let key = OfferKey::new(collection.clone(), asset_id);
        let result = self.try_withdraw_offer(caller, &key);
        log_outcome("withdraw_offer", caller, &key, result)
    }

    fn try_withdraw_offer(&mut self, caller: &Address, key: &OfferKey) -> Result<(), LoanError> {
        self.admin.ensure_running()?;
        let offer = self.find(key)?;
        if !offer.is_borrower(caller) {
            return Err(LoanError::NotBorrower);
        }
        let next = offer.withdraw()?;

        let escrow = self.config.escrow.clone();
        self.collateral
            .transfer_from(&key.collection, &escrow, &escrow, &next.borrower, key.asset_id)?;

        let borrower = next.borrower.clone();
        self.commit(key, next);
        self.emit(LedgerEvent::OfferWithdrawn {
            collection: key.collection.clone(),
            asset_id: key.asset_id,
            borrower,
        });
        Ok(())
    }

    /// Caller becomes the lender: the principal moves into escrow and the
    /// term starts now
    pub fn accept_offer(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_id: AssetId,
    ) -> Result<(), LoanError> {
        let key = OfferKey::new(collection.clone(), asset_id);
        let result = self.try_accept_offer(caller, &key);
        log_outcome("accept_offer", caller, &key, result)
    }

    fn try_accept_offer(&mut self, caller: &Address, key: &OfferKey) -> Result<(), LoanError> {
        self.admin.ensure_running()?;
        let now = self.clock.now();
        let next = self.find(key)?.accept(caller, now)?;

        let escrow = self.config.escrow.clone();
        self.currency
            .transfer_from(&next.currency, &escrow, caller, &escrow, next.loan_amount)?;

        self.commit(key, next);
        self.emit(LedgerEvent::OfferAccepted {
            collection: key.collection.clone(),
            asset_id: key.asset_id,
            lender: caller.clone(),
        });
        Ok(())
    }

    /// Borrower draws the escrowed principal
    pub fn borrow(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_id: AssetId,
    ) -> Result<(), LoanError> {
        let key = OfferKey::new(collection.clone(), asset_id);
        let result = self.try_borrow(caller, &key);
        log_outcome("borrow", caller, &key, result)
    }

    fn try_borrow(&mut self, caller: &Address, key: &OfferKey) -> Result<(), LoanError> {
        self.admin.ensure_running()?;
        let offer = self.find(key)?;
        if !offer.is_borrower(caller) {
            return Err(LoanError::NotBorrower);
        }
        let next = offer.borrow()?;
        let amount = next.loan_amount;

        let escrow = self.config.escrow.clone();
        self.currency
            .transfer(&next.currency, &escrow, &next.borrower, amount)?;

        self.commit(key, next);
        self.emit(LedgerEvent::PrincipalBorrowed {
            collection: key.collection.clone(),
            asset_id: key.asset_id,
            borrower: caller.clone(),
            amount,
        });
        Ok(())
    }

    /// Borrower pays principal plus interest into escrow. Accepted after the
    /// term as long as the lender has not claimed the collateral.
    pub fn repay_offer(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_id: AssetId,
    ) -> Result<(), LoanError> {
        let key = OfferKey::new(collection.clone(), asset_id);
        let result = self.try_repay_offer(caller, &key);
        log_outcome("repay_offer", caller, &key, result)
    }

    fn try_repay_offer(&mut self, caller: &Address, key: &OfferKey) -> Result<(), LoanError> {
        self.admin.ensure_running()?;
        let offer = self.find(key)?;
        if !offer.is_borrower(caller) {
            return Err(LoanError::NotBorrower);
        }
        let next = offer.repay()?;
        let amount = next.yield_amount()?;

        let escrow = self.config.escrow.clone();
        self.currency
            .transfer_from(&next.currency, &escrow, caller, &escrow, amount)?;

        self.commit(key, next);
        self.emit(LedgerEvent::LoanRepaid {
            collection: key.collection.clone(),
            asset_id: key.asset_id,
            borrower: caller.clone(),
            amount,
        });
        Ok(())
    }

    /// Release the collateral: to the borrower after repayment, or to the
    /// lender once the term has ended unpaid
    pub fn withdraw_nft(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_id: AssetId,
    ) -> Result<(), LoanError> {
        let key = OfferKey::new(collection.clone(), asset_id);
        let result = self.try_withdraw_nft(caller, &key);
        log_outcome("withdraw_nft", caller, &key, result)
    }

    fn try_withdraw_nft(&mut self, caller: &Address, key: &OfferKey) -> Result<(), LoanError> {
        self.admin.ensure_running()?;
        let now = self.clock.now();
        let (next, reason) = self
            .find(key)?
            .release_collateral(caller, now, self.config.seconds_per_day)?;

        let to = match reason {
            CollateralRelease::Repaid => next.borrower.clone(),
            CollateralRelease::Default => next.lender.clone().ok_or(LoanError::NotStarted)?,
        };

        let escrow = self.config.escrow.clone();
        self.collateral
            .transfer_from(&key.collection, &escrow, &escrow, &to, key.asset_id)?;

        self.commit(key, next);
        self.emit(LedgerEvent::CollateralReleased {
            collection: key.collection.clone(),
            asset_id: key.asset_id,
            to,
            reason,
        });
        Ok(())
    }

    /// Lender collects the escrowed repayment, or the undrawn principal
    /// after a default
    pub fn withdraw_deposit(
        &mut self,
        caller: &Address,
        collection: &Address,
        asset_id: AssetId,
    ) -> Result<(), LoanError> {
        let key = OfferKey::new(collection.clone(), asset_id);
        let result = self.try_withdraw_deposit(caller, &key);
        log_outcome("withdraw_deposit", caller, &key, result)
    }

    fn try_withdraw_deposit(&mut self, caller: &Address, key: &OfferKey) -> Result<(), LoanError> {
        self.admin.ensure_running()?;
        let (next, amount) = self.find(key)?.release_deposit(caller)?;

        let escrow = self.config.escrow.clone();
        self.currency.transfer(&next.currency, &escrow, caller, amount)?;

        self.commit(key, next);
        self.emit(LedgerEvent::DepositReleased {
            collection: key.collection.clone(),
            asset_id: key.asset_id,
            lender: caller.clone(),
            amount,
        });
        Ok(())
    }

    // ───────────────────────── queries ─────────────────────────

    /// Amount due at repayment, in any state
    pub fn yield_of(&self, collection: &Address, asset_id: AssetId) -> Result<Amount, LoanError> {
        self.offer_info(collection, asset_id)?.yield_amount()
    }

    pub fn offer_info(&self, collection: &Address, asset_id: AssetId) -> Result<&Offer, LoanError> {
        self.find(&OfferKey::new(collection.clone(), asset_id))
    }

    /// Offers ever created by `address`
    pub fn offer_count(&self, address: &Address) -> u64 {
        self.records.offer_count(address)
    }

    pub fn collection_record(
        &self,
        address: &Address,
        collection: &Address,
        index: usize,
    ) -> Option<AssetId> {
        self.records.asset_at(address, collection, index)
    }

    pub fn total_offers(&self) -> u64 {
        self.records.total_offers()
    }

    pub fn offers_by(&self, address: &Address) -> Vec<OfferKey> {
        self.records.offered_by(address)
    }

    /// Every stored offer, in key order
    pub fn offers(&self) -> impl Iterator<Item = (&OfferKey, &Offer)> {
        self.offers.iter()
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Hand the buffered events to the caller and clear the log
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── administration ─────────────────────────

    pub fn admin(&self) -> &AdminGate {
        &self.admin
    }

    pub fn owner(&self) -> &Address {
        self.admin.owner()
    }

    pub fn is_paused(&self) -> bool {
        self.admin.is_paused()
    }

    pub fn whitelist_collection(
        &mut self,
        caller: &Address,
        collection: Address,
    ) -> Result<(), LoanError> {
        self.admin.whitelist_collection(caller, collection)
    }

    pub fn whitelist_currency(
        &mut self,
        caller: &Address,
        currency: Address,
    ) -> Result<(), LoanError> {
        self.admin.whitelist_currency(caller, currency)
    }

    pub fn delist_collection(
        &mut self,
        caller: &Address,
        collection: &Address,
    ) -> Result<(), LoanError> {
        self.admin.delist_collection(caller, collection)
    }

    pub fn delist_currency(
        &mut self,
        caller: &Address,
        currency: &Address,
    ) -> Result<(), LoanError> {
        self.admin.delist_currency(caller, currency)
    }

    pub fn pause(&mut self, caller: &Address) -> Result<(), LoanError> {
        self.admin.pause(caller)
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<(), LoanError> {
        self.admin.unpause(caller)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), LoanError> {
        self.admin.transfer_ownership(caller, new_owner)
    }

    // ───────────────────────── collaborators ─────────────────────────

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn escrow(&self) -> &Address {
        &self.config.escrow
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn collateral(&self) -> &C {
        &self.collateral
    }

    /// Direct access for hosts that mint or approve through the same service
    pub fn collateral_mut(&mut self) -> &mut C {
        &mut self.collateral
    }

    pub fn currency(&self) -> &T {
        &self.currency
    }

    pub fn currency_mut(&mut self) -> &mut T {
        &mut self.currency
    }

    pub(crate) fn records(&self) -> &OfferRecords {
        &self.records
    }

    fn find(&self, key: &OfferKey) -> Result<&Offer, LoanError> {
        self.offers.get(key).ok_or_else(|| LoanError::OfferNotFound {
            collection: key.collection.clone(),
            asset_id: key.asset_id,
        })
    }

    fn commit(&mut self, key: &OfferKey, next: Offer) {
        self.offers.insert(key.clone(), next);
    }

    fn emit(&mut self, event: LedgerEvent) {
        let record = EventRecord {
            sequence: self.next_sequence,
            timestamp: self.clock.now(),
            event,
        };
        self.next_sequence += 1;
        self.events.push(record);
    }
}

fn log_outcome<R>(
    operation: &'static str,
    caller: &Address,
    key: &OfferKey,
    result: Result<R, LoanError>,
) -> Result<R, LoanError> {
    match &result {
        Ok(_) => info!(operation, caller = %caller, offer = %key, "Ledger call applied"),
        Err(e) => warn!(
            operation,
            caller = %caller,
            offer = %key,
            category = ?e.category(),
            error = %e,
            "Ledger call rejected"
        ),
    }
    result
}
