use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::error::LoanError;
use crate::types::Address;

/// Ownership, pause switch and the collection/currency allow-lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminGate {
    owner: Address,
    paused: bool,
    allowed_collections: BTreeSet<Address>,
    allowed_currencies: BTreeSet<Address>,
}

impl AdminGate {
    /// Unpaused gate with empty allow-lists
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            paused: false,
            allowed_collections: BTreeSet::new(),
            allowed_currencies: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_collection_allowed(&self, collection: &Address) -> bool {
        self.allowed_collections.contains(collection)
    }

    pub fn is_currency_allowed(&self, currency: &Address) -> bool {
        self.allowed_currencies.contains(currency)
    }

    pub fn allowed_collections(&self) -> impl Iterator<Item = &Address> {
        self.allowed_collections.iter()
    }

    pub fn allowed_currencies(&self) -> impl Iterator<Item = &Address> {
        self.allowed_currencies.iter()
    }

    /// Fails with `Paused` while the gate is closed
    pub fn ensure_running(&self) -> Result<(), LoanError> {
        if self.paused {
            return Err(LoanError::Paused);
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), LoanError> {
        if caller != &self.owner {
            return Err(LoanError::NotOwner);
        }
        Ok(())
    }

    pub fn whitelist_collection(
        &mut self,
        caller: &Address,
        collection: Address,
    ) -> Result<(), LoanError> {
        self.ensure_owner(caller)?;
        info!(collection = %collection, "Collection whitelisted");
        self.allowed_collections.insert(collection);
        Ok(())
    }

    pub fn whitelist_currency(
        &mut self,
        caller: &Address,
        currency: Address,
    ) -> Result<(), LoanError> {
        self.ensure_owner(caller)?;
        info!(currency = %currency, "Currency whitelisted");
        self.allowed_currencies.insert(currency);
        Ok(())
    }

    /// Stops new offers in `collection`; offers already open are unaffected
    pub fn delist_collection(
        &mut self,
        caller: &Address,
        collection: &Address,
    ) -> Result<(), LoanError> {
        self.ensure_owner(caller)?;
        if self.allowed_collections.remove(collection) {
            info!(collection = %collection, "Collection delisted");
        }
        Ok(())
    }

    pub fn delist_currency(
        &mut self,
        caller: &Address,
        currency: &Address,
    ) -> Result<(), LoanError> {
        self.ensure_owner(caller)?;
        if self.allowed_currencies.remove(currency) {
            info!(currency = %currency, "Currency delisted");
        }
        Ok(())
    }

    pub fn pause(&mut self, caller: &Address) -> Result<(), LoanError> {
        self.ensure_owner(caller)?;
        self.ensure_running()?;
        self.paused = true;
        info!(owner = %self.owner, "Ledger paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<(), LoanError> {
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(LoanError::NotPaused);
        }
        self.paused = false;
        info!(owner = %self.owner, "Ledger unpaused");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), LoanError> {
        self.ensure_owner(caller)?;
        info!(from = %self.owner, to = %new_owner, "Ownership transferred");
        self.owner = new_owner;
        Ok(())
    }
}
