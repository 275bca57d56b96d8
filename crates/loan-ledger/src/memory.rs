use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::custody::{CollateralService, CurrencyService};
use crate::error::CustodyError;
use crate::types::{Address, Amount, AssetId};

/// Non-fungible collections keyed by collection address
#[derive(Debug, Clone, Default)]
pub struct MemoryCollections {
    owners: HashMap<(Address, AssetId), Address>,
    approvals: HashMap<(Address, AssetId), Address>,
    // (collection, owner, operator)
    operators: HashSet<(Address, Address, Address)>,
}

impl MemoryCollections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(
        &mut self,
        collection: &Address,
        to: &Address,
        asset_id: AssetId,
    ) -> Result<(), CustodyError> {
        let key = (collection.clone(), asset_id);
        if self.owners.contains_key(&key) {
            return Err(CustodyError::AssetAlreadyMinted {
                collection: collection.clone(),
                asset_id,
            });
        }
        self.owners.insert(key, to.clone());
        Ok(())
    }

    /// Let `approved` move a single asset owned by `owner`
    pub fn approve(
        &mut self,
        collection: &Address,
        owner: &Address,
        approved: &Address,
        asset_id: AssetId,
    ) -> Result<(), CustodyError> {
        self.ensure_owned_by(collection, owner, asset_id)?;
        self.approvals.insert((collection.clone(), asset_id), approved.clone());
        Ok(())
    }

    /// Grant or revoke `operator` rights over every asset `owner` holds in `collection`
    pub fn set_approval_for_all(
        &mut self,
        collection: &Address,
        owner: &Address,
        operator: &Address,
        approved: bool,
    ) {
        let key = (collection.clone(), owner.clone(), operator.clone());
        if approved {
            self.operators.insert(key);
        } else {
            self.operators.remove(&key);
        }
    }

    fn ensure_owned_by(
        &self,
        collection: &Address,
        owner: &Address,
        asset_id: AssetId,
    ) -> Result<(), CustodyError> {
        match self.owners.get(&(collection.clone(), asset_id)) {
            None => Err(CustodyError::UnknownAsset {
                collection: collection.clone(),
                asset_id,
            }),
            Some(current) if current != owner => Err(CustodyError::NotAssetOwner {
                collection: collection.clone(),
                asset_id,
                from: owner.clone(),
            }),
            Some(_) => Ok(()),
        }
    }

    fn may_operate(
        &self,
        collection: &Address,
        operator: &Address,
        owner: &Address,
        asset_id: AssetId,
    ) -> bool {
        operator == owner
            || self.approvals.get(&(collection.clone(), asset_id)) == Some(operator)
            || self
                .operators
                .contains(&(collection.clone(), owner.clone(), operator.clone()))
    }
}

impl CollateralService for MemoryCollections {
    fn owner_of(&self, collection: &Address, asset_id: AssetId) -> Option<Address> {
        self.owners.get(&(collection.clone(), asset_id)).cloned()
    }

    fn balance_of(&self, collection: &Address, owner: &Address) -> u64 {
        self.owners
            .iter()
            .filter(|((c, _), o)| c == collection && *o == owner)
            .count() as u64
    }

    fn transfer_from(
        &mut self,
        collection: &Address,
        operator: &Address,
        from: &Address,
        to: &Address,
        asset_id: AssetId,
    ) -> Result<(), CustodyError> {
        self.ensure_owned_by(collection, from, asset_id)?;
        if !self.may_operate(collection, operator, from, asset_id) {
            return Err(CustodyError::NotApproved {
                collection: collection.clone(),
                asset_id,
                operator: operator.clone(),
            });
        }

        let key = (collection.clone(), asset_id);
        self.approvals.remove(&key);
        self.owners.insert(key, to.clone());

        debug!(collection = %collection, asset_id, from = %from, to = %to, "Asset transferred");
        Ok(())
    }
}

/// Fungible currencies keyed by currency address
#[derive(Debug, Clone, Default)]
pub struct MemoryTokens {
    balances: HashMap<(Address, Address), Amount>,
    // (currency, owner, spender)
    allowances: HashMap<(Address, Address, Address), Amount>,
}

impl MemoryTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(
        &mut self,
        currency: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.credit(currency, to, amount)
    }

    /// Set `spender`'s allowance over `owner`'s balance. `Amount::MAX` never decreases.
    pub fn approve(
        &mut self,
        currency: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) {
        self.allowances
            .insert((currency.clone(), owner.clone(), spender.clone()), amount);
    }

    pub fn allowance(&self, currency: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(currency.clone(), owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn credit(
        &mut self,
        currency: &Address,
        owner: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let balance = self.balances.entry((currency.clone(), owner.clone())).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| CustodyError::BalanceOverflow {
                currency: currency.clone(),
                owner: owner.clone(),
            })?;
        Ok(())
    }

    fn move_balance(
        &mut self,
        currency: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let available = self.balance_of(currency, from);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                currency: currency.clone(),
                owner: from.clone(),
                available,
                required: amount,
            });
        }

        let receiving = self.balance_of(currency, to);
        if from != to && receiving.checked_add(amount).is_none() {
            return Err(CustodyError::BalanceOverflow {
                currency: currency.clone(),
                owner: to.clone(),
            });
        }

        self.balances
            .insert((currency.clone(), from.clone()), available - amount);
        self.credit(currency, to, amount)?;

        debug!(
            currency = %currency,
            from = %from,
            to = %to,
            amount = %amount,
            "Currency transferred"
        );
        Ok(())
    }
}

impl CurrencyService for MemoryTokens {
    fn balance_of(&self, currency: &Address, owner: &Address) -> Amount {
        self.balances
            .get(&(currency.clone(), owner.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        currency: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.move_balance(currency, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        currency: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let allowance = self.allowance(currency, from, spender);
        if spender != from && allowance < amount {
            return Err(CustodyError::InsufficientAllowance {
                currency: currency.clone(),
                owner: from.clone(),
                spender: spender.clone(),
                available: allowance,
                required: amount,
            });
        }

        self.move_balance(currency, from, to, amount)?;

        if spender != from && allowance != Amount::MAX {
            self.approve(currency, from, spender, allowance - amount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_index(n)
    }

    #[test]
    fn test_nft_transfer_needs_ownership_and_approval() {
        let (collection, alice, bob, market) = (addr(10), addr(1), addr(2), addr(3));
        let mut nfts = MemoryCollections::new();
        nfts.mint(&collection, &alice, 0).unwrap();

        assert!(matches!(
            nfts.transfer_from(&collection, &market, &alice, &market, 0),
            Err(CustodyError::NotApproved { .. })
        ));
        assert!(matches!(
            nfts.transfer_from(&collection, &bob, &bob, &market, 0),
            Err(CustodyError::NotAssetOwner { .. })
        ));
        assert!(matches!(
            nfts.approve(&collection, &bob, &market, 0),
            Err(CustodyError::NotAssetOwner { .. })
        ));

        nfts.approve(&collection, &alice, &market, 0).unwrap();
        nfts.transfer_from(&collection, &market, &alice, &market, 0).unwrap();

        assert_eq!(nfts.owner_of(&collection, 0), Some(market.clone()));
        assert_eq!(nfts.balance_of(&collection, &alice), 0);
        assert_eq!(nfts.balance_of(&collection, &market), 1);
    }

    #[test]
    fn test_approval_is_cleared_after_transfer() {
        let (collection, alice, market) = (addr(10), addr(1), addr(3));
        let mut nfts = MemoryCollections::new();
        nfts.mint(&collection, &alice, 0).unwrap();
        nfts.approve(&collection, &alice, &market, 0).unwrap();
        nfts.transfer_from(&collection, &market, &alice, &market, 0).unwrap();
        nfts.transfer_from(&collection, &market, &market, &alice, 0).unwrap();

        assert!(nfts
            .transfer_from(&collection, &market, &alice, &market, 0)
            .is_err());
    }

    #[test]
    fn test_operator_approval() {
        let (collection, alice, market) = (addr(10), addr(1), addr(3));
        let mut nfts = MemoryCollections::new();
        nfts.mint(&collection, &alice, 0).unwrap();
        nfts.mint(&collection, &alice, 1).unwrap();
        nfts.set_approval_for_all(&collection, &alice, &market, true);

        nfts.transfer_from(&collection, &market, &alice, &market, 0).unwrap();
        nfts.transfer_from(&collection, &market, &alice, &market, 1).unwrap();
        assert_eq!(nfts.balance_of(&collection, &market), 2);
    }

    #[test]
    fn test_double_mint_is_rejected() {
        let mut nfts = MemoryCollections::new();
        nfts.mint(&addr(10), &addr(1), 0).unwrap();
        assert!(matches!(
            nfts.mint(&addr(10), &addr(2), 0),
            Err(CustodyError::AssetAlreadyMinted { .. })
        ));
        assert!(nfts.mint(&addr(11), &addr(2), 0).is_ok());
    }

    #[test]
    fn test_token_transfer_from_consumes_allowance() {
        let (usd, alice, market) = (addr(20), addr(1), addr(3));
        let mut tokens = MemoryTokens::new();
        tokens.mint(&usd, &alice, 1_000).unwrap();
        tokens.approve(&usd, &alice, &market, 600);

        tokens.transfer_from(&usd, &market, &alice, &market, 400).unwrap();
        assert_eq!(tokens.allowance(&usd, &alice, &market), 200);
        assert_eq!(tokens.balance_of(&usd, &alice), 600);
        assert_eq!(tokens.balance_of(&usd, &market), 400);

        assert!(matches!(
            tokens.transfer_from(&usd, &market, &alice, &market, 300),
            Err(CustodyError::InsufficientAllowance { available: 200, .. })
        ));
        assert_eq!(tokens.balance_of(&usd, &alice), 600);
    }

    #[test]
    fn test_token_transfer_checks_balance() {
        let (usd, alice, bob) = (addr(20), addr(1), addr(2));
        let mut tokens = MemoryTokens::new();
        tokens.mint(&usd, &alice, 10).unwrap();

        assert!(matches!(
            tokens.transfer(&usd, &alice, &bob, 11),
            Err(CustodyError::InsufficientBalance { available: 10, required: 11, .. })
        ));
        tokens.transfer(&usd, &alice, &bob, 10).unwrap();
        assert_eq!(tokens.balance_of(&usd, &alice), 0);
        assert_eq!(tokens.balance_of(&usd, &bob), 10);
    }

    #[test]
    fn test_unlimited_allowance_is_not_consumed() {
        let (usd, alice, market) = (addr(20), addr(1), addr(3));
        let mut tokens = MemoryTokens::new();
        tokens.mint(&usd, &alice, 1_000).unwrap();
        tokens.approve(&usd, &alice, &market, Amount::MAX);

        tokens.transfer_from(&usd, &market, &alice, &market, 1_000).unwrap();
        assert_eq!(tokens.allowance(&usd, &alice, &market), Amount::MAX);
    }

    #[test]
    fn test_mint_overflow() {
        let (usd, alice) = (addr(20), addr(1));
        let mut tokens = MemoryTokens::new();
        tokens.mint(&usd, &alice, Amount::MAX).unwrap();
        assert!(matches!(
            tokens.mint(&usd, &alice, 1),
            Err(CustodyError::BalanceOverflow { .. })
        ));
    }
}
