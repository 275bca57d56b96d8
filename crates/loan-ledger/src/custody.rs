use crate::error::CustodyError;
use crate::types::{Address, Amount, AssetId};

/// Non-fungible collateral, addressed by `(collection, asset_id)`.
/// A call that returns an error must not have moved anything.
pub trait CollateralService {
    fn owner_of(&self, collection: &Address, asset_id: AssetId) -> Option<Address>;

    /// Number of assets of `collection` held by `owner`
    fn balance_of(&self, collection: &Address, owner: &Address) -> u64;

    /// Move `asset_id` from `from` to `to`, acting as `operator`
    fn transfer_from(
        &mut self,
        collection: &Address,
        operator: &Address,
        from: &Address,
        to: &Address,
        asset_id: AssetId,
    ) -> Result<(), CustodyError>;
}

/// Fungible currencies, addressed by their contract address. Same
/// all-or-nothing contract as [`CollateralService`].
pub trait CurrencyService {
    fn balance_of(&self, currency: &Address, owner: &Address) -> Amount;

    /// Move `amount` out of `from`'s own balance
    fn transfer(
        &mut self,
        currency: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError>;

    /// Move `amount` from `from` to `to` against `spender`'s allowance
    fn transfer_from(
        &mut self,
        currency: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError>;
}
