use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;

/// Token id of a single collateral asset inside its collection
pub type AssetId = u64;

/// Currency amounts (principal, yield, balances)
pub type Amount = u128;

/// Account or contract address: `0x` followed by 20 bytes of lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub const BYTES: usize = 20;

    /// Parse and normalise an address string
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(raw.to_string()))?;

        let bytes = hex::decode(digits)
            .map_err(|e| AddressError::InvalidHex(raw.to_string(), e.to_string()))?;
        if bytes.len() != Self::BYTES {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        Ok(Self::from_bytes(bytes.as_slice()))
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Address(format!("0x{}", hex::encode(bytes)))
    }

    /// Deterministic address derived from a number, handy for fixtures and
    /// well-known accounts such as the escrow.
    pub fn from_index(index: u64) -> Self {
        let mut bytes = [0u8; Self::BYTES];
        bytes[Self::BYTES - 8..].copy_from_slice(&index.to_be_bytes());
        Self::from_bytes(&bytes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Identity of an offer: the collateral it is secured by
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferKey {
    pub collection: Address,
    pub asset_id: AssetId,
}

impl OfferKey {
    pub fn new(collection: Address, asset_id: AssetId) -> Self {
        Self { collection, asset_id }
    }
}

impl fmt::Display for OfferKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.collection, self.asset_id)
    }
}

/// Loan terms proposed by the borrower at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub amount: Amount,
    pub duration_days: u32,
    pub apr: u32,
    pub currency: Address,
}
