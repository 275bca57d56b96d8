use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::admin::AdminGate;
use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::custody::{CollateralService, CurrencyService};
use crate::error::SnapshotError;
use crate::ledger::LoanLedger;
use crate::offer::Offer;
use crate::records::OfferRecords;
use crate::types::{Address, AssetId, OfferKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferEntry {
    pub collection: Address,
    pub asset_id: AssetId,
    pub offer: Offer,
}

/// Durable ledger state. The event log itself is not included; only the
/// sequence number the next event will carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Clock reading when the snapshot was taken
    pub taken_at: u64,
    #[serde(default)]
    pub next_sequence: u64,
    pub config: LedgerConfig,
    pub admin: AdminGate,
    pub offers: Vec<OfferEntry>,
    pub records: OfferRecords,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl<C, T, K> LoanLedger<C, T, K>
where
    C: CollateralService,
    T: CurrencyService,
    K: Clock,
{
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            taken_at: self.clock().now(),
            next_sequence: self.next_sequence(),
            config: self.config().clone(),
            admin: self.admin().clone(),
            offers: self
                .offers()
                .map(|(key, offer)| OfferEntry {
                    collection: key.collection.clone(),
                    asset_id: key.asset_id,
                    offer: offer.clone(),
                })
                .collect(),
            records: self.records().clone(),
        }
    }

    /// Rebuild a ledger from `snapshot`. The collaborators must already hold
    /// the custody state the snapshot expects (escrowed assets and balances).
    /// Fails on an invalid config or an offer no sequence of calls could
    /// have produced.
    pub fn restore(
        snapshot: LedgerSnapshot,
        collateral: C,
        currency: T,
        clock: K,
    ) -> Result<Self, SnapshotError> {
        snapshot.config.validate()?;

        let mut offers = BTreeMap::new();
        for entry in snapshot.offers {
            if let Some(reason) = entry.offer.inconsistency() {
                return Err(SnapshotError::InconsistentOffer {
                    collection: entry.collection,
                    asset_id: entry.asset_id,
                    reason: reason.to_string(),
                });
            }
            offers.insert(OfferKey::new(entry.collection, entry.asset_id), entry.offer);
        }

        info!(
            taken_at = snapshot.taken_at,
            total_offers = snapshot.records.total_offers(),
            next_sequence = snapshot.next_sequence,
            "Loan ledger restored from snapshot"
        );
        let ledger = Self::from_parts(
            snapshot.config,
            snapshot.admin,
            offers,
            snapshot.records,
            collateral,
            currency,
            clock,
        );
        Ok(ledger.resume_sequence(snapshot.next_sequence))
    }
}
