use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Address, AssetId, OfferKey};

/// Creation history per borrower, for enumeration. Counts only grow: a
/// withdrawn or settled offer still counts, and re-listing counts again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRecords {
    total_offers: u64,
    offer_count: BTreeMap<Address, u64>,
    collection_record: BTreeMap<Address, BTreeMap<Address, Vec<AssetId>>>,
}

impl OfferRecords {
    pub fn record(&mut self, borrower: &Address, collection: &Address, asset_id: AssetId) {
        self.total_offers += 1;
        *self.offer_count.entry(borrower.clone()).or_insert(0) += 1;
        self.collection_record
            .entry(borrower.clone())
            .or_default()
            .entry(collection.clone())
            .or_default()
            .push(asset_id);
    }

    pub fn total_offers(&self) -> u64 {
        self.total_offers
    }

    pub fn offer_count(&self, address: &Address) -> u64 {
        self.offer_count.get(address).copied().unwrap_or(0)
    }

    /// `index`-th asset `address` offered in `collection`, in creation order
    pub fn asset_at(
        &self,
        address: &Address,
        collection: &Address,
        index: usize,
    ) -> Option<AssetId> {
        self.assets_in(address, collection).get(index).copied()
    }

    pub fn assets_in(&self, address: &Address, collection: &Address) -> &[AssetId] {
        self.collection_record
            .get(address)
            .and_then(|by_collection| by_collection.get(collection))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every key `address` has ever offered, grouped by collection
    pub fn offered_by(&self, address: &Address) -> Vec<OfferKey> {
        self.collection_record
            .get(address)
            .into_iter()
            .flat_map(|by_collection| by_collection.iter())
            .flat_map(|(collection, assets)| {
                assets
                    .iter()
                    .map(move |asset_id| OfferKey::new(collection.clone(), *asset_id))
            })
            .collect()
    }
}
