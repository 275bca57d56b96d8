#![allow(dead_code)]

use loan_ledger::{
    Address, Amount, AssetId, CollateralService, CurrencyService, LedgerConfig, LoanError,
    LoanLedger, LoanTerms, ManualClock, MemoryCollections, MemoryTokens, Offer,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DAY: u64 = 86_400;
pub const START: u64 = 1_700_000_000;
pub const FUNDS: Amount = 100_000_000_000;

pub type TestLedger = LoanLedger<MemoryCollections, MemoryTokens, ManualClock>;

/// Route ledger logs to the test harness; set RUST_LOG to see them
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_ledger=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Ledger with one allow-listed collection and currency. The borrower holds
/// assets 0 and 1, both approved to escrow; borrower and lender are funded
/// and have approved escrow to pull currency.
pub struct Fixture {
    pub ledger: TestLedger,
    pub clock: ManualClock,
    pub owner: Address,
    pub borrower: Address,
    pub lender: Address,
    pub stranger: Address,
    pub collection: Address,
    pub currency: Address,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();

        let owner = Address::from_index(1);
        let borrower = Address::from_index(2);
        let lender = Address::from_index(3);
        let stranger = Address::from_index(4);
        let collection = Address::from_index(0x1000);
        let currency = Address::from_index(0x2000);

        let config = LedgerConfig::default();
        let escrow = config.escrow.clone();

        let mut nfts = MemoryCollections::new();
        for asset_id in [0, 1] {
            nfts.mint(&collection, &borrower, asset_id).unwrap();
            nfts.approve(&collection, &borrower, &escrow, asset_id).unwrap();
        }

        let mut tokens = MemoryTokens::new();
        for holder in [&borrower, &lender] {
            tokens.mint(&currency, holder, FUNDS).unwrap();
            tokens.approve(&currency, holder, &escrow, FUNDS);
        }

        let clock = ManualClock::new(START);
        let mut ledger = LoanLedger::new(config, owner.clone(), nfts, tokens, clock.clone());
        ledger.whitelist_collection(&owner, collection.clone()).unwrap();
        ledger.whitelist_currency(&owner, currency.clone()).unwrap();

        Self {
            ledger,
            clock,
            owner,
            borrower,
            lender,
            stranger,
            collection,
            currency,
        }
    }

    /// One-day loan at 15% APR
    pub fn terms(&self, amount: Amount) -> LoanTerms {
        LoanTerms {
            amount,
            duration_days: 1,
            apr: 15,
            currency: self.currency.clone(),
        }
    }

    pub fn create(&mut self, asset_id: AssetId, amount: Amount) -> Result<(), LoanError> {
        let terms = self.terms(amount);
        let (borrower, collection) = (self.borrower.clone(), self.collection.clone());
        self.ledger.create_offer(&borrower, &collection, asset_id, terms)
    }

    pub fn accept(&mut self, caller: &Address, asset_id: AssetId) -> Result<(), LoanError> {
        let collection = self.collection.clone();
        self.ledger.accept_offer(caller, &collection, asset_id)
    }

    pub fn withdraw(&mut self, caller: &Address, asset_id: AssetId) -> Result<(), LoanError> {
        let collection = self.collection.clone();
        self.ledger.withdraw_offer(caller, &collection, asset_id)
    }

    pub fn borrow(&mut self, caller: &Address, asset_id: AssetId) -> Result<(), LoanError> {
        let collection = self.collection.clone();
        self.ledger.borrow(caller, &collection, asset_id)
    }

    pub fn repay(&mut self, caller: &Address, asset_id: AssetId) -> Result<(), LoanError> {
        let collection = self.collection.clone();
        self.ledger.repay_offer(caller, &collection, asset_id)
    }

    pub fn withdraw_nft(&mut self, caller: &Address, asset_id: AssetId) -> Result<(), LoanError> {
        let collection = self.collection.clone();
        self.ledger.withdraw_nft(caller, &collection, asset_id)
    }

    pub fn withdraw_deposit(
        &mut self,
        caller: &Address,
        asset_id: AssetId,
    ) -> Result<(), LoanError> {
        let collection = self.collection.clone();
        self.ledger.withdraw_deposit(caller, &collection, asset_id)
    }

    /// Create, accept and draw asset `asset_id`
    pub fn open_loan(&mut self, asset_id: AssetId, amount: Amount) {
        let (borrower, lender) = (self.borrower.clone(), self.lender.clone());
        self.create(asset_id, amount).unwrap();
        self.accept(&lender, asset_id).unwrap();
        self.borrow(&borrower, asset_id).unwrap();
    }

    pub fn offer(&self, asset_id: AssetId) -> &Offer {
        self.ledger.offer_info(&self.collection, asset_id).unwrap()
    }

    pub fn balance(&self, holder: &Address) -> Amount {
        self.ledger.currency().balance_of(&self.currency, holder)
    }

    pub fn holder_of(&self, asset_id: AssetId) -> Option<Address> {
        self.ledger.collateral().owner_of(&self.collection, asset_id)
    }

    pub fn escrow(&self) -> Address {
        self.ledger.escrow().clone()
    }
}
