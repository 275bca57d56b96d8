mod common;

use common::{Fixture, DAY};
use loan_ledger::{LoanError, OfferState};

const PRINCIPAL: u128 = 1_000_000;

fn reapprove(fx: &mut Fixture, asset_id: u64) {
    let (collection, borrower, escrow) = (fx.collection.clone(), fx.borrower.clone(), fx.escrow());
    fx.ledger
        .collateral_mut()
        .approve(&collection, &borrower, &escrow, asset_id)
        .unwrap();
}

#[test]
fn open_offer_cannot_be_listed_twice() {
    let mut fx = Fixture::new();
    fx.create(0, PRINCIPAL).unwrap();

    assert!(matches!(
        fx.create(0, 2 * PRINCIPAL),
        Err(LoanError::OfferAlreadyExists { asset_id: 0, .. })
    ));
    assert_eq!(fx.offer(0).loan_amount, PRINCIPAL);
    assert_eq!(fx.ledger.total_offers(), 1);
}

#[test]
fn withdrawn_asset_can_be_listed_again() {
    let mut fx = Fixture::new();
    let (borrower, lender) = (fx.borrower.clone(), fx.lender.clone());
    fx.create(0, PRINCIPAL).unwrap();
    fx.withdraw(&borrower, 0).unwrap();

    reapprove(&mut fx, 0);
    fx.create(0, 2 * PRINCIPAL).unwrap();

    let offer = fx.offer(0);
    assert_eq!(offer.state, OfferState::Created);
    assert_eq!(offer.loan_amount, 2 * PRINCIPAL);
    assert_eq!(fx.ledger.offer_count(&borrower), 2);
    assert_eq!(fx.ledger.collection_record(&borrower, &fx.collection, 1), Some(0));

    fx.accept(&lender, 0).unwrap();
}

#[test]
fn settled_loan_can_be_listed_again() {
    let mut fx = Fixture::new();
    let (borrower, lender) = (fx.borrower.clone(), fx.lender.clone());
    fx.open_loan(0, PRINCIPAL);
    fx.repay(&borrower, 0).unwrap();
    fx.withdraw_nft(&borrower, 0).unwrap();

    // Deposit not collected yet, the old record still has a claim on escrow
    reapprove(&mut fx, 0);
    assert!(matches!(fx.create(0, PRINCIPAL), Err(LoanError::OfferAlreadyExists { .. })));

    fx.withdraw_deposit(&lender, 0).unwrap();
    fx.create(0, PRINCIPAL).unwrap();
    assert_eq!(fx.offer(0).lender, None);
}

#[test]
fn lender_can_relist_collateral_won_by_default() {
    let mut fx = Fixture::new();
    let lender = fx.lender.clone();
    let collection = fx.collection.clone();
    fx.open_loan(0, PRINCIPAL);
    fx.clock.advance(DAY);
    fx.withdraw_nft(&lender, 0).unwrap();

    let escrow = fx.escrow();
    fx.ledger
        .collateral_mut()
        .approve(&collection, &lender, &escrow, 0)
        .unwrap();
    let terms = fx.terms(PRINCIPAL);
    fx.ledger.create_offer(&lender, &collection, 0, terms).unwrap();

    assert_eq!(fx.offer(0).borrower, lender);
    assert_eq!(fx.ledger.offer_count(&lender), 1);
    assert_eq!(fx.ledger.total_offers(), 2);
}
