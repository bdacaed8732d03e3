//! Navigation between bibs, holdings and items.

mod common;

use common::{config, mfhd_record, standard};
use vger::{CardinalityPolicy, Config, ItemRecord, RecordKind, VgerError};

#[test]
fn test_bib_holdings_in_id_order() {
    let session = standard().session(config());
    let holdings = session.get_bib(100).expect("bib").holdings().expect("holdings");
    let ids: Vec<i64> = holdings.iter().map(|h| h.mfhd_id()).collect();
    assert_eq!(ids, [200, 201]);

    assert!(session.get_bib(101).expect("bib").holdings().expect("holdings").is_empty());
}

#[test]
fn test_items_and_holdings_are_symmetric() {
    let session = standard().session(config());
    for mfhd_id in [200, 201, 202] {
        let mfhd = session.get_mfhd(mfhd_id).expect("mfhd");
        for item in mfhd.get_items().expect("items") {
            assert_eq!(item.mfhd_id, mfhd_id);
            let owner = item.get_mfhd().expect("owning mfhd");
            assert_eq!(owner.mfhd_id(), mfhd_id);
            assert_eq!(owner.record(), mfhd.record());
        }
    }

    let items: Vec<Option<i64>> = session
        .get_mfhd(200)
        .expect("mfhd")
        .get_items()
        .expect("items")
        .into_iter()
        .map(|item| item.item_id)
        .collect();
    assert_eq!(items, [Some(300), Some(301)]);
}

#[test]
fn test_mfhd_get_bib_follows_004() {
    let session = standard().session(config());
    let bib = session.get_mfhd(202).expect("mfhd").get_bib().expect("bib");
    assert_eq!(bib.bib_id(), 102);
    assert_eq!(bib.title(), Some("Darlington papers"));
}

#[test]
fn test_mfhd_without_004_has_no_bib() {
    let catalog = standard();
    catalog.mfhd(210, 100, &mfhd_record(210, None, "hill"), "N", 1);
    let session = catalog.session(config());
    assert!(matches!(
        session.get_mfhd(210).expect("mfhd").get_bib(),
        Err(VgerError::MissingBibReference { mfhd_id: 210 })
    ));
}

#[test]
fn test_item_get_bib() {
    let session = standard().session(config());
    let item = session.get_item("36000000000301").expect("item");
    assert_eq!(item.get_bib().expect("bib").bib_id(), 100);

    let new_item = ItemRecord::new(&session, 202);
    assert_eq!(new_item.get_bib().expect("bib").bib_id(), 102);
}

#[test]
fn test_item_linked_to_several_bibs_follows_policy() {
    let catalog = standard();
    catalog.bib_mfhd(102, 201);
    let session = catalog.session(config());
    assert_eq!(
        session.get_item(302_i64).expect("item").get_bib().expect("first bib").bib_id(),
        100
    );

    let catalog = standard();
    catalog.bib_mfhd(102, 201);
    let session = catalog.session(Config {
        cardinality: CardinalityPolicy::Strict,
        ..config()
    });
    assert!(matches!(
        session.get_item(302_i64).expect("item").get_bib(),
        Err(VgerError::Anomaly { what: "bib of item", rows: 2, .. })
    ));
}

#[test]
fn test_item_in_two_holdings_is_fatal() {
    let catalog = standard();
    catalog.mfhd_item(202, 302, None);
    let session = catalog.session(config());
    let item = session.get_item(302_i64).expect("warn policy reads the item");
    assert!(matches!(
        item.get_mfhd(),
        Err(VgerError::Cardinality { what: "holdings of item", rows: 2, .. })
    ));
}

#[test]
fn test_unlinked_item_is_not_found() {
    let catalog = standard();
    catalog.execute("INSERT INTO item VALUES (399, 1, 0, 3, 0, 1, 1, 0, NULL);");
    let session = catalog.session(config());
    assert!(matches!(
        session.get_item(399_i64),
        Err(VgerError::NotFound { kind: RecordKind::Item, .. })
    ));
}

#[test]
fn test_new_item_traverses_through_its_holding() {
    let session = standard().session(config());
    let item = ItemRecord::new(&session, 201);
    assert_eq!(item.item_id, None);
    assert_eq!(item.get_mfhd().expect("mfhd").location_code(), "hillr");
    assert_eq!(item.barcode().expect("barcode"), None);
}

#[test]
fn test_each_call_requeries() {
    let catalog = standard();
    let session = catalog.session(config());
    let bib = session.get_bib(100).expect("bib");
    assert_eq!(bib.holdings().expect("holdings").len(), 2);

    session
        .connection()
        .execute_batch("DELETE FROM bib_mfhd WHERE mfhd_id = 201;")
        .expect("delete link");
    assert_eq!(bib.holdings().expect("holdings").len(), 1);
}
