//! Transaction store integration tests against in-memory SQLite.

use wallet_risk::core::StorageConfig;
use wallet_risk::scoring::{TransactionSource, TxRecord};
use wallet_risk::storage::TransactionStore;

fn memory_config() -> StorageConfig {
    StorageConfig {
        database_url: "sqlite::memory:".to_string(),
        // A single connection keeps every query on the same in-memory DB.
        max_connections: 1,
        connection_timeout_seconds: 5,
    }
}

fn tx(value: f64, from: &str, to: &str, block: i64) -> TxRecord {
    TxRecord {
        value,
        from_addr: from.to_string(),
        to_addr: to.to_string(),
        block_number: block,
    }
}

async fn seeded_store() -> TransactionStore {
    let store = TransactionStore::connect(&memory_config()).await.unwrap();
    store
        .insert_transaction("0xh1", &tx(100.0, "0xother", "0xWallet", 10))
        .await
        .unwrap();
    store
        .insert_transaction("0xh2", &tx(200.0, "0xwallet", "0xother", 20))
        .await
        .unwrap();
    store
        .insert_transaction("0xh3", &tx(50.0, "0xpeer", "0xwallet", 30))
        .await
        .unwrap();
    store
        .insert_transaction("0xh4", &tx(999.0, "0xa", "0xb", 40))
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn fetch_is_case_insensitive_and_block_descending() {
    let store = seeded_store().await;

    let records = store.transactions_for_wallet("0xwallet").await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].block_number, 30);
    assert_eq!(records[1].block_number, 20);
    assert_eq!(records[2].block_number, 10);

    // Mixed-case stored sender/receiver still matches the canonical wallet.
    assert!(records.iter().any(|r| r.to_addr == "0xWallet"));
}

#[tokio::test]
async fn fetch_unknown_wallet_returns_empty() {
    let store = seeded_store().await;
    let records = store.transactions_for_wallet("0xnobody").await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn reports_lists_most_recent_first() {
    let store = seeded_store().await;

    let reports = store.recent_reports(20).await.unwrap();
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0].tx_hash, "0xh4");
    assert_eq!(reports[0].block, 40);
    assert_eq!(reports[0].reporter, "0xa");
    assert_eq!(reports[0].wallet, "0xb");
}

#[tokio::test]
async fn reports_respects_limit() {
    let store = seeded_store().await;
    let reports = store.recent_reports(2).await.unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].tx_hash, "0xh4");
    assert_eq!(reports[1].tx_hash, "0xh3");
}

#[tokio::test]
async fn duplicate_hash_is_rejected() {
    let store = seeded_store().await;
    let err = store
        .insert_transaction("0xh1", &tx(1.0, "0xx", "0xy", 99))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("storage error"));
}
