//! Feature extraction from raw transaction records.
//!
//! Pure aggregation: the same record set always produces the same vector,
//! and record order does not matter since only count/mean/max/comparison
//! are used.

use serde::{Deserialize, Serialize};

use crate::core::{Result, ScoringError};

/// Feature schema, in the order the model was trained on. Artifact metadata
/// pins this list; a disagreement at load time is fatal.
pub const FEATURE_NAMES: [&str; 5] = [
    "tx_count",
    "avg_value",
    "max_value",
    "incoming",
    "outgoing",
];

/// Feature dimension.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// One ledger entry as read from the transaction store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    /// Non-negative transferred amount.
    pub value: f64,
    pub from_addr: String,
    pub to_addr: String,
    /// Monotonic ordering key.
    pub block_number: i64,
}

/// Fixed-order numeric summary of one wallet's transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub tx_count: u64,
    pub avg_value: f64,
    pub max_value: f64,
    pub incoming_count: u64,
    pub outgoing_count: u64,
}

impl FeatureVector {
    /// Aggregate the records in which `wallet` appears as sender or
    /// receiver. `wallet` must already be canonicalized (lower-cased);
    /// receiver comparison is case-insensitive on the record side.
    ///
    /// Fails with `DataUnavailable` on an empty record set: the caller must
    /// not proceed to scoring.
    pub fn extract(wallet: &str, records: &[TxRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(ScoringError::DataUnavailable);
        }

        let tx_count = records.len() as u64;
        let total: f64 = records.iter().map(|tx| tx.value).sum();
        let max_value = records
            .iter()
            .map(|tx| tx.value)
            .fold(f64::NEG_INFINITY, f64::max);
        let incoming_count = records
            .iter()
            .filter(|tx| tx.to_addr.to_lowercase() == wallet)
            .count() as u64;

        Ok(Self {
            tx_count,
            avg_value: total / tx_count as f64,
            max_value,
            incoming_count,
            outgoing_count: tx_count - incoming_count,
        })
    }

    /// Schema-ordered numeric form fed to the scaler and model.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.tx_count as f64,
            self.avg_value,
            self.max_value,
            self.incoming_count as f64,
            self.outgoing_count as f64,
        ]
    }
}
