use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod mine;
pub mod pow;

pub use chain::{Ledger, SharedLedger};
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use pow::CancelToken;

pub type Hash = [u8; 32];

/// A transfer of `value` from `sender` to `recipient`.
///
/// Fields are private so a transaction cannot change after construction; two
/// transactions with the same fields are the same transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "senderAddress")]
    sender: String,
    #[serde(rename = "recipientAddress")]
    recipient: String,
    value: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, value: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            value,
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// NaN and infinities all encode as `null`, so they would collide in the
    /// block hash. Negative and zero values are fine.
    pub fn check_encodable(&self) -> Result<()> {
        if !self.value.is_finite() {
            return Err(LedgerError::InvalidTransaction(format!(
                "value must be finite, got {}",
                self.value
            )));
        }
        Ok(())
    }

    /// Opt-in sanity check; construction itself never rejects anything.
    pub fn validate(&self) -> Result<()> {
        self.check_encodable()?;
        if self.sender.is_empty() || self.recipient.is_empty() {
            return Err(LedgerError::InvalidTransaction(
                "sender and recipient must not be empty".to_string(),
            ));
        }
        if self.value <= 0.0 {
            return Err(LedgerError::InvalidTransaction(format!(
                "value must be positive, got {}",
                self.value
            )));
        }
        Ok(())
    }
}

/// A sealed batch of transactions linked to its predecessor by hash.
///
/// The hash is not stored; [`Block::hash`] recomputes it from the canonical
/// encoding every time.
#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    timestamp: i64,
    nonce: u64,
    #[serde(with = "hex_hash")]
    previous_hash: Hash,
    transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(nonce: u64, previous_hash: Hash, transactions: Vec<Transaction>) -> Self {
        Self::with_timestamp(now_nanos(), nonce, previous_hash, transactions)
    }

    pub fn with_timestamp(
        timestamp: i64,
        nonce: u64,
        previous_hash: Hash,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        self.encoding().to_bytes()
    }

    pub fn hash(&self) -> Hash {
        self.encoding().hash()
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    fn encoding(&self) -> CanonicalBlock<'_> {
        CanonicalBlock {
            timestamp: self.timestamp,
            nonce: self.nonce,
            previous_hash: &self.previous_hash,
            transactions: &self.transactions,
        }
    }
}

impl Serialize for Block {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.encoding().serialize(serializer)
    }
}

/// Borrowed view of a block in hash-input field order.
///
/// The proof-of-work loop hashes candidates through this view so it never has
/// to clone the transaction list per nonce.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CanonicalBlock<'a> {
    pub(crate) timestamp: i64,
    pub(crate) nonce: u64,
    #[serde(serialize_with = "hex_hash::serialize")]
    pub(crate) previous_hash: &'a Hash,
    pub(crate) transactions: &'a [Transaction],
}

impl CanonicalBlock<'_> {
    fn to_bytes(&self) -> Vec<u8> {
        // Only strings, integers and floats: serde_json cannot fail here.
        serde_json::to_vec(self).expect("canonical block encoding is infallible")
    }

    pub(crate) fn hash(&self) -> Hash {
        sha256(&self.to_bytes())
    }
}

pub fn sha256(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

mod hex_hash {
    use super::Hash;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(hash: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(&s, &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}
