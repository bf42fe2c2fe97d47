//! Shared types for the Wallet Store SDK.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Serde module for serializing fixed-size byte arrays as base58 strings.
mod base58_bytes {
    use super::*;

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&bs58::encode(bytes).into_string())
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::decode_base58::<N>(&s).map_err(serde::de::Error::custom)
    }
}

fn decode_base58<const N: usize>(s: &str) -> crate::Result<[u8; N]> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| crate::Error::Parse(format!("Invalid base58 string: {e}")))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| crate::Error::Parse(format!("Expected {} bytes, got {}", N, len)))
}

/// Ed25519 public key of a wallet account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "base58_bytes")] [u8; 32]);

impl PublicKey {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for PublicKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58(s).map(Self)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

/// Signature identifying a submitted transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionSignature(#[serde(with = "base58_bytes")] [u8; 64]);

impl TransactionSignature {
    pub const fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.0
    }
}

impl FromStr for TransactionSignature {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58(s).map(Self)
    }
}

impl fmt::Display for TransactionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for TransactionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionSignature({self})")
    }
}

/// A serialized transaction.
///
/// The store never looks inside; building and decoding transactions is the
/// caller's job. Signed transactions come back in the same wire form.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Transaction(Vec<u8>);

impl Transaction {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> crate::Result<Self> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| crate::Error::Parse(format!("Invalid transaction hex: {e}")))
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transaction(0x{})", self.to_hex())
    }
}

impl Serialize for Transaction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Transaction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Transaction::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Commitment level used when querying or submitting through an RPC node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl FromStr for Commitment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processed" | "recent" => Ok(Commitment::Processed),
            "confirmed" | "single" => Ok(Commitment::Confirmed),
            "finalized" | "max" => Ok(Commitment::Finalized),
            _ => Err(crate::Error::Parse(format!("Unknown commitment: {}", s))),
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commitment::Processed => write!(f, "processed"),
            Commitment::Confirmed => write!(f, "confirmed"),
            Commitment::Finalized => write!(f, "finalized"),
        }
    }
}

/// Handle to the RPC node a transaction is sent through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub endpoint: String,
    #[serde(default)]
    pub commitment: Commitment,
}

impl Connection {
    pub fn new(endpoint: impl Into<String>, commitment: Commitment) -> Self {
        Self {
            endpoint: endpoint.into(),
            commitment,
        }
    }
}

/// Options forwarded untouched to the adapter's `send_transaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionOptions {
    #[serde(default)]
    pub skip_preflight: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight_commitment: Option<Commitment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_context_slot: Option<u64>,
}

/// Connection state of the selected adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    /// Adapter selected (or none) but not yet reported ready.
    #[default]
    NotReady,
    /// Ready to connect.
    Ready,
    /// A connection attempt is pending.
    Connecting,
    /// Connected; signing operations are allowed.
    Connected,
}

impl ConnectionState {
    /// Human-readable label for wallet pickers and status badges.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::NotReady => "Initializing",
            ConnectionState::Ready => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Optional signing operations an adapter implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySet {
    pub sign_transaction: bool,
    pub sign_all_transactions: bool,
    pub sign_message: bool,
}

impl CapabilitySet {
    pub const NONE: CapabilitySet = CapabilitySet {
        sign_transaction: false,
        sign_all_transactions: false,
        sign_message: false,
    };

    pub const ALL: CapabilitySet = CapabilitySet {
        sign_transaction: true,
        sign_all_transactions: true,
        sign_message: true,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_base58_roundtrip() {
        let key = PublicKey::new([7u8; 32]);
        let text = key.to_string();
        assert_eq!(text.parse::<PublicKey>().unwrap(), key);

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{text}\""));
    }

    #[test]
    fn test_public_key_rejects_wrong_length() {
        let short = bs58::encode([1u8; 31]).into_string();
        let err = short.parse::<PublicKey>().unwrap_err();
        assert_eq!(err, crate::Error::Parse("Expected 32 bytes, got 31".to_string()));

        assert!("0OIl".parse::<PublicKey>().is_err());
    }

    #[test]
    fn test_transaction_serializes_as_hex() {
        let tx = Transaction::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(serde_json::to_string(&tx).unwrap(), "\"deadbeef\"");
        assert_eq!(format!("{tx:?}"), "Transaction(0xdeadbeef)");
        assert!(Transaction::from_hex("xyz").is_err());
    }

    #[test]
    fn test_commitment_parsing() {
        assert_eq!("Finalized".parse::<Commitment>().unwrap(), Commitment::Finalized);
        assert_eq!("recent".parse::<Commitment>().unwrap(), Commitment::Processed);
        assert!("eventually".parse::<Commitment>().is_err());
        assert_eq!(Commitment::default().to_string(), "confirmed");
    }

    #[test]
    fn test_send_options_camel_case() {
        let options = SendTransactionOptions {
            skip_preflight: true,
            max_retries: Some(3),
            ..Default::default()
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json, serde_json::json!({ "skipPreflight": true, "maxRetries": 3 }));
    }

    #[test]
    fn test_connection_state_labels() {
        assert_eq!(ConnectionState::default(), ConnectionState::NotReady);
        assert_eq!(ConnectionState::NotReady.to_string(), "Initializing");
        assert_eq!(ConnectionState::Ready.label(), "Disconnected");
        assert_eq!(ConnectionState::Connected.label(), "Connected");
    }
}
