//! Accounts as reported by a provider.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeAccount {
    pub address: String,
    #[serde(default, serialize_with = "to_hex", deserialize_with = "from_hex")]
    pub public_key: Vec<u8>,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl NativeAccount {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), ..Default::default() }
    }
    pub fn with_public_key(mut self, key: impl Into<Vec<u8>>) -> Self { self.public_key = key.into(); self }
    pub fn with_chains(mut self, chains: Vec<String>) -> Self { self.chains = chains; self }
    pub fn with_label(mut self, label: impl Into<String>) -> Self { self.label = Some(label.into()); self }
}

fn to_hex<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

fn from_hex<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let raw = String::deserialize(d)?;
    hex::decode(raw.trim_start_matches("0x")).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_key_travels_as_hex() {
        let account = NativeAccount::new("0xAB").with_public_key(vec![0xde, 0xad]);
        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["public_key"], "dead");

        let parsed: NativeAccount = serde_json::from_value(json!({"address": "0xAB", "public_key": "0xdead"})).unwrap();
        assert_eq!(parsed.public_key, vec![0xde, 0xad]);
        assert!(parsed.chains.is_empty());
    }
}
