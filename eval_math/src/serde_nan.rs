//! Serde helpers for scores that may be NaN
//!
//! JSON has no NaN, so `serde_json` writes NaN as `null`. These readers map
//! `null` back to NaN so persisted scores load into plain `f64` fields.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Read an `f64`, treating `null` as NaN.
pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Read a map of named scores, treating `null` values as NaN.
pub fn deserialize_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<f64>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| (name, value.unwrap_or(f64::NAN)))
        .collect())
}
