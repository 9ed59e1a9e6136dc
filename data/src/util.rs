use serde::{Deserialize, Deserializer};

/// Deserialize a field tolerantly: an unrecognized or malformed value
/// falls back to `T::default()` instead of failing the whole document.
/// Keeps old saved-state files loadable across config shape changes.
pub fn ok_or_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}
