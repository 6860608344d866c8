use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn to_json<T: Serialize>(obj: &T) -> String {
    // Our types only contain maps with string-like keys, so this can't fail
    serde_json::to_string_pretty(obj).unwrap()
}

pub fn from_json<T: DeserializeOwned>(raw: &[u8]) -> Result<T> {
    serde_json::from_slice(raw).map_err(|err| err.into())
}

pub fn write_json<T: Serialize>(path: &str, obj: &T) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)?;
        }
    }
    fs_err::write(path, to_json(obj))?;
    log::info!("Wrote {}", path);
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let raw = fs_err::read(path)?;
    from_json(&raw).with_context(|| format!("parsing {}", path))
}

/// Reads a file if it exists and parses, otherwise falls back to the type's default and logs why.
pub fn maybe_read_json<T: DeserializeOwned + Default>(path: &str) -> T {
    if !Path::new(path).exists() {
        return T::default();
    }
    match read_json(path) {
        Ok(obj) => obj,
        Err(err) => {
            log::warn!("Couldn't load {}, using defaults: {:#}", path, err);
            T::default()
        }
    }
}

// For BTreeMaps with struct keys. See https://github.com/serde-rs/json/issues/402.

pub fn serialize_btreemap<S: Serializer, K: Serialize, V: Serialize>(
    map: &BTreeMap<K, V>,
    s: S,
) -> Result<S::Ok, S::Error> {
    map.iter().collect::<Vec<(_, _)>>().serialize(s)
}

pub fn deserialize_btreemap<
    'de,
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
>(
    d: D,
) -> Result<BTreeMap<K, V>, D::Error> {
    let vec = <Vec<(K, V)>>::deserialize(d)?;
    let mut map = BTreeMap::new();
    for (k, v) in vec {
        map.insert(k, v);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_uses_default() {
        let map: BTreeMap<String, usize> = maybe_read_json("definitely/not/a/real/file.json");
        assert!(map.is_empty());
    }

    #[test]
    fn json_round_trip_through_disk() {
        let dir = std::env::temp_dir().join("abstutil_io_test");
        let path = dir.join("obj.json").display().to_string();
        let mut obj = BTreeMap::new();
        obj.insert("lanes".to_string(), 4);
        write_json(&path, &obj).unwrap();
        let loaded: BTreeMap<String, usize> = read_json(&path).unwrap();
        assert_eq!(obj, loaded);
        fs_err::remove_dir_all(dir).unwrap();
    }
}
