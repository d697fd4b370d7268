//! Configuration document loading
//!
//! The document is first read as an ordered list of top-level `(key, value)`
//! entries rather than a mapping, so duplicate keys survive parsing and the
//! loader decides what to do with them instead of inheriting whatever a YAML
//! library happens to do. Policy [`DuplicateKeys::Deny`] turns any duplicated
//! top-level key into a hard error; [`DuplicateKeys::LastWins`] merges the
//! entries in document order and reports every override.

use serde::Deserialize;
use serde::de::{MapAccess, Visitor};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::{AppConfig, validate};
use crate::error::{ConfigError, Result};

/// Top-level keys the schema knows about. Anything else is carried through
/// with a warning rather than rejected.
const KNOWN_KEYS: &[&str] = &[
    "market_data",
    "fundamental_data",
    "news_data",
    "symbols",
    "analysis",
    "recommendations",
    "risk_management",
    "reporting",
    "logging",
    "api_keys",
    "gui",
];

/// How to resolve duplicated top-level keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeys {
    /// Fail loading, naming every duplicated key
    #[default]
    Deny,
    /// Keep the last occurrence of each key, warning per override
    LastWins,
}

/// Result of a successful load
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// The merged, validated, normalized configuration
    pub config: AppConfig,
    /// Top-level keys whose earlier occurrences were discarded (LastWins only)
    pub overridden: Vec<String>,
    /// Top-level keys the schema does not know about
    pub unknown: Vec<String>,
}

/// The document as an ordered entry list, duplicates preserved
struct RawDocument {
    entries: Vec<(String, Value)>,
}

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DocVisitor;

        impl<'de> Visitor<'de> for DocVisitor {
            type Value = RawDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping at the document root")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(RawDocument { entries })
            }

            // Empty file parses as null
            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(RawDocument {
                    entries: Vec::new(),
                })
            }
        }

        deserializer.deserialize_any(DocVisitor)
    }
}

/// Load and validate a configuration file
pub fn load_path(path: impl AsRef<Path>, policy: DuplicateKeys) -> Result<LoadOutcome> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loading configuration");
    load_str(&text, policy)
}

/// Load and validate a configuration document from a string
pub fn load_str(document: &str, policy: DuplicateKeys) -> Result<LoadOutcome> {
    let raw: RawDocument = serde_yaml::from_str(document)?;

    if raw.entries.is_empty() {
        tracing::warn!("empty configuration document, using defaults");
        return Ok(LoadOutcome {
            config: AppConfig::default(),
            overridden: Vec::new(),
            unknown: Vec::new(),
        });
    }

    let (mapping, overridden) = merge_entries(raw.entries, policy)?;

    let unknown: Vec<String> = mapping
        .keys()
        .filter_map(Value::as_str)
        .filter(|k| !KNOWN_KEYS.contains(k))
        .map(ToString::to_string)
        .collect();
    for key in &unknown {
        tracing::warn!(key = %key, "unknown top-level configuration key");
    }

    let mut config: AppConfig = serde_yaml::from_value(Value::Mapping(mapping))?;
    config.normalize();

    let problems = validate::check(&config);
    if !problems.is_empty() {
        return Err(ConfigError::Validation { problems });
    }
    config.recommendations.normalize();

    Ok(LoadOutcome {
        config,
        overridden,
        unknown,
    })
}

/// Merge ordered entries into a single mapping according to the policy
fn merge_entries(
    entries: Vec<(String, Value)>,
    policy: DuplicateKeys,
) -> Result<(Mapping, Vec<String>)> {
    match policy {
        DuplicateKeys::Deny => {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for (key, _) in &entries {
                *counts.entry(key.as_str()).or_default() += 1;
            }
            // preserve first-occurrence order in the error
            let mut duplicated = Vec::new();
            for (key, _) in &entries {
                if counts[key.as_str()] > 1 && !duplicated.contains(key) {
                    duplicated.push(key.clone());
                }
            }
            if !duplicated.is_empty() {
                return Err(ConfigError::DuplicateKeys { keys: duplicated });
            }

            let mut mapping = Mapping::new();
            for (key, value) in entries {
                mapping.insert(Value::String(key), value);
            }
            Ok((mapping, Vec::new()))
        }
        DuplicateKeys::LastWins => {
            let mut mapping = Mapping::new();
            let mut overridden = Vec::new();
            for (key, value) in entries {
                if mapping.insert(Value::String(key.clone()), value).is_some() {
                    tracing::warn!(
                        key = %key,
                        "duplicate top-level key, later occurrence replaces the earlier one"
                    );
                    if !overridden.contains(&key) {
                        overridden.push(key);
                    }
                }
            }
            Ok((mapping, overridden))
        }
    }
}
