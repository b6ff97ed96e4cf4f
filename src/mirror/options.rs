//! Declarative safe configuration and fetch options

use serde::{Deserialize, Serialize};

/// Where `fetch` reads from
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    /// The local slot
    Safe,
    /// The remote source (the default when unset)
    Remote,
}

/// Options for a mirrored instance
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeOptions {
    /// Pull persisted data into the instance while it is being constructed
    #[serde(default)]
    pub reload: bool,
    /// `Some(FetchSource::Safe)` makes `fetch` read the slot unless the call
    /// asks for `Remote`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<FetchSource>,
}

impl SafeOptions {
    /// Options used when a class declares a safe without any options
    pub fn reloading() -> Self {
        Self {
            reload: true,
            from: None,
        }
    }

    pub fn serves_fetch(&self) -> bool {
        self.from == Some(FetchSource::Safe)
    }
}

/// The `safe` entry of a class declaration.
///
/// Either a bare storage key:
///
/// ```toml
/// safe = "todos"
/// ```
///
/// or a key with options:
///
/// ```toml
/// [safe]
/// key = "todos"
/// options = { reload = false, from = "safe" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SafeConfig {
    Key(String),
    Detailed {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<SafeOptions>,
    },
}

impl SafeConfig {
    pub fn key(&self) -> &str {
        match self {
            SafeConfig::Key(key) => key,
            SafeConfig::Detailed { key, .. } => key,
        }
    }

    /// Effective options. A missing `options` table means `{ reload: true }`;
    /// a present table is taken as written.
    pub fn options(&self) -> SafeOptions {
        match self {
            SafeConfig::Detailed {
                options: Some(options),
                ..
            } => options.clone(),
            _ => SafeOptions::reloading(),
        }
    }
}

impl From<&str> for SafeConfig {
    fn from(key: &str) -> Self {
        SafeConfig::Key(key.to_string())
    }
}

impl From<String> for SafeConfig {
    fn from(key: String) -> Self {
        SafeConfig::Key(key)
    }
}

/// Options for a single `fetch` call
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<FetchSource>,
    /// Overrides the instance url for this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Record sets only: replace contents instead of merging
    #[serde(default)]
    pub reset: bool,
}

impl FetchOptions {
    pub fn from_safe() -> Self {
        Self {
            from: Some(FetchSource::Safe),
            ..Self::default()
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}
