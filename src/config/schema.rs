//! Raw configuration schema, exactly as written in the YAML document.
//!
//! Nothing here is interpreted: composite keys stay strings and defaults are
//! only applied for omitted fields. [`super::canonical`] turns these values
//! into the domain types of [`super::model`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawConfig {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub spec: RawSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSpec {
    /// Default modules keyed by `"<name>/<flavor>"`.
    #[serde(default)]
    pub modules: BTreeMap<String, RawModule>,
    /// Default addons keyed by addon name.
    #[serde(default)]
    pub addons: BTreeMap<String, RawAddon>,
    #[serde(default)]
    pub groups: Vec<RawGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawModule {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAddon {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawGroup {
    pub name: String,
    #[serde(default)]
    pub clusters: Vec<RawCluster>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCluster {
    pub name: String,
    pub context: String,
    #[serde(default)]
    pub modules: BTreeMap<String, RawModule>,
    #[serde(default)]
    pub addons: BTreeMap<String, RawAddon>,
}
