//! npm registry wire types
//!
//! Only the fields of the abbreviated install document that burr reads are
//! modelled; everything else in the payload is ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Package document returned by `GET <registry>/<name>`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageDocument {
    /// Package name
    pub name: String,
    /// Tag to version map (`latest`, `next`, ...)
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
    /// Every published version keyed by its version string
    #[serde(default)]
    pub versions: HashMap<String, VersionDocument>,
}

/// One published version
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionDocument {
    /// Version string
    #[serde(default)]
    pub version: String,
    /// Runtime dependencies
    #[serde(default)]
    pub dependencies: Option<HashMap<String, String>>,
    /// Distribution information
    pub dist: DistInfo,
}

/// Distribution information for a package tarball
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistInfo {
    /// Tarball download URL
    pub tarball: String,
    /// SHA-1 checksum
    #[serde(default)]
    pub shasum: Option<String>,
    /// Subresource integrity string
    #[serde(default)]
    pub integrity: Option<String>,
}
