//! Package identities.

use crate::error::{BurrError, BurrResult};
use crate::types::version::{Range, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_NAME_LENGTH: usize = 214;

/// A requested package: `name` or `name@range`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    pub name: String,
    pub range: Range,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, range: Range) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    /// Parse `name[@range]`; a missing range means any version
    pub fn parse(input: &str) -> BurrResult<Self> {
        let spec = input.trim();
        let invalid = |reason: &str| BurrError::InvalidPackageSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        if spec.starts_with('@') {
            return Err(invalid("scoped package names are not supported"));
        }

        let (name, range) = match spec.split_once('@') {
            Some((name, range)) => (name, range),
            None => (spec, ""),
        };
        validate_name(name).map_err(invalid)?;

        let range = Range::parse(range)?;
        Ok(Self::new(name, range))
    }
}

/// Check an unscoped npm package name; the name must be usable as one directory
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("package name is empty");
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err("package name is longer than 214 characters");
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err("package name cannot start with '.' or '_'");
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '@'))
    {
        return Err("package name contains an invalid character");
    }
    Ok(())
}

impl FromStr for PackageSpec {
    type Err = BurrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageSpec::parse(s)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.range.is_any() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.range)
        }
    }
}

/// One concrete package version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId {
    pub name: String,
    pub version: Version,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A package chosen by resolution, ready to be installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: Version,
    pub tarball_url: String,
}

impl ResolvedPackage {
    pub fn id(&self) -> PackageId {
        PackageId::new(self.name.clone(), self.version.clone())
    }
}

impl fmt::Display for ResolvedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let spec = PackageSpec::parse("left-pad").unwrap();
        assert_eq!(spec.name, "left-pad");
        assert!(spec.range.is_any());
        assert_eq!(spec.to_string(), "left-pad");
    }

    #[test]
    fn test_parse_with_range() {
        let spec: PackageSpec = "left-pad@^1.3.0".parse().unwrap();
        assert_eq!(spec.name, "left-pad");
        assert_eq!(spec.range.as_str(), "^1.3.0");
        assert!(spec.range.matches(&Version::new(1, 3, 5)));
        assert_eq!(spec.to_string(), "left-pad@^1.3.0");

        let empty_range = PackageSpec::parse("left-pad@").unwrap();
        assert!(empty_range.range.is_any());
    }

    #[test]
    fn test_parse_rejects_bad_specs() {
        for input in ["", "@scope/pkg", ".hidden", "has space", "a/b", "pkg@^^1"] {
            let result = PackageSpec::parse(input);
            assert!(result.is_err(), "{input:?} should be rejected");
        }

        assert!(matches!(
            PackageSpec::parse("pkg@banana"),
            Err(BurrError::InvalidRange { .. })
        ));
        assert!(matches!(
            PackageSpec::parse("@types/node"),
            Err(BurrError::InvalidPackageSpec { .. })
        ));
    }

    #[test]
    fn test_validate_name_rejects_path_like_names() {
        assert!(validate_name("left-pad").is_ok());
        for name in ["x/..", "../evil", "..", ".", "a\\b", ""] {
            assert!(validate_name(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_package_id_ordering() {
        let a = PackageId::new("left", Version::new(1, 0, 0));
        let b = PackageId::new("left", Version::new(1, 10, 0));
        let c = PackageId::new("right", Version::new(0, 1, 0));
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b.to_string(), "left@1.10.0");
    }

    #[test]
    fn test_resolved_package_id() {
        let resolved = ResolvedPackage {
            name: "left".to_string(),
            version: Version::new(2, 1, 0),
            tarball_url: "https://registry.example/left/-/left-2.1.0.tgz".to_string(),
        };
        assert_eq!(resolved.id(), PackageId::new("left", Version::new(2, 1, 0)));
        assert_eq!(resolved.to_string(), "left@2.1.0");
    }
}
