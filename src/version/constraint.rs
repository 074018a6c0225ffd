//! Version constraints
//!
//! A constraint is owned by an extension dependency and decides which
//! versions may satisfy it. A bare version in metadata is a recommendation:
//! any installed version at least as recent satisfies it, which is why bare
//! strings parse as `AtLeast`.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ExtmanError, Result};
use crate::version::Version;

/// A range/equality expression over versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// Satisfied by any version.
    Any,
    /// Satisfied only by an equal version.
    Exact(Version),
    /// Satisfied by any version greater than or equal to the bound.
    AtLeast(Version),
}

impl VersionConstraint {
    /// Parse a constraint from its string form.
    ///
    /// `*` or the empty string mean any version, `=X` an exact match, and
    /// `>=X` or a bare `X` a lower bound.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        if trimmed.is_empty() || trimmed == "*" {
            return Ok(VersionConstraint::Any);
        }

        if let Some(rest) = trimmed.strip_prefix(">=") {
            let rest = rest.trim();
            if rest.is_empty() {
                return Err(ExtmanError::InvalidVersionConstraint {
                    input: input.to_string(),
                });
            }
            return Ok(VersionConstraint::AtLeast(Version::new(rest)));
        }

        if let Some(rest) = trimmed.strip_prefix('=') {
            let rest = rest.trim();
            if rest.is_empty() {
                return Err(ExtmanError::InvalidVersionConstraint {
                    input: input.to_string(),
                });
            }
            return Ok(VersionConstraint::Exact(Version::new(rest)));
        }

        if trimmed.starts_with(|c: char| !c.is_ascii_alphanumeric()) {
            return Err(ExtmanError::InvalidVersionConstraint {
                input: input.to_string(),
            });
        }

        Ok(VersionConstraint::AtLeast(Version::new(trimmed)))
    }

    /// Build an exact constraint for a known version.
    pub fn exact(version: Version) -> Self {
        VersionConstraint::Exact(version)
    }

    /// Whether the given version satisfies this constraint.
    pub fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionConstraint::Any => true,
            VersionConstraint::Exact(bound) => version.compare_to(bound) == 0,
            VersionConstraint::AtLeast(bound) => version.compare_to(bound) >= 0,
        }
    }

    /// Merge two constraints into the strongest compatible combination.
    ///
    /// Fails with `ConstraintConflict` when no version could satisfy both,
    /// e.g. two different exact pins.
    pub fn merge(&self, other: &VersionConstraint, name: &str) -> Result<VersionConstraint> {
        let conflict = || ExtmanError::ConstraintConflict {
            name: name.to_string(),
            existing: self.to_string(),
            requested: other.to_string(),
        };

        let merged = match (self, other) {
            (VersionConstraint::Any, c) | (c, VersionConstraint::Any) => c.clone(),
            (VersionConstraint::Exact(a), VersionConstraint::Exact(b)) => {
                if a == b {
                    VersionConstraint::Exact(a.clone())
                } else {
                    return Err(conflict());
                }
            }
            (VersionConstraint::Exact(pin), VersionConstraint::AtLeast(bound))
            | (VersionConstraint::AtLeast(bound), VersionConstraint::Exact(pin)) => {
                if pin.compare_to(bound) >= 0 {
                    VersionConstraint::Exact(pin.clone())
                } else {
                    return Err(conflict());
                }
            }
            (VersionConstraint::AtLeast(a), VersionConstraint::AtLeast(b)) => {
                VersionConstraint::AtLeast(a.clone().max(b.clone()))
            }
        };

        Ok(merged)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Any => f.write_str("*"),
            VersionConstraint::Exact(v) => write!(f, "={v}"),
            VersionConstraint::AtLeast(v) => write!(f, ">={v}"),
        }
    }
}

impl Serialize for VersionConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VersionConstraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        VersionConstraint::parse(&raw).map_err(D::Error::custom)
    }
}
