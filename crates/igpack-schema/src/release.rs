use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The closed set of FHIR specification version bands igpack understands.
///
/// A target version string like "4.0.1" maps to exactly one band, and each
/// band maps deterministically to the id of the core specification package
/// that seeds every resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FhirRelease {
    Dstu3,
    R4,
    R4B,
    R5,
}

impl FhirRelease {
    /// Map a version string to its band by major.minor prefix.
    /// Returns `None` for versions outside the supported set.
    pub fn from_version(version: &str) -> Option<Self> {
        let band = match version.split('.').take(2).collect::<Vec<_>>()[..] {
            ["3", "0"] => Self::Dstu3,
            ["4", "0"] => Self::R4,
            ["4", "3"] => Self::R4B,
            ["5", "0"] => Self::R5,
            _ => return None,
        };
        Some(band)
    }

    /// The canonical id of the core specification package for this band.
    pub fn core_package_id(self) -> &'static str {
        match self {
            Self::Dstu3 => "hl7.fhir.dstu3.core",
            Self::R4 => "hl7.fhir.r4.core",
            Self::R4B => "hl7.fhir.r4b.core",
            Self::R5 => "hl7.fhir.r5.core",
        }
    }
}

impl fmt::Display for FhirRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dstu3 => "DSTU3",
            Self::R4 => "R4",
            Self::R4B => "R4B",
            Self::R5 => "R5",
        };
        f.write_str(s)
    }
}

/// Compare two dotted version strings segment by segment.
///
/// Segments that both parse as integers compare numerically, otherwise
/// lexically; a missing segment sorts before a present one ("1.0" < "1.0.1").
/// Used for the highest-version fallback in artifact lookups — this is not a
/// semver implementation and does not interpret pre-release tags.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(n), Ok(m)) => n.cmp(&m),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
