use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a scene entity (marker or disaster area).
///
/// Upstream feeds use either integers or strings; the two are never equal to
/// each other, so `1` and `"1"` name different entities.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverlayId {
    Int(i64),
    Text(String),
}

impl From<i64> for OverlayId {
    fn from(v: i64) -> Self {
        OverlayId::Int(v)
    }
}

impl From<&str> for OverlayId {
    fn from(v: &str) -> Self {
        OverlayId::Text(v.to_string())
    }
}

impl From<String> for OverlayId {
    fn from(v: String) -> Self {
        OverlayId::Text(v)
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayId::Int(v) => write!(f, "{v}"),
            OverlayId::Text(v) => f.write_str(v),
        }
    }
}
