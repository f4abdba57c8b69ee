use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("metric name is blank")]
pub struct BlankMetricName;

/// Name of a tracked rating dimension (e.g. `"intensity"`, `"anxiety"`).
///
/// Always trimmed and never blank, so a `MetricName` can be shown as a chart
/// title or column label as-is. Every record, series and chart refers to the
/// same handful of names, hence the shared `Arc<str>`. Maps keyed by
/// `MetricName` can be queried with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricName(Arc<str>);

impl MetricName {
    /// Trim `name`, rejecting it if nothing is left.
    pub fn new(name: &str) -> Result<Self, BlankMetricName> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BlankMetricName);
        }
        Ok(Self(Arc::from(name)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MetricName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for MetricName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Deref for MetricName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MetricName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MetricName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for MetricName {
    type Error = BlankMetricName;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl TryFrom<String> for MetricName {
    type Error = BlankMetricName;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(&name)
    }
}

impl FromStr for MetricName {
    type Err = BlankMetricName;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::new(name)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Serialized as a bare string; avoids serde's `rc` feature.
impl Serialize for MetricName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MetricName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::new(&name).map_err(D::Error::custom)
    }
}
