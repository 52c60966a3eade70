use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A performer and everything needed to put them on air.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DjRecord {
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub recording_path: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub rtmp_server: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub stream_key: Option<String>,
    /// Opaque value kept from the last live set; only echoed by live exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_live_resolution: Option<Value>,
}

impl DjRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_logo(&self) -> bool {
        self.logo_path.is_some()
    }

    pub fn has_recording(&self) -> bool {
        self.recording_path.is_some()
    }
}

/// A promotional video played between sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromoRecord {
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl PromoRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }

    pub fn has_recording(&self) -> bool {
        self.path.is_some()
    }
}

/// New values for the editable fields of a [`DjRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DjUpdate {
    pub name: String,
    pub logo_path: Option<String>,
    pub recording_path: Option<String>,
    pub rtmp_server: Option<String>,
    pub stream_key: Option<String>,
}

/// New values for the editable fields of a [`PromoRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromoUpdate {
    pub name: String,
    pub path: Option<String>,
}

/// On-disk shape of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub djs: Vec<DjRecord>,
    #[serde(default)]
    pub promos: Vec<PromoRecord>,
}

/// One row of the DJ listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DjRow {
    pub name: String,
    pub has_logo: bool,
    pub rtmp_server: Option<String>,
    pub has_recording: bool,
}

/// One row of the promo listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoRow {
    pub name: String,
    pub has_recording: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub djs: Vec<DjRow>,
    pub promos: Vec<PromoRow>,
}

/// Older ledgers store unset paths as `""`.
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
