//! Export records: ledger data merged with stream and probe metadata.

use serde::Serialize;
use serde_json::Value;

use crate::{
    config::StreamConfig,
    ledger::{DjRecord, PromoRecord},
    probe::{MediaProbe, Resolution},
    Result,
};

/// The document handed to the playout side, DJs and promos in lineup order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineupExport {
    pub djs: Vec<DjExport>,
    pub promos: Vec<PromoExport>,
}

impl LineupExport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DjExport {
    pub name: String,
    pub logo_path: Option<String>,
    #[serde(flatten)]
    pub source: DjSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vj: Option<String>,
}

/// Where a DJ's set comes from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DjSource {
    /// `resolution` and `url` are always written, even as `null`. The `url`
    /// key is what marks the entry live when the export is read back.
    Live {
        resolution: Option<Value>,
        url: Option<String>,
    },
    Recorded {
        #[serde(skip_serializing_if = "Option::is_none")]
        resolution: Option<Resolution>,
        recording_path: Option<String>,
    },
}

impl DjExport {
    pub fn is_live(&self) -> bool {
        matches!(self.source, DjSource::Live { .. })
    }

    pub fn stream_url(&self) -> Option<&str> {
        match &self.source {
            DjSource::Live { url, .. } => url.as_deref(),
            DjSource::Recorded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromoExport {
    pub name: String,
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

/// Builds export records using the stream settings and a media probe.
pub struct Exporter<'a> {
    stream: &'a StreamConfig,
    probe: &'a dyn MediaProbe,
}

impl<'a> Exporter<'a> {
    pub fn new(stream: &'a StreamConfig, probe: &'a dyn MediaProbe) -> Self {
        Self { stream, probe }
    }

    pub fn dj(&self, dj: &DjRecord, is_live: bool) -> DjExport {
        let source = if is_live {
            let url = self
                .stream
                .stream_url(dj.rtmp_server.as_deref(), dj.stream_key.as_deref());
            if url.is_none() {
                tracing::warn!(name = %dj.name, "live DJ has no RTMP server or stream key");
            }
            DjSource::Live {
                resolution: dj.last_live_resolution.clone(),
                url,
            }
        } else {
            DjSource::Recorded {
                resolution: self.probe_path(dj.recording_path.as_deref()),
                recording_path: dj.recording_path.clone(),
            }
        };

        DjExport {
            name: dj.name.clone(),
            logo_path: dj.logo_path.clone(),
            source,
            vj: None,
        }
    }

    pub fn promo(&self, promo: &PromoRecord) -> PromoExport {
        PromoExport {
            name: promo.name.clone(),
            path: promo.path.clone(),
            resolution: self.probe_path(promo.path.as_deref()),
        }
    }

    fn probe_path(&self, path: Option<&str>) -> Option<Resolution> {
        let path = path?;
        let resolution = self.probe.probe(path);
        if resolution.is_none() {
            tracing::debug!(path, "no video metadata available");
        }
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{NullProbe, StaticProbe};
    use serde_json::json;

    fn live_dj() -> DjRecord {
        DjRecord {
            rtmp_server: Some("us-east".into()),
            stream_key: Some("k1".into()),
            last_live_resolution: Some(json!([1280, 720])),
            ..DjRecord::new("alice")
        }
    }

    #[test]
    fn live_record_carries_url_and_stored_resolution() {
        let stream = StreamConfig::default();
        let exporter = Exporter::new(&stream, &NullProbe);
        let value = serde_json::to_value(exporter.dj(&live_dj(), true)).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "alice",
                "logo_path": null,
                "resolution": [1280, 720],
                "url": "rtmp://rtmp-us-east.anisonhijack.com/live/k1"
            })
        );
    }

    #[test]
    fn live_record_without_key_keeps_null_url() {
        let stream = StreamConfig::default();
        let exporter = Exporter::new(&stream, &NullProbe);
        let dj = DjRecord {
            stream_key: None,
            ..live_dj()
        };
        let export = exporter.dj(&dj, true);
        assert!(export.is_live());
        assert_eq!(export.stream_url(), None);

        let value = serde_json::to_value(export).unwrap();
        assert!(value.as_object().unwrap().contains_key("url"));
        assert!(value["url"].is_null());
    }

    #[test]
    fn live_record_without_stored_resolution_writes_null() {
        let stream = StreamConfig::default();
        let exporter = Exporter::new(&stream, &NullProbe);
        let dj = DjRecord {
            last_live_resolution: None,
            ..live_dj()
        };

        let value = serde_json::to_value(exporter.dj(&dj, true)).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "alice",
                "logo_path": null,
                "resolution": null,
                "url": "rtmp://rtmp-us-east.anisonhijack.com/live/k1"
            })
        );
    }

    #[test]
    fn vj_is_written_only_when_set() {
        let stream = StreamConfig::default();
        let exporter = Exporter::new(&stream, &NullProbe);
        let mut export = exporter.dj(&live_dj(), true);
        assert!(serde_json::to_value(&export).unwrap().get("vj").is_none());

        export.vj = Some("bob".into());
        assert_eq!(serde_json::to_value(&export).unwrap()["vj"], json!("bob"));
    }

    #[test]
    fn recorded_record_is_probed() {
        let stream = StreamConfig::default();
        let probe = StaticProbe::new().with("alice.mp4", Resolution(1920, 1080));
        let exporter = Exporter::new(&stream, &probe);
        let dj = DjRecord {
            recording_path: Some("alice.mp4".into()),
            ..live_dj()
        };

        let value = serde_json::to_value(exporter.dj(&dj, false)).unwrap();
        assert_eq!(value["resolution"], json!([1920, 1080]));
        assert_eq!(value["recording_path"], json!("alice.mp4"));
        assert!(value.get("url").is_none());
    }

    #[test]
    fn unreadable_media_omits_resolution() {
        let stream = StreamConfig::default();
        let exporter = Exporter::new(&stream, &NullProbe);
        let promo = PromoRecord {
            name: "ad1".into(),
            path: Some("missing.mp4".into()),
        };

        let value = serde_json::to_value(exporter.promo(&promo)).unwrap();
        assert_eq!(value, json!({ "name": "ad1", "path": "missing.mp4" }));

        let recorded = serde_json::to_value(exporter.dj(&DjRecord::new("bob"), false)).unwrap();
        assert_eq!(
            recorded,
            json!({ "name": "bob", "logo_path": null, "recording_path": null })
        );
    }
}
