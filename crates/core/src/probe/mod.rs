//! Video dimension probing.
//!
//! Export asks a [`MediaProbe`] for the pixel size of pre-recorded sets and
//! promo videos. A file that cannot be opened is never an error, the probe
//! just has nothing to report.

use std::collections::HashMap;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::config::ProbeConfig;

/// Pixel dimensions of a video, serialized as `[width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution(pub u32, pub u32);

impl Resolution {
    pub fn width(&self) -> u32 {
        self.0
    }

    pub fn height(&self) -> u32 {
        self.1
    }
}

/// Reports the dimensions of the video at `path`, or `None` when the path
/// cannot be opened as a video.
pub trait MediaProbe {
    fn probe(&self, path: &str) -> Option<Resolution>;
}

/// Probe that shells out to `ffprobe` and reads the first video stream.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: String,
}

impl FfprobeProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            binary: config.ffprobe.clone(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new(&ProbeConfig::default())
    }
}

impl MediaProbe for FfprobeProbe {
    fn probe(&self, path: &str) -> Option<Resolution> {
        if path.is_empty() {
            return None;
        }

        let output = match Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(binary = %self.binary, %err, "failed to run ffprobe");
                return None;
            }
        };

        if !output.status.success() {
            tracing::debug!(path, status = ?output.status.code(), "ffprobe could not open file");
            return None;
        }

        let resolution = parse_ffprobe_output(&output.stdout);
        if resolution.is_none() {
            tracing::debug!(path, "ffprobe reported no video stream");
        }
        resolution
    }
}

fn parse_ffprobe_output(stdout: &[u8]) -> Option<Resolution> {
    let data: serde_json::Value = serde_json::from_slice(stdout).ok()?;
    let stream = data.get("streams")?.as_array()?.first()?;
    let width = stream.get("width")?.as_u64()?;
    let height = stream.get("height")?.as_u64()?;
    Some(Resolution(
        u32::try_from(width).ok()?,
        u32::try_from(height).ok()?,
    ))
}

/// Probe that never finds anything, for exports without media access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl MediaProbe for NullProbe {
    fn probe(&self, _path: &str) -> Option<Resolution> {
        None
    }
}

/// Probe answering from a fixed table of paths.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    known: HashMap<String, Resolution>,
}

impl StaticProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, resolution: Resolution) -> Self {
        self.known.insert(path.into(), resolution);
        self
    }
}

impl MediaProbe for StaticProbe {
    fn probe(&self, path: &str) -> Option<Resolution> {
        self.known.get(path).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_video_stream() {
        let stdout = br#"{ "programs": [], "streams": [ { "width": 1920, "height": 1080 } ] }"#;
        assert_eq!(parse_ffprobe_output(stdout), Some(Resolution(1920, 1080)));
    }

    #[test]
    fn empty_stream_list_reports_nothing() {
        assert_eq!(parse_ffprobe_output(br#"{ "streams": [] }"#), None);
        assert_eq!(parse_ffprobe_output(b"not json"), None);
    }

    #[test]
    fn missing_binary_is_absorbed() {
        let probe = FfprobeProbe::new(&ProbeConfig {
            ffprobe: "definitely-not-an-ffprobe-binary".into(),
        });
        assert_eq!(probe.probe("clip.mp4"), None);
        assert_eq!(probe.probe(""), None);
    }

    #[test]
    fn resolution_serializes_as_pair() {
        let json = serde_json::to_string(&Resolution(1280, 720)).unwrap();
        assert_eq!(json, "[1280,720]");
    }

    #[test]
    fn static_probe_answers_known_paths() {
        let probe = StaticProbe::new().with("ad1.mp4", Resolution(1920, 1080));
        assert_eq!(probe.probe("ad1.mp4").map(|r| r.width()), Some(1920));
        assert_eq!(probe.probe("other.mp4"), None);
    }
}
