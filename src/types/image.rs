//! Generated image payloads and provenance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Image generation tier, in default fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Paid, credentialed text-to-image model
    Premium,
    /// Free public text-to-image endpoint
    Free,
    /// Plain node/edge diagram rendered from the graph itself
    Structural,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Premium, Tier::Free, Tier::Structural];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Premium => write!(f, "premium"),
            Tier::Free => write!(f, "free"),
            Tier::Structural => write!(f, "structural"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "premium" | "imagen" => Ok(Tier::Premium),
            "free" | "pollinations" => Ok(Tier::Free),
            "structural" | "mermaid" => Ok(Tier::Structural),
            _ => Err(format!(
                "Unknown tier: {}. Valid values: premium, free, structural",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Svg,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 4] = [
        ImageFormat::Png,
        ImageFormat::Jpeg,
        ImageFormat::Webp,
        ImageFormat::Svg,
    ];

    /// Detect the format from magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            return Some(Self::Png);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            return Some(Self::Webp);
        }
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
        let head = head.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
            return Some(Self::Svg);
        }
        None
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A finished hero image, tagged with the tier that produced it
#[derive(Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub tier: Tier,
    pub provider: String,
    /// Remote location when the provider serves the image by URL
    pub url: Option<String>,
}

impl GeneratedImage {
    pub fn new(bytes: Vec<u8>, format: ImageFormat, tier: Tier, provider: &str) -> Self {
        Self {
            bytes,
            format,
            tier,
            provider: provider.to_string(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("format", &self.format)
            .field("tier", &self.tier)
            .field("provider", &self.provider)
            .field("url", &self.url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_formats() {
        assert_eq!(
            ImageFormat::sniff(b"\x89PNG\r\n\x1a\n0000"),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::sniff(b"RIFF\x00\x00\x00\x00WEBPVP8 "),
            Some(ImageFormat::Webp)
        );
        assert_eq!(
            ImageFormat::sniff(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"\"/>"),
            Some(ImageFormat::Svg)
        );
        assert_eq!(ImageFormat::sniff(b"<html>error</html>"), None);
    }

    #[test]
    fn test_tier_from_str_accepts_provider_names() {
        assert_eq!("imagen".parse::<Tier>(), Ok(Tier::Premium));
        assert_eq!("FREE".parse::<Tier>(), Ok(Tier::Free));
        assert_eq!("mermaid".parse::<Tier>(), Ok(Tier::Structural));
        assert!("dalle".parse::<Tier>().is_err());
    }
}
