use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Social platform a source URL belongs to.
///
/// Classification is a plain substring check on the input, not URL parsing:
/// exactly one variant holds for any string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    TikTok,
    Instagram,
    Unsupported,
}

impl Platform {
    /// Classify a source URL by host substring.
    pub fn classify(url: &str) -> Self {
        if url.contains("tiktok.com") {
            Platform::TikTok
        } else if url.contains("instagram.com") {
            Platform::Instagram
        } else {
            Platform::Unsupported
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Platform::Unsupported)
    }

    /// Human-readable title used when a provider returns none.
    pub fn placeholder_title(&self) -> String {
        format!("{} video", self.display_name())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Unsupported => "Unsupported",
        }
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiktok" => Ok(Platform::TikTok),
            "instagram" => Ok(Platform::Instagram),
            _ => Err(anyhow::anyhow!("Invalid platform: {}", s)),
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Platform::TikTok => write!(f, "tiktok"),
            Platform::Instagram => write!(f, "instagram"),
            Platform::Unsupported => write!(f, "unsupported"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tiktok() {
        assert_eq!(
            Platform::classify("https://www.tiktok.com/@user/video/123"),
            Platform::TikTok
        );
        assert_eq!(
            Platform::classify("https://vm.tiktok.com/ZMabc/"),
            Platform::TikTok
        );
    }

    #[test]
    fn test_classify_instagram() {
        assert_eq!(
            Platform::classify("https://www.instagram.com/reel/Cabc/"),
            Platform::Instagram
        );
    }

    #[test]
    fn test_classify_unsupported() {
        assert_eq!(Platform::classify("https://example.com/x"), Platform::Unsupported);
        assert_eq!(Platform::classify(""), Platform::Unsupported);
    }

    #[test]
    fn test_classification_is_substring_based() {
        // No URL parsing: the substring anywhere wins, TikTok checked first.
        assert_eq!(
            Platform::classify("https://example.com/?next=instagram.com"),
            Platform::Instagram
        );
        assert_eq!(
            Platform::classify("tiktok.com instagram.com"),
            Platform::TikTok
        );
    }

    #[test]
    fn test_placeholder_title() {
        assert_eq!(Platform::TikTok.placeholder_title(), "TikTok video");
        assert_eq!(Platform::Instagram.placeholder_title(), "Instagram video");
    }

    #[test]
    fn test_from_str_rejects_unsupported() {
        assert_eq!("TikTok".parse::<Platform>().unwrap(), Platform::TikTok);
        assert!("unsupported".parse::<Platform>().is_err());
    }
}
