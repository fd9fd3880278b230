// Platform table and URL detection
//
// Patterns are anchored on the host part of the URL so that a platform
// never matches another site whose name merely ends with the same letters
// (e.g. `netflix.com` vs `x.com`). The table order is the documented
// tie-break when more than one pattern could match.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::format_selector::DurationStyle;

/// Symbolic identity of a supported platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    YouTube,
    TikTok,
    Instagram,
    Facebook,
    Twitter,
    Reddit,
    Vimeo,
}

impl PlatformKind {
    pub const ALL: [PlatformKind; 7] = [
        Self::YouTube,
        Self::TikTok,
        Self::Instagram,
        Self::Facebook,
        Self::Twitter,
        Self::Reddit,
        Self::Vimeo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::TikTok => "TikTok",
            Self::Instagram => "Instagram",
            Self::Facebook => "Facebook",
            Self::Twitter => "Twitter",
            Self::Reddit => "Reddit",
            Self::Vimeo => "Vimeo",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A supported source platform
#[derive(Debug)]
pub struct Platform {
    pub kind: PlatformKind,
    pub pattern: Regex,
    pub duration_style: DurationStyle,
    /// Brand color, only used by the presentation layer
    pub color: &'static str,
    /// Icon name, only used by the presentation layer
    pub icon: &'static str,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// Look a platform up by its symbolic name (case-insensitive)
    pub fn by_name(name: &str) -> Option<&'static Platform> {
        PLATFORMS
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn by_kind(kind: PlatformKind) -> &'static Platform {
        // Every kind has exactly one table entry
        PLATFORMS
            .iter()
            .find(|p| p.kind == kind)
            .unwrap_or(&PLATFORMS[0])
    }

    /// All platforms in detection priority order
    pub fn all() -> &'static [Platform] {
        &PLATFORMS
    }
}

fn host_pattern(hosts: &str) -> Regex {
    // scheme optional, any number of subdomains, then one of `hosts`
    let pattern = format!(
        r"(?i)^(?:https?://)?(?:[a-z0-9-]+\.)*(?:{})(?::\d+)?(?:[/?#]|$)",
        hosts
    );
    Regex::new(&pattern).unwrap()
}

lazy_static::lazy_static! {
    static ref PLATFORMS: Vec<Platform> = vec![
        Platform {
            kind: PlatformKind::YouTube,
            pattern: host_pattern(r"youtube\.com|youtu\.be|youtube-nocookie\.com"),
            duration_style: DurationStyle::Long,
            color: "#FF0000",
            icon: "youtube",
        },
        Platform {
            kind: PlatformKind::TikTok,
            pattern: host_pattern(r"tiktok\.com"),
            duration_style: DurationStyle::Short,
            color: "#000000",
            icon: "tiktok",
        },
        Platform {
            kind: PlatformKind::Instagram,
            pattern: host_pattern(r"instagram\.com|instagr\.am"),
            duration_style: DurationStyle::Short,
            color: "#E4405F",
            icon: "instagram",
        },
        Platform {
            kind: PlatformKind::Facebook,
            pattern: host_pattern(r"facebook\.com|fb\.watch|fb\.com"),
            duration_style: DurationStyle::Long,
            color: "#1877F2",
            icon: "facebook",
        },
        Platform {
            kind: PlatformKind::Twitter,
            pattern: host_pattern(r"twitter\.com|x\.com"),
            duration_style: DurationStyle::Short,
            color: "#1DA1F2",
            icon: "twitter",
        },
        Platform {
            kind: PlatformKind::Reddit,
            pattern: host_pattern(r"reddit\.com|redd\.it"),
            duration_style: DurationStyle::Short,
            color: "#FF4500",
            icon: "reddit",
        },
        Platform {
            kind: PlatformKind::Vimeo,
            pattern: host_pattern(r"vimeo\.com"),
            duration_style: DurationStyle::Long,
            color: "#1AB7EA",
            icon: "vimeo",
        },
    ];
}

/// Find the platform a URL belongs to; first match in table order wins
pub fn detect(url: &str) -> Option<&'static Platform> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    PLATFORMS.iter().find(|p| p.matches(url))
}
