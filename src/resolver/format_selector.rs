// FormatSelector - unified option normalization and ranking
//
// Converts raw options from the extractors into the canonical, ranked
// `DownloadOption` list. Handles:
// - Quality ranking against a fixed table (unknown labels keep their order)
// - Deduplication by quality label (first one extracted wins)
// - Best audio stream selection (highest bitrate)
// - Size and duration display strings

use std::collections::HashSet;

use super::errors::ResolveError;
use super::models::{DownloadOption, MediaInfo, RawMedia, RawOption};
use super::platforms::Platform;

/// Known quality labels, best first
pub const QUALITY_RANK: [&str; 9] = [
    "2160p", "1440p", "1080p", "720p", "480p", "360p", "240p", "144p", "audio",
];

/// Duration shown for livestreams
pub const DURATION_LIVE: &str = "LIVE";
/// Duration shown when the upstream did not report one
pub const DURATION_UNKNOWN: &str = "--:--";

pub const DESCRIPTION_LIMIT: usize = 500;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// How a platform displays durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationStyle {
    /// HH:MM:SS
    Long,
    /// MM:SS, for short-form platforms
    Short,
}

/// Option normalizer with a deterministic quality order
pub struct FormatSelector;

impl FormatSelector {
    /// Position of a label in the rank table, `None` for unknown labels
    pub fn quality_rank(label: &str) -> Option<usize> {
        QUALITY_RANK.iter().position(|known| *known == label)
    }

    /// Drop options without a URL, keep the first option per label, then
    /// stable-sort by rank. Applying it twice gives the same result.
    pub fn rank_and_dedup(options: Vec<RawOption>) -> Vec<RawOption> {
        let mut seen = HashSet::new();
        let mut kept: Vec<RawOption> = options
            .into_iter()
            .filter(|o| !o.url.trim().is_empty())
            .filter(|o| seen.insert(o.quality.clone()))
            .collect();

        // sort_by_key is stable: unknown labels keep upstream order
        kept.sort_by_key(|o| Self::quality_rank(&o.quality).unwrap_or(QUALITY_RANK.len()));
        kept
    }

    /// Build the final, ranked option list
    pub fn build_download_options(options: Vec<RawOption>) -> Vec<DownloadOption> {
        Self::rank_and_dedup(options)
            .into_iter()
            .map(|o| DownloadOption {
                size: Self::format_size(o.size_bytes),
                quality: o.quality,
                format: o.format,
                url: o.url,
            })
            .collect()
    }

    /// Format file size for display; unknown sizes stay unknown
    pub fn format_size(bytes: Option<u64>) -> Option<String> {
        bytes
            .filter(|b| *b > 0)
            .map(|b| format!("{:.1} MB", b as f64 / BYTES_PER_MB))
    }

    /// Format a duration in seconds for display
    pub fn format_duration(seconds: Option<f64>, style: DurationStyle, is_live: bool) -> String {
        if is_live {
            return DURATION_LIVE.to_string();
        }

        let total = match seconds {
            Some(s) if s.is_finite() && s > 0.0 => s.round() as u64,
            _ => return DURATION_UNKNOWN.to_string(),
        };

        match style {
            DurationStyle::Long => format!(
                "{:02}:{:02}:{:02}",
                total / 3600,
                (total % 3600) / 60,
                total % 60
            ),
            DurationStyle::Short => format!("{:02}:{:02}", total / 60, total % 60),
        }
    }

    /// Pick the audio stream with the highest bitrate; ties keep the first
    pub fn best_audio<T, F>(candidates: &[T], bitrate: F) -> Option<&T>
    where
        F: Fn(&T) -> Option<f64>,
    {
        let mut best: Option<(&T, f64)> = None;
        for candidate in candidates {
            let rate = bitrate(candidate).unwrap_or(0.0);
            match best {
                Some((_, best_rate)) if rate <= best_rate => {}
                _ => best = Some((candidate, rate)),
            }
        }
        best.map(|(c, _)| c)
    }

    /// Label a video by its shorter edge, so vertical videos get "720p" too
    pub fn label_for_height(width: Option<u32>, height: Option<u32>) -> Option<String> {
        let edge = match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => w.min(h),
            (_, Some(h)) if h > 0 => h,
            _ => return None,
        };
        Some(format!("{}p", edge))
    }

    /// Strip frame-rate and HDR suffixes ("1080p60 HDR" -> "1080p")
    pub fn normalize_label(label: &str) -> String {
        let label = label.trim();
        if let Some(idx) = label.find('p') {
            let (digits, _) = label.split_at(idx);
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return format!("{}p", digits);
            }
        }
        label.to_string()
    }

    /// Extension token from a MIME type ("video/mp4; codecs=..." -> "mp4")
    pub fn ext_from_mime(mime: &str) -> String {
        let essence = mime.split(';').next().unwrap_or(mime).trim().to_lowercase();
        match essence.as_str() {
            "audio/mp4" => "m4a".to_string(),
            "audio/mpeg" => "mp3".to_string(),
            "application/x-mpegurl" | "application/vnd.apple.mpegurl" => "m3u8".to_string(),
            other => other
                .split('/')
                .nth(1)
                .filter(|s| !s.is_empty())
                .unwrap_or("mp4")
                .to_string(),
        }
    }

    /// Cut text to `limit` characters on a char boundary
    pub fn truncate(text: &str, limit: usize) -> String {
        if text.chars().count() <= limit {
            return text.to_string();
        }
        let mut cut: String = text.chars().take(limit).collect();
        cut.push('…');
        cut
    }

    /// Build the canonical record, or fail if nothing is downloadable
    pub fn finalize(
        platform: &Platform,
        source_url: &str,
        raw: RawMedia,
    ) -> Result<MediaInfo, ResolveError> {
        let download_options = Self::build_download_options(raw.options);
        if download_options.is_empty() {
            return Err(ResolveError::NoMediaFound(format!(
                "{} returned no downloadable streams",
                platform.name()
            )));
        }

        let non_empty = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(MediaInfo {
            title: non_empty(raw.title).unwrap_or_else(|| "Untitled".to_string()),
            thumbnail: non_empty(raw.thumbnail).unwrap_or_default(),
            duration: Some(Self::format_duration(
                raw.duration_seconds,
                platform.duration_style,
                raw.is_live,
            )),
            author: non_empty(raw.author).unwrap_or_else(|| "Unknown".to_string()),
            platform: platform.kind,
            url: non_empty(raw.canonical_url).unwrap_or_else(|| source_url.trim().to_string()),
            description: non_empty(raw.description).map(|d| Self::truncate(&d, DESCRIPTION_LIMIT)),
            download_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::platforms::PlatformKind;

    fn opt(quality: &str, url: &str) -> RawOption {
        RawOption::new(quality, "mp4", url)
    }

    fn labels(options: &[RawOption]) -> Vec<&str> {
        options.iter().map(|o| o.quality.as_str()).collect()
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FormatSelector::format_size(Some(5_242_880)), Some("5.0 MB".to_string()));
        assert_eq!(FormatSelector::format_size(Some(1_572_864)), Some("1.5 MB".to_string()));
        assert_eq!(FormatSelector::format_size(None), None);
        assert_eq!(FormatSelector::format_size(Some(0)), None);
    }

    #[test]
    fn test_format_duration_styles() {
        assert_eq!(
            FormatSelector::format_duration(Some(3725.0), DurationStyle::Long, false),
            "01:02:05"
        );
        assert_eq!(
            FormatSelector::format_duration(Some(65.0), DurationStyle::Short, false),
            "01:05"
        );
        assert_eq!(
            FormatSelector::format_duration(Some(3725.0), DurationStyle::Short, false),
            "62:05"
        );
    }

    #[test]
    fn test_format_duration_sentinels() {
        assert_eq!(
            FormatSelector::format_duration(Some(120.0), DurationStyle::Long, true),
            DURATION_LIVE
        );
        assert_eq!(
            FormatSelector::format_duration(None, DurationStyle::Long, false),
            DURATION_UNKNOWN
        );
        assert_eq!(
            FormatSelector::format_duration(Some(0.0), DurationStyle::Short, false),
            DURATION_UNKNOWN
        );
        assert_eq!(
            FormatSelector::format_duration(Some(-1.0), DurationStyle::Short, false),
            DURATION_UNKNOWN
        );
    }

    #[test]
    fn test_ranking_known_before_unknown() {
        let ranked = FormatSelector::rank_and_dedup(vec![
            opt("HD Video", "u1"),
            opt("audio", "u2"),
            opt("360p", "u3"),
            opt("Watermarked", "u4"),
            opt("1080p", "u5"),
            opt("HLS", "u6"),
        ]);
        assert_eq!(
            labels(&ranked),
            vec!["1080p", "360p", "audio", "HD Video", "Watermarked", "HLS"]
        );
    }

    #[test]
    fn test_dedup_keeps_first_extracted() {
        let ranked = FormatSelector::rank_and_dedup(vec![
            opt("720p", "muxed"),
            opt("1080p", "video-only"),
            opt("720p", "video-only-720"),
        ]);
        assert_eq!(labels(&ranked), vec!["1080p", "720p"]);
        assert_eq!(ranked[1].url, "muxed");
    }

    #[test]
    fn test_rank_and_dedup_is_idempotent() {
        let raw = vec![
            opt("Original", "a"),
            opt("480p", "b"),
            opt("480p", "c"),
            opt("2160p", "d"),
            opt("Photo 1", "e"),
            opt("audio", "f"),
        ];
        let once = FormatSelector::rank_and_dedup(raw);
        let twice = FormatSelector::rank_and_dedup(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_urls_are_dropped() {
        let ranked = FormatSelector::rank_and_dedup(vec![opt("1080p", ""), opt("1080p", "real")]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].url, "real");
    }

    #[test]
    fn test_best_audio_tie_keeps_first() {
        let streams = vec![("a", Some(128.0)), ("b", Some(160.0)), ("c", Some(160.0)), ("d", None)];
        let best = FormatSelector::best_audio(&streams, |s| s.1);
        assert_eq!(best.map(|s| s.0), Some("b"));

        let empty: Vec<(&str, Option<f64>)> = Vec::new();
        assert!(FormatSelector::best_audio(&empty, |s| s.1).is_none());
    }

    #[test]
    fn test_labels() {
        assert_eq!(FormatSelector::normalize_label("1080p60"), "1080p");
        assert_eq!(FormatSelector::normalize_label("2160p60 HDR"), "2160p");
        assert_eq!(FormatSelector::normalize_label("HD Video"), "HD Video");
        assert_eq!(
            FormatSelector::label_for_height(Some(720), Some(1280)),
            Some("720p".to_string())
        );
        assert_eq!(FormatSelector::label_for_height(None, Some(480)), Some("480p".to_string()));
        assert_eq!(FormatSelector::label_for_height(None, None), None);
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(FormatSelector::ext_from_mime("video/mp4; codecs=\"avc1\""), "mp4");
        assert_eq!(FormatSelector::ext_from_mime("audio/mp4"), "m4a");
        assert_eq!(FormatSelector::ext_from_mime("audio/webm"), "webm");
        assert_eq!(FormatSelector::ext_from_mime(""), "mp4");
    }

    #[test]
    fn test_finalize_fails_on_empty_options() {
        let platform = Platform::by_kind(PlatformKind::Vimeo);
        let err = FormatSelector::finalize(platform, "https://vimeo.com/1", RawMedia::default())
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoMediaFound(_)));
    }

    #[test]
    fn test_finalize_fills_defaults() {
        let platform = Platform::by_kind(PlatformKind::TikTok);
        let raw = RawMedia {
            title: Some("  ".to_string()),
            description: Some("x".repeat(DESCRIPTION_LIMIT + 50)),
            duration_seconds: Some(42.0),
            options: vec![opt("SD Video", "https://cdn/sd.mp4").with_size(Some(5_242_880))],
            ..Default::default()
        };
        let info = FormatSelector::finalize(platform, " https://www.tiktok.com/@a/video/1 ", raw)
            .unwrap();
        assert_eq!(info.title, "Untitled");
        assert_eq!(info.author, "Unknown");
        assert_eq!(info.thumbnail, "");
        assert_eq!(info.url, "https://www.tiktok.com/@a/video/1");
        assert_eq!(info.duration.as_deref(), Some("00:42"));
        assert_eq!(info.description.unwrap().chars().count(), DESCRIPTION_LIMIT + 1);
        assert_eq!(info.download_options[0].size.as_deref(), Some("5.0 MB"));
    }
}
