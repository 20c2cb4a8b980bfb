//! Source classification and URL normalization — §4.3 preflight steps 1-2.
//!
//! Only the YouTube family is recognized today; everything else is
//! `Unclassified`. Different URL forms that share a video id normalize to
//! the same canonical URL (§8 round-trip law).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Source;

static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^https?://
        (?:www\.|m\.)?
        (?:
            youtube\.com/(?:watch\?(?:.*&)?v=|embed/|v/|shorts/)(?P<id1>[A-Za-z0-9_-]{11})
            |
            youtu\.be/(?P<id2>[A-Za-z0-9_-]{11})
        )
        ",
    )
    .expect("static youtube regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unclassified;

/// Classify `url` and return its canonical, normalized form.
///
/// `normalize(normalize(url)) == normalize(url)` and two URLs sharing the
/// same extracted video id always normalize identically.
pub fn classify_and_normalize(url: &str) -> Result<(Source, String), Unclassified> {
    if let Some(caps) = YOUTUBE_RE.captures(url) {
        let id = caps
            .name("id1")
            .or_else(|| caps.name("id2"))
            .expect("one alternative always matches when the regex matches")
            .as_str();
        return Ok((Source::Youtube, format!("https://www.youtube.com/watch?v={id}")));
    }

    Err(Unclassified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_short_url() {
        let (source, normalized) =
            classify_and_normalize("https://youtu.be/2AB3_l0iqSk?si=x").unwrap();
        assert_eq!(source, Source::Youtube);
        assert_eq!(normalized, "https://www.youtube.com/watch?v=2AB3_l0iqSk");
    }

    #[test]
    fn different_forms_same_id_normalize_identically() {
        let forms = [
            "https://www.youtube.com/watch?v=2AB3_l0iqSk",
            "https://youtu.be/2AB3_l0iqSk",
            "https://www.youtube.com/embed/2AB3_l0iqSk",
            "https://m.youtube.com/shorts/2AB3_l0iqSk",
            "https://www.youtube.com/watch?list=PL123&v=2AB3_l0iqSk",
        ];
        let normalized: Vec<_> = forms
            .iter()
            .map(|u| classify_and_normalize(u).unwrap().1)
            .collect();
        assert!(normalized.iter().all(|n| n == &normalized[0]));
    }

    #[test]
    fn normalize_is_idempotent() {
        let (_, once) = classify_and_normalize("https://youtu.be/2AB3_l0iqSk").unwrap();
        let (_, twice) = classify_and_normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_source_is_unclassified() {
        assert!(classify_and_normalize("https://you.be/xxx").is_err());
        assert!(classify_and_normalize("https://example.com/video.mp4").is_err());
    }
}
