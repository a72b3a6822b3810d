//! Media asset references.

use montage_core::config::MediaConfig;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in a path component.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Builds asset URLs from the delivery base, project id and filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocator {
    base_url: String,
    project_id: String,
}

impl MediaLocator {
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.into(),
        }
    }

    pub fn from_config(config: &MediaConfig, project_id: impl Into<String>) -> Self {
        Self::new(config.base_url.clone(), project_id)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// URL of `filename` within the project.
    pub fn locate(&self, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            utf8_percent_encode(&self.project_id, COMPONENT),
            utf8_percent_encode(filename, COMPONENT),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_plain() {
        let locator = MediaLocator::new("https://cdn.example.com/media/", "p1");
        assert_eq!(locator.locate("clip.mp4"), "https://cdn.example.com/media/p1/clip.mp4");
    }

    #[test]
    fn test_locate_escapes_filename() {
        let locator = MediaLocator::new("https://cdn.example.com", "p1");
        assert_eq!(
            locator.locate("my clip #2 (final).mp4"),
            "https://cdn.example.com/p1/my%20clip%20%232%20%28final%29.mp4"
        );
        assert_eq!(locator.locate("a/b.png"), "https://cdn.example.com/p1/a%2Fb.png");
    }

    #[test]
    fn test_locate_unicode() {
        let locator = MediaLocator::new("https://cdn.example.com", "p1");
        assert_eq!(locator.locate("é.png"), "https://cdn.example.com/p1/%C3%A9.png");
    }

    #[test]
    fn test_from_config() {
        let config = MediaConfig {
            base_url: "https://media.test".to_string(),
        };
        let locator = MediaLocator::from_config(&config, "proj 9");
        assert_eq!(locator.project_id(), "proj 9");
        assert_eq!(locator.locate("x.wav"), "https://media.test/proj%209/x.wav");
    }
}
