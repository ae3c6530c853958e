use serde::{Deserialize, Serialize};

/// The persisted link list together with the version it was read at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    pub version: u64,
    #[serde(rename = "imageLinks")]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Reachable,
    Unreachable(String),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCheck {
    pub url: String,
    pub status: LinkStatus,
}

impl LinkCheck {
    pub fn is_valid(&self) -> bool {
        self.status == LinkStatus::Reachable
    }
}

/// Drops the query string from a generated image URL. Signed URLs carry
/// short-lived parameters that should not be persisted.
pub fn strip_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_query_strings() {
        assert_eq!(strip_query("https://x/img.png?sig=1"), "https://x/img.png");
        assert_eq!(strip_query("https://x/img.png"), "https://x/img.png");
        assert_eq!(strip_query("https://x/img.png?a=1?b=2"), "https://x/img.png");
    }

    #[test]
    fn snapshot_uses_image_links_key() {
        let snapshot = LinkSnapshot {
            version: 2,
            links: vec!["b.png".into()],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json, serde_json::json!({"version": 2, "imageLinks": ["b.png"]}));
    }
}
