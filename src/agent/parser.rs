use serde::{Deserialize, Serialize};

pub const KEY_POINTS_MARKER: &str = "Key Points:";
const GIST_LABEL: &str = "Gist:";

/// Shown in place of bullets when the completion has no `Key Points:` section.
pub const KEY_POINTS_PLACEHOLDER: &str = "Key points could not be generated for this answer.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub gist: String,
    pub key_points: String,
    /// Set when the gist carries a provider error rather than an answer.
    #[serde(default)]
    pub failed: bool,
}

impl Explanation {
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            gist: format!("❌ Error: {}", message),
            key_points: String::new(),
            failed: true,
        }
    }

    /// The form stored in chat history.
    pub fn as_text(&self) -> String {
        if self.key_points.is_empty() {
            self.gist.clone()
        } else {
            format!("{}\n\n{}\n{}", self.gist, KEY_POINTS_MARKER, self.key_points)
        }
    }

    /// Individual bullets with their list markers removed.
    pub fn bullets(&self) -> Vec<&str> {
        self.key_points
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Splits a completion on the first `Key Points:` marker.
pub fn parse_explanation(text: &str) -> Explanation {
    match text.split_once(KEY_POINTS_MARKER) {
        Some((gist, key_points)) => {
            let gist = gist.trim();
            let gist = gist.strip_prefix(GIST_LABEL).unwrap_or(gist).trim();
            Explanation {
                gist: gist.to_string(),
                key_points: key_points.trim().to_string(),
                failed: false,
            }
        }
        None => Explanation {
            gist: text.trim().to_string(),
            key_points: KEY_POINTS_PLACEHOLDER.to_string(),
            failed: false,
        },
    }
}
