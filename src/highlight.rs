use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Strings wrapped around each highlighted match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightMarker {
    pub open: String,
    pub close: String,
}

impl Default for HighlightMarker {
    fn default() -> Self {
        Self {
            open: "<mark>".into(),
            close: "</mark>".into(),
        }
    }
}

impl HighlightMarker {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Reverse video, for terminals.
    pub fn ansi() -> Self {
        Self::new("\u{1b}[7m", "\u{1b}[27m")
    }
}

/// Case-insensitive literal matcher for `query`. Pattern metacharacters are
/// escaped, so every query is valid.
pub fn build_literal_regex(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Wraps every non-overlapping match, leftmost first, in `marker`.
pub fn highlight(text: &str, regex: &Regex, marker: &HighlightMarker) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for found in regex.find_iter(text) {
        out.push_str(&text[last..found.start()]);
        out.push_str(&marker.open);
        out.push_str(found.as_str());
        out.push_str(&marker.close);
        last = found.end();
    }
    out.push_str(&text[last..]);
    out
}
