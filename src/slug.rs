// Slug normalization. Slugs are always the output of `slugify`, never raw
// caller input; callers fall back to `random_slug` when normalization
// produces an empty string.

use once_cell::sync::Lazy;
use rand::{distr::Alphanumeric, Rng};
use regex::Regex;

static QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]"#).unwrap());
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}\-_\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Normalize a title or explicit slug into a URL-safe label: lowercase,
/// quotes stripped, non-word characters dropped, whitespace collapsed to
/// single dashes, no leading or trailing dash. Idempotent.
pub fn slugify(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let unquoted = QUOTES.replace_all(&lowered, "");
    let filtered = DISALLOWED.replace_all(&unquoted, "");
    let dashed = WHITESPACE.replace_all(&filtered, "-");
    let collapsed = DASH_RUNS.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

/// Short random identifier used when a page has neither a usable slug nor a
/// usable title.
pub fn random_slug() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}
