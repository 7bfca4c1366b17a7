use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::variables::Variables;

static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$([A-Za-z_][\w ]*)\$|\[([^\[\]]+)\]").expect("valid placeholder pattern")
});

pub const UNKNOWN_VALUE: &str = "Unknown";

/// Replace `$Name$` and legacy `[Name]` placeholders with variable values.
/// Substituted values are never scanned again.
pub fn interpolate(text: &str, variables: &Variables) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str().trim());
            variables.get(name).unwrap_or(UNKNOWN_VALUE).to_string()
        })
        .into_owned()
}
