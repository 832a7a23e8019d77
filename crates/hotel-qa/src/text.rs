//! Text helpers shared by the engine, parsers and presenter.

use regex::Regex;

/// Case-insensitive whole-word matcher, so `man` matches "isle of man" but
/// not "germany".
#[derive(Debug, Clone)]
pub struct WordMatcher {
    needle: String,
    pattern: Option<Regex>,
}

impl WordMatcher {
    /// Returns `None` for a blank needle, meaning "no filter".
    pub fn new(needle: &str) -> Option<Self> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let pattern = match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&needle))) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(needle = %needle, error = %e, "Word pattern rejected, using substring match");
                None
            }
        };

        Some(Self { needle, pattern })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        match &self.pattern {
            Some(re) => re.is_match(haystack),
            None => haystack.to_lowercase().contains(&self.needle),
        }
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }
}

/// Capitalize the first letter of every alphabetic run and lower-case the
/// rest: "isle of man" -> "Isle Of Man", "saint-malo" -> "Saint-Malo".
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Format a number the short way: `4.0` -> "4", `8.25` -> "8.25".
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
