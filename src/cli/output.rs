//! Output formatting utilities for the CLI.

use serde::Serialize;

/// Rendering of a command's result for humans and for `--json`.
pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        let value = result.to_json();
        let rendered = serde_json::to_string_pretty(&value).unwrap_or_default();
        println!("{rendered}");
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to at most `max_chars` characters, appending "..." if
/// truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer sentence", 10), "a longe...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }
}
