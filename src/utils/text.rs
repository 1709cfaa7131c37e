/// Cuts `input` to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    let trimmed = input.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Collapses runs of whitespace (including newlines) into single spaces.
pub fn squash_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo…");
        assert_eq!(truncate_chars("  short  ", 10), "short");
    }

    #[test]
    fn squashes_whitespace() {
        assert_eq!(squash_whitespace("a\n\n b\t c"), "a b c");
    }
}
