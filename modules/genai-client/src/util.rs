/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code fences from a model response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_at_char_boundary() {
        let text = "emissions 排出量";
        let truncated = truncate_to_char_boundary(text, 12);
        assert!(truncated.len() <= 12);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn short_strings_pass_through() {
        assert_eq!(truncate_to_char_boundary("short", 100), "short");
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_blocks("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_blocks("{\"a\":1}"), "{\"a\":1}");
    }
}
