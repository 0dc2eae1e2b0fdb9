//! Turning free-form backend text into a list of book titles.
//!
//! The backend is asked for a JSON array but often wraps it in prose or
//! ignores the request and answers with a numbered list. Extraction first
//! tries the span between the first `[` and the last `]` as JSON, then falls
//! back to reading one title per line.

use log::debug;

/// Characters stripped from the front of a line by the line heuristic:
/// quotes, digits, dashes, dots, asterisks and bullets.
fn is_list_marker(c: char) -> bool {
    matches!(c, '"' | '\'' | '-' | '.' | '*' | '•') || c.is_ascii_digit()
}

/// Parse the bracketed span of `response` as a JSON array of strings.
pub fn parse_json_array(response: &str) -> Option<Vec<String>> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Vec<String>>(&response[start..=end]) {
        Ok(titles) => Some(titles),
        Err(e) => {
            debug!("Catalog response is not a JSON string array: {}", e);
            None
        }
    }
}

/// One title per non-blank line, with leading list markers removed.
pub fn parse_lines(response: &str, limit: usize) -> Option<Vec<String>> {
    let titles: Vec<String> = response
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim_start_matches(is_list_marker).trim().to_string())
        .filter(|title| !title.is_empty())
        .take(limit)
        .collect();
    if titles.is_empty() {
        None
    } else {
        Some(titles)
    }
}

/// Extract up to `limit` titles, or `None` when neither strategy finds any.
///
/// A JSON array is returned as parsed; trimming it to the room size is left
/// to catalog normalization.
pub fn extract_catalog(response: &str, limit: usize) -> Option<Vec<String>> {
    parse_json_array(response).or_else(|| parse_lines(response, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_array_inside_prose() {
        let text = "Here are some titles: [\"A\",\"B\",\"C\"]";
        assert_eq!(
            extract_catalog(text, 100),
            Some(vec!["A".to_string(), "B".to_string(), "C".to_string()])
        );
    }

    #[test]
    fn numbered_list_uses_line_heuristic() {
        assert_eq!(
            extract_catalog("1. Alpha\n2. Beta", 100),
            Some(vec!["Alpha".to_string(), "Beta".to_string()])
        );
    }

    #[test]
    fn heuristic_strips_bullets_and_quotes_and_skips_blank_lines() {
        let text = "\n-\"The Veiled Truth\n\n* Echoes\n•'Riddles\n  12) Cartography";
        assert_eq!(
            extract_catalog(text, 10),
            Some(vec![
                "The Veiled Truth".to_string(),
                "Echoes".to_string(),
                "Riddles".to_string(),
                "12) Cartography".to_string(),
            ])
        );
    }

    #[test]
    fn heuristic_respects_limit() {
        let text = "1. A\n2. B\n3. C\n4. D";
        assert_eq!(extract_catalog(text, 2).map(|t| t.len()), Some(2));
    }

    #[test]
    fn malformed_array_falls_back_to_lines() {
        let text = "[\"Unclosed\", 42]\nSecond line";
        assert_eq!(
            extract_catalog(text, 5),
            Some(vec!["[\"Unclosed\", 42]".to_string(), "Second line".to_string()])
        );
    }

    #[test]
    fn reversed_brackets_are_not_an_array() {
        assert_eq!(parse_json_array("] nothing ["), None);
    }

    #[test]
    fn blank_response_yields_nothing() {
        assert_eq!(extract_catalog("", 100), None);
        assert_eq!(extract_catalog("  \n\t\n", 100), None);
        assert_eq!(extract_catalog("1.\n2.", 100), None);
    }
}
