//! Helpers for logging generated text and prompts without flooding the log.
//! Control characters are escaped so every entry stays on one line.

/// Characters of a prompt shown in "making call for ..." log lines.
pub const PROMPT_PREVIEW: usize = 30;

/// Escape a string for single-line logging and cap it at `max_chars`:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///
/// Longer input is cut off with an ellipsis.
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Short preview of a prompt for request logging.
pub fn prompt_preview(prompt: &str) -> String {
    preview(prompt, PROMPT_PREVIEW)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_newlines() {
        assert_eq!(preview("Line1\nLine2\r\tEnd", 100), "Line1\\nLine2\\r\\tEnd");
    }

    #[test]
    fn truncates_long_prompts() {
        let prompt = "Generate a list of 100 book titles that would be found";
        let shown = prompt_preview(prompt);
        assert_eq!(shown.chars().count(), PROMPT_PREVIEW + 1);
        assert!(shown.ends_with('…'));
    }
}
