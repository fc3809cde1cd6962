//! Utility functions for common operations.

use crate::error::ServiceError;

/// Returns at most the first `max_chars` characters of `text`.
///
/// Slices on a char boundary so multi-byte text is never split mid-character.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Wraps text into lines of at most `width` characters, breaking on whitespace.
///
/// Existing line breaks are kept; blank lines survive as empty strings.
/// A single word longer than `width` is hard-split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word = word;
            let mut word_len = word.chars().count();

            while word_len > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let head = char_prefix(word, width);
                lines.push(head.to_string());
                word = &word[head.len()..];
                word_len -= width;
            }

            if word.is_empty() {
                continue;
            }

            let needed = word_len + if current.is_empty() { 0 } else { 1 };
            if current_len + needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }

        lines.push(current);
    }

    lines
}

/// Makes a string safe to use as a file name on all platforms.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "Book".to_string()
    } else {
        cleaned
    }
}

/// Checks if an HTTP response is successful, and if not, returns a detailed error.
///
/// This helper extracts both the status code and response body for better error messages.
pub async fn check_response_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(ServiceError::ApiError(format!("HTTP {}: {}", status, text)));
    }
    Ok(response)
}
