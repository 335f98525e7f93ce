//! Export functionality: transaction CSV and plain-text statement reports.

pub mod csv;
pub mod text;

/// Replace characters that are unsafe in file names with `_`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename_part("18f0a/../b c", 80), "18f0a_.._b_c");
        assert_eq!(sanitize_filename_part("", 80), "unknown");
        assert_eq!(sanitize_filename_part("abcdef", 3), "abc");
    }
}
