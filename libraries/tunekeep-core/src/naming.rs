//! File naming helpers

/// Replace characters that are invalid in file names on common platforms
pub fn sanitize_file_stem(s: &str) -> String {
    let cleaned = s
        .chars()
        .map(|c| match c {
            // Invalid on Windows: < > : " / \ | ? *
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>();
    // Windows refuses trailing dots and spaces
    let trimmed = cleaned.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name with a ` (N)` counter inserted before the extension
///
/// "song.mp3" with `n = 2` becomes "song (2).mp3".
pub fn numbered_name(stem: &str, extension: Option<&str>, n: u32) -> String {
    match extension {
        Some(ext) if !ext.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{stem} ({n})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("AC/DC: Back in Black"), "AC_DC_ Back in Black");
        assert_eq!(sanitize_file_stem("  what?  "), "what_");
        assert_eq!(sanitize_file_stem("trailing..."), "trailing");
        assert_eq!(sanitize_file_stem("   "), "untitled");
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("song", Some("mp3"), 2), "song (2).mp3");
        assert_eq!(numbered_name("song", None, 3), "song (3)");
    }
}
