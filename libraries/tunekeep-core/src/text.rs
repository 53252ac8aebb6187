//! Text decoding for playlist and work-list files
//!
//! Files written by older tools on Windows are often Windows-1252 rather
//! than UTF-8.

use crate::error::{Result, TuneError};
use std::path::Path;

/// Decode file contents, trying UTF-8 first and Windows-1252 second
pub fn decode_text(bytes: Vec<u8>, path: &Path) -> Result<String> {
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let bytes = err.into_bytes();
            let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(&bytes);
            if had_errors {
                return Err(TuneError::DecodeFallback {
                    path: path.to_path_buf(),
                });
            }
            tracing::warn!(
                path = %path.display(),
                "File is not valid UTF-8, decoded as Windows-1252"
            );
            Ok(text.into_owned())
        }
    }
}

/// Split decoded text into trimmed lines, dropping `\r` and blanks
pub fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.trim_end_matches('\r').trim())
        .filter(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let text = decode_text("Beyoncé\n".as_bytes().to_vec(), Path::new("x")).unwrap();
        assert_eq!(text, "Beyoncé\n");
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "Beyonc\xe9" in Windows-1252
        let bytes = vec![b'B', b'e', b'y', b'o', b'n', b'c', 0xE9];
        let text = decode_text(bytes, Path::new("x")).unwrap();
        assert_eq!(text, "Beyoncé");
    }

    #[test]
    fn test_non_empty_lines() {
        let lines: Vec<&str> = non_empty_lines("a\r\n\n  b  \r\n\r\n").collect();
        assert_eq!(lines, vec!["a", "b"]);
    }
}
