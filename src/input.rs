//! Input reading with legacy-encoding fallback, plus the line parser.
//!
//! Address lists come from spreadsheets and old Windows tooling, so a
//! file may be UTF-8 (with or without BOM) or windows-1251. Decoding
//! falls through an encoding list and, as a last resort, decodes
//! permissively with visible replacement characters instead of aborting.

use crate::link;
use std::fs;
use std::io;
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

fn decode_with_fallback(bytes: &[u8]) -> (&'static str, String) {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        if let Ok(text) = std::str::from_utf8(rest) {
            return ("utf-8-sig", text.to_string());
        }
    } else if let Ok(text) = std::str::from_utf8(bytes) {
        return ("utf-8", text.to_string());
    }

    let (text, had_errors) = encoding_rs::WINDOWS_1251.decode_without_bom_handling(bytes);
    if !had_errors {
        return ("windows-1251", text.into_owned());
    }

    ("utf-8(replaced)", String::from_utf8_lossy(bytes).into_owned())
}

/// Read a file as lines, trying UTF-8 (BOM-aware) then windows-1251,
/// then lossy UTF-8. Returns the encoding name actually used and the
/// trimmed lines.
pub fn read_lines_with_fallback(path: &Path) -> io::Result<(&'static str, Vec<String>)> {
    let bytes = fs::read(path)?;
    let (encoding, text) = decode_with_fallback(&bytes);
    let lines = text.lines().map(|line| line.trim().to_string()).collect();
    Ok((encoding, lines))
}

/// Drop blank lines and `#` comments.
pub fn filter_addresses(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Split a raw line into `(label, geocoding target)`.
///
/// `"Address | lat,lon"` pins the target to explicit coordinates while
/// keeping the left side as the display label. Any other shape (no
/// pipe, or a right side that is not coordinates) uses the whole line
/// for both.
pub fn parse_label_and_target(raw: &str) -> (String, String) {
    if let Some((left, right)) = raw.split_once('|') {
        let left = left.trim();
        let right = right.trim();
        if link::is_coords(right) {
            return (left.to_string(), right.to_string());
        }
    }
    let trimmed = raw.trim().to_string();
    (trimmed.clone(), trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_and_read(bytes: &[u8]) -> (&'static str, Vec<String>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("addresses.txt");
        fs::write(&path, bytes).unwrap();
        read_lines_with_fallback(&path).unwrap()
    }

    #[test]
    fn test_read_plain_utf8() {
        let (enc, lines) = write_and_read("Москва\nТула\n".as_bytes());
        assert_eq!(enc, "utf-8");
        assert_eq!(lines, vec!["Москва", "Тула"]);
    }

    #[test]
    fn test_read_utf8_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("Москва\n".as_bytes());
        let (enc, lines) = write_and_read(&bytes);
        assert_eq!(enc, "utf-8-sig");
        assert_eq!(lines, vec!["Москва"]);
    }

    #[test]
    fn test_read_windows_1251() {
        let (encoded, _, _) = encoding_rs::WINDOWS_1251.encode("Москва, Тверская 1\n");
        let (enc, lines) = write_and_read(&encoded);
        assert_eq!(enc, "windows-1251");
        assert_eq!(lines, vec!["Москва, Тверская 1"]);
    }

    #[test]
    fn test_read_garbage_replaced_not_fatal() {
        // 0x98 is undefined in windows-1251 and the pair is invalid UTF-8
        let (enc, lines) = write_and_read(&[0xD0, 0x98, 0x98, b'\n']);
        assert_eq!(enc, "utf-8(replaced)");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains('\u{FFFD}'));
    }

    #[test]
    fn test_filter_addresses() {
        let lines: Vec<String> = ["# комментарий", "", "  ", "Тверская 1", " Арбат 2 "]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(filter_addresses(&lines), vec!["Тверская 1", "Арбат 2"]);
    }

    #[test]
    fn test_parse_plain_address() {
        let (label, target) = parse_label_and_target("Тверская 1");
        assert_eq!(label, "Тверская 1");
        assert_eq!(target, "Тверская 1");
    }

    #[test]
    fn test_parse_pipe_with_coords() {
        let (label, target) = parse_label_and_target("Красная площадь | 55.7539, 37.6208");
        assert_eq!(label, "Красная площадь");
        assert_eq!(target, "55.7539, 37.6208");
    }

    #[test]
    fn test_parse_pipe_without_coords_falls_back() {
        let (label, target) = parse_label_and_target("Кафе | где-то у метро");
        assert_eq!(label, "Кафе | где-то у метро");
        assert_eq!(target, "Кафе | где-то у метро");
    }

    #[test]
    fn test_parse_splits_on_first_pipe() {
        let (label, target) = parse_label_and_target("A | B | 55.0,37.0");
        // Right side "B | 55.0,37.0" is not coordinates
        assert_eq!(label, "A | B | 55.0,37.0");
        assert_eq!(target, label);
    }
}
