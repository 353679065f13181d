//! Output writers for the generated link rows.

use crate::run::LinkRow;
use std::fs;
use std::io;
use std::path::Path;

/// How rows are written to the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// CSV with an `Address,YandexMapsLink` header.
    Csv,
    /// `label/link` followed by a blank line, per row.
    Pairs,
}

pub fn write_rows(path: &Path, rows: &[LinkRow], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Csv => write_csv(path, rows),
        OutputFormat::Pairs => write_pairs(path, rows),
    }
}

fn write_csv(path: &Path, rows: &[LinkRow]) -> io::Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(into_io)?;
    writer
        .write_record(["Address", "YandexMapsLink"])
        .map_err(into_io)?;
    for row in rows {
        writer
            .write_record([row.label.as_str(), row.url.as_str()])
            .map_err(into_io)?;
    }
    writer.flush()
}

fn write_pairs(path: &Path, rows: &[LinkRow]) -> io::Result<()> {
    let mut text = String::new();
    for row in rows {
        text.push_str(&row.label);
        text.push('/');
        text.push_str(&row.url);
        text.push_str("\n\n");
    }
    fs::write(path, text)
}

fn into_io(err: csv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_rows() -> Vec<LinkRow> {
        vec![
            LinkRow {
                label: "Москва, Тверская 1".into(),
                url: "https://yandex.ru/maps/?mode=routes&rtext=~55.76,37.61&rtt=masstransit".into(),
            },
            LinkRow {
                label: "Арбат 2".into(),
                url: "https://yandex.ru/maps/?mode=routes&rtext=~55.75,37.59&rtt=masstransit".into(),
            },
        ]
    }

    #[test]
    fn test_write_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.csv");
        write_rows(&path, &sample_rows(), OutputFormat::Csv).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Address,YandexMapsLink"));
        // A label containing a comma gets quoted
        let first = lines.next().unwrap();
        assert!(first.starts_with("\"Москва, Тверская 1\","));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_write_pairs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.txt");
        write_rows(&path, &sample_rows(), OutputFormat::Pairs).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Москва, Тверская 1/https://"));
        // Each row is followed by a blank line
        assert_eq!(text.matches("\n\n").count(), 2);
    }

    #[test]
    fn test_write_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.csv");
        write_rows(&path, &[], OutputFormat::Csv).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim(), "Address,YandexMapsLink");
    }
}
