//! Reads seed files into field-name → value records.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{error, info, warn};

use crate::Result;

/// One CSV data row keyed by header name.
pub type Record = HashMap<String, String>;

const SNIFF_LEN: usize = 1024;

/// Tab wins if the first kilobyte contains one, otherwise comma.
pub fn sniff_delimiter(sample: &[u8]) -> u8 {
    let sample = &sample[..sample.len().min(SNIFF_LEN)];
    if sample.contains(&b'\t') {
        b'\t'
    } else {
        b','
    }
}

/// Trims whitespace, then double quotes, then single quotes.
pub fn clean_field(s: &str) -> &str {
    s.trim().trim_matches('"').trim_matches('\'')
}

/// Reads every record of `path`. A missing or unreadable file yields an
/// empty list; the reason is logged.
pub fn read_records(path: impl AsRef<Path>) -> Vec<Record> {
    let path = path.as_ref();
    match try_read_records(path) {
        Ok(records) => {
            info!("read {} records from {}", records.len(), path.display());
            records
        }
        Err(crate::error::SeedError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            warn!("file {} not found", path.display());
            Vec::new()
        }
        Err(e) => {
            error!("error reading {}: {e}", path.display());
            Vec::new()
        }
    }
}

fn try_read_records(path: &Path) -> Result<Vec<Record>> {
    let content = std::fs::read_to_string(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    parse_records(content.as_bytes())
}

pub(crate) fn parse_records(data: &[u8]) -> Result<Vec<Record>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(sniff_delimiter(data))
        .quote(b'"')
        .has_headers(true)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| clean_field(h).to_string())
        .collect();

    let mut records = Vec::new();
    let mut raw = StringRecord::new();
    loop {
        match reader.read_record(&mut raw) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("skipping unreadable row: {e}");
                continue;
            }
        }
        // only a truly empty line is dropped; a row of empty fields still
        // occupies its position in the file
        if raw.is_empty() || (raw.len() == 1 && raw[0].is_empty()) {
            continue;
        }
        let record: Record = headers
            .iter()
            .zip(raw.iter())
            .map(|(k, v)| (k.clone(), clean_field(v).to_string()))
            .collect();
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = read_records(dir.path().join("nope.csv"));
        assert!(records.is_empty());
    }

    #[test]
    fn reads_comma_separated() {
        let file = write_file(
            "customer_id,company_name,contact_name\n\
             ALFKI,Alfreds Futterkiste,Maria Anders\n\
             ANATR,\"Ana Trujillo Emparedados, y helados\",Ana Trujillo\n",
        );
        let records = read_records(file.path());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["customer_id"], "ALFKI");
        assert_eq!(records[0]["contact_name"], "Maria Anders");
        assert_eq!(
            records[1]["company_name"],
            "Ana Trujillo Emparedados, y helados"
        );
    }

    #[test]
    fn tab_wins_over_comma() {
        let file = write_file(
            "\"CustomerID\"\t\"CompanyName\"\t\"ContactName\"\n\
             \"ALFKI\"\t\"Alfreds, Futterkiste\"\t 'Maria Anders' \n",
        );
        let records = read_records(file.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["CustomerID"], "ALFKI");
        assert_eq!(records[0]["CompanyName"], "Alfreds, Futterkiste");
        assert_eq!(records[0]["ContactName"], "Maria Anders");
    }

    #[test]
    fn sniffs_only_first_kilobyte() {
        let mut sample = vec![b'a'; SNIFF_LEN];
        sample.push(b'\t');
        assert_eq!(sniff_delimiter(&sample), b',');
        sample[10] = b'\t';
        assert_eq!(sniff_delimiter(&sample), b'\t');
    }

    #[test]
    fn short_rows_and_bom() {
        let file = write_file("\u{feff}first_name,last_name,title\nNancy,Davolio\n\n");
        let records = read_records(file.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["first_name"], "Nancy");
        assert!(!records[0].contains_key("title"));
    }

    #[test]
    fn keeps_rows_of_empty_fields() {
        let records =
            parse_records(b"first_name,last_name\n,\nNancy,Davolio\n\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["first_name"], "");
        assert_eq!(records[1]["first_name"], "Nancy");
    }

    #[test]
    fn clean_field_strips_quotes_in_order() {
        assert_eq!(clean_field("  \"abc\"  "), "abc");
        assert_eq!(clean_field("'x'"), "x");
        assert_eq!(clean_field("\"'both'\""), "both");
        assert_eq!(clean_field(""), "");
    }
}
