use std::collections::HashSet;
use std::io::Read;

use feedcheck_logging::check_warn;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read url list: {0}")]
    Read(#[from] csv::Error),
}

/// Candidate feed URLs in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlList {
    pub urls: Vec<String>,
    /// Records that could not be parsed and were skipped.
    pub skipped_lines: usize,
    pub duplicates: usize,
}

/// Read a delimited URL list, taking the first field of every record.
///
/// Blank entries and entries starting with `#` are dropped, as are repeats of
/// an entry already seen. Malformed records are skipped with a warning; only
/// an IO failure aborts the read.
pub fn read_url_list<R: Read>(reader: R, has_header: bool) -> Result<UrlList, InputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut list = UrlList::default();
    let mut seen = HashSet::new();

    for record in csv_reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                let line = err.position().map(|pos| pos.line()).unwrap_or_default();
                check_warn!("Skipping line {} due to error: {}", line, err);
                list.skipped_lines += 1;
                continue;
            }
        };

        let Some(url) = record.get(0).map(str::trim) else {
            continue;
        };
        if url.is_empty() || url.starts_with('#') {
            continue;
        }
        if !seen.insert(url.to_string()) {
            list.duplicates += 1;
            continue;
        }
        list.urls.push(url.to_string());
    }

    Ok(list)
}
