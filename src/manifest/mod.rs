//! Manifest parsing.
//!
//! The manifest is an externally sourced CSV and may contain noise: comment
//! lines, short rows, unparseable time fields. The reader skips anything it
//! cannot turn into a [`WorkItem`] and keeps going.

use anyhow::{Context, Result};
use std::io;
use std::path::Path;

/// One manifest row: a clip to download, trim, and annotate.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    /// Video identifier on the external host
    pub source_id: String,

    /// Clip window start, in seconds from the start of the source video
    pub start_secs: f64,

    /// Clip window end, in seconds
    pub end_secs: f64,

    /// Label ids attached to the clip, in manifest order
    pub label_ids: Vec<String>,
}

impl WorkItem {
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// Lazy reader over manifest rows. Yields items in file order, up to
/// `max_items` when set. Re-reading requires constructing a new reader.
pub struct ManifestReader<R: io::Read> {
    records: csv::StringRecordsIntoIter<R>,
    max_items: Option<usize>,
    produced: usize,
}

impl ManifestReader<fs_err::File> {
    pub fn from_path(path: &Path, max_items: Option<usize>) -> Result<Self> {
        let file = fs_err::File::open(path)
            .with_context(|| format!("Failed to open manifest {}", path.display()))?;
        Ok(Self::from_reader(file, max_items))
    }
}

impl<R: io::Read> ManifestReader<R> {
    pub fn from_reader(reader: R, max_items: Option<usize>) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        Self {
            records,
            max_items,
            produced: 0,
        }
    }
}

impl<R: io::Read> Iterator for ManifestReader<R> {
    type Item = WorkItem;

    fn next(&mut self) -> Option<WorkItem> {
        if let Some(max) = self.max_items {
            if self.produced >= max {
                return None;
            }
        }

        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!("Skipping unreadable manifest row: {}", err);
                    continue;
                }
            };

            match parse_record(&record) {
                Some(item) => {
                    self.produced += 1;
                    return Some(item);
                }
                None => continue,
            }
        }
    }
}

fn parse_record(record: &csv::StringRecord) -> Option<WorkItem> {
    // Extra trailing columns are ignored; short rows are noise.
    if record.len() < 4 {
        tracing::warn!(
            "Skipping manifest row with {} column(s), expected at least 4",
            record.len()
        );
        return None;
    }

    let source_id = record.get(0)?.to_string();
    if source_id.is_empty() {
        tracing::warn!("Skipping manifest row with empty source id");
        return None;
    }

    let start_secs = match record.get(1)?.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!("Skipping row for {}: malformed start time", source_id);
            return None;
        }
    };

    let end_secs = match record.get(2)?.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!("Skipping row for {}: malformed end time", source_id);
            return None;
        }
    };

    Some(WorkItem {
        source_id,
        start_secs,
        end_secs,
        label_ids: split_labels(record.get(3).unwrap_or("")),
    })
}

/// Split a comma-separated label field. An empty field yields an empty list,
/// not a list containing the empty string.
pub fn split_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "\
# Segments manifest
YTID,start_seconds,end_seconds,positive_labels
--PJHxphWEs,30.000,40.000,\"/m/09x0r,/t/dd00088\"
abcdefghijk, 0.000, 10.000, /m/0ytgt
";

    fn read_all(content: &str, max_items: Option<usize>) -> Vec<WorkItem> {
        ManifestReader::from_reader(content.as_bytes(), max_items).collect()
    }

    #[test]
    fn parses_quoted_multi_label_rows() {
        let items = read_all(MANIFEST, None);
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].source_id, "--PJHxphWEs");
        assert_eq!(items[0].start_secs, 30.0);
        assert_eq!(items[0].end_secs, 40.0);
        assert_eq!(items[0].duration_secs(), 10.0);
        assert_eq!(items[0].label_ids, vec!["/m/09x0r", "/t/dd00088"]);

        assert_eq!(items[1].label_ids, vec!["/m/0ytgt"]);
    }

    #[test]
    fn skips_malformed_rows_without_failing() {
        let manifest = "\
YTID, start_seconds, end_seconds, positive_labels
good_one____, 1.0, 11.0, /m/09x0r
short_row___, 5.0
bad_number__, zero, 10.0, /m/09x0r
good_two____, 2.0, 12.0, /m/0ytgt
";
        let items = read_all(manifest, None);
        let ids: Vec<&str> = items.iter().map(|item| item.source_id.as_str()).collect();
        assert_eq!(ids, vec!["good_one____", "good_two____"]);
    }

    #[test]
    fn caps_at_max_items() {
        let manifest = "\
YTID, start_seconds, end_seconds, positive_labels
a, 0.0, 10.0, /m/09x0r
b, 0.0, 10.0, /m/09x0r
c, 0.0, 10.0, /m/09x0r
";
        let items = read_all(manifest, Some(2));
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].source_id, "b");
    }

    #[test]
    fn empty_label_column_yields_empty_list() {
        let manifest = "\
YTID, start_seconds, end_seconds, positive_labels
unlabeled___, 0.0, 10.0,
";
        let items = read_all(manifest, None);
        assert_eq!(items.len(), 1);
        assert!(items[0].label_ids.is_empty());
    }

    #[test]
    fn split_labels_trims_and_drops_empties() {
        assert_eq!(
            split_labels("/m/09x0r, /m/0ytgt"),
            vec!["/m/09x0r", "/m/0ytgt"]
        );
        assert_eq!(split_labels(""), Vec::<String>::new());
        assert_eq!(split_labels(" , ,/m/09x0r"), vec!["/m/09x0r"]);
    }

    #[test]
    fn comment_lines_are_ignored() {
        let manifest = "\
YTID, start_seconds, end_seconds, positive_labels
# a stray comment in the middle
real_row____, 3.0, 13.0, /m/09x0r
";
        let items = read_all(manifest, None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_id, "real_row____");
    }
}
