//! Annotation output.
//!
//! One writer, two modes. Index mode resolves the first label id of each
//! emitted item to a numeric class index and writes a companion evaluation
//! manifest of bare source ids. Name mode resolves every label id to a
//! display name and joins them into one quoted field.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::cli::{AnnotationMode, EmissionPolicy};
use crate::config::StorageConfig;
use crate::manifest::WorkItem;

/// Class index written when an item has no labels or its first label id is
/// missing from the taxonomy
const UNKNOWN_INDEX: i64 = -1;

/// Display name written for label ids missing from the taxonomy
const UNKNOWN_NAME: &str = "Unknown";

/// Label taxonomy, loaded fully into memory before any record is written.
enum LabelTaxonomy {
    /// label id -> numeric class index
    Indices(HashMap<String, i64>),
    /// label id -> human-readable display name
    Names(HashMap<String, String>),
}

impl LabelTaxonomy {
    fn load(mode: AnnotationMode, path: &Path) -> Result<Self> {
        match mode {
            AnnotationMode::Index => Ok(Self::Indices(load_index_taxonomy(path)?)),
            AnnotationMode::Name => Ok(Self::Names(load_name_taxonomy(path)?)),
        }
    }
}

/// CSV taxonomy with `mid` and `index` header columns. Extra columns such as
/// `display_name` are ignored.
fn load_index_taxonomy(path: &Path) -> Result<HashMap<String, i64>> {
    let file = fs_err::File::open(path)
        .with_context(|| format!("Failed to open label taxonomy {}", path.display()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let mid_col = headers
        .iter()
        .position(|header| header == "mid")
        .context("Label taxonomy is missing a `mid` column")?;
    let index_col = headers
        .iter()
        .position(|header| header == "index")
        .context("Label taxonomy is missing an `index` column")?;

    let mut mapping = HashMap::new();
    for record in reader.records() {
        let record = record.context("Failed to read label taxonomy row")?;

        let mid = record
            .get(mid_col)
            .context("Label taxonomy row is missing its `mid` field")?;
        let index = record
            .get(index_col)
            .context("Label taxonomy row is missing its `index` field")?
            .parse::<i64>()
            .with_context(|| format!("Malformed class index for label {}", mid))?;

        mapping.insert(mid.to_string(), index);
    }

    Ok(mapping)
}

/// JSON taxonomy: an object mapping label id to display name.
fn load_name_taxonomy(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs_err::read_to_string(path)
        .with_context(|| format!("Failed to read label taxonomy {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse label taxonomy {}", path.display()))
}

/// Writes label-mapped CSV records for the retained manifest items.
pub struct AnnotationWriter {
    taxonomy: LabelTaxonomy,
    policy: EmissionPolicy,
}

impl AnnotationWriter {
    /// Load the taxonomy for `mode` and build a writer with the given
    /// emission policy.
    pub fn new(mode: AnnotationMode, labels_path: &Path, policy: EmissionPolicy) -> Result<Self> {
        Ok(Self {
            taxonomy: LabelTaxonomy::load(mode, labels_path)?,
            policy,
        })
    }

    /// Write annotation files under `storage` for the items selected by the
    /// emission policy, in manifest order. Returns the record count.
    pub fn write(
        &self,
        items: &[WorkItem],
        acquired: &HashSet<String>,
        storage: &StorageConfig,
    ) -> Result<usize> {
        let emitted: Vec<&WorkItem> = items
            .iter()
            .filter(|item| match self.policy {
                EmissionPolicy::Acquired => acquired.contains(&item.source_id),
                EmissionPolicy::All => true,
            })
            .collect();

        match &self.taxonomy {
            LabelTaxonomy::Indices(mapping) => {
                self.write_index_mode(&emitted, mapping, storage)?;
            }
            LabelTaxonomy::Names(mapping) => {
                self.write_name_mode(&emitted, mapping, storage)?;
            }
        }

        Ok(emitted.len())
    }

    fn write_index_mode(
        &self,
        items: &[&WorkItem],
        mapping: &HashMap<String, i64>,
        storage: &StorageConfig,
    ) -> Result<()> {
        let train_path = storage.train_file();
        let test_path = storage.test_file();

        let mut train = csv::Writer::from_writer(
            fs_err::File::create(&train_path)
                .with_context(|| format!("Failed to create {}", train_path.display()))?,
        );
        let mut test = csv::Writer::from_writer(
            fs_err::File::create(&test_path)
                .with_context(|| format!("Failed to create {}", test_path.display()))?,
        );

        for item in items {
            // Only the first label id decides the class index
            let class_index = item
                .label_ids
                .first()
                .map(|id| mapping.get(id).copied().unwrap_or(UNKNOWN_INDEX))
                .unwrap_or(UNKNOWN_INDEX)
                .to_string();

            train.write_record([item.source_id.as_str(), class_index.as_str()])?;
            test.write_record([item.source_id.as_str()])?;
        }

        train.flush()?;
        test.flush()?;
        Ok(())
    }

    fn write_name_mode(
        &self,
        items: &[&WorkItem],
        mapping: &HashMap<String, String>,
        storage: &StorageConfig,
    ) -> Result<()> {
        let train_path = storage.train_file();
        let mut train = csv::Writer::from_writer(
            fs_err::File::create(&train_path)
                .with_context(|| format!("Failed to create {}", train_path.display()))?,
        );

        train.write_record(["file_name", "label"])?;

        for item in items {
            let names = item
                .label_ids
                .iter()
                .map(|id| mapping.get(id).map(String::as_str).unwrap_or(UNKNOWN_NAME))
                .collect::<Vec<&str>>()
                .join(",");

            train.write_record([item.source_id.as_str(), names.as_str()])?;
        }

        train.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(source_id: &str, label_ids: &[&str]) -> WorkItem {
        WorkItem {
            source_id: source_id.to_string(),
            start_secs: 0.0,
            end_secs: 10.0,
            label_ids: label_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    fn storage(dir: &TempDir) -> StorageConfig {
        StorageConfig {
            base_dir: dir.path().to_path_buf(),
        }
    }

    fn write_index_taxonomy(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("class_labels_indices.csv");
        fs_err::write(
            &path,
            "index,mid,display_name\n0,/m/09x0r,Speech\n72,/m/0ytgt,\"Child speech, kid speaking\"\n",
        )
        .unwrap();
        path
    }

    fn write_name_taxonomy(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("label_mapping.json");
        fs_err::write(
            &path,
            r#"{"/m/09x0r": "Speech", "/m/0ytgt": "Child speech"}"#,
        )
        .unwrap();
        path
    }

    fn acquired(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn index_mode_uses_first_label_only() {
        let dir = TempDir::new().unwrap();
        let labels = write_index_taxonomy(&dir);
        let writer =
            AnnotationWriter::new(AnnotationMode::Index, &labels, EmissionPolicy::Acquired)
                .unwrap();

        let items = vec![item("vid_a", &["/m/09x0r", "/m/0ytgt"])];
        let count = writer
            .write(&items, &acquired(&["vid_a"]), &storage(&dir))
            .unwrap();

        assert_eq!(count, 1);
        let train = fs_err::read_to_string(storage(&dir).train_file()).unwrap();
        assert_eq!(train, "vid_a,0\n");
    }

    #[test]
    fn index_mode_defaults_to_minus_one() {
        let dir = TempDir::new().unwrap();
        let labels = write_index_taxonomy(&dir);
        let writer =
            AnnotationWriter::new(AnnotationMode::Index, &labels, EmissionPolicy::Acquired)
                .unwrap();

        let items = vec![item("no_labels", &[]), item("unmapped", &["/m/zzz"])];
        writer
            .write(&items, &acquired(&["no_labels", "unmapped"]), &storage(&dir))
            .unwrap();

        let train = fs_err::read_to_string(storage(&dir).train_file()).unwrap();
        assert_eq!(train, "no_labels,-1\nunmapped,-1\n");
    }

    #[test]
    fn index_mode_emits_matching_evaluation_manifest() {
        let dir = TempDir::new().unwrap();
        let labels = write_index_taxonomy(&dir);
        let writer =
            AnnotationWriter::new(AnnotationMode::Index, &labels, EmissionPolicy::Acquired)
                .unwrap();

        let items = vec![
            item("vid_a", &["/m/09x0r"]),
            item("vid_b", &["/m/0ytgt"]),
            item("vid_c", &["/m/09x0r"]),
        ];
        // vid_b failed to download
        writer
            .write(&items, &acquired(&["vid_a", "vid_c"]), &storage(&dir))
            .unwrap();

        let train = fs_err::read_to_string(storage(&dir).train_file()).unwrap();
        let test = fs_err::read_to_string(storage(&dir).test_file()).unwrap();

        let train_ids: Vec<&str> = train
            .lines()
            .map(|line| line.split(',').next().unwrap())
            .collect();
        let test_ids: Vec<&str> = test.lines().collect();

        assert_eq!(train_ids, vec!["vid_a", "vid_c"]);
        assert_eq!(test_ids, train_ids);
    }

    #[test]
    fn name_mode_maps_every_label() {
        let dir = TempDir::new().unwrap();
        let labels = write_name_taxonomy(&dir);
        let writer =
            AnnotationWriter::new(AnnotationMode::Name, &labels, EmissionPolicy::All).unwrap();

        let items = vec![item("vid_a", &["/m/09x0r", "/m/0ytgt"])];
        writer.write(&items, &acquired(&[]), &storage(&dir)).unwrap();

        let train = fs_err::read_to_string(storage(&dir).train_file()).unwrap();
        // The joined names contain a comma, so the field must be quoted
        assert_eq!(train, "file_name,label\nvid_a,\"Speech,Child speech\"\n");
    }

    #[test]
    fn name_mode_marks_unmapped_labels_unknown() {
        let dir = TempDir::new().unwrap();
        let labels = write_name_taxonomy(&dir);
        let writer =
            AnnotationWriter::new(AnnotationMode::Name, &labels, EmissionPolicy::All).unwrap();

        let items = vec![item("vid_a", &["/m/09x0r", "/m/zzz"])];
        writer.write(&items, &acquired(&[]), &storage(&dir)).unwrap();

        let train = fs_err::read_to_string(storage(&dir).train_file()).unwrap();
        assert!(train.contains("\"Speech,Unknown\""));
    }

    #[test]
    fn name_mode_annotates_unacquired_items_by_default_policy() {
        let dir = TempDir::new().unwrap();
        let labels = write_name_taxonomy(&dir);
        let policy = AnnotationMode::Name.default_policy();
        assert_eq!(policy, EmissionPolicy::All);

        let writer = AnnotationWriter::new(AnnotationMode::Name, &labels, policy).unwrap();
        let items = vec![item("never_downloaded", &["/m/09x0r"])];
        let count = writer.write(&items, &acquired(&[]), &storage(&dir)).unwrap();

        assert_eq!(count, 1);
    }

    #[test]
    fn acquired_policy_filters_on_the_success_set() {
        let dir = TempDir::new().unwrap();
        let labels = write_name_taxonomy(&dir);
        let writer =
            AnnotationWriter::new(AnnotationMode::Name, &labels, EmissionPolicy::Acquired)
                .unwrap();

        let items = vec![item("kept", &["/m/09x0r"]), item("dropped", &["/m/09x0r"])];
        let count = writer
            .write(&items, &acquired(&["kept"]), &storage(&dir))
            .unwrap();

        assert_eq!(count, 1);
        let train = fs_err::read_to_string(storage(&dir).train_file()).unwrap();
        assert!(train.contains("kept"));
        assert!(!train.contains("dropped"));
    }

    #[test]
    fn index_taxonomy_requires_mid_and_index_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.csv");
        fs_err::write(&path, "id,name\n1,Speech\n").unwrap();

        let result = AnnotationWriter::new(AnnotationMode::Index, &path, EmissionPolicy::Acquired);
        assert!(result.is_err());
    }
}
