//! CSV loading, cleaning and the stratified train/test split.

use crate::label::Ethnicity;
use anyhow::{Context, Result};
use chrono::Local;
use rand::rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// One labeled training row after cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledName {
    pub name: String,
    pub label: Ethnicity,
}

#[derive(Debug, Deserialize)]
struct LabeledRow {
    name: String,
    ethnicity: String,
}

#[derive(Debug, Deserialize)]
struct UnlabeledRow {
    name: String,
}

#[derive(Debug, Serialize)]
struct PredictionRow<'a> {
    name: &'a str,
    predicted_ethnicity: Ethnicity,
}

/// Loads the labeled training CSV (`name,ethnicity` columns).
///
/// Labels are parsed case-insensitively; blank, `nan` and unrecognized
/// labels collapse to `Others`.
pub fn load_labeled(path: &Path) -> Result<Vec<LabeledName>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let row: LabeledRow =
            row.with_context(|| format!("invalid row in {}", path.display()))?;
        records.push(LabeledName {
            name: row.name.trim().to_string(),
            label: Ethnicity::parse(&row.ethnicity),
        });
    }
    Ok(records)
}

/// Loads the unlabeled CSV (`name` column); raw names are kept verbatim so
/// the prediction output echoes them unchanged.
pub fn load_unlabeled(path: &Path) -> Result<Vec<String>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut names = Vec::new();
    for row in reader.deserialize() {
        let row: UnlabeledRow =
            row.with_context(|| format!("invalid row in {}", path.display()))?;
        names.push(row.name);
    }
    Ok(names)
}

/// A train/test split of the labeled data.
#[derive(Debug)]
pub struct DatasetSplit {
    pub train: Vec<LabeledName>,
    pub test: Vec<LabeledName>,
}

/// Randomly splits the dataset, stratified by class: each class is shuffled
/// and split by `test_ratio` separately, then the halves are merged and
/// reshuffled.
pub fn train_test_split(data: &[LabeledName], test_ratio: f64) -> DatasetSplit {
    let mut rng = rng();
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in Ethnicity::ALL {
        let mut bucket: Vec<LabeledName> = data
            .iter()
            .filter(|r| r.label == class)
            .cloned()
            .collect();
        bucket.shuffle(&mut rng);

        let test_size = ((bucket.len() as f64) * test_ratio).round() as usize;
        let test_size = test_size.min(bucket.len());
        test.extend(bucket.drain(..test_size));
        train.extend(bucket);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    DatasetSplit { train, test }
}

/// Writes predictions to `predictions_YYYYMMDD_HHMMSS.csv` under `dir` and
/// returns the path.
pub fn write_predictions(
    dir: &Path,
    names: &[String],
    labels: &[Ethnicity],
) -> Result<PathBuf> {
    debug_assert_eq!(names.len(), labels.len());
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("predictions_{stamp}.csv"));

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for (name, &label) in names.iter().zip(labels) {
        writer.serialize(PredictionRow {
            name,
            predicted_ethnicity: label,
        })?;
    }
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, label: Ethnicity) -> LabeledName {
        LabeledName {
            name: name.to_string(),
            label,
        }
    }

    fn sample(per_class: usize) -> Vec<LabeledName> {
        let mut data = Vec::new();
        for class in Ethnicity::ALL {
            for i in 0..per_class {
                data.push(row(&format!("{class}-{i}"), class));
            }
        }
        data
    }

    #[test]
    fn split_preserves_every_row() {
        let data = sample(10);
        let split = train_test_split(&data, 0.2);
        assert_eq!(split.train.len() + split.test.len(), data.len());
        assert_eq!(split.test.len(), 8);
    }

    #[test]
    fn split_is_stratified() {
        let data = sample(10);
        let split = train_test_split(&data, 0.2);
        for class in Ethnicity::ALL {
            let in_test = split.test.iter().filter(|r| r.label == class).count();
            assert_eq!(in_test, 2);
        }
    }

    #[test]
    fn extreme_ratios_are_clamped() {
        let data = sample(2);
        let split = train_test_split(&data, 1.0);
        assert!(split.train.is_empty());
        assert_eq!(split.test.len(), data.len());
    }

    #[test]
    fn labeled_csv_parses_and_cleans() {
        let dir = std::env::temp_dir();
        let path = dir.join("name2ethnicity_labeled_test.csv");
        std::fs::write(&path, "name,ethnicity\nTan Wei Ming,Chinese\nnan,nan\n")
            .expect("write test csv");

        let records = load_labeled(&path).expect("load");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Tan Wei Ming");
        assert_eq!(records[0].label, Ethnicity::Chinese);
        assert_eq!(records[1].label, Ethnicity::Others);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn predictions_file_is_timestamped_csv() {
        let dir = std::env::temp_dir();
        let names = vec!["Tan Wei Ming".to_string()];
        let labels = vec![Ethnicity::Chinese];

        let path = write_predictions(&dir, &names, &labels).expect("write");
        let body = std::fs::read_to_string(&path).expect("read back");
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("predictions_") && n.ends_with(".csv")));
        assert!(body.starts_with("name,predicted_ethnicity\n"));
        assert!(body.contains("Tan Wei Ming,Chinese"));

        std::fs::remove_file(&path).ok();
    }
}
