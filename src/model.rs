//! Training, evaluation and persistence of the three ethnicity classifiers.

use crate::dataset::{train_test_split, LabeledName};
use crate::features::CountVectorizer;
use crate::label::Ethnicity;
use crate::metrics::{roc_curve, ClassMetrics, ConfusionMatrix, RocCurve};
use crate::text::Preprocessor;
use anyhow::{bail, Context, Result};
use linfa::prelude::*;
use linfa_bayes::{MultinomialNb, NaiveBayes};
use linfa_logistic::{MultiFittedLogisticRegression, MultiLogisticRegression};
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use rmp_serde::{decode::from_read, encode::write_named};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::SystemTime;

const N_CLASSES: usize = Ethnicity::COUNT;

/// The three classifiers trained on the same bag-of-words features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    NaiveBayes,
    LogisticRegression,
    DecisionTree,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::NaiveBayes,
        ModelKind::LogisticRegression,
        ModelKind::DecisionTree,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::NaiveBayes => "Multinomial Naive Bayes",
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::DecisionTree => "Decision Tree",
        }
    }

    /// Short name used in report file names.
    pub fn slug(self) -> &'static str {
        match self {
            ModelKind::NaiveBayes => "naive_bayes",
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::DecisionTree => "decision_tree",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Held-out metrics for one classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEval {
    pub kind: ModelKind,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<ClassMetrics>,
    /// One-vs-rest ROC per class, for models that expose probabilities.
    pub roc: Option<Vec<RocCurve>>,
}

/// Evaluation snapshot stored inside the saved model bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub train_size: usize,
    pub test_size: usize,
    pub evals: Vec<ModelEval>,
    pub best: ModelKind,
    /// Per class, the tokens with the highest in-class frequency ratio.
    pub informative: Vec<Vec<(String, f64)>>,
}

impl EvalReport {
    fn empty() -> Self {
        Self {
            train_size: 0,
            test_size: 0,
            evals: Vec::new(),
            best: ModelKind::NaiveBayes,
            informative: Vec::new(),
        }
    }
}

/// Trained ethnicity classifier bundle: preprocessing, vocabulary, the three
/// fitted models and the held-out evaluation.
#[derive(Serialize, Deserialize)]
pub struct EthnicityModel {
    prep: Preprocessor,
    vectorizer: CountVectorizer,
    /// Class indices present in the training targets, ascending. Probability
    /// columns of the logistic model follow this order.
    classes: Vec<usize>,
    nb: MultinomialNb<f64, usize>,
    logistic: MultiFittedLogisticRegression<f64, usize>,
    tree: DecisionTree<f64, usize>,
    report: EvalReport,
}

impl EthnicityModel {
    /// Load a saved bundle if up-to-date, or retrain if the CSV is newer.
    pub fn load_or_train_if_stale(
        model_path: &Path,
        csv_path: &Path,
        test_ratio: f64,
    ) -> Result<Self> {
        let model_mtime = model_path
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let csv_mtime = csv_path
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        if !model_path.exists() || csv_mtime > model_mtime {
            println!("🧠 Training models (CSV is newer or bundle missing)...");
            let records = crate::dataset::load_labeled(csv_path)?;
            let model = Self::train(&records, test_ratio)?;
            println!("💾 Saving bundle to {:?}", model_path);
            model.save_to_file(model_path)?;
            Ok(model)
        } else {
            println!("📦 Loading bundle from {:?} (up-to-date)", model_path);
            Self::load_from_file(model_path)
        }
    }

    /// Trains all three classifiers and evaluates them on the held-out split.
    pub fn train(records: &[LabeledName], test_ratio: f64) -> Result<Self> {
        let split = train_test_split(records, test_ratio);
        if split.train.is_empty() || split.test.is_empty() {
            bail!(
                "need labeled rows on both sides of the split, got {} train / {} test",
                split.train.len(),
                split.test.len()
            );
        }

        let prep = Preprocessor::default();
        let train_docs: Vec<Vec<String>> =
            split.train.iter().map(|r| prep.tokens(&r.name)).collect();
        let mut vectorizer = CountVectorizer::new();
        let x_train = vectorizer.fit_transform(&train_docs);
        if vectorizer.vocabulary_size() == 0 {
            bail!("training data produced an empty vocabulary");
        }

        let y_train: Vec<usize> = split.train.iter().map(|r| r.label.index()).collect();
        let classes: Vec<usize> = y_train.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if classes.len() < 2 {
            bail!("training data covers a single class, nothing to separate");
        }
        let y = Array1::from_vec(y_train.clone());

        let nb = MultinomialNb::params()
            .fit(&Dataset::new(x_train.clone(), y.clone()))
            .context("Naive Bayes training failed")?;
        let logistic = MultiLogisticRegression::default()
            .max_iterations(500)
            .fit(&Dataset::new(x_train.clone(), y.clone()))
            .context("logistic regression training failed")?;
        let tree = DecisionTree::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(Some(24))
            .fit(&Dataset::new(x_train.clone(), y.clone()))
            .context("decision tree training failed")?;

        let mut model = EthnicityModel {
            prep,
            vectorizer,
            classes,
            nb,
            logistic,
            tree,
            report: EvalReport::empty(),
        };

        let test_docs: Vec<Vec<String>> =
            split.test.iter().map(|r| model.prep.tokens(&r.name)).collect();
        let x_test = model.vectorizer.transform(&test_docs);
        let y_test: Vec<usize> = split.test.iter().map(|r| r.label.index()).collect();

        let report = model.evaluate(&x_test, &y_test, &train_docs, &y_train);
        model.report = report;
        Ok(model)
    }

    fn evaluate(
        &self,
        x_test: &Array2<f64>,
        y_test: &[usize],
        train_docs: &[Vec<String>],
        y_train: &[usize],
    ) -> EvalReport {
        let mut evals = Vec::new();
        for kind in ModelKind::ALL {
            let predicted = self.predict_matrix(kind, x_test).to_vec();
            let confusion = ConfusionMatrix::from_pairs(y_test, &predicted, N_CLASSES);
            let per_class = (0..N_CLASSES).map(|k| confusion.class_metrics(k)).collect();

            let roc = self.class_probabilities(kind, x_test).map(|probs| {
                (0..N_CLASSES)
                    .map(|k| {
                        let scores = probs.column(k).to_vec();
                        let truth: Vec<bool> = y_test.iter().map(|&y| y == k).collect();
                        roc_curve(&scores, &truth)
                    })
                    .collect()
            });

            evals.push(ModelEval {
                kind,
                accuracy: confusion.accuracy(),
                macro_f1: confusion.macro_f1(),
                confusion,
                per_class,
                roc,
            });
        }

        let best = evals
            .iter()
            .max_by(|a, b| {
                (a.accuracy, a.macro_f1)
                    .partial_cmp(&(b.accuracy, b.macro_f1))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| e.kind)
            .unwrap_or(ModelKind::NaiveBayes);

        EvalReport {
            train_size: y_train.len(),
            test_size: y_test.len(),
            evals,
            best,
            informative: informative_tokens(train_docs, y_train, 8),
        }
    }

    fn predict_matrix(&self, kind: ModelKind, x: &Array2<f64>) -> Array1<usize> {
        match kind {
            ModelKind::NaiveBayes => self.nb.predict(x),
            ModelKind::LogisticRegression => self.logistic.predict(x),
            ModelKind::DecisionTree => self.tree.predict(x),
        }
    }

    fn nb_probabilities(&self, x: &Array2<f64>) -> Array2<f64> {
        let (proba, classes) = self.nb.predict_proba(x.view());
        let mut out = Array2::zeros((x.nrows(), N_CLASSES));
        for k in 0..N_CLASSES {
            if let Some(j) = classes.iter().position(|&c| *c == k) {
                for i in 0..x.nrows() {
                    out[[i, k]] = proba[[i, j]];
                }
            }
        }
        out
    }

    fn logistic_probabilities(&self, x: &Array2<f64>) -> Array2<f64> {
        let proba = self.logistic.predict_probabilities(x);
        let mut out = Array2::zeros((x.nrows(), N_CLASSES));
        for (j, &class) in self.classes.iter().enumerate() {
            if class < N_CLASSES {
                for i in 0..x.nrows() {
                    out[[i, class]] = proba[[i, j]];
                }
            }
        }
        out
    }

    /// Per-class membership probabilities, columns indexed by
    /// [`Ethnicity::index`]. `None` for the decision tree.
    pub fn class_probabilities(&self, kind: ModelKind, x: &Array2<f64>) -> Option<Array2<f64>> {
        match kind {
            ModelKind::NaiveBayes => Some(self.nb_probabilities(x)),
            ModelKind::LogisticRegression => Some(self.logistic_probabilities(x)),
            ModelKind::DecisionTree => None,
        }
    }

    /// Predicts every name with the best held-out model. Names that are blank
    /// or vectorize to an all-zero row are assigned `Others` directly.
    pub fn predict_batch(&self, names: &[String]) -> Vec<Ethnicity> {
        let docs: Vec<Vec<String>> = names.iter().map(|n| self.prep.tokens(n)).collect();
        let covered: Vec<usize> = (0..docs.len())
            .filter(|&i| self.vectorizer.covers(&docs[i]))
            .collect();

        let mut out = vec![Ethnicity::Others; names.len()];
        if covered.is_empty() {
            return out;
        }

        let covered_docs: Vec<Vec<String>> =
            covered.iter().map(|&i| docs[i].clone()).collect();
        let x = self.vectorizer.transform(&covered_docs);
        let predicted = self.predict_matrix(self.report.best, &x);
        for (slot, &i) in covered.iter().enumerate() {
            out[i] = Ethnicity::from_index(predicted[slot]);
        }
        out
    }

    /// Predicts one name and returns the label with all four class
    /// probabilities. Falls back to the logistic model when the best model is
    /// the tree, which has no probability output.
    pub fn predict_with_proba(&self, name: &str) -> (Ethnicity, [f64; N_CLASSES]) {
        let tokens = self.prep.tokens(name);
        if !self.vectorizer.covers(&tokens) {
            let mut proba = [0.0; N_CLASSES];
            proba[Ethnicity::Others.index()] = 1.0;
            return (Ethnicity::Others, proba);
        }

        let x = self.vectorizer.transform(std::slice::from_ref(&tokens));
        let probs = match self.report.best {
            ModelKind::LogisticRegression | ModelKind::DecisionTree => {
                self.logistic_probabilities(&x)
            }
            ModelKind::NaiveBayes => self.nb_probabilities(&x),
        };

        let mut proba = [0.0; N_CLASSES];
        let mut best = Ethnicity::Others.index();
        for k in 0..N_CLASSES {
            proba[k] = probs[[0, k]];
            if proba[k] > proba[best] {
                best = k;
            }
        }
        (Ethnicity::from_index(best), proba)
    }

    pub fn report(&self) -> &EvalReport {
        &self.report
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    /// Saves the bundle to a binary `.msgpack` file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_named(&mut writer, self).context("failed to serialize model bundle")?;
        Ok(())
    }

    /// Loads the bundle from a binary `.msgpack` file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        from_read(BufReader::new(file)).context("failed to deserialize model bundle")
    }
}

/// Most informative tokens per class, ranked by smoothed in-class frequency
/// against the rest of the corpus.
fn informative_tokens(
    train_docs: &[Vec<String>],
    y_train: &[usize],
    top_n: usize,
) -> Vec<Vec<(String, f64)>> {
    let mut freq: HashMap<&str, [usize; N_CLASSES]> = HashMap::new();
    for (doc, &label) in train_docs.iter().zip(y_train) {
        for token in doc {
            freq.entry(token.as_str()).or_insert([0; N_CLASSES])[label] += 1;
        }
    }

    (0..N_CLASSES)
        .map(|k| {
            let mut ranked: Vec<(String, f64)> = freq
                .iter()
                .map(|(token, counts)| {
                    let in_class = counts[k];
                    let rest: usize = counts.iter().sum::<usize>() - in_class;
                    let ratio = (in_class as f64 + 1.0) / (rest as f64 + 1.0);
                    (token.to_string(), ratio)
                })
                .collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            ranked.truncate(top_n);
            ranked
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(name: &str, label: Ethnicity) -> LabeledName {
        LabeledName {
            name: name.to_string(),
            label,
        }
    }

    /// Small synthetic corpus with strongly class-typed tokens, repeated so
    /// both split halves see every class.
    fn corpus() -> Vec<LabeledName> {
        let malay = ["Nurul Binti Rahman", "Haziq Bin Ismail", "Siti Binti Ahmad"];
        let indian = ["Rajesh Kumar", "Priya Subramaniam", "Arun Kumar Nair"];
        let chinese = ["Tan Wei Ming", "Lim Mei Ling", "Wong Jia Hui"];
        let others = ["John Smith", "Maria Santos", "David Miller"];

        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend(malay.iter().map(|n| labeled(n, Ethnicity::Malay)));
            data.extend(indian.iter().map(|n| labeled(n, Ethnicity::Indian)));
            data.extend(chinese.iter().map(|n| labeled(n, Ethnicity::Chinese)));
            data.extend(others.iter().map(|n| labeled(n, Ethnicity::Others)));
        }
        data
    }

    #[test]
    fn trains_all_three_models_and_evaluates() {
        let model = EthnicityModel::train(&corpus(), 0.25).expect("training");
        assert!(model.vocabulary_size() > 0);

        let report = model.report();
        assert_eq!(report.evals.len(), 3);
        assert_eq!(report.train_size + report.test_size, corpus().len());
        for eval in &report.evals {
            assert_eq!(eval.per_class.len(), Ethnicity::COUNT);
            assert!((0.0..=1.0).contains(&eval.accuracy));
        }
        let with_roc = report.evals.iter().filter(|e| e.roc.is_some()).count();
        assert_eq!(with_roc, 2);
    }

    #[test]
    fn blank_names_predict_others() {
        let model = EthnicityModel::train(&corpus(), 0.25).expect("training");
        let names = vec!["nan".to_string(), String::new(), "???".to_string()];
        let labels = model.predict_batch(&names);
        assert_eq!(labels, vec![Ethnicity::Others; 3]);

        let (label, proba) = model.predict_with_proba("nan");
        assert_eq!(label, Ethnicity::Others);
        assert_eq!(proba[Ethnicity::Others.index()], 1.0);
    }

    #[test]
    fn predict_batch_keeps_input_order() {
        let model = EthnicityModel::train(&corpus(), 0.25).expect("training");
        let names = vec![
            "Tan Wei Ming".to_string(),
            "nan".to_string(),
            "Nurul Binti Rahman".to_string(),
        ];
        let labels = model.predict_batch(&names);
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[1], Ethnicity::Others);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let model = EthnicityModel::train(&corpus(), 0.25).expect("training");
        let (_, proba) = model.predict_with_proba("Tan Wei Ming");
        let total: f64 = proba.iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "probabilities sum to {total}");
    }

    #[test]
    fn bundle_round_trips_through_msgpack() {
        let model = EthnicityModel::train(&corpus(), 0.25).expect("training");
        let path = std::env::temp_dir().join("name2ethnicity_bundle_test.msgpack");

        model.save_to_file(&path).expect("save");
        let loaded = EthnicityModel::load_from_file(&path).expect("load");
        assert_eq!(loaded.vocabulary_size(), model.vocabulary_size());
        assert_eq!(loaded.report().best, model.report().best);

        let names = vec!["Rajesh Kumar".to_string()];
        assert_eq!(loaded.predict_batch(&names), model.predict_batch(&names));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn training_rejects_degenerate_input() {
        let data: Vec<LabeledName> = (0..8)
            .map(|i| labeled(&format!("Tan {i}"), Ethnicity::Chinese))
            .collect();
        assert!(EthnicityModel::train(&data, 0.25).is_err());
    }
}
