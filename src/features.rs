//! Bag-of-words vectorization of preprocessed name tokens.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Count vectorizer with a deterministic, alphabetically indexed vocabulary.
///
/// `fit` learns the vocabulary from training token lists, `transform` maps
/// token lists to dense count rows. Tokens unseen at fit time are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountVectorizer {
    vocab: BTreeMap<String, usize>,
    max_features: Option<usize>,
}

impl CountVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the `n` most frequent tokens (ties break alphabetically).
    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    pub fn fit(&mut self, docs: &[Vec<String>]) {
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for doc in docs {
            for token in doc {
                *freq.entry(token.as_str()).or_insert(0) += 1;
            }
        }

        let mut tokens: Vec<(&str, usize)> = freq.into_iter().collect();
        if let Some(cap) = self.max_features {
            tokens.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            tokens.truncate(cap);
        }

        let sorted: std::collections::BTreeSet<&str> =
            tokens.into_iter().map(|(t, _)| t).collect();
        self.vocab = sorted
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();
    }

    pub fn transform(&self, docs: &[Vec<String>]) -> Array2<f64> {
        let mut x = Array2::zeros((docs.len(), self.vocab.len()));
        for (i, doc) in docs.iter().enumerate() {
            for token in doc {
                if let Some(&j) = self.vocab.get(token) {
                    x[[i, j]] += 1.0;
                }
            }
        }
        x
    }

    pub fn fit_transform(&mut self, docs: &[Vec<String>]) -> Array2<f64> {
        self.fit(docs);
        self.transform(docs)
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocab
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocab.len()
    }

    /// True when at least one token of `doc` is in the vocabulary, i.e. the
    /// document vectorizes to a non-zero row.
    pub fn covers<S: AsRef<str>>(&self, doc: &[S]) -> bool {
        doc.iter().any(|t| self.vocab.contains_key(t.as_ref()))
    }
}
