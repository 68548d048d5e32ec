//! # name2ethnicity 🧠📦
//!
//! Predict ethnicity (Malay, Indian, Chinese, Others) from customer shipping
//! names using supervised text classification on the [linfa](https://crates.io/crates/linfa)
//! stack.
//!
//! One pass over a labeled spreadsheet export: clean and tokenize the name
//! strings, bag-of-words vectorize, train three classifiers, evaluate them on
//! a held-out split, chart the results and apply the best model to unlabeled
//! names.
//!
//! ## Features
//! - Name normalization, stop word filtering and Porter stemming
//! - Bag-of-words count vectorization with a deterministic vocabulary
//! - Multinomial Naive Bayes, logistic regression and decision tree models
//! - Confusion matrix, per-class precision/recall/F1 and one-vs-rest ROC/AUC
//! - SVG confusion heatmaps and ROC charts via `plotters`
//! - Bundle persistence with `rmp-serde` (MessagePack)
//! - Auto-retrain when the training CSV is updated
//! - Timestamped prediction output for unlabeled names
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use name2ethnicity::EthnicityModel;
//!
//! # fn main() -> anyhow::Result<()> {
//! let model = EthnicityModel::load_or_train_if_stale(
//!     Path::new("model.msgpack"),
//!     Path::new("data/shipping_names.csv"),
//!     0.2,
//! )?;
//! let (label, proba) = model.predict_with_proba("Nurul Aisyah Binti Rahman");
//! println!("{label}: {:.2}%", proba[label.index()] * 100.0);
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod features;
pub mod label;
pub mod metrics;
pub mod model;
pub mod report;
pub mod text;

pub use dataset::{load_labeled, load_unlabeled, train_test_split, DatasetSplit, LabeledName};
pub use features::CountVectorizer;
pub use label::Ethnicity;
pub use model::{EthnicityModel, EvalReport, ModelKind};
pub use text::Preprocessor;
