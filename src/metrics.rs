//! Classification metrics: confusion matrix, per-class scores and
//! one-vs-rest ROC curves.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Row-major confusion matrix, `counts[actual * n + predicted]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    n_classes: usize,
    counts: Vec<usize>,
}

/// Precision, recall and F1 for a single class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ConfusionMatrix {
    pub fn from_pairs(actual: &[usize], predicted: &[usize], n_classes: usize) -> Self {
        debug_assert_eq!(actual.len(), predicted.len());
        let mut counts = vec![0; n_classes * n_classes];
        for (&a, &p) in actual.iter().zip(predicted) {
            if a < n_classes && p < n_classes {
                counts[a * n_classes + p] += 1;
            }
        }
        Self { n_classes, counts }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn count(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual * self.n_classes + predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of test rows whose actual label is `class`.
    pub fn support(&self, class: usize) -> usize {
        (0..self.n_classes).map(|p| self.count(class, p)).sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes).map(|k| self.count(k, k)).sum();
        correct as f64 / total as f64
    }

    pub fn precision(&self, class: usize) -> f64 {
        let predicted: usize = (0..self.n_classes).map(|a| self.count(a, class)).sum();
        if predicted == 0 {
            return 0.0;
        }
        self.count(class, class) as f64 / predicted as f64
    }

    pub fn recall(&self, class: usize) -> f64 {
        let support = self.support(class);
        if support == 0 {
            return 0.0;
        }
        self.count(class, class) as f64 / support as f64
    }

    pub fn f1(&self, class: usize) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }

    pub fn class_metrics(&self, class: usize) -> ClassMetrics {
        ClassMetrics {
            precision: self.precision(class),
            recall: self.recall(class),
            f1: self.f1(class),
            support: self.support(class),
        }
    }

    pub fn macro_f1(&self) -> f64 {
        (0..self.n_classes).map(|k| self.f1(k)).sum::<f64>() / self.n_classes as f64
    }
}

/// A one-vs-rest ROC curve: (false positive rate, true positive rate) points
/// swept over score thresholds, plus the trapezoidal AUC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocCurve {
    pub points: Vec<(f64, f64)>,
    pub auc: f64,
}

/// Builds the ROC curve for one class from its membership scores.
///
/// Tied scores advance together so the curve does not depend on input order.
/// Degenerate inputs (all positive or all negative) fall back to the chance
/// diagonal with an AUC of 0.5.
pub fn roc_curve(scores: &[f64], truth: &[bool]) -> RocCurve {
    debug_assert_eq!(scores.len(), truth.len());
    let positives = truth.iter().filter(|&&t| t).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return RocCurve {
            points: vec![(0.0, 0.0), (1.0, 1.0)],
            auc: 0.5,
        };
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut points = vec![(0.0, 0.0)];
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if truth[order[i]] {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push((fp as f64 / negatives as f64, tp as f64 / positives as f64));
    }

    let auc = points
        .windows(2)
        .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
        .sum();

    RocCurve { points, auc }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn confusion_matrix_counts_and_accuracy() {
        let actual = [0, 0, 1, 1, 2, 3];
        let predicted = [0, 1, 1, 1, 2, 0];
        let cm = ConfusionMatrix::from_pairs(&actual, &predicted, 4);

        assert_eq!(cm.total(), 6);
        assert_eq!(cm.count(0, 0), 1);
        assert_eq!(cm.count(0, 1), 1);
        assert_eq!(cm.count(1, 1), 2);
        assert_eq!(cm.support(1), 2);
        assert!(close(cm.accuracy(), 4.0 / 6.0));
    }

    #[test]
    fn per_class_precision_recall_f1() {
        let actual = [0, 0, 1, 1];
        let predicted = [0, 1, 1, 1];
        let cm = ConfusionMatrix::from_pairs(&actual, &predicted, 2);

        assert!(close(cm.precision(0), 1.0));
        assert!(close(cm.recall(0), 0.5));
        assert!(close(cm.f1(0), 2.0 / 3.0));
        assert!(close(cm.precision(1), 2.0 / 3.0));
        assert!(close(cm.recall(1), 1.0));
    }

    #[test]
    fn absent_class_scores_zero() {
        let cm = ConfusionMatrix::from_pairs(&[0, 0], &[0, 0], 2);
        assert!(close(cm.precision(1), 0.0));
        assert!(close(cm.recall(1), 0.0));
        assert!(close(cm.f1(1), 0.0));
    }

    #[test]
    fn perfect_separation_has_auc_one() {
        let scores = [0.9, 0.8, 0.2, 0.1];
        let truth = [true, true, false, false];
        let roc = roc_curve(&scores, &truth);
        assert!(close(roc.auc, 1.0));
        assert_eq!(roc.points.first(), Some(&(0.0, 0.0)));
        assert_eq!(roc.points.last(), Some(&(1.0, 1.0)));
    }

    #[test]
    fn inverted_scores_have_auc_zero() {
        let scores = [0.1, 0.2, 0.8, 0.9];
        let truth = [true, true, false, false];
        let roc = roc_curve(&scores, &truth);
        assert!(close(roc.auc, 0.0));
    }

    #[test]
    fn tied_scores_advance_together() {
        let scores = [0.5, 0.5, 0.5, 0.5];
        let truth = [true, false, true, false];
        let roc = roc_curve(&scores, &truth);
        assert_eq!(roc.points, vec![(0.0, 0.0), (1.0, 1.0)]);
        assert!(close(roc.auc, 0.5));
    }

    #[test]
    fn single_class_truth_falls_back_to_chance() {
        let roc = roc_curve(&[0.4, 0.6], &[true, true]);
        assert!(close(roc.auc, 0.5));
    }
}
