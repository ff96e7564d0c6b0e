//! Scoring a fitted classifier on the held-out split
//!
//! Precision and recall are measured in the encoded label space against
//! the positive class chosen by [`ClassNames`]. Accuracy and the ROC curve
//! come from `linfa::metrics`; the confusion counts are kept here because
//! linfa orders the classes of its matrix by hash, not by the positive class.

use crate::core::{ClassNames, ClassifyError, FittedModel, Result, Split};
use crate::model::ClassifierConfig;
use crate::utils::{rounding, validation};
use linfa::dataset::Pr;
use linfa::metrics::{BinaryClassification, ToConfusionMatrix};
use log::{debug, info};
use ndarray::{Array1, Array2};
use std::cmp::Ordering;
use std::fmt;

/// Binary confusion counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    /// Count outcomes with `positive` as the positive label code
    pub fn from_predictions(predicted: &Array1<usize>, actual: &Array1<usize>, positive: usize) -> Self {
        let mut matrix = Self::default();
        for (&pred, &truth) in predicted.iter().zip(actual.iter()) {
            match (pred == positive, truth == positive) {
                (true, true) => matrix.true_positives += 1,
                (false, false) => matrix.true_negatives += 1,
                (true, false) => matrix.false_positives += 1,
                (false, true) => matrix.false_negatives += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Counts laid out as `[[tn, fp], [fn, tp]]` (rows: actual, columns: predicted)
    pub fn as_grid(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Calculate specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// The three headline numbers shown after every classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsResult {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

impl MetricsResult {
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        Self {
            accuracy: matrix.accuracy(),
            precision: matrix.precision(),
            recall: matrix.recall(),
        }
    }

    /// Values rounded to two decimals for display
    pub fn rounded(&self) -> Self {
        Self {
            accuracy: rounding::round2(self.accuracy),
            precision: rounding::round2(self.precision),
            recall: rounding::round2(self.recall),
        }
    }
}

impl fmt::Display for MetricsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        writeln!(f, "Accuracy: {:.2}", rounded.accuracy)?;
        writeln!(f, "Precision: {:.2}", rounded.precision)?;
        write!(f, "Recall: {:.2}", rounded.recall)
    }
}

/// Receiver operating characteristic over every distinct score threshold
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    /// False positive rate per point, starting at 0
    pub fpr: Vec<f64>,
    /// True positive rate per point, starting at 0
    pub tpr: Vec<f64>,
    /// Score threshold per point; the first is `+inf`
    pub thresholds: Vec<f64>,
    /// Area under the curve (trapezoidal rule)
    pub auc: f64,
}

/// Precision-recall trade-off over every distinct score threshold
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionRecallCurve {
    /// Precision per point; the first point is (recall 0, precision 1)
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f64>,
    /// Step-wise area: sum of (R_n - R_{n-1}) * P_n
    pub average_precision: f64,
}

/// Cumulative (threshold, tp, fp) after each block of tied scores,
/// highest scores first
fn threshold_steps(actual: &Array1<usize>, scores: &Array1<f64>, positive: usize) -> Vec<(f64, usize, usize)> {
    let mut pairs: Vec<(f64, bool)> = scores
        .iter()
        .zip(actual.iter())
        .map(|(&score, &label)| (score, label == positive))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let mut steps = Vec::new();
    let (mut tp, mut fp) = (0, 0);
    for (i, &(score, is_positive)) in pairs.iter().enumerate() {
        if is_positive {
            tp += 1;
        } else {
            fp += 1;
        }
        let block_ends = pairs.get(i + 1).map(|next| next.0 != score).unwrap_or(true);
        if block_ends {
            steps.push((score, tp, fp));
        }
    }
    steps
}

impl RocCurve {
    pub fn compute(actual: &Array1<usize>, scores: &Array1<f64>, positive: usize) -> Result<Self> {
        let n_pos = actual.iter().filter(|&&label| label == positive).count();
        let n_neg = actual.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Ok(Self::single_class(actual, scores, positive, n_pos, n_neg));
        }

        let (ranked, mut cutoffs) = ranked_probabilities(scores);
        let truth: Vec<bool> = actual.iter().map(|&label| label == positive).collect();
        let roc = ranked
            .roc(truth.as_slice())
            .map_err(|e| ClassifyError::Metric(format!("ROC curve: {e}")))?;

        // linfa sweeps thresholds upward and reports (tpr, fpr) of the rule
        // `score < t`; flip each point to the rule `score >= t`
        let curve = roc.get_curve();
        cutoffs.push(f64::INFINITY);
        let mut fpr = Vec::with_capacity(curve.len());
        let mut tpr = Vec::with_capacity(curve.len());
        let mut thresholds = Vec::with_capacity(curve.len());
        for (&(below_tp, below_fp), threshold) in curve.iter().zip(&cutoffs).rev() {
            fpr.push(1.0 - f64::from(below_fp));
            tpr.push(1.0 - f64::from(below_tp));
            thresholds.push(*threshold);
        }

        Ok(Self {
            fpr,
            tpr,
            thresholds,
            auc: f64::from(roc.area_under_curve()),
        })
    }

    /// One class only: the rates of the missing class stay at 0 and the
    /// area is reported as chance
    fn single_class(
        actual: &Array1<usize>,
        scores: &Array1<f64>,
        positive: usize,
        n_pos: usize,
        n_neg: usize,
    ) -> Self {
        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];
        let mut thresholds = vec![f64::INFINITY];
        for (threshold, tp, fp) in threshold_steps(actual, scores, positive) {
            fpr.push(ratio(fp, n_neg));
            tpr.push(ratio(tp, n_pos));
            thresholds.push(threshold);
        }
        Self {
            fpr,
            tpr,
            thresholds,
            auc: 0.5,
        }
    }
}

/// Scores replaced by their dense rank scaled into (0, 1], plus the distinct
/// scores in ascending order. Ordering and ties are unchanged, so the curve
/// is the one of the raw scores.
fn ranked_probabilities(scores: &Array1<f64>) -> (Array1<Pr>, Vec<f64>) {
    let mut distinct = scores.to_vec();
    distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    distinct.dedup();

    let levels = distinct.len() as f32;
    let ranked = scores.mapv(|score| {
        let rank = distinct.partition_point(|&d| d < score);
        Pr::new_unchecked((rank + 1) as f32 / levels)
    });
    (ranked, distinct)
}

/// Accuracy through linfa's confusion matrix. linfa takes the class set
/// from the ground truth, so with a one-class test side the local counts
/// are used instead.
fn accuracy(actual: &Array1<usize>, predicted: &Array1<usize>, confusion: &ConfusionMatrix) -> Result<f64> {
    let both_classes = confusion.true_positives + confusion.false_negatives > 0
        && confusion.true_negatives + confusion.false_positives > 0;
    if !both_classes {
        return Ok(confusion.accuracy());
    }
    let matrix = actual
        .confusion_matrix(predicted)
        .map_err(|e| ClassifyError::Metric(format!("confusion matrix: {e}")))?;
    Ok(f64::from(matrix.accuracy()))
}

impl PrecisionRecallCurve {
    pub fn compute(actual: &Array1<usize>, scores: &Array1<f64>, positive: usize) -> Self {
        let n_pos = actual.iter().filter(|&&label| label == positive).count();

        let mut precision = vec![1.0];
        let mut recall = vec![0.0];
        let mut thresholds = vec![f64::INFINITY];
        for (threshold, tp, fp) in threshold_steps(actual, scores, positive) {
            precision.push(ratio(tp, tp + fp));
            recall.push(ratio(tp, n_pos));
            thresholds.push(threshold);
        }

        let average_precision = recall
            .windows(2)
            .zip(precision.iter().skip(1))
            .map(|(r, &p)| (r[1] - r[0]) * p)
            .sum();

        Self {
            precision,
            recall,
            thresholds,
            average_precision,
        }
    }
}

/// Everything measured on the test split for one fitted model
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub metrics: MetricsResult,
    pub confusion: ConfusionMatrix,
    pub roc: RocCurve,
    pub pr: PrecisionRecallCurve,
    pub classes: ClassNames,
}

/// Score an already fitted model on held-out rows
pub fn score_model(
    model: &dyn FittedModel,
    x_test: &Array2<f64>,
    y_test: &Array1<usize>,
    classes: &ClassNames,
) -> Result<Evaluation> {
    if y_test.is_empty() || x_test.nrows() != y_test.len() {
        return Err(ClassifyError::InvalidParameter(format!(
            "cannot score {} rows against {} labels",
            x_test.nrows(),
            y_test.len()
        )));
    }

    let predictions = model.predict(x_test);
    let scores = model.decision_scores(x_test);
    if predictions.len() != y_test.len() || scores.len() != y_test.len() {
        return Err(ClassifyError::Fit(format!(
            "model returned {} predictions and {} scores for {} rows",
            predictions.len(),
            scores.len(),
            y_test.len()
        )));
    }

    let positive = classes.positive();
    let confusion = ConfusionMatrix::from_predictions(&predictions, y_test, positive);
    let metrics = MetricsResult {
        accuracy: accuracy(y_test, &predictions, &confusion)?,
        ..MetricsResult::from_confusion(&confusion)
    };
    debug!(
        "Confusion (positive = {}): tp={} tn={} fp={} fn={}",
        classes.name(positive),
        confusion.true_positives,
        confusion.true_negatives,
        confusion.false_positives,
        confusion.false_negatives
    );

    Ok(Evaluation {
        metrics,
        confusion,
        roc: RocCurve::compute(y_test, &scores, positive)?,
        pr: PrecisionRecallCurve::compute(y_test, &scores, positive),
        classes: classes.clone(),
    })
}

/// Fit `config` on the training side of `split` and score it on the test side
pub fn evaluate(config: &ClassifierConfig, split: &Split, classes: &ClassNames) -> Result<Evaluation> {
    let (positives, negatives) =
        validation::label_balance(&split.y_train.to_vec(), classes.positive());
    debug!(
        "Training on {} rows: {} {}, {} {}",
        split.n_train(),
        positives,
        classes.name(classes.positive()),
        negatives,
        classes.name(classes.negative())
    );

    let model = config.fit(&split.x_train, &split.y_train, classes)?;
    let evaluation = score_model(model.as_ref(), &split.x_test, &split.y_test, classes)?;
    info!(
        "{}: accuracy {:.4}, precision {:.4}, recall {:.4}",
        config.family(),
        evaluation.metrics.accuracy,
        evaluation.metrics.precision,
        evaluation.metrics.recall
    );
    Ok(evaluation)
}
