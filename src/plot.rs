//! Diagnostic plots for a scored model
//!
//! Plots are always produced in the order confusion matrix, ROC curve,
//! precision-recall curve, whatever order they were requested in.

use crate::core::{ClassifyError, Result};
use crate::evaluation::Evaluation;
use crate::model::ClassifierFamily;
use log::debug;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Diagnostic plots; declaration order is render order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricPlot {
    ConfusionMatrix,
    RocCurve,
    PrecisionRecallCurve,
}

impl MetricPlot {
    pub const ALL: [MetricPlot; 3] = [
        MetricPlot::ConfusionMatrix,
        MetricPlot::RocCurve,
        MetricPlot::PrecisionRecallCurve,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            MetricPlot::ConfusionMatrix => "Confusion Matrix",
            MetricPlot::RocCurve => "ROC Curve",
            MetricPlot::PrecisionRecallCurve => "Precision-Recall Curve",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            MetricPlot::ConfusionMatrix => "confusion-matrix",
            MetricPlot::RocCurve => "roc-curve",
            MetricPlot::PrecisionRecallCurve => "precision-recall-curve",
        }
    }
}

impl fmt::Display for MetricPlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for MetricPlot {
    type Err = ClassifyError;

    /// Accepts slugs (`roc-curve`) and titles (`ROC Curve`), case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace([' ', '_'], "-");
        MetricPlot::ALL
            .into_iter()
            .find(|plot| plot.slug() == wanted)
            .ok_or_else(|| {
                ClassifyError::InvalidParameter(format!(
                    "unknown metric '{s}', expected one of: confusion-matrix, roc-curve, precision-recall-curve"
                ))
            })
    }
}

/// Set of requested plots, iterated in render order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSelection(BTreeSet<MetricPlot>);

impl MetricSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        MetricPlot::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, plot: MetricPlot) -> bool {
        self.0.insert(plot)
    }

    pub fn contains(&self, plot: MetricPlot) -> bool {
        self.0.contains(&plot)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = MetricPlot> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<MetricPlot> for MetricSelection {
    fn from_iter<I: IntoIterator<Item = MetricPlot>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for MetricSelection {
    type Err = ClassifyError;

    /// Comma separated list; an empty string selects nothing
    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(MetricPlot::from_str)
            .collect()
    }
}

/// Draws one plot for a scored model and returns where it went
pub trait PlotRenderer {
    fn render(
        &self,
        plot: MetricPlot,
        family: ClassifierFamily,
        evaluation: &Evaluation,
    ) -> Result<PathBuf>;
}

/// Writes SVG files named `<family>-<plot>.svg` into a directory
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    out_dir: PathBuf,
    size: (u32, u32),
}

impl SvgRenderer {
    pub fn new<P: AsRef<Path>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
            size: (640, 480),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Target path of a plot
    pub fn path_for(&self, plot: MetricPlot, family: ClassifierFamily) -> PathBuf {
        self.out_dir
            .join(format!("{}-{}.svg", family.slug(), plot.slug()))
    }

    fn draw_confusion_matrix(&self, path: &Path, family: ClassifierFamily, evaluation: &Evaluation) -> DrawResult {
        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let grid = evaluation.confusion.as_grid();
        let max = grid.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;
        let positive = evaluation.classes.positive();
        let negative = evaluation.classes.negative();
        // row/column 0 is the negative class, matching `as_grid`
        let labels = [
            evaluation.classes.name(negative).to_string(),
            evaluation.classes.name(positive).to_string(),
        ];

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} - {}", family.display_name(), MetricPlot::ConfusionMatrix.title()),
                ("sans-serif", 20).into_font(),
            )
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((0u32..2u32).into_segmented(), (0u32..2u32).into_segmented())?;

        // the top row of the picture is segment 1
        let label_of = |v: &SegmentValue<u32>, flip: bool| match v {
            SegmentValue::CenterOf(i) if *i < 2 => {
                let idx = if flip { 1 - *i } else { *i };
                labels[idx as usize].clone()
            }
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Predicted label")
            .y_desc("True label")
            .x_label_formatter(&|v| label_of(v, false))
            .y_label_formatter(&|v| label_of(v, true))
            .draw()?;

        for (row, counts) in grid.iter().enumerate() {
            for (col, &count) in counts.iter().enumerate() {
                let intensity = count as f64 / max;
                let shade = (255.0 * (1.0 - 0.8 * intensity)) as u8;
                let (x, y) = (col as u32, 1 - row as u32);
                chart.draw_series(std::iter::once(Rectangle::new(
                    [
                        (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                        (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                    ],
                    RGBColor(shade, shade, 255).filled(),
                )))?;
                chart.draw_series(std::iter::once(Text::new(
                    count.to_string(),
                    (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                    ("sans-serif", 24).into_font(),
                )))?;
            }
        }

        root.present()?;
        Ok(())
    }

    fn draw_curve(
        &self,
        path: &Path,
        title: String,
        axes: (&str, &str),
        points: Vec<(f64, f64)>,
        legend: String,
        diagonal: bool,
    ) -> DrawResult {
        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..1f64, 0f64..1.05f64)?;

        chart
            .configure_mesh()
            .x_desc(axes.0)
            .y_desc(axes.1)
            .x_labels(6)
            .y_labels(6)
            .draw()?;

        if diagonal {
            chart.draw_series(LineSeries::new(
                vec![(0.0, 0.0), (1.0, 1.0)],
                BLACK.mix(0.3).stroke_width(1),
            ))?;
        }

        chart
            .draw_series(LineSeries::new(points, BLUE.stroke_width(2)))?
            .label(legend)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

impl PlotRenderer for SvgRenderer {
    fn render(
        &self,
        plot: MetricPlot,
        family: ClassifierFamily,
        evaluation: &Evaluation,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir).map_err(|e| {
            ClassifyError::Render(format!("cannot create {}: {e}", self.out_dir.display()))
        })?;
        let path = self.path_for(plot, family);
        let title = format!("{} - {}", family.display_name(), plot.title());

        let drawn = match plot {
            MetricPlot::ConfusionMatrix => self.draw_confusion_matrix(&path, family, evaluation),
            MetricPlot::RocCurve => {
                let roc = &evaluation.roc;
                self.draw_curve(
                    &path,
                    title,
                    ("False Positive Rate", "True Positive Rate"),
                    roc.fpr.iter().copied().zip(roc.tpr.iter().copied()).collect(),
                    format!("AUC = {:.2}", roc.auc),
                    true,
                )
            }
            MetricPlot::PrecisionRecallCurve => {
                let pr = &evaluation.pr;
                self.draw_curve(
                    &path,
                    title,
                    ("Recall", "Precision"),
                    pr.recall.iter().copied().zip(pr.precision.iter().copied()).collect(),
                    format!("AP = {:.2}", pr.average_precision),
                    false,
                )
            }
        };

        drawn.map_err(|e| ClassifyError::Render(format!("{}: {e}", path.display())))?;
        debug!("Rendered {} to {}", plot, path.display());
        Ok(path)
    }
}
