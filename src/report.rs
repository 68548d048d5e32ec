//! Console report and SVG charts for the held-out evaluation.

use crate::label::Ethnicity;
use crate::metrics::RocCurve;
use crate::model::{EvalReport, ModelEval, ModelKind};
use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::Path;

/// Prints the metric tables and the most informative tokens.
pub fn print_report(report: &EvalReport) {
    println!(
        "📊 Held-out evaluation ({} train / {} test rows)",
        report.train_size, report.test_size
    );

    for eval in &report.evals {
        println!("\n{}", eval.kind);
        println!(
            "   accuracy: {:.2}%   macro-F1: {:.3}",
            eval.accuracy * 100.0,
            eval.macro_f1
        );
        println!(
            "   {:>8} | {:>9} {:>7} {:>7} {:>8}",
            "class", "precision", "recall", "f1", "support"
        );
        for (k, m) in eval.per_class.iter().enumerate() {
            println!(
                "   {:>8} | {:>9.3} {:>7.3} {:>7.3} {:>8}",
                Ethnicity::from_index(k).as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            );
        }
        if let Some(rocs) = &eval.roc {
            let line = rocs
                .iter()
                .enumerate()
                .map(|(k, r)| format!("{} {:.3}", Ethnicity::from_index(k).as_str(), r.auc))
                .collect::<Vec<_>>()
                .join(", ");
            println!("   AUC (one-vs-rest): {line}");
        }
    }

    println!("\n🏆 Best model on held-out data: {}", report.best);

    println!("\nMost informative tokens (in-class freq ratio vs rest):");
    for (k, tokens) in report.informative.iter().enumerate() {
        let line = tokens
            .iter()
            .map(|(token, ratio)| format!("{token} ({ratio:.1})"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("   {:>8}: {}", Ethnicity::from_index(k).as_str(), line);
    }
}

/// Renders one confusion matrix heatmap per model and one ROC chart per
/// probability-capable model into `dir`.
pub fn render_plots(report: &EvalReport, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    for eval in &report.evals {
        let path = dir.join(format!("confusion_{}.svg", eval.kind.slug()));
        confusion_svg(eval, &path)
            .with_context(|| format!("failed to render {}", path.display()))?;

        if let Some(rocs) = &eval.roc {
            let path = dir.join(format!("roc_{}.svg", eval.kind.slug()));
            roc_svg(eval.kind, rocs, &path)
                .with_context(|| format!("failed to render {}", path.display()))?;
        }
    }
    Ok(())
}

fn class_label(v: f64, n: usize) -> String {
    let index = v.floor() as usize;
    if v.fract().abs() < f64::EPSILON && index < n {
        Ethnicity::from_index(index).as_str().to_string()
    } else {
        String::new()
    }
}

fn confusion_svg(eval: &ModelEval, path: &Path) -> Result<()> {
    let n = eval.confusion.n_classes();
    let max = (0..n)
        .flat_map(|a| (0..n).map(move |p| eval.confusion.count(a, p)))
        .max()
        .unwrap_or(1)
        .max(1) as f64;

    let root = SVGBackend::new(path, (540, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Confusion matrix ({})", eval.kind), ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..n as f64, 0.0..n as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n + 1)
        .y_labels(n + 1)
        .x_label_formatter(&|v| class_label(*v, n))
        .y_label_formatter(&|v| class_label(*v, n))
        .x_desc("predicted")
        .y_desc("actual")
        .draw()?;

    chart.draw_series((0..n).flat_map(|a| (0..n).map(move |p| (a, p))).map(
        |(actual, predicted)| {
            let count = eval.confusion.count(actual, predicted);
            let shade = (count as f64 / max * 180.0) as u8;
            let color = RGBColor(255 - shade, 255 - shade, 255);
            Rectangle::new(
                [
                    (predicted as f64, actual as f64),
                    (predicted as f64 + 1.0, actual as f64 + 1.0),
                ],
                color.filled(),
            )
        },
    ))?;

    chart.draw_series((0..n).flat_map(|a| (0..n).map(move |p| (a, p))).map(
        |(actual, predicted)| {
            let count = eval.confusion.count(actual, predicted);
            Text::new(
                count.to_string(),
                (predicted as f64 + 0.5, actual as f64 + 0.5),
                ("sans-serif", 16),
            )
        },
    ))?;

    root.present()?;
    Ok(())
}

fn roc_svg(kind: ModelKind, rocs: &[RocCurve], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, (560, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("ROC, one-vs-rest ({kind})"),
            ("sans-serif", 22),
        )
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)?;

    chart
        .configure_mesh()
        .x_desc("false positive rate")
        .y_desc("true positive rate")
        .draw()?;

    // chance diagonal
    chart.draw_series(LineSeries::new(
        [(0.0, 0.0), (1.0, 1.0)],
        BLACK.mix(0.3),
    ))?;

    for (k, roc) in rocs.iter().enumerate() {
        let style = Palette99::pick(k).mix(1.0).stroke_width(2);
        chart
            .draw_series(LineSeries::new(roc.points.iter().copied(), style))?
            .label(format!(
                "{} (AUC {:.3})",
                Ethnicity::from_index(k).as_str(),
                roc.auc
            ))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], style));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .position(SeriesLabelPosition::LowerRight)
        .draw()?;

    root.present()?;
    Ok(())
}
