use anyhow::Result;
use name2ethnicity::{dataset, report, Ethnicity, EthnicityModel};
use std::env;
use std::io::{self, Write};
use std::path::Path;

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let interactive = if let Some(pos) = args.iter().position(|a| a == "--interactive") {
        args.remove(pos);
        true
    } else {
        false
    };

    let train_csv = args
        .first()
        .cloned()
        .unwrap_or_else(|| "data/shipping_names.csv".into());
    let unlabeled_csv = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "data/new_shipments.csv".into());
    let model_path = args.get(2).cloned().unwrap_or_else(|| "model.msgpack".into());
    let reports_dir = args.get(3).cloned().unwrap_or_else(|| "reports".into());

    let model = EthnicityModel::load_or_train_if_stale(
        Path::new(&model_path),
        Path::new(&train_csv),
        0.2,
    )?;

    report::print_report(model.report());
    report::render_plots(model.report(), Path::new(&reports_dir))?;
    println!("🖼️ Charts written to {reports_dir}/");

    let names = dataset::load_unlabeled(Path::new(&unlabeled_csv))?;
    let labels = model.predict_batch(&names);
    let out = dataset::write_predictions(Path::new("."), &names, &labels)?;
    println!("📄 Wrote {} predictions to {}", labels.len(), out.display());

    if interactive {
        loop {
            print!("Enter a name to classify (or 'exit'): ");
            io::stdout().flush()?;
            let mut name = String::new();
            io::stdin().read_line(&mut name)?;
            let name = name.trim();

            if name.eq_ignore_ascii_case("exit") {
                break;
            }

            let (label, proba) = model.predict_with_proba(name);
            let breakdown = Ethnicity::ALL
                .iter()
                .map(|&c| format!("{c} {:.1}%", proba[c.index()] * 100.0))
                .collect::<Vec<_>>()
                .join(", ");
            println!("{name} is classified as {label} ({breakdown})");
        }
    }

    Ok(())
}
