//! Writes a batch of synthetic chromatography reports for trying out the
//! viewer and the `extract` command.
//!
//! Usage: `generate_sample [OUT_DIR]` (default `samples/`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use rusty_extraktor::sample::{injection, ReportBuilder, SimpleRng, TableStyle, MIXTURE};

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("samples"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let samples = ["Sample_A", "Sample_B", "Sample_C"];
    let concentrations = [0.1, 0.5, 1.0, 2.0, 5.0];

    let mut written = 0;
    for sample in samples {
        for &conc in &concentrations {
            let peaks = injection(&mut rng, &MIXTURE, conc);
            let name = format!("{sample}_{conc}");
            let path = out_dir.join(format!("{name}.pdf"));
            ReportBuilder::new(&name).peaks(peaks).save(&path)?;
            written += 1;
        }
    }

    // A report where integration found nothing, to show exclusions.
    ReportBuilder::new("Blank")
        .style(TableStyle::Omitted)
        .save(&out_dir.join("Blank.pdf"))?;

    println!(
        "Wrote {} reports to {}",
        written + 1,
        out_dir.display()
    );
    Ok(())
}
