//! Writes the demo agreement to `sample_output/sample_agreement.pdf`.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use client_agreement::agreement::{Agreement, SampleData};
use client_agreement::assembler::{AgreementAssembler, AssembledAgreement};

const OUTPUT_PATH: &str = "sample_output/sample_agreement.pdf";

fn generate(path: &Path) -> anyhow::Result<(AssembledAgreement, u64)> {
    let assembled = AgreementAssembler::default()
        .assemble_to(&Agreement::from(SampleData::demo()), path)
        .context("failed to assemble sample agreement")?;
    let size = fs::metadata(&assembled.path)
        .with_context(|| format!("failed to stat {}", assembled.path.display()))?
        .len();
    Ok((assembled, size))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match generate(Path::new(OUTPUT_PATH)) {
        Ok((assembled, size)) => {
            let location = fs::canonicalize(&assembled.path).unwrap_or_else(|_| assembled.path.clone());
            println!("Sample PDF generated successfully!");
            println!("File: {}", assembled.filename);
            println!("Location: {}", location.display());
            println!("Size: {:.1} KB", size as f64 / 1024.0);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error generating sample PDF: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
