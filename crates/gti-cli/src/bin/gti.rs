use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;

use gti_cli::args::{CliArgs, OutputFormat};
use gti_cli::report::Reporter;
use gti_cli::scenario::Scenario;
use gti_cli::{Overrides, run, tracing_config};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INFERENCE_FAILED: i32 = 1;

fn main() -> Result<()> {
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    let overrides = Overrides {
        legacy: args.legacy,
        strict: args.strict,
        no_verify: args.no_verify,
        expected: args.expected.clone(),
    };
    let color = !args.no_color && std::io::stdout().is_terminal();
    let reporter = Reporter::new(color);

    let mut status = EXIT_SUCCESS;
    let mut reports = Vec::with_capacity(args.scenarios.len());
    for path in &args.scenarios {
        let scenario = Scenario::load(path)?;
        let mut report = run(&scenario, &overrides)?;
        if report.name.is_none() {
            report.name = Some(path.display().to_string());
        }
        if !report.is_success() {
            status = EXIT_INFERENCE_FAILED;
        }
        reports.push(report);
    }

    match args.format {
        OutputFormat::Json => {
            let rendered = if let [single] = reports.as_slice() {
                reporter.render_json(single)?
            } else {
                serde_json::to_string_pretty(&reports)?
            };
            println!("{rendered}");
        }
        OutputFormat::Text => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", reporter.render_text(report));
            }
        }
    }
    std::process::exit(status);
}
