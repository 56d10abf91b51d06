#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;

use rfx::cli::args::CliArgs;
use rfx::cli::driver::{self, Session};
use rfx::cli::reporter::Reporter;

fn main() -> Result<()> {
    // Initialize tracing if RFX_LOG or RUST_LOG is set (zero cost otherwise).
    // Supports RFX_LOG_FORMAT=tree|json|text (see src/tracing_config.rs).
    rfx::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let color = !args.no_color && !args.json && std::io::stdout().is_terminal();
    let reporter = Reporter::new(color);
    let session = Session::new(!args.no_demo);

    match driver::run(&session, &args.command) {
        Ok(outcome) => {
            let rendered = if args.json {
                reporter
                    .render_json(&outcome)
                    .context("failed to serialize the query result")?
            } else {
                reporter.render(&outcome)
            };
            println!("{rendered}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", reporter.render_error(&err));
            std::process::exit(driver::exit_code(&err));
        }
    }
}
