use std::io;

use ab_sizer::cli::Args;
use ab_sizer::config::SizerConfig;
use ab_sizer::engine::compute;
use ab_sizer::report;
use ab_sizer::share::share_url;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

/// Exit status when the inputs fail validation.
const EXIT_INVALID_INPUT: i32 = 2;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ab_sizer=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "ab-sizer", &mut io::stdout());
        return Ok(());
    }

    let mut cfg = SizerConfig::load_or_default(args.config.as_deref())?;
    if let Some(port) = args.port {
        cfg.server.port = port;
    }

    // Web UI mode
    if args.web {
        ab_sizer::web::serve(cfg).await?;
        return Ok(());
    }

    let raw = args.resolve_inputs(&cfg.defaults);
    let computation = compute(&raw)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&computation)?);
    } else {
        print!("{}", report::render(&computation, &raw));
    }
    if args.share {
        println!("{}", share_url(&cfg.server.base_url(), &raw));
    }

    if !computation.is_ok() {
        std::process::exit(EXIT_INVALID_INPUT);
    }
    Ok(())
}
