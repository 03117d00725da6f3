use std::path::PathBuf;

use clap::Parser;

use crate::config::DefaultInputs;
use crate::share::{overlay, parse_query};
use crate::validate::{Field, RawInputs};

#[derive(Parser, Debug)]
#[command(name = "ab-sizer")]
#[command(version)]
#[command(about = "Sample size and duration planner for two-proportion A/B tests")]
pub struct Args {
    /// Baseline conversion rate in percent (e.g. 8)
    #[arg(long, allow_hyphen_values = true)]
    pub baseline: Option<String>,

    /// Minimum detectable relative uplift in percent (e.g. 10)
    #[arg(long, allow_hyphen_values = true)]
    pub uplift: Option<String>,

    /// Significance level (alpha) in percent, two-sided (e.g. 5)
    #[arg(long, allow_hyphen_values = true)]
    pub significance: Option<String>,

    /// Statistical power in percent (e.g. 80)
    #[arg(long, allow_hyphen_values = true)]
    pub power: Option<String>,

    /// Eligible users per day across both arms
    #[arg(long, allow_hyphen_values = true)]
    pub daily_visitors: Option<String>,

    /// Share of traffic sent to the variant, in percent (e.g. 50)
    #[arg(long, allow_hyphen_values = true)]
    pub variant_traffic: Option<String>,

    /// Load inputs from a shared link or its query string
    #[arg(long)]
    pub query: Option<String>,

    /// Path to a TOML config file
    #[arg(long, env = "AB_SIZER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the computation as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print a shareable link for these inputs
    #[arg(long)]
    pub share: bool,

    /// Launch the web page on localhost instead of terminal output
    #[arg(long)]
    pub web: bool,

    /// Port for the web page (overrides the config file)
    #[arg(long)]
    pub port: Option<u16>,

    /// Print a shell completion script and exit
    #[arg(long, value_enum)]
    pub completions: Option<clap_complete::Shell>,
}

impl Args {
    /// Raw value given on the command line for `field`, if any.
    pub fn flag(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::BaselineRatePct => &self.baseline,
            Field::UpliftPct => &self.uplift,
            Field::SignificancePct => &self.significance,
            Field::PowerPct => &self.power,
            Field::DailyVisitors => &self.daily_visitors,
            Field::VariantTrafficPct => &self.variant_traffic,
        };
        value.as_deref()
    }

    /// Resolve the six inputs: flag, then `--query`, then config, then built-in.
    pub fn resolve_inputs(&self, defaults: &DefaultInputs) -> RawInputs {
        let mut raw = defaults.resolve();

        if let Some(query) = &self.query {
            let query = query.split_once('?').map_or(query.as_str(), |(_, q)| q);
            raw = overlay(raw, &parse_query(query));
        }

        for field in Field::ALL {
            if let Some(value) = self.flag(field) {
                raw.set(field, value);
            }
        }
        raw
    }
}
