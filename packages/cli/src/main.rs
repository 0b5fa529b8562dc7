#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the crime type report.
//!
//! With no arguments, prints the top 10 crime types in Chicago for 2024.
//! Credentials come from `SODA_APP_TOKEN` / `SODA_API_KEY_ID`; log output
//! (stderr) is controlled by `RUST_LOG`.

use std::path::PathBuf;

use clap::Parser;
use crime_report::ReportError;
use crime_report::config::ReportConfig;
use crime_report::fetch_top_crimes;
use crime_report::query::{DEFAULT_LIMIT, DEFAULT_YEAR, DateRange, TallyQuery};
use crime_report::transport::SodaClient;
use crime_report_models::OutputFormat;

#[derive(Parser)]
#[command(
    name = "crime_report",
    about = "Top crime types by incident count from a Socrata open-data portal"
)]
struct Cli {
    /// Number of crime types to list
    #[arg(long, default_value_t = DEFAULT_LIMIT, value_parser = clap::value_parser!(u32).range(1..))]
    limit: u32,
    /// Calendar year to count incidents in
    #[arg(long, default_value_t = DEFAULT_YEAR, conflicts_with = "all_years")]
    year: i32,
    /// Count incidents across all years (no date filter)
    #[arg(long)]
    all_years: bool,
    /// Output format ("text" or "json")
    #[arg(long, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// TOML config file; `SODA_*` environment variables take precedence
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn date_range(&self) -> Result<Option<DateRange>, ReportError> {
        if self.all_years {
            return Ok(None);
        }
        DateRange::calendar_year(self.year).map(Some)
    }

    fn report_config(&self) -> Result<ReportConfig, ReportError> {
        match &self.config {
            Some(path) => Ok(ReportConfig::from_file(path)?.with_env()),
            None => Ok(ReportConfig::from_env()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = cli.report_config()?;
    let query = TallyQuery::top_primary_types(cli.limit, cli.date_range()?);
    let client = SodaClient::new(&config)?;

    let report = fetch_top_crimes(&client, &config, &query).await?;
    if report.tally.is_empty() {
        log::warn!("Request succeeded but no rows were parsed");
    }

    print!("{}", terminated(&report.render(cli.format)?));

    Ok(())
}

/// Ensures the output ends in exactly one newline.
fn terminated(output: &str) -> String {
    let mut output = output.trim_end_matches('\n').to_string();
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_report() {
        let cli = Cli::try_parse_from(["crime_report"]).unwrap();
        assert_eq!(cli.limit, 10);
        assert_eq!(cli.year, 2024);
        assert!(!cli.all_years);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.config.is_none());
        assert!(cli.date_range().unwrap().is_some());
    }

    #[test]
    fn rejects_zero_limit() {
        assert!(Cli::try_parse_from(["crime_report", "--limit", "0"]).is_err());
    }

    #[test]
    fn all_years_drops_date_filter() {
        let cli = Cli::try_parse_from(["crime_report", "--all-years"]).unwrap();
        assert!(cli.date_range().unwrap().is_none());
    }

    #[test]
    fn year_conflicts_with_all_years() {
        assert!(Cli::try_parse_from(["crime_report", "--year", "2023", "--all-years"]).is_err());
    }

    #[test]
    fn parses_json_format() {
        let cli =
            Cli::try_parse_from(["crime_report", "--format", "json", "--limit", "5"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.limit, 5);
    }

    #[test]
    fn output_ends_in_single_newline() {
        assert_eq!(terminated("{}"), "{}\n");
        assert_eq!(terminated("Top 0\n\n"), "Top 0\n");
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["crime_report", "--format", "xml"]).is_err());
    }
}
