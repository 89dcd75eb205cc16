//! Usage cost report - prints the cost of a usage window as JSON.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usage_billing_report::{generate, read_request, ReportConfig, ReportError};

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,usage_billing=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ReportConfig::from_env();
    tracing::debug!(
        request_path = ?config.request_path,
        pricing_catalog_path = ?config.pricing_catalog_path,
        enforce_lookback = config.enforce_lookback,
        "Report configuration loaded"
    );

    match run(&config) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, code = err.code(), "Cost report failed");
            match serde_json::to_string(&err.to_response()) {
                Ok(body) => println!("{body}"),
                Err(_) => eprintln!("{err}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ReportConfig) -> Result<String, ReportError> {
    let input = read_request(config)?;
    generate(config, &input, chrono::Utc::now())
}
