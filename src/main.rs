//! Premium Optimizer CLI
//!
//! Prices the first N customers of a dataset and prints the per-stage
//! explanation for each, followed by a portfolio summary.
//!
//! ```sh
//! premium_optimizer data/car_insurance_premium_dataset.csv --count 5 \
//!     --conversion-model models/rf_conversion_model.json \
//!     --output priced_customers.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use premium_optimizer::{
    load_applicants, pipeline::CustomerQuote, EngineConfig, PortfolioSummary, PricingPipeline,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

/// Per-customer insurance pricing: risk score, base premium and optimized market price.
#[derive(Debug, Parser)]
#[command(name = "premium_optimizer", version, about, long_about = None)]
struct Cli {
    /// Customer dataset (CSV with `Driver Age`, `Previous Accidents`,
    /// `Annual Mileage (x1000 km)` and optionally `Insurance Premium ($)`)
    input: PathBuf,
    /// Number of customers to price, from the top of the file
    #[arg(long, short = 'n', value_name = "N")]
    count: Option<usize>,
    /// Engine configuration (JSON). Defaults are used when omitted.
    #[arg(long, short, value_name = "CONFIG")]
    config: Option<PathBuf>,
    /// Trained risk classifier artifact, overrides the configuration
    #[arg(long, value_name = "PATH")]
    risk_model: Option<PathBuf>,
    /// Trained conversion classifier artifact, overrides the configuration
    #[arg(long, value_name = "PATH")]
    conversion_model: Option<PathBuf>,
    /// Write one row per priced customer to this CSV file
    #[arg(long, short, value_name = "CSV")]
    output: Option<PathBuf>,
    /// Write quotes and the portfolio summary to this JSON file
    #[arg(long, value_name = "JSON")]
    json: Option<PathBuf>,
    /// Only print the summary
    #[arg(long, short)]
    quiet: bool,
}

/// One row of the priced customers CSV
#[derive(Debug, Serialize)]
struct OutputRow {
    #[serde(rename = "Customer")]
    customer_id: u64,
    #[serde(rename = "Driver Age")]
    driver_age: f64,
    #[serde(rename = "Previous Accidents")]
    previous_accidents: f64,
    #[serde(rename = "Annual Mileage (x1000 km)")]
    annual_mileage: f64,
    #[serde(rename = "Risk Score")]
    risk_score: f64,
    #[serde(rename = "Base Premium")]
    base_premium: f64,
    #[serde(rename = "Optimal Multiplier")]
    optimal_multiplier: f64,
    #[serde(rename = "Final Premium")]
    final_premium: f64,
    #[serde(rename = "Competitor Price")]
    competitor_price: f64,
    #[serde(rename = "Expected Profit")]
    expected_profit: f64,
    #[serde(rename = "Reference Premium")]
    reference_premium: Option<f64>,
    #[serde(rename = "Company Profit")]
    company_profit: Option<f64>,
}

impl From<&CustomerQuote> for OutputRow {
    fn from(customer: &CustomerQuote) -> Self {
        let profile = &customer.record.profile;
        let response = &customer.quote.response;
        Self {
            customer_id: customer.record.customer_id,
            driver_age: profile.driver_age,
            previous_accidents: profile.previous_accidents,
            annual_mileage: profile.annual_mileage_thousands_km,
            risk_score: response.risk_score,
            base_premium: response.base_premium,
            optimal_multiplier: response.optimal_multiplier,
            final_premium: response.final_premium,
            competitor_price: response.simulated_competitor_price,
            expected_profit: response.expected_profit,
            reference_premium: customer.record.reference_premium,
            company_profit: customer.company_profit(),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    summary: &'a PortfolioSummary,
    quotes: Vec<&'a CustomerQuote>,
    rejected: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(path) = &cli.risk_model {
        config = config.with_risk_model(path);
    }
    if let Some(path) = &cli.conversion_model {
        config = config.with_conversion_model(path);
    }

    let pipeline = PricingPipeline::new(config).context("Failed to build pricing pipeline")?;
    for advisory in pipeline.advisories() {
        eprintln!("Advisory: {}", advisory);
    }

    let mut records = load_applicants(&cli.input)
        .with_context(|| format!("Failed to load customers from {}", cli.input.display()))?;
    if let Some(n) = cli.count {
        records.truncate(n);
    }
    println!("Pricing {} customers from {}", records.len(), cli.input.display());

    let start = Instant::now();
    let results = pipeline.quote_batch(&records);
    let elapsed = start.elapsed();

    let mut rejected = Vec::new();
    for result in &results {
        match result {
            Ok(customer) => {
                if !cli.quiet {
                    print_customer(&pipeline, customer);
                }
            }
            Err(e) => {
                log::warn!("Skipping customer: {}", e);
                rejected.push(e.to_string());
            }
        }
    }

    let summary = PortfolioSummary::from_responses(&results);
    print_summary(&summary);
    println!("Priced in {:?}", elapsed);

    let priced: Vec<&CustomerQuote> = results.iter().filter_map(|r| r.as_ref().ok()).collect();

    if let Some(path) = &cli.output {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        for customer in &priced {
            writer.serialize(OutputRow::from(*customer))?;
        }
        writer.flush()?;
        println!("Wrote {} rows to {}", priced.len(), path.display());
    }

    if let Some(path) = &cli.json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let report = JsonReport {
            summary: &summary,
            quotes: priced,
            rejected,
        };
        serde_json::to_writer_pretty(BufWriter::new(file), &report)?;
        println!("Wrote report to {}", path.display());
    }

    Ok(())
}

fn print_customer(pipeline: &PricingPipeline, customer: &CustomerQuote) {
    let profile = &customer.record.profile;
    println!("\n---------------- CUSTOMER {} ----------------", customer.record.customer_id);
    println!(
        "Driver Age: {}, Previous Accidents: {}, Annual Mileage (x1000 km): {}",
        profile.driver_age, profile.previous_accidents, profile.annual_mileage_thousands_km
    );
    println!("{}", pipeline.explain(&customer.quote));
    println!("FINAL PREMIUM: ${:.2}", customer.quote.response.final_premium);
    if let (Some(reference), Some(profit)) =
        (customer.record.reference_premium, customer.company_profit())
    {
        println!("Reference premium ${:.2}, company profit ${:+.2}", reference, profit);
    }
}

fn print_summary(summary: &PortfolioSummary) {
    println!("\n================ PORTFOLIO SUMMARY ================");
    println!("Customers priced:        {}", summary.quoted);
    println!("Customers rejected:      {}", summary.rejected);
    println!("Mean risk score:         {:.2}", summary.mean_risk_score);
    println!("Total final premium:     ${:.2}", summary.total_final_premium);
    println!("Mean final premium:      ${:.2}", summary.mean_final_premium);
    println!("Total expected profit:   ${:.2}", summary.total_expected_profit);
    if let Some(profit) = summary.total_company_profit {
        println!("Total company profit:    ${:+.2}", profit);
    }
    if summary.fallback_quotes > 0 {
        println!(
            "Quotes using fallback conversion rule: {} of {}",
            summary.fallback_quotes, summary.quoted
        );
    }
}
