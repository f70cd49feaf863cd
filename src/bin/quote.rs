//! Quote a single applicant and show every candidate the optimizer considered
//!
//! ```sh
//! quote --age 45 --accidents 1 --mileage 12
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use premium_optimizer::{ApplicantProfile, EngineConfig, PricingPipeline};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "quote",
    about = "Price one applicant and print the multiplier grid",
    long_about = None
)]
struct Args {
    /// Driver age in years
    #[arg(long, default_value_t = premium_optimizer::applicant::DEFAULT_DRIVER_AGE)]
    age: f64,
    /// Number of previous accidents
    #[arg(long, default_value_t = premium_optimizer::applicant::DEFAULT_PREVIOUS_ACCIDENTS)]
    accidents: f64,
    /// Annual mileage in thousands of km
    #[arg(long, default_value_t = premium_optimizer::applicant::DEFAULT_ANNUAL_MILEAGE)]
    mileage: f64,
    /// Engine configuration (JSON)
    #[arg(long, short, value_name = "CONFIG")]
    config: Option<PathBuf>,
    /// Trained risk classifier artifact
    #[arg(long, value_name = "PATH")]
    risk_model: Option<PathBuf>,
    /// Trained conversion classifier artifact
    #[arg(long, value_name = "PATH")]
    conversion_model: Option<PathBuf>,
    /// Print the quote as JSON instead of the table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(path) = &args.risk_model {
        config = config.with_risk_model(path);
    }
    if let Some(path) = &args.conversion_model {
        config = config.with_conversion_model(path);
    }

    let pipeline = PricingPipeline::new(config).context("Failed to build pricing pipeline")?;
    for advisory in pipeline.advisories() {
        eprintln!("Advisory: {}", advisory);
    }

    let applicant = ApplicantProfile::new(args.age, args.accidents, args.mileage);
    let quote = pipeline.quote_detailed(&applicant)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&quote)?);
        return Ok(());
    }

    let base = quote.response.base_premium;
    let (competitor, candidates) = pipeline.optimizer().evaluate_grid(base, &applicant)?;

    println!("{}\n", pipeline.explain(&quote));
    println!("Candidate grid (base ${:.2}, competitor ${:.2}):", base, competitor);
    println!(
        "{:>10} {:>12} {:>12} {:>10} {:>12} {:>14}",
        "Multiplier", "Quote", "Diff", "P(buy)", "Margin", "E[Profit]"
    );
    println!("{}", "-".repeat(75));
    for c in &candidates {
        let marker = if c.multiplier == quote.response.optimal_multiplier { " <-" } else { "" };
        println!(
            "{:>10.3} {:>12.2} {:>12.2} {:>10.4} {:>12.2} {:>14.4}{}",
            c.multiplier,
            c.quoted_premium,
            c.price_difference,
            c.conversion_probability,
            c.profit_margin,
            c.expected_profit,
            marker
        );
    }
    println!("\nFINAL PREMIUM: ${:.2}", quote.response.final_premium);

    Ok(())
}
