//! hedge-risk CLI
//!
//! Price and risk a hedging book from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Risk report for a book file
//! hedge-risk report --input book.json
//!
//! # Output as JSON, with engine overrides
//! hedge-risk report --input book.json --format json --config engine.json
//!
//! # Standard stress scenarios
//! hedge-risk scenarios --input book.json
//!
//! # Forward price, optionally with an option on the same asset
//! hedge-risk price --input book.json --asset EURUSD --tenor 3M
//! hedge-risk price --input book.json --asset WTI --tenor 6M --strike 85 --option put
//! ```

use hedge_risk_engine::config::EngineConfig;
use hedge_risk_engine::core::asset::AssetId;
use hedge_risk_engine::core::book::{BookSnapshot, HedgeBook};
use hedge_risk_engine::core::instrument::OptionType;
use hedge_risk_engine::pricing::forward::{time_to_maturity, Tenor};
use hedge_risk_engine::pricing::mtm::InstrumentMark;
use hedge_risk_engine::risk::aggregation::PerAssetExposure;
use hedge_risk_engine::risk::var::RiskMetrics;
use log::info;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"hedge-risk — pricing and risk for FX and commodity hedging books

USAGE:
    hedge-risk <COMMAND> [OPTIONS]

COMMANDS:
    report      VaR, ES, hedge ratios, per-asset exposure and instrument marks
    scenarios   Run the standard stress scenario library
    price       Cost-of-carry forward (and optionally a vanilla option) for an asset
    help        Show this message

OPTIONS:
    --input <FILE>      Path to JSON book file (required)
    --format <FORMAT>   Output format: text (default) or json
    --config <FILE>     Path to JSON engine config (optional)

OPTIONS (price):
    --asset <ASSET>     Asset to price (required)
    --tenor <TENOR>     Tenor such as 0D, 2W, 3M, 1Y (required)
    --strike <K>        Also price a vanilla option at this strike
    --option <TYPE>     call (default) or put
    --vol <SIGMA>       Override the quoted volatility

EXAMPLES:
    hedge-risk report --input book.json
    hedge-risk report --input book.json --format json
    hedge-risk scenarios --input book.json --config engine.json
    hedge-risk price --input book.json --asset EURUSD --tenor 3M --strike 1.12"#
    );
}

#[derive(Default)]
struct Options {
    input: Option<String>,
    format: String,
    config: Option<String>,
    asset: Option<String>,
    tenor: Option<String>,
    strike: Option<f64>,
    option: Option<OptionType>,
    vol: Option<f64>,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn next_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    args.get(i)
        .cloned()
        .unwrap_or_else(|| fail(format!("{} requires {}", flag, what)))
}

fn parse_number(value: &str, flag: &str) -> f64 {
    value
        .parse()
        .unwrap_or_else(|_| fail(format!("{} requires a number, got '{}'", flag, value)))
}

fn parse_options(args: &[String]) -> Options {
    let mut options = Options {
        format: "text".to_string(),
        ..Default::default()
    };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--input" => options.input = Some(next_value(args, i, flag, "a file path")),
            "--format" => options.format = next_value(args, i, flag, "'text' or 'json'"),
            "--config" => options.config = Some(next_value(args, i, flag, "a file path")),
            "--asset" => options.asset = Some(next_value(args, i, flag, "an asset id")),
            "--tenor" => options.tenor = Some(next_value(args, i, flag, "a tenor")),
            "--strike" => options.strike = Some(parse_number(&next_value(args, i, flag, "a number"), flag)),
            "--vol" => options.vol = Some(parse_number(&next_value(args, i, flag, "a number"), flag)),
            "--option" => {
                options.option = Some(match next_value(args, i, flag, "'call' or 'put'").as_str() {
                    "call" => OptionType::Call,
                    "put" => OptionType::Put,
                    other => fail(format!("--option must be 'call' or 'put', got '{}'", other)),
                })
            }
            _ => fail(format!("Unknown option: {}", flag)),
        }
        i += 1;
    }
    if options.format != "text" && options.format != "json" {
        fail(format!("--format must be 'text' or 'json', got '{}'", options.format));
    }
    options
}

fn load_config(path: Option<&str>) -> EngineConfig {
    let Some(path) = path else {
        return EngineConfig::default();
    };
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading config '{}': {}", path, e)));
    EngineConfig::from_json(&content).unwrap_or_else(|e| fail(format!("parsing config '{}': {}", path, e)))
}

fn load_book(options: &Options) -> HedgeBook {
    let path = options
        .input
        .as_deref()
        .unwrap_or_else(|| fail("--input <FILE> is required"));
    let content = fs::read_to_string(path).unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));

    let snapshot = BookSnapshot::from_json(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "valuation_date": "2026-01-02",
  "market": {{
    "EURUSD": {{ "spot": 1.10, "volatility": 0.08, "rate": 0.05,
                "carry": {{ "class": "fx", "foreign_rate": 0.03 }} }}
  }},
  "exposures": [
    {{ "asset": "EURUSD", "quantity": "1000000", "unit_price": "1.10", "maturity": "2026-06-30" }}
  ],
  "instruments": []
}}"#
        );
        process::exit(1);
    });

    let config = load_config(options.config.as_deref());
    let book = snapshot.into_book(config).unwrap_or_else(|e| fail(e));
    info!(
        "loaded {} exposures and {} instruments over {} assets",
        book.exposures().len(),
        book.instruments().len(),
        book.market().len()
    );
    book
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(e));
    println!("{}", json);
}

#[derive(serde::Serialize)]
struct ReportOutput {
    valuation_date: String,
    metrics: RiskMetrics,
    assets: Vec<PerAssetExposure>,
    marks: Vec<InstrumentMark>,
}

fn cmd_report(args: &[String]) {
    let options = parse_options(args);
    let book = load_book(&options);
    let metrics = book.risk_metrics();
    let assets = book.per_asset_exposures();
    let marks = book.instrument_marks();

    if options.format == "json" {
        print_json(&ReportOutput {
            valuation_date: book.valuation_date().to_string(),
            metrics,
            assets,
            marks,
        });
        return;
    }

    println!("Valuation date: {}\n", book.valuation_date());
    println!("{}", metrics);

    println!("=== Exposure by Asset ===");
    println!(
        "{:<12} {:>16} {:>16} {:>8} {:>14} {:>9} {:>14}",
        "Asset", "Gross", "Net", "Hedged%", "VaR95 contrib", "Trend", "Curve"
    );
    for a in &assets {
        println!(
            "{:<12} {:>16.2} {:>16.2} {:>7.1}% {:>14.2} {:>9} {:>14}",
            a.asset,
            a.gross_value,
            a.net_value,
            a.hedge_ratio,
            a.var_contribution,
            format!("{:?}", a.trend),
            a.curve.map(|c| format!("{:?}", c)).unwrap_or_else(|| "-".to_string()),
        );
    }

    if !marks.is_empty() {
        println!("\n=== Instrument Marks ===");
        for m in &marks {
            match (m.mtm, &m.error) {
                (Some(mtm), _) => println!("{:<12} {:<14} {:>16.2}", m.asset, m.kind, mtm),
                (None, Some(error)) => println!("{:<12} {:<14} {:>16}  ({})", m.asset, m.kind, "n/a", error),
                (None, None) => println!("{:<12} {:<14} {:>16}", m.asset, m.kind, "n/a"),
            }
        }
    }
}

fn cmd_scenarios(args: &[String]) {
    let options = parse_options(args);
    let book = load_book(&options);
    let results = book.stress_scenarios();

    if options.format == "json" {
        print_json(&results);
        return;
    }

    if results.is_empty() {
        println!("No live exposures.");
        return;
    }
    println!("=== Stress Scenarios ===");
    for result in &results {
        print!("{}", result);
    }
    if let Some(worst) = results
        .iter()
        .min_by(|a, b| a.impact.total_cmp(&b.impact))
    {
        println!("\nWorst case: {} ({:.2})", worst.scenario, worst.impact);
    }
}

#[derive(serde::Serialize)]
struct PriceOutput {
    asset: String,
    tenor: String,
    maturity: String,
    spot: f64,
    forward: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    option: Option<OptionOutput>,
}

#[derive(serde::Serialize)]
struct OptionOutput {
    option_type: OptionType,
    strike: f64,
    years: f64,
    price: f64,
}

fn cmd_price(args: &[String]) {
    let options = parse_options(args);
    let book = load_book(&options);
    let asset = AssetId::new(
        options
            .asset
            .as_deref()
            .unwrap_or_else(|| fail("--asset <ASSET> is required")),
    );
    let tenor_str = options
        .tenor
        .as_deref()
        .unwrap_or_else(|| fail("--tenor <TENOR> is required"));
    let tenor: Tenor = tenor_str.parse().unwrap_or_else(|e| fail(e));
    let maturity = tenor
        .add_to(book.valuation_date())
        .unwrap_or_else(|| fail(format!("tenor {} is out of range", tenor)));

    let spot = book.market().spot(&asset).unwrap_or_else(|e| fail(e));
    let forward = book.forward_price(&asset, tenor_str).unwrap_or_else(|e| fail(e));

    let option = options.strike.map(|strike| {
        let option_type = options.option.unwrap_or(OptionType::Call);
        let years = time_to_maturity(book.valuation_date(), maturity);
        let price = book
            .option_price(option_type, &asset, strike, years, options.vol)
            .unwrap_or_else(|e| fail(e));
        OptionOutput {
            option_type,
            strike,
            years,
            price,
        }
    });

    if options.format == "json" {
        print_json(&PriceOutput {
            asset: asset.to_string(),
            tenor: tenor.to_string(),
            maturity: maturity.to_string(),
            spot,
            forward,
            option,
        });
        return;
    }

    println!("Asset:    {}", asset);
    println!("Spot:     {:.6}", spot);
    println!("Forward:  {:.6} ({} → {})", forward, tenor, maturity);
    if let Some(o) = option {
        println!(
            "{:<9} {:.6} (strike {}, T = {:.4}y)",
            format!("{}:", o.option_type),
            o.price,
            o.strike,
            o.years
        );
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "report" => cmd_report(rest),
        "scenarios" => cmd_scenarios(rest),
        "price" => cmd_price(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
