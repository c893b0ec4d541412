//! Basic hedging book example.
//!
//! Builds a small FX and commodity book, hedges part of it, and prints the
//! risk report, per-asset exposure and instrument marks.

use chrono::NaiveDate;
use hedge_risk_engine::prelude::*;
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  hedge-risk-engine: Basic Book Example   ║");
    println!("╚══════════════════════════════════════════╝\n");

    let valuation_date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
    let mut market = MarketState::new();
    market
        .set_quote("EURUSD".into(), MarketQuote::fx(1.10, 0.08, 0.05, 0.03))
        .unwrap();
    market
        .set_quote("USDJPY".into(), MarketQuote::fx(150.0, 0.10, 0.05, 0.001))
        .unwrap();
    market
        .set_quote("WTI".into(), MarketQuote::commodity(80.0, 0.35, 0.04, 0.02, 0.01))
        .unwrap();

    let mut book = HedgeBook::new(market, EngineConfig::default(), valuation_date);

    // --- Exposures ---
    println!("━━━ Exposures ━━━\n");

    let june = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
    let receivable = book
        .add_exposure(
            Exposure::new("EURUSD".into(), dec!(5_000_000), dec!(1.10), june)
                .unwrap()
                .with_hedged_quantity(dec!(3_000_000))
                .with_description("EUR export receivable"),
        )
        .unwrap();
    book.add_exposure(
        Exposure::new("WTI".into(), dec!(-40_000), dec!(80), june)
            .unwrap()
            .with_hedge_ratio(dec!(50))
            .with_description("Q2 fuel purchases"),
    )
    .unwrap();
    book.add_exposure(Exposure::new("USDJPY".into(), dec!(-2_000_000), dec!(1), june).unwrap())
        .unwrap();

    for e in book.exposures() {
        println!(
            "{:<8} qty {:>12}  @ {:<6} hedged {:>5}%  {}",
            e.asset(),
            e.quantity(),
            e.unit_price(),
            e.hedge_ratio(),
            e.description().unwrap_or("")
        );
    }
    println!();

    // --- Hedges ---
    book.add_instrument(
        Instrument::new("EURUSD".into(), InstrumentKind::Forward, dec!(-3_000_000), dec!(1.11), june).unwrap(),
    )
    .unwrap();
    book.add_instrument_spec(
        "WTI".into(),
        InstrumentKind::VanillaCall,
        dec!(20_000),
        StrikeSpec::PercentOfSpot(dec!(105)),
        june,
    )
    .unwrap();

    println!("Hedges matched to the EUR receivable: {}\n", book.matching_instruments(receivable).len());

    // --- Report ---
    println!("━━━ Risk Report ━━━\n");
    println!("{}", book.risk_metrics());

    println!("━━━ Exposure by Asset ━━━\n");
    for a in book.per_asset_exposures() {
        println!(
            "{:<8} net {:>14.2}  hedged {:>5.1}%  VaR95 contrib {:>10.2}  {:?}",
            a.asset, a.net_value, a.hedge_ratio, a.var_contribution, a.trend
        );
    }
    println!();

    println!("━━━ Pricing ━━━\n");
    let eur = AssetId::new("EURUSD");
    for tenor in ["0D", "1M", "3M", "1Y"] {
        println!("EURUSD forward {:<3} {:.5}", tenor, book.forward_price(&eur, tenor).unwrap());
    }
    let call = book
        .option_price(OptionType::Call, &eur, 1.12, 0.5, None)
        .unwrap();
    println!("EURUSD 6M 1.12 call  {:.5}", call);
    println!();

    println!("━━━ Instrument Marks ━━━\n");
    for m in book.instrument_marks() {
        match m.mtm {
            Some(mtm) => println!("{:<8} {:<14} {:>14.2}", m.asset, m.kind, mtm),
            None => println!("{:<8} {:<14} {:>14}", m.asset, m.kind, "n/a"),
        }
    }
}
