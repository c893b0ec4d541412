//! Commodity stress example.
//!
//! Runs the standard scenario library and a custom supply shock over an
//! energy and metals book, then replays the risk report across a few
//! seeded market ticks.

use chrono::NaiveDate;
use hedge_risk_engine::prelude::*;
use hedge_risk_engine::simulation::stress_test::sector_shock;
use hedge_risk_engine::core::asset::AssetCategory;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal_macros::dec;

fn main() {
    println!("╔════════════════════════════════════════════════╗");
    println!("║  hedge-risk-engine: Commodity Stress Example   ║");
    println!("╚════════════════════════════════════════════════╝\n");

    let valuation_date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
    let mut market = MarketState::new();
    for (asset, spot, vol, storage, convenience) in [
        ("WTI", 80.0, 0.35, 0.02, 0.01),
        ("BRENT", 84.0, 0.33, 0.02, 0.015),
        ("NATGAS", 3.0, 0.55, 0.05, 0.0),
        ("GOLD", 2000.0, 0.15, 0.005, 0.0),
        ("COPPER", 4.0, 0.22, 0.01, 0.03),
    ] {
        market
            .set_quote(asset.into(), MarketQuote::commodity(spot, vol, 0.04, storage, convenience))
            .unwrap();
    }
    market
        .set_quote("USDCAD".into(), MarketQuote::fx(1.36, 0.07, 0.05, 0.045))
        .unwrap();

    let mut book = HedgeBook::new(market, EngineConfig::default(), valuation_date);
    let sept = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
    for (asset, quantity, price, ratio) in [
        ("WTI", dec!(-100_000), dec!(80), dec!(70)),
        ("BRENT", dec!(50_000), dec!(84), dec!(40)),
        ("NATGAS", dec!(-2_000_000), dec!(3), dec!(25)),
        ("GOLD", dec!(1_500), dec!(2000), dec!(0)),
        ("COPPER", dec!(-500_000), dec!(4), dec!(80)),
        ("USDCAD", dec!(10_000_000), dec!(1), dec!(50)),
    ] {
        book.add_exposure(
            Exposure::new(asset.into(), quantity, price, sept)
                .unwrap()
                .with_hedge_ratio(ratio),
        )
        .unwrap();
    }

    // --- Standard library ---
    println!("━━━ Standard Scenarios ━━━\n");
    let results = book.stress_scenarios();
    for result in &results {
        print!("{}", result);
    }
    if let Some(worst) = results.iter().min_by(|a, b| a.impact.total_cmp(&b.impact)) {
        println!("\nWorst case: {} ({:.2})\n", worst.scenario, worst.impact);
    }

    // --- Custom scenarios ---
    println!("━━━ Custom Scenarios ━━━\n");
    let assets: Vec<AssetId> = book.exposures().iter().map(|e| e.asset().clone()).collect();
    let supply_shock = StressScenario::new("Supply Disruption")
        .with_description("crude +25%, gas +40%, CAD strengthens")
        .with_shock("WTI".into(), 0.25)
        .with_shock("BRENT".into(), 0.25)
        .with_shock("NATGAS".into(), 0.40)
        .with_shock("USDCAD".into(), -0.03);
    print!("{}", book.run_scenario(&supply_shock));
    print!("{}", book.run_scenario(&sector_shock(&assets, AssetCategory::Metal, -0.30)));
    println!();

    // --- Risk through time ---
    println!("━━━ VaR Across Ticks ━━━\n");
    let mut rng = StdRng::seed_from_u64(7);
    for day in 0..5 {
        let metrics = book.risk_metrics();
        println!(
            "day {}  VaR95 {:>14.2}  ES95 {:>14.2}  WTI {:>8.3}",
            day,
            metrics.var_95,
            metrics.es_95,
            book.market().spot(&"WTI".into()).unwrap()
        );
        book.tick_with(&mut rng).unwrap();
    }
}
