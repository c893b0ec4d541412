use chrono::NaiveDate;
use hedge_risk_engine::config::EngineConfig;
use hedge_risk_engine::core::asset::AssetId;
use hedge_risk_engine::core::exposure::Exposure;
use hedge_risk_engine::core::instrument::OptionType;
use hedge_risk_engine::core::market::{MarketQuote, MarketState};
use hedge_risk_engine::pricing::forward::cost_of_carry_forward;
use hedge_risk_engine::pricing::options::vanilla_price;
use hedge_risk_engine::risk::aggregation::{hedge_ratio, ExposureAggregator};
use hedge_risk_engine::risk::correlation::{CorrelationProvider, CorrelationTable};
use hedge_risk_engine::risk::var::{Confidence, RiskEngine};
use hedge_risk_engine::simulation::stress_test::{uniform_shock, StressScenarioEngine};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Asset pool mixing calibrated pairs, category defaults and unclassified names.
fn arb_asset() -> impl Strategy<Value = AssetId> {
    prop::sample::select(vec![
        AssetId::new("EURUSD"),
        AssetId::new("GBPUSD"),
        AssetId::new("USDJPY"),
        AssetId::new("AUDUSD"),
        AssetId::new("USDBRL"),
        AssetId::new("WTI"),
        AssetId::new("BRENT"),
        AssetId::new("GOLD"),
        AssetId::new("CORN"),
        AssetId::new("LITHIUM"),
    ])
}

/// Signed, non-zero quantity.
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (1i64..5_000_000i64).prop_map(Decimal::from),
        (1i64..5_000_000i64).prop_map(|q| -Decimal::from(q)),
    ]
}

fn arb_exposure() -> impl Strategy<Value = Exposure> {
    (arb_asset(), arb_quantity(), 1u32..500u32, 0u32..=150u32).prop_map(|(asset, quantity, price, pct)| {
        let maturity = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        Exposure::new(asset, quantity, Decimal::from(price), maturity)
            .unwrap()
            .with_hedged_quantity(quantity * Decimal::from(pct) / Decimal::from(100))
    })
}

/// Market data for every asset in the pool.
fn pool_market() -> MarketState {
    let mut market = MarketState::new();
    for (name, spot, vol) in [
        ("EURUSD", 1.10, 0.08),
        ("GBPUSD", 1.27, 0.09),
        ("USDJPY", 150.0, 0.10),
        ("AUDUSD", 0.66, 0.11),
        ("USDBRL", 5.0, 0.16),
    ] {
        market
            .set_quote(name.into(), MarketQuote::fx(spot, vol, 0.05, 0.02))
            .unwrap();
    }
    for (name, spot, vol) in [
        ("WTI", 80.0, 0.35),
        ("BRENT", 84.0, 0.33),
        ("GOLD", 2000.0, 0.15),
        ("CORN", 4.5, 0.25),
        ("LITHIUM", 15_000.0, 0.45),
    ] {
        market
            .set_quote(name.into(), MarketQuote::commodity(spot, vol, 0.04, 0.02, 0.01))
            .unwrap();
    }
    market
}

fn arb_quote() -> impl Strategy<Value = MarketQuote> {
    let fx = (0.5f64..200.0, 0.01f64..1.0, 0.0f64..0.1, 0.0f64..0.1)
        .prop_map(|(s, v, rd, rf)| MarketQuote::fx(s, v, rd, rf));
    let commodity = (1.0f64..5_000.0, 0.01f64..1.0, 0.0f64..0.1, 0.0f64..0.05, 0.0f64..0.1)
        .prop_map(|(s, v, r, u, y)| MarketQuote::commodity(s, v, r, u, y));
    prop_oneof![fx, commodity]
}

proptest! {
    /// Hedge ratio is always in [0, 100], including the zero-gross case.
    #[test]
    fn hedge_ratio_bounded(
        hedged in -10_000_000i64..10_000_000i64,
        gross in 0i64..10_000_000i64,
    ) {
        let ratio = hedge_ratio(Decimal::from(hedged), Decimal::from(gross));
        prop_assert!(ratio >= Decimal::ZERO);
        prop_assert!(ratio <= Decimal::from(100));
        if gross == 0 {
            prop_assert_eq!(ratio, Decimal::ZERO);
        }
    }

    /// Aggregated hedge ratios stay in range for arbitrary books.
    #[test]
    fn aggregate_hedge_ratio_bounded(exposures in prop::collection::vec(arb_exposure(), 1..20)) {
        let config = EngineConfig::default();
        let summaries = ExposureAggregator::new(&config).aggregate(&exposures, &[], &pool_market());
        for summary in &summaries {
            prop_assert!(summary.hedge_ratio >= Decimal::ZERO);
            prop_assert!(summary.hedge_ratio <= Decimal::from(100));
            prop_assert!(summary.gross_exposure >= summary.net_exposure.abs());
        }
    }

    /// Correlation is symmetric, within [-1, 1], and 1 on the diagonal.
    #[test]
    fn correlation_symmetric(a in arb_asset(), b in arb_asset()) {
        let table = CorrelationTable::standard();
        let market = pool_market();
        let provider = CorrelationProvider::new(&table, &market);
        prop_assert_eq!(provider.correlation(&a, &b), provider.correlation(&b, &a));
        prop_assert!((-1.0..=1.0).contains(&provider.correlation(&a, &b)));
        prop_assert_eq!(provider.correlation(&a, &a), 1.0);
    }

    /// Component VaRs add up to total VaR whenever the variance is positive.
    #[test]
    fn component_var_sums_to_total(exposures in prop::collection::vec(arb_exposure(), 1..20)) {
        let config = EngineConfig::default();
        let market = pool_market();
        let table = CorrelationTable::standard();
        let summaries = ExposureAggregator::new(&config).aggregate(&exposures, &[], &market);
        let engine = RiskEngine::new(CorrelationProvider::new(&table, &market), &config);
        let portfolio = engine.portfolio_from_summaries(&summaries);
        prop_assume!(portfolio.variance() > 0.0);
        for confidence in Confidence::ALL {
            let total = portfolio.value_at_risk(confidence);
            let sum: f64 = portfolio.component_var(confidence).iter().map(|(_, v)| v).sum();
            prop_assert!((sum - total).abs() <= 1e-6 * total.max(1.0));
        }
    }

    /// ES exceeds VaR, and VaR is positive, whenever the variance is positive.
    #[test]
    fn expected_shortfall_exceeds_var(exposures in prop::collection::vec(arb_exposure(), 1..10)) {
        let config = EngineConfig::default();
        let market = pool_market();
        let table = CorrelationTable::standard();
        let summaries = ExposureAggregator::new(&config).aggregate(&exposures, &[], &market);
        let portfolio = RiskEngine::new(CorrelationProvider::new(&table, &market), &config)
            .portfolio_from_summaries(&summaries);
        prop_assume!(portfolio.variance() > 0.0);
        for confidence in Confidence::ALL {
            let var = portfolio.value_at_risk(confidence);
            prop_assert!(var > 0.0);
            prop_assert!(portfolio.expected_shortfall(confidence) > var);
        }
    }

    /// Option values are finite and non-negative for any inputs, degenerate or not.
    #[test]
    fn option_price_non_negative(
        quote in arb_quote(),
        moneyness in 0.5f64..1.5,
        t in -1.0f64..5.0,
        vol in prop::option::of(0.0f64..1.5),
    ) {
        let strike = quote.spot * moneyness;
        for option_type in [OptionType::Call, OptionType::Put] {
            let price = vanilla_price(option_type, &quote, strike, t.max(0.0), vol);
            prop_assert!(price.is_finite());
            prop_assert!(price >= 0.0);
        }
    }

    /// call - put = (F - K)·exp(-rT) for both models.
    #[test]
    fn put_call_parity(quote in arb_quote(), moneyness in 0.7f64..1.3, t in 0.05f64..3.0) {
        let strike = quote.spot * moneyness;
        let call = vanilla_price(OptionType::Call, &quote, strike, t, None);
        let put = vanilla_price(OptionType::Put, &quote, strike, t, None);
        let forward = cost_of_carry_forward(quote.spot, quote.carry_rate(), t);
        let expected = (forward - strike) * (-quote.rate * t).exp();
        prop_assert!((call - put - expected).abs() <= 1e-6 * quote.spot);
    }

    /// A uniform shock scales linearly with the unhedged dollar exposure.
    #[test]
    fn stress_impact_is_linear_in_shock(
        exposures in prop::collection::vec(arb_exposure(), 1..10),
        shock in -0.5f64..0.5,
    ) {
        let assets: Vec<AssetId> = exposures.iter().map(|e| e.asset().clone()).collect();
        let result = StressScenarioEngine::run(&exposures, &uniform_shock("uniform", &assets, shock));
        let unhedged: f64 = exposures.iter().map(|e| e.unhedged_value()).sum();
        prop_assert!((result.impact - unhedged * shock).abs() <= 1e-6 * unhedged.abs().max(1.0));
    }
}
