//! End-to-end scenarios through the public pipeline.
//!
//! Each test builds a position space from a market catalog, feeds a
//! snapshot through `recompute` (or the domain functions directly), and
//! checks the published probabilities.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use lmsr_probability_engine::domain::aggregator::{aggregate, MarketProbabilities};
use lmsr_probability_engine::domain::display::{implied_scalar_value, DEFAULT_SIGNIFICANT_CHANGE_PCT};
use lmsr_probability_engine::domain::lmsr::LmsrState;
use lmsr_probability_engine::domain::market::{MarketDefinition, OutcomeDefinition, PositionSpace, ScalarBounds};
use lmsr_probability_engine::domain::math::MathContext;
use lmsr_probability_engine::domain::selection::{from_raw_selections, MarketSelection, RawSelection};
use lmsr_probability_engine::domain::simulator::simulate_market_probabilities;
use lmsr_probability_engine::usecases::recompute::{recompute, Snapshot};

// ── Helpers ─────────────────────────────────────────────────

const TOLERANCE: Decimal = dec!(0.00000000000000000001);

fn market(key: &str, shorts: &[&str]) -> MarketDefinition {
    MarketDefinition {
        key: key.to_string(),
        title: format!("Market {key}"),
        outcomes: shorts
            .iter()
            .map(|s| OutcomeDefinition {
                title: s.to_uppercase(),
                short: (*s).to_string(),
            })
            .collect(),
        bounds: None,
    }
}

fn snapshot(funding: Decimal, balances: Vec<Decimal>) -> Snapshot {
    Snapshot {
        sequence: 1,
        captured_at: Utc::now(),
        state: LmsrState::new(funding, balances).unwrap(),
        selections: None,
        staged_trade_amounts: None,
    }
}

fn available(probs: &MarketProbabilities, market: usize) -> Vec<Decimal> {
    probs.get(market).unwrap().as_available().unwrap().to_vec()
}

fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

// ── Scenarios ───────────────────────────────────────────────

#[test]
fn test_fresh_binary_market_is_uniform() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("rain", &["y", "n"])]).unwrap();
    let snap = snapshot(dec!(100), vec![dec!(0), dec!(0)]);

    let inv_b = snap.state.inverse_liquidity(&ctx).unwrap();
    assert_close(inv_b.value(&ctx).unwrap(), dec!(0.006931471805599453094172), TOLERANCE);

    let report = recompute(&space, &ctx, DEFAULT_SIGNIFICANT_CHANGE_PCT, &snap).unwrap();
    assert_eq!(available(&report.market_probabilities, 0), vec![dec!(0.5), dec!(0.5)]);
}

#[test]
fn test_market_maker_long_position_lowers_its_probability() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("rain", &["y", "n"])]).unwrap();
    let report = recompute(
        &space,
        &ctx,
        DEFAULT_SIGNIFICANT_CHANGE_PCT,
        &snapshot(dec!(100), vec![dec!(100), dec!(0)]),
    )
    .unwrap();

    let p = available(&report.market_probabilities, 0);
    assert_close(p[0], dec!(1) / dec!(3), TOLERANCE);
    assert_close(p[1], dec!(2) / dec!(3), TOLERANCE);
}

#[test]
fn test_non_positive_funding_is_a_domain_error() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("rain", &["y", "n"])]).unwrap();

    assert!(LmsrState::new(dec!(0), vec![dec!(0), dec!(0)]).unwrap_err().is_domain());

    // Deserialized states skip the constructor and are re-checked.
    let state: LmsrState =
        serde_json::from_str(r#"{"funding":"0","position_balances":["0","0"]}"#).unwrap();
    let snap = Snapshot {
        sequence: 7,
        captured_at: Utc::now(),
        state,
        selections: None,
        staged_trade_amounts: None,
    };
    let err = recompute(&space, &ctx, DEFAULT_SIGNIFICANT_CHANGE_PCT, &snap).unwrap_err();
    assert!(err.is_domain());
}

#[test]
fn test_balance_count_mismatch_is_invalid_state() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("a", &["y", "n"]), market("b", &["y", "n"])]).unwrap();
    let err = recompute(
        &space,
        &ctx,
        DEFAULT_SIGNIFICANT_CHANGE_PCT,
        &snapshot(dec!(100), vec![dec!(0), dec!(0), dec!(0)]),
    )
    .unwrap_err();
    assert!(err.is_invalid_state());
}

#[test]
fn test_conditioning_matches_renormalized_positions() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("a", &["y", "n"]), market("b", &["y", "n"])]).unwrap();
    let state = LmsrState::new(dec!(100), vec![dec!(10), dec!(20), dec!(30), dec!(40)]).unwrap();
    let probs = state.position_probabilities(&ctx).unwrap();

    // Market 0 varies fastest: positions 0 and 1 have B = outcome 0.
    let selections = vec![MarketSelection::Unselected, MarketSelection::Conditioning(0)];
    let result = aggregate(&space, Some(&selections[..]), &probs, &ctx).unwrap();

    let total = probs[0] + probs[1];
    let a = available(&result, 0);
    assert_close(a[0], probs[0] / total, TOLERANCE);
    assert_close(a[1], probs[1] / total, TOLERANCE);

    // B's own assumption does not restrict B.
    let marginal = aggregate(&space, None, &probs, &ctx).unwrap();
    assert_eq!(result.get(1), marginal.get(1));
}

#[test]
fn test_selection_store_shape_drives_conditioning() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("a", &["y", "n"]), market("b", &["y", "n"])]).unwrap();
    let state = LmsrState::new(dec!(100), vec![dec!(10), dec!(20), dec!(30), dec!(40)]).unwrap();
    let probs = state.position_probabilities(&ctx).unwrap();

    let raw: Vec<RawSelection> = serde_json::from_str(
        r#"[{"selectedOutcomeIndex":-1,"isAssumed":false},{"selectedOutcomeIndex":1,"isAssumed":true}]"#,
    )
    .unwrap();
    let selections = from_raw_selections(&raw).unwrap();
    assert_eq!(selections[1], MarketSelection::Conditioning(1));

    let result = aggregate(&space, Some(&selections[..]), &probs, &ctx).unwrap();
    let a = available(&result, 0);
    assert_close(a[0], probs[2] / (probs[2] + probs[3]), TOLERANCE);
}

#[test]
fn test_staged_trade_moves_probability_with_amount_sign() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("rain", &["y", "n"])]).unwrap();
    let state = LmsrState::new(dec!(100), vec![dec!(0), dec!(0)]).unwrap();
    let inv_b = state.inverse_liquidity(&ctx).unwrap();

    let sell = simulate_market_probabilities(&space, None, &state, &[dec!(-10), dec!(0)], &inv_b, &ctx).unwrap();
    let sell_more =
        simulate_market_probabilities(&space, None, &state, &[dec!(-20), dec!(0)], &inv_b, &ctx).unwrap();
    let buy = simulate_market_probabilities(&space, None, &state, &[dec!(10), dec!(0)], &inv_b, &ctx).unwrap();

    let sell = available(&sell, 0);
    let sell_more = available(&sell_more, 0);
    let buy = available(&buy, 0);

    assert!(sell[0] < dec!(0.5) && sell[1] > dec!(0.5));
    assert!(sell_more[0] < sell[0]);
    assert!(buy[0] > dec!(0.5));
    assert_close(sell[0] + sell[1], Decimal::ONE, TOLERANCE);
}

#[test]
fn test_buying_back_a_deep_short_restores_parity() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("rain", &["y", "n"])]).unwrap();
    let mut snap = snapshot(dec!(100), vec![dec!(9000), dec!(0)]);
    snap.staged_trade_amounts = Some(vec![dec!(9000), dec!(0)]);

    let report = recompute(&space, &ctx, DEFAULT_SIGNIFICANT_CHANGE_PCT, &snap).unwrap();
    let before = available(&report.market_probabilities, 0);
    assert_eq!(before[1], Decimal::ONE);

    let after = available(report.market_probabilities_after_staged_trade.as_ref().unwrap(), 0);
    assert_close(after[0], dec!(0.5), TOLERANCE);
    assert_close(after[1], dec!(0.5), TOLERANCE);
}

#[test]
fn test_uniformly_large_balances_stay_uniform() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("rain", &["y", "n"])]).unwrap();
    let report = recompute(
        &space,
        &ctx,
        DEFAULT_SIGNIFICANT_CHANGE_PCT,
        &snapshot(dec!(1), vec![dec!(1000), dec!(1000)]),
    )
    .unwrap();
    assert_eq!(available(&report.market_probabilities, 0), vec![dec!(0.5), dec!(0.5)]);
}

#[test]
fn test_zero_staged_trade_reproduces_baseline() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![market("a", &["y", "n", "m"]), market("b", &["y", "n"])]).unwrap();
    let balances = vec![dec!(5), dec!(0), dec!(17), dec!(3), dec!(8), dec!(1)];
    let mut snap = snapshot(dec!(50), balances);
    snap.staged_trade_amounts = Some(vec![Decimal::ZERO; 6]);

    let report = recompute(&space, &ctx, DEFAULT_SIGNIFICANT_CHANGE_PCT, &snap).unwrap();
    let after = report.market_probabilities_after_staged_trade.as_ref().unwrap();
    for market in 0..2 {
        for (b, a) in available(&report.market_probabilities, market)
            .into_iter()
            .zip(available(after, market))
        {
            assert_close(a, b, TOLERANCE);
        }
    }
    let changes = report.changes.unwrap();
    assert!(changes.iter().flatten().flatten().all(|c| !c.significant));
}

#[test]
fn test_three_markets_with_conditioning_sum_to_one() {
    let ctx = MathContext::default();
    let space = PositionSpace::new(vec![
        market("a", &["y", "n"]),
        market("b", &["x", "y", "z"]),
        market("c", &["y", "n"]),
    ])
    .unwrap();
    assert_eq!(space.len(), 12);
    assert_eq!(space.positions()[1].id.as_str(), "a:n|b:x|c:y");

    let balances = (0..12).map(|i| Decimal::from(i * 7 % 11)).collect();
    let state = LmsrState::new(dec!(40), balances).unwrap();
    let probs = state.position_probabilities(&ctx).unwrap();
    let selections = vec![
        MarketSelection::Fixed(1),
        MarketSelection::Unselected,
        MarketSelection::Conditioning(0),
    ];

    let result = aggregate(&space, Some(&selections[..]), &probs, &ctx).unwrap();
    for market in result.iter() {
        let total: Decimal = market.as_available().unwrap().iter().sum();
        assert_close(total, Decimal::ONE, TOLERANCE);
    }
}

#[test]
fn test_scalar_market_implied_value() {
    let ctx = MathContext::default();
    let mut temperature = market("temp", &["lo", "hi"]);
    temperature.bounds = Some(ScalarBounds {
        lower: dec!(-10),
        upper: dec!(30),
        unit: Some("°C".to_string()),
    });
    let space = PositionSpace::new(vec![temperature]).unwrap();
    let state = LmsrState::new(dec!(100), vec![dec!(0), dec!(0)]).unwrap();
    let probs = state.position_probabilities(&ctx).unwrap();
    let result = aggregate(&space, None, &probs, &ctx).unwrap();

    let value = implied_scalar_value(&space, 0, &result, &ctx).unwrap().unwrap();
    assert_close(value, dec!(10), TOLERANCE);
}
