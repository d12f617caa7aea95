//! End-to-end weighting scenarios.

use approx::assert_relative_eq;
use ballast::optim::{MinimumVarianceOptimizer, RiskParityConfig};
use ballast::{
    BlackLittermanModel, Direction, EqualWeighting, Insight, InsightCollection, InsightWeighting,
    OptimizedWeighting, ReturnHistory, RiskParityOptimizer, SectorWeighting, WeightingScheme,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray::{Array2, array};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 13, 30, 0).unwrap()
}

fn insight(symbol: &str, direction: Direction) -> Insight {
    Insight::new(symbol, direction, t0(), Duration::days(5))
}

#[test]
fn oversubscribed_weights_are_scaled_to_full_exposure() {
    let insights = vec![
        insight("A", Direction::Up).with_weight(0.6),
        insight("B", Direction::Down).with_weight(0.6),
    ];

    let weights = InsightWeighting::default().compute_weights(&insights);

    assert_relative_eq!(weights.get("A").unwrap(), 0.5, epsilon = 1e-12);
    assert_relative_eq!(weights.get("B").unwrap(), -0.5, epsilon = 1e-12);
}

#[test]
fn undersubscribed_weight_is_unchanged() {
    let insights = vec![insight("A", Direction::Up).with_weight(0.25)];

    let weights = InsightWeighting::default().compute_weights(&insights);

    assert_eq!(weights.len(), 1);
    assert_relative_eq!(weights.get("A").unwrap(), 0.25);
}

#[test]
fn risk_parity_identity_covariance_is_equal_weight() {
    let covariance = Array2::<f64>::eye(2);

    let weights = RiskParityOptimizer::default()
        .optimize(&Array2::zeros((0, 2)), None, Some(&covariance))
        .unwrap();

    assert_relative_eq!(weights[0], 0.5, epsilon = 1e-8);
    assert_relative_eq!(weights[1], 0.5, epsilon = 1e-8);
}

#[test]
fn insight_without_weight_is_excluded() {
    let insights = vec![
        insight("A", Direction::Up),
        insight("B", Direction::Up).with_weight(0.3),
    ];

    let weights = InsightWeighting::default().compute_weights(&insights);

    assert!(!weights.contains("A"));
    assert_relative_eq!(weights.get("B").unwrap(), 0.3);
}

#[test]
fn collection_feeds_schemes_with_latest_active_insight() {
    let mut collection = InsightCollection::new();
    collection.add(insight("A", Direction::Up));
    collection.add(Insight::new(
        "A",
        Direction::Down,
        t0() + Duration::hours(1),
        Duration::days(5),
    ));
    collection.add(insight("B", Direction::Up));
    collection.add(Insight::new(
        "C",
        Direction::Up,
        t0() - Duration::days(10),
        Duration::days(1),
    ));

    let active = collection.active_insights(t0() + Duration::hours(2));
    let weights = EqualWeighting::default().compute_weights(&active);

    assert_eq!(weights.len(), 2);
    assert_relative_eq!(weights.get("A").unwrap(), -0.5);
    assert_relative_eq!(weights.get("B").unwrap(), 0.5);
    assert!(!weights.contains("C"));
}

#[test]
fn sector_budget_then_within_sector() {
    let scheme = SectorWeighting::default()
        .with_sector("A", "one")
        .with_sector("B", "one")
        .with_sector("C", "two");
    let insights = vec![
        insight("A", Direction::Up),
        insight("B", Direction::Down),
        insight("C", Direction::Up),
    ];

    let weights = scheme.compute_weights(&insights);

    assert_relative_eq!(weights.get("A").unwrap(), 0.25, epsilon = 1e-12);
    assert_relative_eq!(weights.get("B").unwrap(), -0.25, epsilon = 1e-12);
    assert_relative_eq!(weights.get("C").unwrap(), 0.5, epsilon = 1e-12);
}

fn history() -> ReturnHistory {
    ReturnHistory::new(
        vec!["A".to_string(), "B".to_string(), "C".to_string()],
        array![
            [0.012, 0.003, -0.006],
            [-0.008, -0.001, 0.004],
            [0.010, 0.002, 0.001],
            [-0.011, 0.001, -0.003],
            [0.004, -0.002, 0.005],
            [0.006, 0.000, -0.002]
        ],
    )
    .unwrap()
}

#[test]
fn optimizers_over_insight_universe() {
    let insights = vec![
        insight("A", Direction::Up),
        insight("B", Direction::Up),
        insight("C", Direction::Up),
    ];
    let history = history();

    let risk_parity = OptimizedWeighting::new(RiskParityOptimizer::new(RiskParityConfig {
        maximum_weight: 0.6,
        ..RiskParityConfig::default()
    }))
    .compute_weights(&insights, &history)
    .unwrap();
    assert_eq!(risk_parity.len(), 3);
    assert!(risk_parity.gross_exposure() <= 1.0 + 1e-9);
    for (_, w) in risk_parity.iter() {
        assert!(w > 0.0 && w <= 0.6);
    }

    let min_variance = OptimizedWeighting::new(MinimumVarianceOptimizer::default())
        .compute_weights(&insights, &history)
        .unwrap();
    assert!(min_variance.gross_exposure() <= 1.0 + 1e-9);
}

#[test]
fn black_litterman_weights_from_insights() {
    let insights = vec![
        insight("A", Direction::Up).with_magnitude(0.10),
        insight("B", Direction::Down).with_magnitude(0.05),
        insight("C", Direction::Flat).with_magnitude(0.20),
    ];

    let weights = BlackLittermanModel::default()
        .compute_weights(&insights, &history())
        .unwrap();

    assert!(!weights.contains("C"));
    assert!(weights.gross_exposure() <= 1.0 + 1e-9);
}
