use rust_decimal_macros::dec;

use super::*;

#[test]
fn defaults_pass_validation() {
    Heuristics::default().validate().unwrap();
}

#[test]
fn empty_document_yields_defaults() {
    let h = Heuristics::from_yaml_str("   \n").unwrap();
    assert_eq!(h, Heuristics::default());
}

#[test]
fn partial_override_keeps_other_defaults() {
    let yaml = r"
performance:
  platform_fee_rate: 0.05
reinvestment:
  minimum_profit: 75
";
    let h = Heuristics::from_yaml_str(yaml).unwrap();
    assert_eq!(h.performance.platform_fee_rate, dec!(0.05));
    assert_eq!(h.performance.mature_marketing_rate, dec!(0.08));
    assert_eq!(h.reinvestment.minimum_profit, dec!(75));
    assert_eq!(h.reinvestment.reinvestment_share, dec!(0.7));
    assert_eq!(h.scoring, ScoringHeuristics::default());
}

#[test]
fn price_range_map_override_replaces_defaults() {
    let yaml = r"
pricing:
  price_ranges:
    dropshipping: { min: 10, max: 20 }
";
    let h = Heuristics::from_yaml_str(yaml).unwrap();
    let ds = h.pricing.price_range(BusinessModel::Dropshipping);
    assert_eq!(ds.min, dec!(10));
    assert_eq!(ds.max, dec!(20));
    // digital_products is no longer listed, so the default range applies
    let dp = h.pricing.price_range(BusinessModel::DigitalProducts);
    assert_eq!(dp, h.pricing.default_price_range);
}

#[test]
fn unknown_business_model_key_is_a_parse_error() {
    let yaml = r"
pricing:
  cost_multipliers:
    pottery: 0.2
";
    let err = Heuristics::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::HeuristicsParse(_)), "got: {err:?}");
}

#[test]
fn inverted_signal_range_is_rejected() {
    let yaml = r"
scoring:
  growth_range: { min: 100, max: -50 }
";
    let err = Heuristics::from_yaml_str(yaml).unwrap_err();
    assert!(
        matches!(err, ConfigError::Validation(ref m) if m.contains("growth_range")),
        "got: {err:?}"
    );
}

#[test]
fn rate_above_one_is_rejected() {
    let mut h = Heuristics::default();
    h.performance.platform_fee_rate = dec!(1.2);
    let err = h.validate().unwrap_err();
    assert!(
        matches!(err, ConfigError::Validation(ref m) if m.contains("platform_fee_rate")),
        "got: {err:?}"
    );
}

#[test]
fn markup_floor_below_one_is_rejected() {
    let mut h = Heuristics::default();
    h.pricing.markup_floor = dec!(0.9);
    assert!(matches!(h.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn shares_exceeding_profit_are_rejected() {
    let mut h = Heuristics::default();
    h.reinvestment.reinvestment_share = dec!(0.95);
    assert!(matches!(h.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn vip_tier_below_high_value_is_rejected() {
    let mut h = Heuristics::default();
    h.segmentation.vip.min_spent = dec!(50);
    assert!(matches!(h.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn unmapped_models_fall_back_to_default_tables() {
    let p = PricingHeuristics::default();
    assert_eq!(
        p.price_range(BusinessModel::SoftwareTool),
        PriceRange {
            min: dec!(20),
            max: dec!(60)
        }
    );
    assert_eq!(p.cost_multiplier(BusinessModel::SoftwareTool), dec!(0.4));
    assert_eq!(p.cost_multiplier(BusinessModel::DigitalProducts), dec!(0.1));
}

#[test]
fn load_heuristics_without_path_uses_defaults() {
    assert_eq!(load_heuristics(None).unwrap(), Heuristics::default());
}

#[test]
fn load_heuristics_reports_missing_file() {
    let path = std::env::temp_dir().join("autoincome-heuristics-does-not-exist.yaml");
    let err = load_heuristics(Some(&path)).unwrap_err();
    assert!(
        matches!(err, ConfigError::HeuristicsFileIo { ref path, .. } if path.ends_with("autoincome-heuristics-does-not-exist.yaml")),
        "got: {err:?}"
    );
}

#[test]
fn load_heuristics_reads_file() {
    let path = std::env::temp_dir().join(format!(
        "autoincome-heuristics-{}.yaml",
        std::process::id()
    ));
    std::fs::write(&path, "segmentation:\n  at_risk_days: 45\n").unwrap();
    let h = load_heuristics(Some(&path)).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(h.segmentation.at_risk_days, 45);
    assert_eq!(h.segmentation.new_customer_days, 7);
}
