use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use olist_core::config::{PipelineConfig, VisualizationMode};
use olist_core::error::PipelineError;
use olist_core::regions::DEFAULT_REGISTRY_URL;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_the_dashboard() {
    let config = PipelineConfig::default();
    assert_eq!(config.data_dir, PathBuf::from("datasets"));
    assert_eq!(config.region_registry_url, DEFAULT_REGISTRY_URL);
    assert_eq!(config.sample_limit, 30_000);
    assert_eq!(config.sample_year, 2018);
    assert!(!config.strict_region_lookup);
    assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2017, 6, 1).unwrap());
    assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2018, 6, 30).unwrap());
    assert!(config.validate().is_ok());
}

#[test]
fn toml_overrides_individual_fields() -> Result<()> {
    let config = PipelineConfig::from_toml_str(
        r#"
data_dir = "/srv/olist"
strict_region_lookup = true
sample_limit = 500
start_date = "2018-01-01"
"#,
    )?;
    assert_eq!(config.data_dir, PathBuf::from("/srv/olist"));
    assert!(config.strict_region_lookup);
    assert_eq!(config.sample_limit, 500);
    assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
    assert_eq!(config.region_timeout_secs, 10);
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() {
    let err = PipelineConfig::from_toml_str("sample_size = 10").expect_err("unknown key");
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn inverted_date_range_is_rejected() {
    let err = PipelineConfig::from_toml_str(
        "start_date = \"2018-07-01\"\nend_date = \"2018-06-30\"",
    )
    .expect_err("start after end");
    assert!(err.to_string().contains("after end_date"));
}

#[test]
fn environment_overrides_apply_last() -> Result<()> {
    let mut config = PipelineConfig::default();
    config.apply_env(env_from(&[
        ("OLIST_DATA_DIR", "/tmp/olist"),
        ("OLIST_REGION_URL", "http://localhost:8080/regions"),
        ("OLIST_REGION_TIMEOUT_SECS", "3"),
        ("OLIST_STRICT_REGIONS", "yes"),
    ]))?;

    assert_eq!(config.data_dir, PathBuf::from("/tmp/olist"));
    assert_eq!(config.region_registry_url, "http://localhost:8080/regions");
    assert_eq!(config.region_timeout().as_secs(), 3);
    assert!(config.strict_region_lookup);
    Ok(())
}

#[test]
fn bad_environment_values_are_config_errors() {
    let mut config = PipelineConfig::default();
    let err = config
        .apply_env(env_from(&[("OLIST_REGION_TIMEOUT_SECS", "soon")]))
        .expect_err("not a number");
    assert!(matches!(err, PipelineError::Config(_)));

    let err = config
        .apply_env(env_from(&[("OLIST_REGION_TIMEOUT_SECS", "0")]))
        .expect_err("zero timeout");
    assert!(err.to_string().contains("region_timeout_secs"));

    let mut config = PipelineConfig::default();
    let err = config
        .apply_env(env_from(&[("OLIST_STRICT_REGIONS", "maybe")]))
        .expect_err("not a flag");
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn missing_config_file_is_reported() {
    let err = PipelineConfig::load(Some(PathBuf::from("/nonexistent/olist.toml").as_path()))
        .expect_err("file is missing");
    assert!(err.to_string().contains("olist.toml"));
}

#[test]
fn visualization_modes_have_titles() {
    let titles: Vec<String> = [
        VisualizationMode::PaymentMethodDistribution,
        VisualizationMode::PeakShoppingTime,
        VisualizationMode::AverageDeliveryTime,
        VisualizationMode::GeospatialAnalysis,
    ]
    .iter()
    .map(|mode| mode.to_string())
    .collect();
    assert_eq!(
        titles,
        vec![
            "Payment Method Distribution",
            "Peak Shopping Time",
            "Average Delivery Time",
            "Geospatial Analysis",
        ]
    );
}
