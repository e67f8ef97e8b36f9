//! End-to-end checks of configuration layering and command output.

use service_cli::commands::{bond, option};
use service_cli::config::{
    build_config_with, CliOverrides, LogLevel, ENV_LOG_LEVEL, ENV_MC_PATHS, ENV_MC_SEED,
};
use service_cli::output::{render, OutputFormat};
use std::path::PathBuf;

fn write_temp(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pricer-cli-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

const CONFIG: &str = r#"
    log_level = "warn"
    format = "json"

    [monte_carlo]
    paths = 100000
    seed = 1

    [curve]
    zero_rates = [[1.0, 0.04], [10.0, 0.05]]
"#;

const MC_CALL: &str = r#"
    [terms]
    spot = 100.0
    strike = 105.0
    time_to_expiration = 1.0
    risk_free_rate = 0.03
    dividend_yield = 0.0
    volatility = 0.25
    payoff = "call"

    [model]
    model = "monte_carlo"
    n_paths = 20000
    n_steps = 1
"#;

#[test]
fn test_file_env_and_flags_layer_in_order() {
    let config_path = write_temp("layers.toml", CONFIG);
    let overrides = CliOverrides {
        config_file: Some(config_path),
        mc_seed: Some(42),
        ..CliOverrides::default()
    };
    let env = |key: &str| match key {
        k if k == ENV_MC_PATHS => Some("3000".to_string()),
        k if k == ENV_MC_SEED => Some("7".to_string()),
        k if k == ENV_LOG_LEVEL => Some("debug".to_string()),
        _ => None,
    };

    let config = build_config_with(&overrides, env).unwrap();
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.format, OutputFormat::Json);
    assert_eq!(config.monte_carlo.paths, Some(3000));
    assert_eq!(config.monte_carlo.seed, Some(42));
    assert_eq!(config.curve.zero_rates.len(), 2);
}

#[test]
fn test_seeded_option_output_is_reproducible() {
    let config_path = write_temp("seeded.toml", CONFIG);
    let input = write_temp("mc-call.toml", MC_CALL);
    let overrides = CliOverrides {
        config_file: Some(config_path),
        mc_paths: Some(5_000),
        ..CliOverrides::default()
    };
    let config = build_config_with(&overrides, |_| None).unwrap();

    let args = option::OptionArgs { input };
    let first = render(&option::execute(&args, &config).unwrap(), config.format).unwrap();
    let second = render(&option::execute(&args, &config).unwrap(), config.format).unwrap();
    assert_eq!(first, second);
    assert!(first.contains("\"fair_value\""));
}

#[test]
fn test_bond_uses_configured_curve() {
    let config_path = write_temp("curve.toml", CONFIG);
    let zero = write_temp(
        "zero.toml",
        "[terms]\nface_value = 100.0\ncoupon_rate = 0.0\nmaturity = 10.0\nfrequency = 1\n",
    );
    let overrides = CliOverrides {
        config_file: Some(config_path),
        ..CliOverrides::default()
    };
    let config = build_config_with(&overrides, |_| None).unwrap();

    let args = bond::BondArgs {
        input: zero,
        rate: None,
        market_price: None,
    };
    let result = bond::execute(&args, &config).unwrap();
    let expected = 100.0 * (-0.05_f64 * 10.0).exp();
    assert!((result.dirty_price - expected).abs() < 1e-9);
}
