#![deny(warnings)]

//! YAML balance sheets: load, validate and write [`GameConfig`]s.

use sim_core::{GameConfig, ValidationError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid balance sheet {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("balance sheet {path} rejected: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
    #[error("failed to encode balance sheet: {0}")]
    Encode(String),
}

fn parse(text: &str, path: &Path) -> Result<GameConfig, BalanceError> {
    let config: GameConfig = serde_yaml::from_str(text).map_err(|e| BalanceError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.validate().map_err(|source| BalanceError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Parse and validate a sheet held in memory.
pub fn from_yaml_str(text: &str) -> Result<GameConfig, BalanceError> {
    parse(text, Path::new("<inline>"))
}

/// Read, parse and validate one sheet from disk.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GameConfig, BalanceError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| BalanceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&text, path)?;
    debug!(path = %path.display(), producers = config.producers.len(), "loaded balance sheet");
    Ok(config)
}

/// Load every `*.yaml` / `*.yml` sheet in `dir`, keyed by file stem.
///
/// Subdirectories and other files are ignored. The first bad sheet aborts
/// the whole load.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, GameConfig>, BalanceError> {
    let dir = dir.as_ref();
    let io_err = |source| BalanceError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut sheets = BTreeMap::new();
    for ent in fs::read_dir(dir).map_err(io_err)? {
        let path = ent.map_err(io_err)?.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if !path.is_file() || !is_yaml {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        sheets.insert(stem.to_string(), load_config(&path)?);
    }
    info!(dir = %dir.display(), count = sheets.len(), "loaded balance sheets");
    Ok(sheets)
}

/// Render a sheet as YAML that [`from_yaml_str`] reads back.
pub fn to_yaml_string(config: &GameConfig) -> Result<String, BalanceError> {
    serde_yaml::to_string(config).map_err(|e| BalanceError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{AchievementTrigger, Condition, ProducerCostPolicy, ProducerId, UpgradeEffect};

    fn assets() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/balance")
    }

    #[test]
    fn default_sheet_matches_builtin_defaults() {
        let cfg = load_config(assets().join("default.yaml")).unwrap();
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn loads_every_sheet_in_dir() {
        let sheets = load_dir(assets()).unwrap();
        assert!(sheets.contains_key("default"));
        let escalating = &sheets["escalating"];
        assert_eq!(
            escalating.producer_cost_policy,
            ProducerCostPolicy::Escalating
        );
        assert_eq!(escalating.producer_cost_growth, 1.5);
        let doubling = &sheets["doubling"];
        assert_eq!(
            doubling.upgrade.effect,
            UpgradeEffect::ManualActionMultiplier(2.0)
        );
        assert_eq!(doubling.upgrade.growth, 2.0);
    }

    #[test]
    fn multiplier_effect_reads_and_writes() {
        let text = "kind: manual_action_multiplier\namount: 2.0\n";
        let effect: UpgradeEffect = serde_yaml::from_str(text).unwrap();
        assert_eq!(effect, UpgradeEffect::ManualActionMultiplier(2.0));

        let mut cfg = GameConfig::default();
        cfg.upgrade.effect = effect;
        let written = to_yaml_string(&cfg).unwrap();
        assert!(written.contains("manual_action_multiplier"));
        assert_eq!(from_yaml_str(&written).unwrap(), cfg);

        cfg.upgrade.effect = UpgradeEffect::ManualActionMultiplier(1.0);
        let flat = to_yaml_string(&cfg).unwrap();
        assert!(matches!(
            from_yaml_str(&flat),
            Err(BalanceError::Invalid { .. })
        ));
    }

    #[test]
    fn parses_tagged_shapes() {
        let text = r#"
manual_action_value: 5.0
producers:
  - id: miner
    display_name: Miner
    base_cost: 10
    production_rate: 0.5
upgrade:
  base_cost: 50
  growth: 2.0
  effect:
    kind: rate_bonus
    amount: 1.5
evolution:
  threshold: 20
  rate_bonus: 1.0
  lump_sum: 100.0
achievements:
  - id: first_miner
    message: First miner!
    trigger:
      kind: condition
      when:
        check: producer_count
        producer: miner
        at_least: 1
  - id: rich
    message: Rich!
    trigger:
      kind: score_threshold
      when: 500.0
"#;
        let cfg = from_yaml_str(text).unwrap();
        assert_eq!(cfg.producer_cost_policy, ProducerCostPolicy::Fixed);
        assert_eq!(cfg.producer_cost_growth, 1.5);
        assert_eq!(cfg.upgrade.effect, UpgradeEffect::RateBonus(1.5));
        assert_eq!(
            cfg.achievements[0].trigger,
            AchievementTrigger::Condition(Condition::ProducerCount {
                producer: ProducerId::new("miner"),
                at_least: 1,
            })
        );
        assert_eq!(
            cfg.achievements[1].trigger,
            AchievementTrigger::ScoreThreshold(500.0)
        );
    }

    #[test]
    fn written_sheet_reads_back() {
        let mut cfg = GameConfig::default();
        cfg.producer_cost_policy = ProducerCostPolicy::Escalating;
        let text = to_yaml_string(&cfg).unwrap();
        assert_eq!(from_yaml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut cfg = GameConfig::default();
        cfg.upgrade.growth = 1.0;
        let text = to_yaml_string(&cfg).unwrap();
        assert!(matches!(
            from_yaml_str(&text),
            Err(BalanceError::Invalid { .. })
        ));
    }

    #[test]
    fn reports_parse_and_io_errors() {
        assert!(matches!(
            from_yaml_str("manual_action_value: [1, 2]"),
            Err(BalanceError::Parse { .. })
        ));
        assert!(matches!(
            load_config(assets().join("missing.yaml")),
            Err(BalanceError::Io { .. })
        ));
    }
}
