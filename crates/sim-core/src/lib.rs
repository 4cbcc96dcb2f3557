#![deny(warnings)]

//! Core domain models and invariants for the paperclip clicker economy.
//!
//! This crate defines the serializable state the engine mutates (player
//! totals, producer roster, upgrade track, achievements) together with the
//! balance sheet ([`GameConfig`]) it is built from and validation helpers that
//! guarantee the sheet's basic invariants.

use serde::{Deserialize, Serialize};
use sim_econ::EconError;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Unique identifier for a producer, e.g. "worker", "grand_estate".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerId(pub String);

impl ProducerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProducerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Unique identifier for an achievement, e.g. "1000_points".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AchievementId(pub String);

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AchievementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Static definition of a producer as listed on a balance sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProducerDef {
    /// Catalog key.
    pub id: ProducerId,
    /// Human-readable label, e.g. "Grand Worker".
    pub display_name: String,
    /// Price of the first unit (> 0).
    pub base_cost: u64,
    /// Output per owned unit per second (>= 0).
    pub production_rate: f64,
}

/// A purchasable producer with its current price and owned count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub id: ProducerId,
    pub display_name: String,
    /// Current price; only ever increases.
    pub cost: u64,
    pub production_rate: f64,
    /// Owned units; only ever increases.
    pub count: u64,
}

impl Producer {
    pub fn from_def(def: &ProducerDef) -> Self {
        Self {
            id: def.id.clone(),
            display_name: def.display_name.clone(),
            cost: def.base_cost,
            production_rate: def.production_rate,
            count: 0,
        }
    }

    /// Add one owned unit.
    pub fn hire(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Escalate the price after a purchase.
    pub fn escalate_cost(&mut self, growth: f64) {
        self.cost = sim_econ::grow_cost(self.cost, growth);
    }

    /// Output per second of all owned units.
    pub fn output(&self) -> f64 {
        self.count as f64 * self.production_rate
    }
}

/// Fixed roster of producers, kept in balance-sheet order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProducerCatalog {
    producers: Vec<Producer>,
}

impl ProducerCatalog {
    pub fn from_defs(defs: &[ProducerDef]) -> Self {
        Self {
            producers: defs.iter().map(Producer::from_def).collect(),
        }
    }

    pub fn get(&self, id: &ProducerId) -> Option<&Producer> {
        self.producers.iter().find(|p| &p.id == id)
    }

    pub fn get_mut(&mut self, id: &ProducerId) -> Option<&mut Producer> {
        self.producers.iter_mut().find(|p| &p.id == id)
    }

    /// Owned units of `id`, zero for unknown producers.
    pub fn count_of(&self, id: &ProducerId) -> u64 {
        self.get(id).map_or(0, |p| p.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Producer> {
        self.producers.iter()
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

/// What each upgrade purchase does.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Raise the value of every manual action by this amount.
    ManualActionBonus(f64),
    /// Add this much to rate-per-second for every purchase made.
    RateBonus(f64),
    /// Multiply the value of every manual action by this factor (> 1).
    ManualActionMultiplier(f64),
}

/// Upgrade chain settings on a balance sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Price of the first purchase (> 0).
    pub base_cost: u64,
    /// Price multiplier per purchase (> 1).
    pub growth: f64,
    pub effect: UpgradeEffect,
}

/// The single escalating-cost upgrade chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTrack {
    base_cost: u64,
    cost: u64,
    growth: f64,
    purchase_count: u32,
    effect: UpgradeEffect,
}

impl UpgradeTrack {
    pub fn new(config: &UpgradeConfig) -> Self {
        Self {
            base_cost: config.base_cost,
            cost: config.base_cost,
            growth: config.growth,
            purchase_count: 0,
            effect: config.effect,
        }
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn purchase_count(&self) -> u32 {
        self.purchase_count
    }

    pub fn effect(&self) -> UpgradeEffect {
        self.effect
    }

    /// Record a paid purchase and escalate the price.
    pub fn purchase(&mut self) {
        self.purchase_count = self.purchase_count.saturating_add(1);
        self.cost = sim_econ::grow_cost(self.cost, self.growth);
    }

    /// Return to the initial price and count (evolution).
    pub fn reset(&mut self) {
        self.cost = self.base_cost;
        self.purchase_count = 0;
    }

    /// Flat rate-per-second contributed by purchases so far.
    pub fn rate_bonus(&self) -> f64 {
        match self.effect {
            UpgradeEffect::RateBonus(amount) => amount * f64::from(self.purchase_count),
            UpgradeEffect::ManualActionBonus(_) | UpgradeEffect::ManualActionMultiplier(_) => 0.0,
        }
    }
}

/// Whether routine hires raise a producer's price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerCostPolicy {
    /// Prices stay at their base value; only explicit producer upgrades escalate.
    #[default]
    Fixed,
    /// Every hire multiplies the price by the producer growth factor.
    Escalating,
}

/// Evolution (prestige) settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Create-value needed to evolve (> 1).
    pub threshold: u32,
    /// Permanent rate-per-second added per evolution.
    pub rate_bonus: f64,
    /// One-time grant to balance and score.
    pub lump_sum: f64,
}

/// Checks a non-threshold achievement can make against current progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Condition {
    /// At least `at_least` units of `producer` are owned.
    ProducerCount { producer: ProducerId, at_least: u64 },
    /// The upgrade track has been bought at least `at_least` times.
    UpgradesPurchased { at_least: u32 },
    /// The player has evolved at least `at_least` times.
    LevelReached { at_least: u32 },
}

/// How an achievement fires: exactly one trigger per achievement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "when", rename_all = "snake_case")]
pub enum AchievementTrigger {
    /// Fires once lifetime score reaches the value.
    ScoreThreshold(f64),
    /// Fires once the condition holds.
    Condition(Condition),
}

/// Achievement entry on a balance sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub message: String,
    pub trigger: AchievementTrigger,
}

/// A one-shot milestone. Once achieved it never reverts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub message: String,
    pub trigger: AchievementTrigger,
    #[serde(default)]
    achieved: bool,
}

impl Achievement {
    pub fn from_def(def: &AchievementDef) -> Self {
        Self {
            id: def.id.clone(),
            message: def.message.clone(),
            trigger: def.trigger.clone(),
            achieved: false,
        }
    }

    pub fn is_achieved(&self) -> bool {
        self.achieved
    }

    /// Latch the achieved flag. Returns `true` only on the first call.
    pub fn mark_achieved(&mut self) -> bool {
        let first = !self.achieved;
        self.achieved = true;
        first
    }
}

/// Engine output consumed by the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub achievement: AchievementId,
    pub message: String,
    /// Game-clock seconds at which the achievement fired.
    pub fired_at: f64,
}

/// Rejection of a purchase. State is left untouched in every case.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PurchaseError {
    /// Balance is below the price.
    #[error("insufficient funds: need {cost}, have {balance:.2}")]
    InsufficientFunds { cost: u64, balance: f64 },
    /// No producer with this id in the catalog.
    #[error("unknown producer: {0}")]
    UnknownProducer(ProducerId),
}

/// Aggregate player resources.
///
/// `rate_per_second` is only written by [`PlayerState::refresh_rate`], which
/// derives it from producer counts, the upgrade track and evolution bonuses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    score: f64,
    balance: f64,
    rate_per_second: f64,
    manual_action_value: f64,
    create_value: u32,
    level: u32,
    evolution_bonus: f64,
}

impl PlayerState {
    pub fn new(manual_action_value: f64) -> Self {
        Self {
            score: 0.0,
            balance: 0.0,
            rate_per_second: 0.0,
            manual_action_value,
            create_value: 0,
            level: 0,
            evolution_bonus: 0.0,
        }
    }

    /// Cumulative lifetime production.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Spendable resource.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn rate_per_second(&self) -> f64 {
        self.rate_per_second
    }

    pub fn manual_action_value(&self) -> f64 {
        self.manual_action_value
    }

    /// Evolution progress counter.
    pub fn create_value(&self) -> u32 {
        self.create_value
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Permanent rate-per-second earned through evolution.
    pub fn evolution_bonus(&self) -> f64 {
        self.evolution_bonus
    }

    /// Add `amount` to both balance and score. Non-positive or non-finite
    /// amounts are ignored.
    pub fn credit(&mut self, amount: f64) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        self.balance = (self.balance + amount).min(f64::MAX);
        self.score = (self.score + amount).min(f64::MAX);
    }

    /// Pay `cost` from the balance, or reject without touching anything.
    pub fn try_debit(&mut self, cost: u64) -> Result<(), PurchaseError> {
        let price = cost as f64;
        if self.balance < price {
            return Err(PurchaseError::InsufficientFunds {
                cost,
                balance: self.balance,
            });
        }
        self.balance = (self.balance - price).max(0.0);
        Ok(())
    }

    pub fn raise_manual_value(&mut self, by: f64) {
        if by.is_finite() && by > 0.0 {
            self.manual_action_value += by;
        }
    }

    pub fn scale_manual_value(&mut self, factor: f64) {
        if factor.is_finite() && factor > 1.0 {
            self.manual_action_value = (self.manual_action_value * factor).min(f64::MAX);
        }
    }

    pub fn bump_create_value(&mut self) {
        self.create_value = self.create_value.saturating_add(1);
    }

    pub fn evolution_ready(&self, threshold: u32) -> bool {
        self.create_value >= threshold
    }

    /// Self-transition of the evolution step. Every field changes together;
    /// the caller checks readiness first.
    pub fn apply_evolution(&mut self, evolution: &EvolutionConfig) {
        self.create_value = 1;
        self.evolution_bonus += evolution.rate_bonus.max(0.0);
        self.credit(evolution.lump_sum);
        self.level = self.level.saturating_add(1);
    }

    /// Recompute rate-per-second from scratch and return it.
    pub fn refresh_rate(&mut self, producers: &ProducerCatalog, upgrades: &UpgradeTrack) -> f64 {
        self.rate_per_second = sim_econ::total_rate(
            producers.iter().map(|p| (p.count, p.production_rate)),
            self.evolution_bonus + upgrades.rate_bonus(),
        );
        self.rate_per_second
    }
}

fn default_cost_growth() -> f64 {
    1.5
}

/// Balance sheet: everything needed to build a fresh engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Credit per manual action at game start (> 0).
    pub manual_action_value: f64,
    #[serde(default)]
    pub producer_cost_policy: ProducerCostPolicy,
    /// Price multiplier for escalating hires (>= 1).
    #[serde(default = "default_cost_growth")]
    pub producer_cost_growth: f64,
    pub producers: Vec<ProducerDef>,
    pub upgrade: UpgradeConfig,
    pub evolution: EvolutionConfig,
    /// Evaluated in this order every tick.
    pub achievements: Vec<AchievementDef>,
}

fn producer(id: &str, display_name: &str, base_cost: u64, production_rate: f64) -> ProducerDef {
    ProducerDef {
        id: ProducerId::new(id),
        display_name: display_name.to_string(),
        base_cost,
        production_rate,
    }
}

fn count_milestone(id: &str, producer: &str, at_least: u64, message: &str) -> AchievementDef {
    AchievementDef {
        id: AchievementId::from(id),
        message: message.to_string(),
        trigger: AchievementTrigger::Condition(Condition::ProducerCount {
            producer: ProducerId::new(producer),
            at_least,
        }),
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            manual_action_value: 100.0,
            producer_cost_policy: ProducerCostPolicy::Fixed,
            producer_cost_growth: default_cost_growth(),
            producers: vec![
                producer("worker", "Worker", 200, 1.0),
                producer("grand_worker", "Grand Worker", 500, 5.0),
                producer("estate", "Estate", 1000, 10.0),
                producer("grand_estate", "Grand Estate", 5000, 50.0),
            ],
            upgrade: UpgradeConfig {
                base_cost: 500,
                growth: 1.5,
                effect: UpgradeEffect::ManualActionBonus(10.0),
            },
            evolution: EvolutionConfig {
                threshold: 100,
                rate_bonus: 10.0,
                lump_sum: 1000.0,
            },
            achievements: vec![
                AchievementDef {
                    id: AchievementId::from("1000_points"),
                    message: "Achievement Unlocked: 1000 Points!".to_string(),
                    trigger: AchievementTrigger::ScoreThreshold(1000.0),
                },
                count_milestone("first_worker", "worker", 1, "Achievement Unlocked: Hired a Worker!"),
                count_milestone(
                    "first_grand_worker",
                    "grand_worker",
                    1,
                    "Achievement Unlocked: Hired a Grand Worker!",
                ),
                count_milestone("10_workers", "worker", 10, "Achievement Unlocked: 10 Workers!"),
                count_milestone("100_workers", "worker", 100, "Achievement Unlocked: 100 Workers!"),
                count_milestone("1000_workers", "worker", 1000, "Achievement Unlocked: 1000 Workers!"),
                count_milestone(
                    "10_grand_workers",
                    "grand_worker",
                    10,
                    "Achievement Unlocked: 10 Grand Workers!",
                ),
                count_milestone(
                    "100_grand_workers",
                    "grand_worker",
                    100,
                    "Achievement Unlocked: 100 Grand Workers!",
                ),
                count_milestone(
                    "1000_grand_workers",
                    "grand_worker",
                    1000,
                    "Achievement Unlocked: 1000 Grand Workers!",
                ),
                count_milestone("10_estates", "estate", 10, "Achievement Unlocked: 10 Estates!"),
                count_milestone(
                    "10_grand_estates",
                    "grand_estate",
                    10,
                    "Achievement Unlocked: 10 Grand Estates!",
                ),
            ],
        }
    }
}

impl GameConfig {
    /// Validate the sheet. See [`validate_config`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_config(self)
    }
}

/// Validation errors for balance-sheet invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Manual action value must be finite and > 0.
    #[error("manual action value must be > 0")]
    NonPositiveManualValue,
    /// Prices must be strictly positive.
    #[error("cost of {0} must be > 0")]
    NonPositiveCost(String),
    /// Rates and amounts must be finite and non-negative.
    #[error("non-finite or negative value for {0}")]
    InvalidAmount(String),
    /// Growth factor rejected by the economics layer.
    #[error(transparent)]
    Growth(#[from] EconError),
    /// Upgrade prices must strictly increase.
    #[error("upgrade growth must be > 1, got {0}")]
    FlatUpgradeCurve(f64),
    /// A multiplicative upgrade must actually grow the manual value.
    #[error("upgrade multiplier must be > 1, got {0}")]
    FlatUpgradeMultiplier(f64),
    /// Evolution resets progress to 1, so the threshold must exceed it.
    #[error("evolution threshold must be > 1, got {0}")]
    EvolutionThreshold(u32),
    /// Producer ids must be unique.
    #[error("duplicate producer id: {0}")]
    DuplicateProducer(String),
    /// Achievement ids must be unique.
    #[error("duplicate achievement id: {0}")]
    DuplicateAchievement(String),
    /// An achievement condition names a producer that is not in the catalog.
    #[error("achievement {achievement} references unknown producer {producer}")]
    UnknownProducer { achievement: String, producer: String },
}

fn check_amount(value: f64, what: impl FnOnce() -> String) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidAmount(what()));
    }
    Ok(())
}

/// Validate a balance sheet, including cross-references from achievements
/// to producers.
pub fn validate_config(config: &GameConfig) -> Result<(), ValidationError> {
    if !config.manual_action_value.is_finite() || config.manual_action_value <= 0.0 {
        return Err(ValidationError::NonPositiveManualValue);
    }
    sim_econ::validate_growth(config.producer_cost_growth)?;

    let mut ids: BTreeSet<&ProducerId> = BTreeSet::new();
    for p in &config.producers {
        if !ids.insert(&p.id) {
            return Err(ValidationError::DuplicateProducer(p.id.0.clone()));
        }
        if p.base_cost == 0 {
            return Err(ValidationError::NonPositiveCost(p.id.0.clone()));
        }
        check_amount(p.production_rate, || format!("production rate of {}", p.id))?;
    }

    let upgrade = &config.upgrade;
    if upgrade.base_cost == 0 {
        return Err(ValidationError::NonPositiveCost("upgrade".to_string()));
    }
    sim_econ::validate_growth(upgrade.growth)?;
    if upgrade.growth <= 1.0 {
        return Err(ValidationError::FlatUpgradeCurve(upgrade.growth));
    }
    match upgrade.effect {
        UpgradeEffect::ManualActionBonus(amount) | UpgradeEffect::RateBonus(amount) => {
            check_amount(amount, || "upgrade effect".to_string())?;
        }
        UpgradeEffect::ManualActionMultiplier(factor) => {
            if !factor.is_finite() || factor <= 1.0 {
                return Err(ValidationError::FlatUpgradeMultiplier(factor));
            }
        }
    }

    let evolution = &config.evolution;
    if evolution.threshold <= 1 {
        return Err(ValidationError::EvolutionThreshold(evolution.threshold));
    }
    check_amount(evolution.rate_bonus, || "evolution rate bonus".to_string())?;
    check_amount(evolution.lump_sum, || "evolution lump sum".to_string())?;

    let mut achievement_ids: BTreeSet<&AchievementId> = BTreeSet::new();
    for a in &config.achievements {
        if !achievement_ids.insert(&a.id) {
            return Err(ValidationError::DuplicateAchievement(a.id.0.clone()));
        }
        match &a.trigger {
            AchievementTrigger::ScoreThreshold(score) => {
                check_amount(*score, || format!("score threshold of {}", a.id))?;
            }
            AchievementTrigger::Condition(Condition::ProducerCount { producer, .. }) => {
                if !ids.contains(producer) {
                    return Err(ValidationError::UnknownProducer {
                        achievement: a.id.0.clone(),
                        producer: producer.0.clone(),
                    });
                }
            }
            AchievementTrigger::Condition(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_sheet_is_valid() {
        let cfg = GameConfig::default();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.producers.len(), 4);
        assert_eq!(cfg.achievements.len(), 11);
        assert_eq!(cfg.achievements[0].id, AchievementId::from("1000_points"));
    }

    #[test]
    fn serde_roundtrip_config() {
        let cfg = GameConfig::default();
        let s = serde_json::to_string_pretty(&cfg).unwrap();
        let back: GameConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn trigger_wire_shape_is_tagged() {
        let t = AchievementTrigger::Condition(Condition::ProducerCount {
            producer: ProducerId::new("worker"),
            at_least: 10,
        });
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["kind"], "condition");
        assert_eq!(v["when"]["check"], "producer_count");
        assert_eq!(v["when"]["producer"], "worker");
    }

    #[test]
    fn duplicate_producer_rejected() {
        let mut cfg = GameConfig::default();
        cfg.producers.push(cfg.producers[0].clone());
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::DuplicateProducer("worker".to_string()))
        );
    }

    #[test]
    fn dangling_producer_reference_rejected() {
        let mut cfg = GameConfig::default();
        cfg.producers.retain(|p| p.id.0 != "estate");
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::UnknownProducer { .. })
        ));
    }

    #[test]
    fn flat_upgrade_curve_rejected() {
        let mut cfg = GameConfig::default();
        cfg.upgrade.growth = 1.0;
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::FlatUpgradeCurve(1.0))
        );
        cfg.upgrade.growth = f64::NAN;
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::Growth(_))
        ));
    }

    #[test]
    fn upgrade_multiplier_must_grow() {
        let mut cfg = GameConfig::default();
        cfg.upgrade.effect = UpgradeEffect::ManualActionMultiplier(2.0);
        assert_eq!(validate_config(&cfg), Ok(()));
        for factor in [1.0, 0.5, f64::NAN] {
            cfg.upgrade.effect = UpgradeEffect::ManualActionMultiplier(factor);
            assert!(matches!(
                validate_config(&cfg),
                Err(ValidationError::FlatUpgradeMultiplier(_))
            ));
        }
    }

    #[test]
    fn manual_value_scales_only_upwards() {
        let mut player = PlayerState::new(100.0);
        player.scale_manual_value(2.0);
        assert_eq!(player.manual_action_value(), 200.0);
        player.scale_manual_value(0.5);
        player.scale_manual_value(f64::INFINITY);
        assert_eq!(player.manual_action_value(), 200.0);
    }

    #[test]
    fn evolution_threshold_must_exceed_reset_value() {
        let mut cfg = GameConfig::default();
        cfg.evolution.threshold = 1;
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::EvolutionThreshold(1))
        );
    }

    #[test]
    fn zero_cost_producer_rejected() {
        let mut cfg = GameConfig::default();
        cfg.producers[1].base_cost = 0;
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::NonPositiveCost("grand_worker".to_string()))
        );
    }

    #[test]
    fn manual_action_credits_balance_and_score() {
        let mut p = PlayerState::new(100.0);
        p.credit(p.manual_action_value());
        assert_eq!(p.balance(), 100.0);
        assert_eq!(p.score(), 100.0);
    }

    #[test]
    fn debit_rejects_without_change() {
        let mut p = PlayerState::new(100.0);
        p.credit(100.0);
        let before = p.clone();
        assert_eq!(
            p.try_debit(200),
            Err(PurchaseError::InsufficientFunds {
                cost: 200,
                balance: 100.0
            })
        );
        assert_eq!(p, before);
        p.try_debit(100).unwrap();
        assert_eq!(p.balance(), 0.0);
        assert_eq!(p.score(), 100.0);
    }

    #[test]
    fn upgrade_track_escalates_and_resets() {
        let mut track = UpgradeTrack::new(&GameConfig::default().upgrade);
        assert_eq!(track.cost(), 500);
        track.purchase();
        assert_eq!(track.cost(), 750);
        assert_eq!(track.purchase_count(), 1);
        track.purchase();
        assert_eq!(track.cost(), 1125);
        track.reset();
        assert_eq!(track.cost(), 500);
        assert_eq!(track.purchase_count(), 0);
    }

    #[test]
    fn rate_is_derived_from_counts_and_bonuses() {
        let cfg = GameConfig::default();
        let mut catalog = ProducerCatalog::from_defs(&cfg.producers);
        let mut track = UpgradeTrack::new(&UpgradeConfig {
            base_cost: 10,
            growth: 2.0,
            effect: UpgradeEffect::RateBonus(2.0),
        });
        let mut p = PlayerState::new(1.0);
        for _ in 0..3 {
            catalog.get_mut(&ProducerId::new("worker")).unwrap().hire();
        }
        catalog.get_mut(&ProducerId::new("estate")).unwrap().hire();
        track.purchase();
        assert_eq!(p.refresh_rate(&catalog, &track), 3.0 + 10.0 + 2.0);
        p.apply_evolution(&cfg.evolution);
        assert_eq!(p.refresh_rate(&catalog, &track), 25.0);
    }

    #[test]
    fn evolution_resets_counter_and_grants_lump_sum() {
        let cfg = GameConfig::default();
        let mut p = PlayerState::new(100.0);
        for _ in 0..100 {
            p.bump_create_value();
        }
        assert!(p.evolution_ready(cfg.evolution.threshold));
        p.apply_evolution(&cfg.evolution);
        assert_eq!(p.create_value(), 1);
        assert_eq!(p.level(), 1);
        assert_eq!(p.balance(), 1000.0);
        assert_eq!(p.score(), 1000.0);
        assert_eq!(p.evolution_bonus(), 10.0);
    }

    #[test]
    fn achievement_latches() {
        let cfg = GameConfig::default();
        let mut a = Achievement::from_def(&cfg.achievements[0]);
        assert!(!a.is_achieved());
        assert!(a.mark_achieved());
        assert!(!a.mark_achieved());
        assert!(a.is_achieved());
    }

    #[test]
    fn catalog_count_of_unknown_is_zero() {
        let catalog = ProducerCatalog::from_defs(&GameConfig::default().producers);
        assert_eq!(catalog.count_of(&ProducerId::new("dragon")), 0);
        assert_eq!(catalog.len(), 4);
    }

    proptest! {
        #[test]
        fn balance_never_negative(ops in proptest::collection::vec((0u64..2_000, 0.0f64..1_000.0), 1..64)) {
            let mut p = PlayerState::new(1.0);
            for (cost, credit) in ops {
                p.credit(credit);
                let before = p.clone();
                if p.try_debit(cost).is_err() {
                    prop_assert_eq!(&p, &before);
                }
                prop_assert!(p.balance() >= 0.0);
                prop_assert!(p.score() >= 0.0);
            }
        }

        #[test]
        fn escalating_hire_raises_price(base in 1u64..1_000_000, hires in 1usize..20) {
            let mut prod = Producer::from_def(&ProducerDef {
                id: ProducerId::new("w"),
                display_name: "W".to_string(),
                base_cost: base,
                production_rate: 1.0,
            });
            let mut last = prod.cost;
            for _ in 0..hires {
                prod.hire();
                prod.escalate_cost(1.5);
                prop_assert!(prod.cost > last);
                last = prod.cost;
            }
            prop_assert_eq!(prod.count, hires as u64);
        }
    }
}
