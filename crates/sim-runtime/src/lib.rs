#![deny(warnings)]

//! Tick-driven runtime for the clicker economy.
//!
//! [`EconomyEngine`] owns the whole game state and is the only thing that
//! mutates it. A presentation layer reads elapsed time from a [`Clock`],
//! calls [`EconomyEngine::tick`], forwards player input to the purchase and
//! action operations, then renders from the read-only queries and pending
//! notifications. Everything is synchronous and single-threaded.

mod achievements;
mod clock;

pub use achievements::{AchievementRegistry, Progress, Unlocks};
pub use clock::{Clock, ManualClock, SystemClock};

use serde::{Deserialize, Serialize};
use sim_core::{
    Achievement, GameConfig, Notification, PlayerState, ProducerCatalog, ProducerCostPolicy,
    ProducerId, PurchaseError, UpgradeEffect, UpgradeTrack, ValidationError,
};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Rejection of [`EconomyEngine::evolve`]; state is unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum EvolveError {
    #[error("evolution needs create value {threshold}, have {progress}")]
    NotReady { progress: u32, threshold: u32 },
}

/// Per-producer row of an [`EngineSnapshot`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProducerView {
    pub id: String,
    pub display_name: String,
    pub cost: u64,
    pub count: u64,
    pub production_rate: f64,
}

/// Upgrade track row of an [`EngineSnapshot`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeView {
    pub cost: u64,
    pub purchase_count: u32,
}

/// Serializable read model for renderers and reports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub elapsed_secs: f64,
    pub score: f64,
    pub balance: f64,
    pub rate_per_second: f64,
    pub manual_action_value: f64,
    pub level: u32,
    pub create_value: u32,
    pub evolution_threshold: u32,
    pub producers: Vec<ProducerView>,
    pub upgrade: UpgradeView,
    pub achievements_unlocked: usize,
    pub achievements_total: usize,
}

/// Owned aggregate of the whole economy.
#[derive(Clone, Debug, PartialEq)]
pub struct EconomyEngine {
    config: GameConfig,
    player: PlayerState,
    producers: ProducerCatalog,
    upgrades: UpgradeTrack,
    achievements: AchievementRegistry,
    notifications: Vec<Notification>,
    delivered: usize,
    elapsed_secs: f64,
}

impl Default for EconomyEngine {
    fn default() -> Self {
        Self::build(GameConfig::default())
    }
}

fn sanitize_dt(dt: f64) -> f64 {
    if dt.is_finite() && dt >= 0.0 {
        dt
    } else {
        warn!(dt, "ignoring invalid tick interval");
        0.0
    }
}

impl EconomyEngine {
    /// Build a fresh engine from a validated balance sheet.
    pub fn new(config: GameConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GameConfig) -> Self {
        let mut engine = Self {
            player: PlayerState::new(config.manual_action_value),
            producers: ProducerCatalog::from_defs(&config.producers),
            upgrades: UpgradeTrack::new(&config.upgrade),
            achievements: AchievementRegistry::from_defs(&config.achievements),
            notifications: Vec::new(),
            delivered: 0,
            elapsed_secs: 0.0,
            config,
        };
        engine.after_change();
        engine
    }

    /// Advance the economy by `dt` seconds of constant-rate production.
    ///
    /// Large intervals are applied as one linear increment. Negative or
    /// non-finite `dt` is treated as zero, and a zero interval changes nothing.
    pub fn tick(&mut self, dt: f64) {
        let dt = sanitize_dt(dt);
        self.player.refresh_rate(&self.producers, &self.upgrades);
        if dt > 0.0 {
            let produced = sim_econ::production(self.player.rate_per_second(), dt);
            self.player.credit(produced);
            self.elapsed_secs = (self.elapsed_secs + dt).min(f64::MAX);
            trace!(dt, produced, "tick");
        }
        self.evaluate_achievements();
    }

    /// Tick by whatever the clock reports since its last reading.
    pub fn advance<C: Clock + ?Sized>(&mut self, clock: &mut C) {
        let dt = clock.delta_secs();
        self.tick(dt);
    }

    /// Credit one manual action. Always succeeds.
    pub fn perform_manual_action(&mut self) {
        let value = self.player.manual_action_value();
        self.player.credit(value);
        self.player.bump_create_value();
        trace!(value, "manual action");
        self.after_change();
    }

    /// Routine hire. Escalates the price only under
    /// [`ProducerCostPolicy::Escalating`].
    pub fn purchase_producer(&mut self, id: &ProducerId) -> Result<(), PurchaseError> {
        let escalate = self.config.producer_cost_policy == ProducerCostPolicy::Escalating;
        self.hire(id, escalate)
    }

    /// Hire that always escalates the producer's price afterwards.
    pub fn upgrade_producer(&mut self, id: &ProducerId) -> Result<(), PurchaseError> {
        self.hire(id, true)
    }

    fn hire(&mut self, id: &ProducerId, escalate: bool) -> Result<(), PurchaseError> {
        let growth = self.config.producer_cost_growth;
        let Some(producer) = self.producers.get_mut(id) else {
            debug!(producer = %id, "purchase rejected: unknown producer");
            return Err(PurchaseError::UnknownProducer(id.clone()));
        };
        if let Err(err) = self.player.try_debit(producer.cost) {
            debug!(producer = %id, %err, "purchase rejected");
            return Err(err);
        }
        let paid = producer.cost;
        producer.hire();
        if escalate {
            producer.escalate_cost(growth);
        }
        debug!(
            producer = %id,
            paid,
            count = producer.count,
            next_cost = producer.cost,
            "hired"
        );
        self.after_change();
        Ok(())
    }

    /// Buy the next step of the upgrade chain.
    pub fn purchase_upgrade(&mut self) -> Result<(), PurchaseError> {
        let cost = self.upgrades.cost();
        if let Err(err) = self.player.try_debit(cost) {
            debug!(%err, "upgrade rejected");
            return Err(err);
        }
        self.upgrades.purchase();
        match self.upgrades.effect() {
            UpgradeEffect::ManualActionBonus(amount) => self.player.raise_manual_value(amount),
            UpgradeEffect::ManualActionMultiplier(factor) => self.player.scale_manual_value(factor),
            UpgradeEffect::RateBonus(_) => {}
        }
        self.player.bump_create_value();
        debug!(
            paid = cost,
            purchases = self.upgrades.purchase_count(),
            next_cost = self.upgrades.cost(),
            "upgrade purchased"
        );
        self.after_change();
        Ok(())
    }

    pub fn can_evolve(&self) -> bool {
        self.player.evolution_ready(self.config.evolution.threshold)
    }

    /// Trade evolution progress for a permanent rate bonus and a lump sum.
    /// Resets the upgrade chain. Returns the new level.
    pub fn evolve(&mut self) -> Result<u32, EvolveError> {
        let threshold = self.config.evolution.threshold;
        if !self.player.evolution_ready(threshold) {
            return Err(EvolveError::NotReady {
                progress: self.player.create_value(),
                threshold,
            });
        }
        self.player.apply_evolution(&self.config.evolution);
        self.upgrades.reset();
        self.after_change();
        info!(
            level = self.player.level(),
            rate = self.player.rate_per_second(),
            "evolved"
        );
        Ok(self.player.level())
    }

    fn after_change(&mut self) {
        self.player.refresh_rate(&self.producers, &self.upgrades);
        self.evaluate_achievements();
    }

    fn evaluate_achievements(&mut self) {
        let progress = Progress {
            player: &self.player,
            producers: &self.producers,
            upgrades: &self.upgrades,
        };
        let before = self.notifications.len();
        self.notifications
            .extend(self.achievements.evaluate(progress, self.elapsed_secs));
        for n in &self.notifications[before..] {
            info!(achievement = %n.achievement, at = n.fired_at, "{}", n.message);
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn producers(&self) -> &ProducerCatalog {
        &self.producers
    }

    pub fn upgrades(&self) -> &UpgradeTrack {
        &self.upgrades
    }

    pub fn achievements(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter()
    }

    /// Game-clock seconds accumulated over all ticks.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Every notification fired so far, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Notifications fired since the previous call. History is kept.
    pub fn take_pending_notifications(&mut self) -> &[Notification] {
        let start = self.delivered;
        self.delivered = self.notifications.len();
        &self.notifications[start..]
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            elapsed_secs: self.elapsed_secs,
            score: self.player.score(),
            balance: self.player.balance(),
            rate_per_second: self.player.rate_per_second(),
            manual_action_value: self.player.manual_action_value(),
            level: self.player.level(),
            create_value: self.player.create_value(),
            evolution_threshold: self.config.evolution.threshold,
            producers: self
                .producers
                .iter()
                .map(|p| ProducerView {
                    id: p.id.0.clone(),
                    display_name: p.display_name.clone(),
                    cost: p.cost,
                    count: p.count,
                    production_rate: p.production_rate,
                })
                .collect(),
            upgrade: UpgradeView {
                cost: self.upgrades.cost(),
                purchase_count: self.upgrades.purchase_count(),
            },
            achievements_unlocked: self.achievements.unlocked_count(),
            achievements_total: self.achievements.len(),
        }
    }
}
