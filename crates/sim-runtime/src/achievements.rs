//! One-shot milestone evaluation.

use sim_core::{
    Achievement, AchievementDef, AchievementTrigger, Condition, Notification, PlayerState,
    ProducerCatalog, UpgradeTrack,
};
use std::iter::FusedIterator;
use std::slice;

/// Read-only view of the state achievements are tested against.
#[derive(Clone, Copy, Debug)]
pub struct Progress<'a> {
    pub player: &'a PlayerState,
    pub producers: &'a ProducerCatalog,
    pub upgrades: &'a UpgradeTrack,
}

impl Progress<'_> {
    fn satisfies(&self, condition: &Condition) -> bool {
        match condition {
            Condition::ProducerCount { producer, at_least } => {
                self.producers.count_of(producer) >= *at_least
            }
            Condition::UpgradesPurchased { at_least } => {
                self.upgrades.purchase_count() >= *at_least
            }
            Condition::LevelReached { at_least } => self.player.level() >= *at_least,
        }
    }

    /// Whether `trigger` currently holds.
    pub fn meets(&self, trigger: &AchievementTrigger) -> bool {
        match trigger {
            AchievementTrigger::ScoreThreshold(score) => self.player.score() >= *score,
            AchievementTrigger::Condition(condition) => self.satisfies(condition),
        }
    }
}

/// Ordered set of achievements, evaluated in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AchievementRegistry {
    achievements: Vec<Achievement>,
}

impl AchievementRegistry {
    pub fn from_defs(defs: &[AchievementDef]) -> Self {
        Self {
            achievements: defs.iter().map(Achievement::from_def).collect(),
        }
    }

    /// Lazily fire every not-yet-achieved achievement whose trigger holds.
    ///
    /// Each yielded notification has already latched its achievement, so an
    /// achievement fires at most once over the registry's lifetime. Dropping
    /// the iterator early leaves the rest for the next evaluation.
    pub fn evaluate<'a>(&'a mut self, progress: Progress<'a>, fired_at: f64) -> Unlocks<'a> {
        Unlocks {
            pending: self.achievements.iter_mut(),
            progress,
            fired_at,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter()
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.is_achieved()).count()
    }

    pub fn len(&self) -> usize {
        self.achievements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.achievements.is_empty()
    }
}

/// Iterator returned by [`AchievementRegistry::evaluate`].
#[derive(Debug)]
pub struct Unlocks<'a> {
    pending: slice::IterMut<'a, Achievement>,
    progress: Progress<'a>,
    fired_at: f64,
}

impl Iterator for Unlocks<'_> {
    type Item = Notification;

    fn next(&mut self) -> Option<Notification> {
        for achievement in self.pending.by_ref() {
            if achievement.is_achieved() || !self.progress.meets(&achievement.trigger) {
                continue;
            }
            if achievement.mark_achieved() {
                return Some(Notification {
                    achievement: achievement.id.clone(),
                    message: achievement.message.clone(),
                    fired_at: self.fired_at,
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.pending.size_hint().1)
    }
}

impl FusedIterator for Unlocks<'_> {}
