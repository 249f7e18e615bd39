//! Per-entity elemental aura state
//!
//! An [`AuraManager`] holds the plain aura entries on one entity plus three
//! composite states that follow their own rules:
//!
//! - Frozen: produced by Freeze, only reduced by Melt, Superconduct, Swirl,
//!   Geo and blunt hits; decays along a convex duration curve.
//! - Quickened: produced by Quicken, fuels Aggravate/Spread without being
//!   consumed by them.
//! - Burning: a fixed pyro gauge that persists while Dendro or Quickened fuel
//!   remains, speeding up the fuel's decay and ticking every quarter second.
//!
//! Incoming hits walk a fixed decision order: Frozen, Electro-Charged,
//! Burning/Quickened, then the pairwise table against each plain entry in
//! attachment order.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use reactor_core::InvariantViolation;

use super::element::Element;
use super::reaction::{
    classify, classify_frozen, classify_quickened, ExtraValue, PairRule, ReactionResult,
    ReactionType, EXTRA_FROZEN_GAUGE, EXTRA_META, EXTRA_QUICKEN_GAUGE, EXTRA_TICK,
};

/// Fraction of an application's gauge that lingers as aura
pub const ATTACH_EFFICIENCY: f64 = 0.8;

/// Amounts at or below this are treated as gone
pub const AURA_EPSILON: f64 = 1e-6;

/// Gauge each Electro-Charged tick removes from both auras
pub const ELECTRO_CHARGED_TICK_GAUGE: f64 = 0.4;
/// Seconds between Electro-Charged ticks
pub const ELECTRO_CHARGED_INTERVAL: f64 = 1.0;

/// Pyro gauge held by an active Burning state
pub const BURNING_PYRO_GAUGE: f64 = 2.0;
/// Seconds between Burning ticks
pub const BURNING_INTERVAL: f64 = 0.25;
/// Slowest decay, in gauge per second, of fuel under Burning
pub const BURNING_MIN_FUEL_DECAY: f64 = 0.4;

/// Aura lifetime in seconds for an application of `strength` gauge.
///
/// The same linear formula applies to every attachable element.
pub fn aura_duration(element: Element, strength: f64) -> f64 {
    let (base, per_unit) = match element {
        Element::Pyro | Element::Hydro | Element::Electro | Element::Cryo | Element::Dendro => {
            (7.0, 2.5)
        }
        _ => (0.0, 0.0),
    };
    base + strength * per_unit
}

/// Frozen lifetime in seconds for a frozen gauge
pub fn frozen_duration(gauge: f64) -> f64 {
    (2.0 * (5.0 * gauge + 4.0).sqrt() - 4.0).max(f64::EPSILON)
}

/// Quickened lifetime in seconds for a quicken gauge
pub fn quickened_duration(gauge: f64) -> f64 {
    5.0 * gauge + 6.0
}

/// A plain aura entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuraEntry {
    pub element: Element,
    pub current_amount: f64,
    /// Gauge lost per second
    pub decay_rate: f64,
}

impl AuraEntry {
    /// Entry created by an application of `strength` gauge, after the attach tax
    pub fn from_application(element: Element, strength: f64) -> Self {
        let amount = strength * ATTACH_EFFICIENCY;
        Self {
            element,
            current_amount: amount,
            decay_rate: amount / aura_duration(element, strength),
        }
    }

    fn is_depleted(&self) -> bool {
        self.current_amount <= AURA_EPSILON
    }
}

/// A meta-state gauge with its own decay rate (Frozen, Quickened)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeState {
    pub amount: f64,
    pub decay_rate: f64,
}

impl GaugeState {
    fn frozen(gauge: f64) -> Self {
        Self {
            amount: gauge,
            decay_rate: gauge / frozen_duration(gauge),
        }
    }

    fn quickened(gauge: f64) -> Self {
        Self {
            amount: gauge,
            decay_rate: gauge / quickened_duration(gauge),
        }
    }
}

/// Active Burning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurningState {
    pub pyro_amount: f64,
    /// Seconds until the next tick
    pub tick_timer: f64,
}

impl BurningState {
    fn ignite() -> Self {
        Self {
            pyro_amount: BURNING_PYRO_GAUGE,
            tick_timer: BURNING_INTERVAL,
        }
    }
}

/// Plain-value image of an [`AuraManager`], safe to serialize and rebuild from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuraSnapshot {
    pub entries: Vec<AuraEntry>,
    #[serde(default)]
    pub frozen: Option<GaugeState>,
    #[serde(default)]
    pub quickened: Option<GaugeState>,
    #[serde(default)]
    pub burning: Option<BurningState>,
    /// Seconds until the next Electro-Charged tick, when charged
    #[serde(default)]
    pub electro_charged_timer: Option<f64>,
}

/// Owns one entity's elemental attachment state
#[derive(Debug, Clone, Default)]
pub struct AuraManager {
    entries: Vec<AuraEntry>,
    frozen: Option<GaugeState>,
    quickened: Option<GaugeState>,
    burning: Option<BurningState>,
    electro_charged: Option<f64>,
}

/// Whether a stage used up the trigger or left it for later stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Continue,
    Done,
}

impl AuraManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Queries ----

    pub fn entries(&self) -> &[AuraEntry] {
        &self.entries
    }

    /// Resident amount of a plain aura (0 if absent)
    pub fn amount_of(&self, element: Element) -> f64 {
        self.entry(element).map_or(0.0, |e| e.current_amount)
    }

    pub fn has(&self, element: Element) -> bool {
        self.entry(element).is_some()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn frozen_amount(&self) -> f64 {
        self.frozen.map_or(0.0, |f| f.amount)
    }

    pub fn is_quickened(&self) -> bool {
        self.quickened.is_some()
    }

    pub fn quickened_amount(&self) -> f64 {
        self.quickened.map_or(0.0, |q| q.amount)
    }

    pub fn is_burning(&self) -> bool {
        self.burning.is_some()
    }

    pub fn burning(&self) -> Option<&BurningState> {
        self.burning.as_ref()
    }

    pub fn is_electro_charged(&self) -> bool {
        self.electro_charged.is_some()
    }

    /// No aura and no meta-state
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.frozen.is_none()
            && self.quickened.is_none()
            && self.burning.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn entry(&self, element: Element) -> Option<&AuraEntry> {
        self.entries.iter().find(|e| e.element == element)
    }

    fn entry_mut(&mut self, element: Element) -> Option<&mut AuraEntry> {
        self.entries.iter_mut().find(|e| e.element == element)
    }

    // ---- Application ----

    /// Apply `strength` gauge of `element`.
    ///
    /// Returns the reactions triggered, in the order they consumed resident
    /// gauge, or `None` when the hit only attached (or did nothing). A zero
    /// or negative strength, and Physical, never change state.
    pub fn apply(&mut self, element: Element, strength: f64) -> Option<Vec<ReactionResult>> {
        if !element.is_elemental() || strength <= 0.0 {
            return None;
        }

        let mut remaining = strength;
        let mut results = Vec::new();

        if self.frozen.is_some()
            && self.react_with_frozen(element, &mut remaining, &mut results) == Stage::Done
        {
            return Self::finish(results);
        }

        if let Some(counterpart) = Self::charge_counterpart(element) {
            if self.has(counterpart) {
                self.charge(element, remaining, &mut results);
                return Self::finish(results);
            }
        }

        if self.burning.is_some()
            && self.react_with_burning(element, &mut remaining, &mut results) == Stage::Done
        {
            return Self::finish(results);
        }

        if self.quickened.is_some()
            && self.react_with_quickened(element, &mut remaining, &mut results) == Stage::Done
        {
            return Self::finish(results);
        }

        let consumed_earlier = results.iter().any(|r| r.gauge_consumed > 0.0);
        if !self.react_with_entries(element, &mut remaining, &mut results) && !consumed_earlier {
            self.attach(element, strength);
        }

        Self::finish(results)
    }

    fn finish(results: Vec<ReactionResult>) -> Option<Vec<ReactionResult>> {
        if results.is_empty() {
            None
        } else {
            Some(results)
        }
    }

    /// Blunt hit against a frozen target. Removes the whole frozen gauge.
    pub fn shatter(&mut self) -> Option<ReactionResult> {
        let frozen = self.frozen.take()?;
        debug!("Shatter removed {:.3} frozen gauge", frozen.amount);
        Some(
            ReactionResult::new(ReactionType::Shatter, Element::Physical, Element::Cryo)
                .with_consumed(frozen.amount)
                .with_extra(EXTRA_META, ExtraValue::Text("frozen".into())),
        )
    }

    /// Attach or refresh a plain aura. Refresh keeps the larger amount.
    fn attach(&mut self, element: Element, strength: f64) {
        if !element.can_attach() {
            trace!("{element} has nothing to react with and does not linger");
            return;
        }
        let fresh = AuraEntry::from_application(element, strength);
        match self.entry_mut(element) {
            Some(existing) => {
                if fresh.current_amount > existing.current_amount {
                    existing.current_amount = fresh.current_amount;
                    existing.decay_rate = fresh.decay_rate;
                }
            }
            None => self.entries.push(fresh),
        }
        trace!("{element} aura now {:.3}", self.amount_of(element));
    }

    /// Spend trigger gauge against a resident amount. Returns the resident
    /// gauge removed.
    fn consume(rule: &PairRule, remaining: &mut f64, resident: &mut f64) -> f64 {
        let consumed = (*remaining * rule.ratio).min(*resident);
        *resident -= consumed;
        *remaining -= consumed / rule.ratio;
        if *remaining < AURA_EPSILON {
            *remaining = 0.0;
        }
        consumed
    }

    fn react_with_frozen(
        &mut self,
        element: Element,
        remaining: &mut f64,
        results: &mut Vec<ReactionResult>,
    ) -> Stage {
        let Some(rule) = classify_frozen(element) else {
            return Stage::Continue;
        };
        let Some(frozen) = self.frozen.as_mut() else {
            return Stage::Continue;
        };

        if rule.reaction == ReactionType::Shatter {
            // Geo shatters without spending its gauge; it may still crystallize
            // whatever plain aura is left underneath.
            let consumed = frozen.amount;
            self.frozen = None;
            results.push(
                ReactionResult::new(ReactionType::Shatter, element, Element::Cryo)
                    .with_consumed(consumed)
                    .with_extra(EXTRA_META, ExtraValue::Text("frozen".into())),
            );
            return Stage::Continue;
        }

        let consumed = Self::consume(&rule, remaining, &mut frozen.amount);
        if frozen.amount <= AURA_EPSILON {
            self.frozen = None;
        }
        debug!("{} against Frozen consumed {:.3}", rule.reaction, consumed);
        results.push(
            ReactionResult::new(rule.reaction, element, Element::Cryo)
                .with_multiplier(rule.multiplier)
                .with_consumed(consumed)
                .with_extra(EXTRA_META, ExtraValue::Text("frozen".into())),
        );

        if *remaining <= 0.0 {
            Stage::Done
        } else {
            Stage::Continue
        }
    }

    fn charge_counterpart(element: Element) -> Option<Element> {
        match element {
            Element::Hydro => Some(Element::Electro),
            Element::Electro => Some(Element::Hydro),
            _ => None,
        }
    }

    /// Hydro and Electro coexist. The first contact ticks immediately; later
    /// applications only top up their own aura.
    fn charge(&mut self, element: Element, strength: f64, results: &mut Vec<ReactionResult>) {
        self.attach(element, strength);
        if self.electro_charged.is_some() {
            return;
        }
        let resident = Self::charge_counterpart(element).unwrap_or(Element::Hydro);
        let consumed = self.electro_charged_tick();
        self.electro_charged = Some(ELECTRO_CHARGED_INTERVAL);
        debug!("Electro-Charged started by {element}");
        results.push(
            ReactionResult::new(ReactionType::ElectroCharged, element, resident)
                .with_consumed(consumed),
        );
    }

    /// Take one tick's gauge from both auras. Returns the gauge removed from
    /// each side.
    fn electro_charged_tick(&mut self) -> f64 {
        let mut consumed = 0.0;
        for element in [Element::Hydro, Element::Electro] {
            if let Some(entry) = self.entry_mut(element) {
                let taken = ELECTRO_CHARGED_TICK_GAUGE.min(entry.current_amount);
                entry.current_amount -= taken;
                consumed = f64::max(consumed, taken);
            }
        }
        self.entries.retain(|e| !e.is_depleted());
        consumed
    }

    fn react_with_burning(
        &mut self,
        element: Element,
        remaining: &mut f64,
        results: &mut Vec<ReactionResult>,
    ) -> Stage {
        match element {
            Element::Dendro => {
                // more fuel for the fire
                self.attach(Element::Dendro, *remaining);
                return Stage::Done;
            }
            Element::Pyro => {
                if let Some(burning) = self.burning.as_mut() {
                    burning.pyro_amount = burning.pyro_amount.max(BURNING_PYRO_GAUGE);
                }
                return Stage::Done;
            }
            _ => {}
        }

        let Some(rule) = classify(element, Element::Pyro) else {
            return Stage::Continue;
        };
        let Some(burning) = self.burning.as_mut() else {
            return Stage::Continue;
        };

        let consumed = Self::consume(&rule, remaining, &mut burning.pyro_amount);
        if burning.pyro_amount <= AURA_EPSILON {
            debug!("Burning extinguished by {}", rule.reaction);
            self.burning = None;
        }
        results.push(
            ReactionResult::new(rule.reaction, element, Element::Pyro)
                .with_multiplier(rule.multiplier)
                .with_consumed(consumed)
                .with_extra(EXTRA_META, ExtraValue::Text("burning".into())),
        );

        if *remaining <= 0.0 {
            Stage::Done
        } else {
            Stage::Continue
        }
    }

    fn react_with_quickened(
        &mut self,
        element: Element,
        remaining: &mut f64,
        results: &mut Vec<ReactionResult>,
    ) -> Stage {
        let Some(rule) = classify_quickened(element) else {
            return Stage::Continue;
        };

        match rule.reaction {
            ReactionType::Aggravate | ReactionType::Spread => {
                debug!("{} on Quickened", rule.reaction);
                results.push(
                    ReactionResult::new(rule.reaction, element, Element::Dendro)
                        .with_multiplier(rule.multiplier)
                        .with_extra(EXTRA_META, ExtraValue::Text("quickened".into())),
                );
                Stage::Continue
            }
            ReactionType::Burning => {
                self.ignite();
                results.push(
                    ReactionResult::new(ReactionType::Burning, element, Element::Dendro)
                        .with_extra(EXTRA_META, ExtraValue::Text("quickened".into())),
                );
                *remaining = 0.0;
                Stage::Done
            }
            _ => {
                let Some(quickened) = self.quickened.as_mut() else {
                    return Stage::Continue;
                };
                let consumed = Self::consume(&rule, remaining, &mut quickened.amount);
                if quickened.amount <= AURA_EPSILON {
                    self.quickened = None;
                }
                results.push(
                    ReactionResult::new(rule.reaction, element, Element::Dendro)
                        .with_multiplier(rule.multiplier)
                        .with_consumed(consumed)
                        .with_extra(EXTRA_META, ExtraValue::Text("quickened".into())),
                );
                if *remaining <= 0.0 {
                    Stage::Done
                } else {
                    Stage::Continue
                }
            }
        }
    }

    fn ignite(&mut self) {
        match self.burning.as_mut() {
            Some(burning) => burning.pyro_amount = burning.pyro_amount.max(BURNING_PYRO_GAUGE),
            None => {
                debug!("Burning ignited");
                self.burning = Some(BurningState::ignite());
            }
        }
    }

    /// Walk the plain entries in attachment order. Returns whether any entry
    /// reacted.
    fn react_with_entries(
        &mut self,
        element: Element,
        remaining: &mut f64,
        results: &mut Vec<ReactionResult>,
    ) -> bool {
        let mut reacted = false;
        let mut index = 0;

        while index < self.entries.len() && *remaining > 0.0 {
            let resident = self.entries[index].element;
            let Some(rule) = classify(element, resident) else {
                index += 1;
                continue;
            };
            reacted = true;

            match rule.reaction {
                ReactionType::Burning => {
                    self.start_burning(element, *remaining, index, results);
                    *remaining = 0.0;
                    break;
                }
                ReactionType::ElectroCharged => {
                    // caught by the co-residency check before this walk
                    index += 1;
                    continue;
                }
                _ => {}
            }

            let consumed = Self::consume(&rule, remaining, &mut self.entries[index].current_amount);
            let mut result = ReactionResult::new(rule.reaction, element, resident)
                .with_multiplier(rule.multiplier)
                .with_consumed(consumed);

            match rule.reaction {
                ReactionType::Freeze => {
                    let gauge = 2.0 * consumed;
                    self.install_frozen(gauge);
                    result = result.with_extra(EXTRA_FROZEN_GAUGE, ExtraValue::Number(gauge));
                }
                ReactionType::Quicken => {
                    self.install_quickened(consumed);
                    result = result.with_extra(EXTRA_QUICKEN_GAUGE, ExtraValue::Number(consumed));
                }
                _ => {}
            }

            debug!(
                "{} ({element} on {resident}) consumed {consumed:.3}, {:.3} trigger left",
                rule.reaction, remaining
            );
            results.push(result);
            index += 1;
        }

        self.entries.retain(|e| !e.is_depleted());
        reacted
    }

    /// Pyro onto Dendro keeps the Dendro as fuel; Dendro onto Pyro replaces
    /// the Pyro aura with Burning and lays down fresh fuel.
    fn start_burning(
        &mut self,
        element: Element,
        strength: f64,
        resident_index: usize,
        results: &mut Vec<ReactionResult>,
    ) {
        let resident = self.entries[resident_index].element;
        if resident == Element::Pyro {
            self.entries.remove(resident_index);
            self.attach(Element::Dendro, strength);
        }
        self.ignite();
        results.push(ReactionResult::new(ReactionType::Burning, element, resident));
    }

    fn install_frozen(&mut self, gauge: f64) {
        if gauge <= AURA_EPSILON {
            return;
        }
        match self.frozen.as_mut() {
            Some(frozen) if frozen.amount >= gauge => {}
            _ => self.frozen = Some(GaugeState::frozen(gauge)),
        }
    }

    fn install_quickened(&mut self, gauge: f64) {
        if gauge <= AURA_EPSILON {
            return;
        }
        match self.quickened.as_mut() {
            Some(quickened) if quickened.amount >= gauge => {}
            _ => self.quickened = Some(GaugeState::quickened(gauge)),
        }
    }

    // ---- Time ----

    /// Advance decay by `dt` seconds.
    ///
    /// Returns the periodic reactions (Electro-Charged and Burning ticks)
    /// that fired during this step.
    pub fn update(&mut self, dt: f64) -> Vec<ReactionResult> {
        self.check_invariants();

        let burning = self.burning.is_some();
        for entry in &mut self.entries {
            let rate = if burning && entry.element == Element::Dendro {
                accelerated(entry.decay_rate)
            } else {
                entry.decay_rate
            };
            entry.current_amount -= rate * dt;
        }
        if let Some(frozen) = self.frozen.as_mut() {
            frozen.amount -= frozen.decay_rate * dt;
        }
        if let Some(quickened) = self.quickened.as_mut() {
            let rate = if burning {
                accelerated(quickened.decay_rate)
            } else {
                quickened.decay_rate
            };
            quickened.amount -= rate * dt;
        }

        let mut ticks = Vec::new();
        self.tick_electro_charged(dt, &mut ticks);
        self.entries.retain(|e| !e.is_depleted());
        if self.frozen.is_some_and(|f| f.amount <= AURA_EPSILON) {
            self.frozen = None;
        }
        if self.quickened.is_some_and(|q| q.amount <= AURA_EPSILON) {
            self.quickened = None;
        }
        self.tick_burning(dt, &mut ticks);
        ticks
    }

    fn tick_electro_charged(&mut self, dt: f64, ticks: &mut Vec<ReactionResult>) {
        let Some(timer) = self.electro_charged else {
            return;
        };
        let hydro_live = self.entry(Element::Hydro).is_some_and(|e| !e.is_depleted());
        let electro_live = self.entry(Element::Electro).is_some_and(|e| !e.is_depleted());
        if !(hydro_live && electro_live) {
            debug!("Electro-Charged ended");
            self.electro_charged = None;
            return;
        }

        let timer = timer - dt;
        if timer <= 0.0 {
            let consumed = self.electro_charged_tick();
            ticks.push(
                ReactionResult::new(ReactionType::ElectroCharged, Element::Electro, Element::Hydro)
                    .with_consumed(consumed)
                    .with_extra(EXTRA_TICK, ExtraValue::Flag(true)),
            );
            self.electro_charged = Some(timer + ELECTRO_CHARGED_INTERVAL);
        } else {
            self.electro_charged = Some(timer);
        }
    }

    fn tick_burning(&mut self, dt: f64, ticks: &mut Vec<ReactionResult>) {
        let has_fuel = self.has(Element::Dendro) || self.quickened.is_some();
        let Some(burning) = self.burning.as_mut() else {
            return;
        };
        if !has_fuel {
            debug!("Burning ran out of fuel");
            self.burning = None;
            return;
        }
        burning.tick_timer -= dt;
        if burning.tick_timer <= 0.0 {
            burning.tick_timer += BURNING_INTERVAL;
            ticks.push(
                ReactionResult::new(ReactionType::Burning, Element::Pyro, Element::Dendro)
                    .with_extra(EXTRA_TICK, ExtraValue::Flag(true)),
            );
        }
    }

    fn check_invariants(&self) {
        for entry in &self.entries {
            if entry.current_amount < 0.0 {
                InvariantViolation::NegativeAura {
                    element: entry.element.to_string(),
                    amount: entry.current_amount,
                }
                .raise();
            }
        }
        for (name, state) in [("Frozen", self.frozen), ("Quickened", self.quickened)] {
            if let Some(state) = state {
                if state.amount < 0.0 {
                    InvariantViolation::NegativeAura {
                        element: name.to_string(),
                        amount: state.amount,
                    }
                    .raise();
                }
            }
        }
    }

    // ---- Snapshots ----

    pub fn snapshot(&self) -> AuraSnapshot {
        AuraSnapshot {
            entries: self.entries.clone(),
            frozen: self.frozen,
            quickened: self.quickened,
            burning: self.burning,
            electro_charged_timer: self.electro_charged,
        }
    }

    pub fn from_snapshot(snapshot: AuraSnapshot) -> Self {
        Self {
            entries: snapshot.entries,
            frozen: snapshot.frozen,
            quickened: snapshot.quickened,
            burning: snapshot.burning,
            electro_charged: snapshot.electro_charged_timer,
        }
    }
}

fn accelerated(rate: f64) -> f64 {
    (2.0 * rate).max(BURNING_MIN_FUEL_DECAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::ReactionCategory;

    const DT: f64 = 1.0 / 60.0;

    fn resident(element: Element, amount: f64) -> AuraManager {
        AuraManager::from_snapshot(AuraSnapshot {
            entries: vec![AuraEntry {
                element,
                current_amount: amount,
                decay_rate: amount / aura_duration(element, amount / ATTACH_EFFICIENCY),
            }],
            ..Default::default()
        })
    }

    #[test]
    fn test_attach_applies_efficiency() {
        let mut aura = AuraManager::new();
        assert!(aura.apply(Element::Pyro, 1.0).is_none());
        assert!((aura.amount_of(Element::Pyro) - 0.8).abs() < 1e-12);
        let entry = aura.entries()[0];
        assert!((entry.decay_rate - 0.8 / 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_refresh_takes_max_not_sum() {
        let mut aura = AuraManager::new();
        aura.apply(Element::Hydro, 1.0);
        aura.apply(Element::Hydro, 2.0);
        assert!((aura.amount_of(Element::Hydro) - 1.6).abs() < 1e-12);
        assert_eq!(aura.entries().len(), 1);

        // a weaker refresh leaves the stronger aura alone
        aura.apply(Element::Hydro, 1.0);
        assert!((aura.amount_of(Element::Hydro) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_zero_strength_is_noop() {
        let mut aura = AuraManager::new();
        assert!(aura.apply(Element::Pyro, 0.0).is_none());
        assert!(aura.is_empty());

        let mut aura = resident(Element::Hydro, 2.0);
        let before = aura.snapshot();
        assert!(aura.apply(Element::Pyro, 0.0).is_none());
        assert!(aura.apply(Element::Hydro, 0.0).is_none());
        assert_eq!(aura.snapshot(), before);
    }

    #[test]
    fn test_physical_is_noop() {
        let mut aura = resident(Element::Cryo, 1.0);
        let before = aura.snapshot();
        assert!(aura.apply(Element::Physical, 2.0).is_none());
        assert_eq!(aura.snapshot(), before);
    }

    #[test]
    fn test_anemo_and_geo_do_not_attach() {
        let mut aura = AuraManager::new();
        assert!(aura.apply(Element::Anemo, 1.0).is_none());
        assert!(aura.apply(Element::Geo, 2.0).is_none());
        assert!(aura.is_empty());
    }

    #[test]
    fn test_vaporize_consumption_asymmetry() {
        // Pyro 1U onto 2U Hydro: 1.5x, eats 0.5U
        let mut hydro = resident(Element::Hydro, 2.0);
        let reverse = hydro.apply(Element::Pyro, 1.0).unwrap();
        assert_eq!(reverse.len(), 1);
        assert_eq!(reverse[0].reaction_type, ReactionType::Vaporize);
        assert_eq!(reverse[0].multiplier, 1.5);
        assert!((reverse[0].gauge_consumed - 0.5).abs() < 1e-12);
        assert!((hydro.amount_of(Element::Hydro) - 1.5).abs() < 1e-12);

        // Hydro 1U onto 2U Pyro: 2.0x, eats 2U
        let mut pyro = resident(Element::Pyro, 2.0);
        let forward = pyro.apply(Element::Hydro, 1.0).unwrap();
        assert_eq!(forward[0].multiplier, 2.0);
        assert!((forward[0].gauge_consumed - 2.0).abs() < 1e-12);
        assert!(!pyro.has(Element::Pyro));

        assert_ne!(forward[0].multiplier, reverse[0].multiplier);
        assert_ne!(
            hydro.amount_of(Element::Hydro),
            pyro.amount_of(Element::Pyro)
        );
    }

    #[test]
    fn test_leftover_trigger_does_not_attach() {
        let mut aura = resident(Element::Pyro, 0.4);
        let results = aura.apply(Element::Hydro, 2.0).unwrap();
        assert!((results[0].gauge_consumed - 0.4).abs() < 1e-12);
        assert!(aura.is_empty());
    }

    #[test]
    fn test_trigger_reacts_with_several_entries() {
        // Hydro + Electro coexist, Cryo freezes the Hydro and superconducts the Electro
        let mut aura = AuraManager::new();
        aura.apply(Element::Hydro, 1.0);
        aura.apply(Element::Electro, 1.0);
        assert!(aura.has(Element::Hydro) && aura.has(Element::Electro));

        let results = aura.apply(Element::Cryo, 2.0).unwrap();
        let kinds: Vec<_> = results.iter().map(|r| r.reaction_type).collect();
        assert_eq!(kinds, vec![ReactionType::Freeze, ReactionType::Superconduct]);
        assert!(aura.is_frozen());
    }

    #[test]
    fn test_exhausted_trigger_stops_walk() {
        let mut aura = AuraManager::new();
        aura.apply(Element::Hydro, 2.0);
        aura.apply(Element::Electro, 2.0);
        let results = aura.apply(Element::Cryo, 0.5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].reaction_type, ReactionType::Freeze);
    }

    #[test]
    fn test_freeze_installs_frozen_gauge() {
        let mut aura = resident(Element::Hydro, 0.8);
        let results = aura.apply(Element::Cryo, 1.0).unwrap();
        assert_eq!(results[0].reaction_type, ReactionType::Freeze);
        assert_eq!(results[0].category, ReactionCategory::Status);
        assert!((aura.frozen_amount() - 1.6).abs() < 1e-12);
        assert!(!aura.has(Element::Hydro));
        assert!(matches!(
            results[0].extra.get(EXTRA_FROZEN_GAUGE),
            Some(ExtraValue::Number(g)) if (g - 1.6).abs() < 1e-12
        ));
    }

    #[test]
    fn test_frozen_checked_before_plain_entries() {
        let mut aura = resident(Element::Hydro, 0.8);
        aura.apply(Element::Cryo, 2.0);
        assert!(aura.is_frozen());
        assert!(!aura.has(Element::Cryo));
        let results = aura.apply(Element::Pyro, 0.5).unwrap();
        assert_eq!(results[0].reaction_type, ReactionType::Melt);
        assert_eq!(results[0].multiplier, 2.0);
        assert!((aura.frozen_amount() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_shatter_clears_frozen() {
        let mut aura = resident(Element::Cryo, 1.0);
        aura.apply(Element::Hydro, 1.0);
        assert!(aura.is_frozen());
        let result = aura.shatter().unwrap();
        assert_eq!(result.reaction_type, ReactionType::Shatter);
        assert!(!aura.is_frozen());
        assert!(aura.shatter().is_none());
    }

    #[test]
    fn test_geo_shatters_frozen() {
        let mut aura = resident(Element::Cryo, 0.8);
        aura.apply(Element::Hydro, 2.0);
        assert!(aura.is_frozen());
        let results = aura.apply(Element::Geo, 1.0).unwrap();
        assert_eq!(results[0].reaction_type, ReactionType::Shatter);
        assert!(!aura.is_frozen());
    }

    #[test]
    fn test_electro_charged_coexists_and_ticks() {
        let mut aura = AuraManager::new();
        aura.apply(Element::Hydro, 2.0);
        let results = aura.apply(Element::Electro, 2.0).unwrap();
        assert_eq!(results[0].reaction_type, ReactionType::ElectroCharged);
        assert!(aura.is_electro_charged());
        // first contact already took 0.4 from each
        assert!((aura.amount_of(Element::Hydro) - 1.2).abs() < 1e-12);
        assert!((aura.amount_of(Element::Electro) - 1.2).abs() < 1e-12);

        // re-applying does not start a second charge
        assert!(aura.apply(Element::Hydro, 1.0).is_none());

        let mut ticks = Vec::new();
        for _ in 0..61 {
            ticks.extend(aura.update(DT));
        }
        assert_eq!(ticks.len(), 1);
        assert!(ticks[0].is_tick());
    }

    #[test]
    fn test_electro_charged_ends_when_one_side_runs_out() {
        let mut aura = AuraManager::new();
        aura.apply(Element::Hydro, 0.5);
        aura.apply(Element::Electro, 2.0);
        // 0.4 hydro minus the 0.4 first tick leaves nothing
        for _ in 0..5 {
            aura.update(DT);
        }
        assert!(!aura.has(Element::Hydro));
        assert!(!aura.is_electro_charged());
    }

    #[test]
    fn test_quicken_then_aggravate_keeps_gauge() {
        let mut aura = resident(Element::Dendro, 1.0);
        let results = aura.apply(Element::Electro, 1.0).unwrap();
        assert_eq!(results[0].reaction_type, ReactionType::Quicken);
        let gauge = aura.quickened_amount();
        assert!(gauge > 0.0);

        let results = aura.apply(Element::Electro, 1.0).unwrap();
        assert_eq!(results[0].reaction_type, ReactionType::Aggravate);
        assert_eq!(results[0].category, ReactionCategory::Additive);
        assert_eq!(results[0].multiplier, 1.15);
        assert!((aura.quickened_amount() - gauge).abs() < 1e-12);
    }

    #[test]
    fn test_spread_on_quickened() {
        let mut aura = resident(Element::Electro, 1.0);
        aura.apply(Element::Dendro, 1.0);
        assert!(aura.is_quickened());
        let results = aura.apply(Element::Dendro, 1.0).unwrap();
        assert_eq!(results[0].reaction_type, ReactionType::Spread);
        assert_eq!(results[0].multiplier, 1.25);
    }

    #[test]
    fn test_burning_ticks_and_burns_fuel_faster() {
        let mut aura = resident(Element::Dendro, 1.0);
        let natural = aura.entries()[0].decay_rate;
        let results = aura.apply(Element::Pyro, 1.0).unwrap();
        assert_eq!(results[0].reaction_type, ReactionType::Burning);
        assert!(aura.is_burning());
        assert!(aura.has(Element::Dendro));

        let mut ticks = Vec::new();
        for _ in 0..16 {
            ticks.extend(aura.update(DT));
        }
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].reaction_type, ReactionType::Burning);
        let burned = 1.0 - aura.amount_of(Element::Dendro);
        assert!(burned > natural * 0.25 * 1.5);
    }

    #[test]
    fn test_burning_ends_without_fuel() {
        let mut aura = resident(Element::Dendro, 0.1);
        aura.apply(Element::Pyro, 1.0);
        for _ in 0..120 {
            aura.update(DT);
        }
        assert!(!aura.is_burning());
        assert!(aura.is_empty());
    }

    #[test]
    fn test_hydro_vaporizes_burning() {
        let mut aura = resident(Element::Dendro, 1.0);
        aura.apply(Element::Pyro, 1.0);
        let results = aura.apply(Element::Hydro, 1.0).unwrap();
        assert_eq!(results[0].reaction_type, ReactionType::Vaporize);
        assert_eq!(results[0].multiplier, 2.0);
        assert!(!aura.is_burning());
    }

    #[test]
    fn test_decay_is_monotonic_and_removes() {
        let mut aura = AuraManager::new();
        aura.apply(Element::Cryo, 1.0);
        let mut last = aura.amount_of(Element::Cryo);
        let mut frames = 0;
        while aura.has(Element::Cryo) {
            aura.update(DT);
            let now = aura.amount_of(Element::Cryo);
            assert!(now <= last);
            last = now;
            frames += 1;
            assert!(frames < 10_000);
        }
        // 1U lasts 9.5 seconds
        assert!((frames as i64 - 570).abs() <= 1);
    }

    #[test]
    fn test_frozen_decays_on_convex_curve() {
        let short = frozen_duration(1.0);
        let long = frozen_duration(4.0);
        assert!(long < 4.0 * short);
        assert!((frozen_duration(2.0) - (2.0 * 14f64.sqrt() - 4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut aura = AuraManager::new();
        aura.apply(Element::Hydro, 2.0);
        aura.apply(Element::Dendro, 1.0); // blooms
        aura.apply(Element::Electro, 1.0);
        aura.update(0.5);

        let json = serde_json::to_string(&aura.snapshot()).unwrap();
        let snapshot: AuraSnapshot = serde_json::from_str(&json).unwrap();
        let mut rebuilt = AuraManager::from_snapshot(snapshot);

        let same = |a: &AuraManager, b: &AuraManager| {
            assert_eq!(a.entries().len(), b.entries().len());
            for (x, y) in a.entries().iter().zip(b.entries()) {
                assert_eq!(x.element, y.element);
                assert!((x.current_amount - y.current_amount).abs() < 1e-9);
                assert!((x.decay_rate - y.decay_rate).abs() < 1e-9);
            }
            assert_eq!(a.is_electro_charged(), b.is_electro_charged());
            assert_eq!(a.is_frozen(), b.is_frozen());
        };
        same(&aura, &rebuilt);

        for _ in 0..120 {
            aura.update(DT);
            rebuilt.update(DT);
        }
        same(&aura, &rebuilt);
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn test_negative_amount_fails_fast() {
        let mut aura = AuraManager::from_snapshot(AuraSnapshot {
            entries: vec![AuraEntry {
                element: Element::Pyro,
                current_amount: -0.5,
                decay_rate: 0.1,
            }],
            ..Default::default()
        });
        aura.update(DT);
    }
}
