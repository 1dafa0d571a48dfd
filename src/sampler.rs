//! Slot Sampling - Weighted Choice of One Attribute per Slot

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use tracing::{debug, warn};

use crate::attribute::{Attribute, ColorSigns};
use crate::catalog::AttributeCatalog;
use crate::config::ConfigError;
use crate::settings::{AttributeSettings, SettingsResolver, Slot};

/// Pick one item with probability proportional to its weight.
///
/// Items whose weight is not a positive finite number are never picked;
/// `None` when nothing is eligible.
pub fn choose_weighted<'a, T, R>(
    items: &'a [T],
    weight: impl Fn(&T) -> f64,
    rng: &mut R,
) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    let eligible: Vec<(&T, f64)> = items
        .iter()
        .map(|item| (item, weight(item)))
        .filter(|(_, w)| w.is_finite() && *w > 0.0)
        .collect();
    if eligible.is_empty() {
        return None;
    }
    let index = WeightedIndex::new(eligible.iter().map(|(_, w)| *w)).ok()?;
    Some(eligible[index.sample(rng)].0)
}

/// Samples a slot's feature against the catalog and the settings cascade
pub struct SlotSampler<'a> {
    catalog: &'a dyn AttributeCatalog,
    resolver: SettingsResolver<'a>,
    signs: &'a ColorSigns,
}

impl<'a> SlotSampler<'a> {
    pub fn new(
        catalog: &'a dyn AttributeCatalog,
        resolver: SettingsResolver<'a>,
        signs: &'a ColorSigns,
    ) -> Self {
        Self {
            catalog,
            resolver,
            signs,
        }
    }

    /// Resolve settings for every candidate of the slot's feature
    pub fn candidates(&self, slot: &Slot) -> Result<Vec<AttributeSettings>, ConfigError> {
        self.catalog
            .attribute_names(&slot.feature)
            .into_iter()
            .map(|name| {
                let attribute = Attribute::tagged(slot.feature.as_str(), name, self.signs);
                self.resolver.resolve(&attribute, &slot.attributes_section)
            })
            .collect()
    }

    /// Choose one attribute for `slot`. `Ok(None)` skips the slot.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        slot: &Slot,
        rng: &mut R,
    ) -> Result<Option<AttributeSettings>, ConfigError> {
        let candidates = self.candidates(slot)?;
        if candidates.is_empty() {
            warn!(feature = %slot.feature, "No attributes available, skipping slot");
            return Ok(None);
        }

        match choose_weighted(&candidates, |c| c.weight, rng) {
            Some(chosen) => {
                debug!(
                    feature = %slot.feature,
                    name = %chosen.attribute.name,
                    weight = chosen.weight,
                    candidates = candidates.len(),
                    "Sampled attribute"
                );
                Ok(Some(chosen.clone()))
            }
            None => {
                warn!(feature = %slot.feature, "No attribute has a positive weight, skipping slot");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryStore;
    use crate::settings::{BaseSettings, Section};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn features(value: serde_json::Value) -> Section {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_choose_weighted_skips_non_positive() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = [("zero", 0.0), ("negative", -2.0), ("nan", f64::NAN), ("one", 1.0)];
        for _ in 0..200 {
            let picked = choose_weighted(&items, |i| i.1, &mut rng).unwrap();
            assert_eq!(picked.0, "one");
        }
        let none: [(&str, f64); 1] = [("zero", 0.0)];
        assert!(choose_weighted(&none, |i| i.1, &mut rng).is_none());
    }

    #[test]
    fn test_sampling_follows_weights() {
        let mut store = MemoryStore::new();
        store.add_name("body", "light").add_name("body", "heavy");
        let base = BaseSettings::default();
        let settings = features(json!({"body": {"heavy": {"weight": 3}}}));
        let signs = ColorSigns::default();
        let sampler = SlotSampler::new(&store, SettingsResolver::new(&base, &settings), &signs);

        let mut rng = StdRng::seed_from_u64(42);
        let slot = Slot::new("body");
        let n = 10_000;
        let heavy = (0..n)
            .filter(|_| sampler.sample(&slot, &mut rng).unwrap().unwrap().attribute.name == "heavy")
            .count();
        let ratio = heavy as f64 / n as f64;
        // 5 standard deviations of a Bernoulli(0.75) mean over n draws
        let tolerance = 5.0 * (0.75f64 * 0.25 / n as f64).sqrt();
        assert!((ratio - 0.75).abs() < tolerance, "ratio {ratio}");
    }

    #[test]
    fn test_empty_feature_is_skipped() {
        let store = MemoryStore::new();
        let base = BaseSettings::default();
        let settings = Section::new();
        let signs = ColorSigns::default();
        let sampler = SlotSampler::new(&store, SettingsResolver::new(&base, &settings), &signs);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sampler.sample(&Slot::new("hat"), &mut rng).unwrap().is_none());
    }

    #[test]
    fn test_slot_section_can_disable_candidate() {
        let mut store = MemoryStore::new();
        store.add_name("hat", "cap").add_name("hat", "crown");
        let base = BaseSettings::default();
        let settings = Section::new();
        let signs = ColorSigns::default();
        let sampler = SlotSampler::new(&store, SettingsResolver::new(&base, &settings), &signs);

        let mut slot = Slot::new("hat");
        slot.attributes_section = features(json!({"crown": {"weight": 0}}));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let chosen = sampler.sample(&slot, &mut rng).unwrap().unwrap();
            assert_eq!(chosen.attribute.name, "cap");
        }
    }
}
