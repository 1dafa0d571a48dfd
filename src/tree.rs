//! Composition Tree - Resolved Attribute Choices in Render Order
//!
//! Built depth-first from the base slots with an explicit work stack, so a
//! runaway slot chain hits the nesting bound before its siblings expand. Each
//! node remembers which children render beneath it (`behind`) and which
//! render on top, so flattening yields the final z-order directly.

use rand::Rng;
use serde::Serialize;
use crate::attribute::Attribute;
use crate::config::ConfigError;
use crate::parse::Point;
use crate::sampler::SlotSampler;
use crate::settings::{AttributeSettings, Slot};

/// Nesting bound for slots declared inside chosen attributes
pub const MAX_SLOT_DEPTH: usize = 32;

/// One renderable entry of a generated artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub attribute: Attribute,
    /// Sum of all enclosing slot positions plus the attribute's own position
    pub position: Point,
    /// Alignment origin inside the layer image, subtracted at render time
    pub anchor_point: Point,
    /// 0 for base slots
    pub depth: usize,
}

#[derive(Debug, Clone)]
struct Node {
    settings: AttributeSettings,
    position: Point,
    depth: usize,
    beneath: Vec<usize>,
    above: Vec<usize>,
}

struct Pending {
    parent: Option<usize>,
    slot: Slot,
    origin: Point,
    depth: usize,
}

enum Visit {
    Expand(usize),
    Emit(usize),
}

#[derive(Debug, Clone, Default)]
pub struct CompositionTree {
    nodes: Vec<Node>,
    roots: Vec<usize>,
}

impl CompositionTree {
    /// Sample every base slot and, transitively, every slot the chosen
    /// attributes declare
    pub fn build<R: Rng + ?Sized>(
        sampler: &SlotSampler<'_>,
        base_slots: &[Slot],
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let mut tree = Self::default();
        let mut stack: Vec<Pending> = base_slots
            .iter()
            .rev()
            .map(|slot| Pending {
                parent: None,
                slot: slot.clone(),
                origin: Point::ORIGIN,
                depth: 0,
            })
            .collect();

        while let Some(pending) = stack.pop() {
            let origin = pending.origin.offset(pending.slot.position);
            let Some(settings) = sampler.sample(&pending.slot, rng)? else {
                continue;
            };

            if !settings.slots.is_empty() && pending.depth + 1 > MAX_SLOT_DEPTH {
                return Err(ConfigError::SlotDepthExceeded(
                    MAX_SLOT_DEPTH,
                    pending.slot.feature.clone(),
                ));
            }

            let index = tree.nodes.len();
            // Reversed so siblings pop in declaration order
            for child in settings.slots.iter().rev() {
                stack.push(Pending {
                    parent: Some(index),
                    slot: child.clone(),
                    origin,
                    depth: pending.depth + 1,
                });
            }

            match pending.parent {
                Some(parent) if settings.behind => tree.nodes[parent].beneath.push(index),
                Some(parent) => tree.nodes[parent].above.push(index),
                None => tree.roots.push(index),
            }

            tree.nodes.push(Node {
                position: origin.offset(settings.position),
                depth: pending.depth,
                settings,
                beneath: vec![],
                above: vec![],
            });
        }

        Ok(tree)
    }

    /// Layers bottom to top: children marked `behind` precede their parent,
    /// the rest follow it, siblings keep declaration order
    pub fn layers(&self) -> Vec<Layer> {
        let mut layers = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<Visit> = self.roots.iter().rev().map(|&i| Visit::Expand(i)).collect();

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Expand(i) => {
                    let node = &self.nodes[i];
                    stack.extend(node.above.iter().rev().map(|&c| Visit::Expand(c)));
                    stack.push(Visit::Emit(i));
                    stack.extend(node.beneath.iter().rev().map(|&c| Visit::Expand(c)));
                }
                Visit::Emit(i) => {
                    let node = &self.nodes[i];
                    layers.push(Layer {
                        attribute: node.settings.attribute.clone(),
                        position: node.position,
                        anchor_point: node.settings.anchor_point,
                        depth: node.depth,
                    });
                }
            }
        }

        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::ColorSigns;
    use crate::catalog::MemoryStore;
    use crate::settings::{BaseSettings, Section, SettingsResolver};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn section(value: serde_json::Value) -> Section {
        value.as_object().cloned().unwrap()
    }

    fn build(store: &MemoryStore, features: &Section, base_slots: &[Slot]) -> Result<Vec<Layer>, ConfigError> {
        let base = BaseSettings::default();
        let signs = ColorSigns::default();
        let sampler = SlotSampler::new(store, SettingsResolver::new(&base, features), &signs);
        let mut rng = StdRng::seed_from_u64(11);
        Ok(CompositionTree::build(&sampler, base_slots, &mut rng)?.layers())
    }

    fn names(layers: &[Layer]) -> Vec<String> {
        layers.iter().map(|l| l.attribute.feature.clone()).collect()
    }

    #[test]
    fn test_nested_positions_accumulate() {
        let mut store = MemoryStore::new();
        store.add_name("body", "blue").add_name("hat", "cap");
        let features = section(json!({
            "body": {"blue": {"slots": {"hat": {"position": "(5, -5)"}}}},
            "hat": {"cap": {"position": "(1, 1)", "anchor_point": "(3, 4)"}}
        }));
        let base_slots = vec![Slot::new("body").at(Point::new(10.0, 10.0))];

        let layers = build(&store, &features, &base_slots).unwrap();
        assert_eq!(names(&layers), vec!["body", "hat"]);
        assert_eq!(layers[0].position, Point::new(10.0, 10.0));
        assert_eq!(layers[1].position, Point::new(16.0, 6.0));
        assert_eq!(layers[1].anchor_point, Point::new(3.0, 4.0));
        assert_eq!(layers[1].depth, 1);
    }

    #[test]
    fn test_behind_orders_before_parent() {
        let mut store = MemoryStore::new();
        store
            .add_name("body", "blue")
            .add_name("tail", "long")
            .add_name("hat", "cap")
            .add_name("cape", "red");
        let features = section(json!({
            "body": {"blue": {"slots": {"hat": null, "tail": null, "cape": null}}},
            "tail": {"default": {"behind": true}},
            "cape": {"default": {"behind": "true"}}
        }));
        let base_slots = vec![Slot::new("background"), Slot::new("body")];

        let layers = build(&store, &features, &base_slots).unwrap();
        assert_eq!(names(&layers), vec!["tail", "cape", "body", "hat"]);
    }

    #[test]
    fn test_behind_applies_recursively() {
        let mut store = MemoryStore::new();
        store
            .add_name("body", "blue")
            .add_name("hat", "cap")
            .add_name("feather", "plume");
        let features = section(json!({
            "body": {"blue": {"slots": {"hat": null}}},
            "hat": {"cap": {"slots": {"feather": {"attributes": {"plume": {"behind": true}}}}}}
        }));
        let layers = build(&store, &features, &[Slot::new("body")]).unwrap();
        assert_eq!(names(&layers), vec!["body", "feather", "hat"]);
        assert_eq!(layers[1].depth, 2);
    }

    #[test]
    fn test_self_referencing_slot_is_bounded() {
        let mut store = MemoryStore::new();
        store.add_name("chain", "link");
        let features = section(json!({"chain": {"link": {"slots": {"chain": null}}}}));
        let err = build(&store, &features, &[Slot::new("chain")]).unwrap_err();
        assert!(matches!(err, ConfigError::SlotDepthExceeded(MAX_SLOT_DEPTH, _)));
    }

    #[test]
    fn test_branching_cycle_fails_fast() {
        let mut store = MemoryStore::new();
        store.add_name("left", "x").add_name("right", "y");
        let features = section(json!({
            "left": {"x": {"slots": {"left": null, "right": null}}},
            "right": {"y": {"slots": {"left": null, "right": null}}}
        }));
        let err = build(&store, &features, &[Slot::new("left")]).unwrap_err();
        assert!(matches!(err, ConfigError::SlotDepthExceeded(MAX_SLOT_DEPTH, _)));
    }

    #[test]
    fn test_siblings_keep_declaration_order() {
        let mut store = MemoryStore::new();
        store
            .add_name("body", "blue")
            .add_name("hat", "cap")
            .add_name("feather", "plume")
            .add_name("scarf", "wool");
        let features = section(json!({
            "body": {"blue": {"slots": {"hat": null, "scarf": null}}},
            "hat": {"cap": {"slots": {"feather": null}}}
        }));
        let base_slots = vec![Slot::new("body"), Slot::new("hat")];

        let layers = build(&store, &features, &base_slots).unwrap();
        assert_eq!(names(&layers), vec!["body", "hat", "feather", "scarf", "hat", "feather"]);
    }

    #[test]
    fn test_empty_base_slots() {
        let store = MemoryStore::new();
        let layers = build(&store, &Section::new(), &[]).unwrap();
        assert!(layers.is_empty());
    }
}
