//! Property tests for loot resolution.

use std::sync::Arc;

use hoard_core::{
    EntryConfig, EntryId, LootEntry, LootTable, RandomSource, Rarity, Registry, Reward,
    SeededRandom,
};
use proptest::prelude::*;

/// One generated entry: chance, always, unique, exclude, enabled, capped.
type EntrySpec = (f64, bool, bool, bool, bool, bool);

struct Generated {
    table: LootTable,
    entries: Vec<(Arc<LootEntry>, EntrySpec)>,
    max: i32,
}

fn build(specs: &[EntrySpec], count: u32, max: i32) -> Generated {
    let capped = Rarity::new().with_name("capped").with_max(max);
    let entries: Vec<(Arc<LootEntry>, EntrySpec)> = specs
        .iter()
        .map(|spec| {
            let &(chance, always, unique, exclude, enabled, is_capped) = spec;
            let mut entry = LootEntry::leaf(Reward::empty())
                .with_chance(chance)
                .with_always(always)
                .with_unique(unique)
                .with_exclude_from_random(exclude)
                .with_enabled(enabled);
            if is_capped {
                entry = entry.with_rarity(capped.clone());
            }
            (entry.shared(), *spec)
        })
        .collect();

    let table = LootTable::new(count, entries.iter().map(|(entry, _)| Arc::clone(entry)).collect());
    Generated { table, entries, max }
}

fn entry_spec() -> impl Strategy<Value = EntrySpec> {
    (
        0.0_f64..10.0,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        prop::bool::weighted(0.8),
        any::<bool>(),
    )
}

proptest! {
    #[test]
    fn property_constraints_hold(
        specs in prop::collection::vec(entry_spec(), 1..12),
        count in 0_u32..20,
        max in 0_i32..4,
        seed in any::<u64>(),
    ) {
        let generated = build(&specs, count, max);
        let result = generated.table.loot(None, &mut SeededRandom::new(seed));

        let mut always_enabled = 0_usize;
        let mut always_capped = 0_usize;
        let mut capped_hits = 0_usize;

        for (entry, spec) in &generated.entries {
            let &(_, always, unique, exclude, enabled, is_capped) = spec;
            let hits = result.count_of(entry.id());

            if !enabled {
                prop_assert_eq!(hits, 0);
                continue;
            }
            if unique {
                prop_assert!(hits <= 1);
            }
            if always {
                prop_assert!(hits >= 1);
                always_enabled += 1;
                if is_capped {
                    always_capped += 1;
                }
            }
            if exclude && !always {
                prop_assert_eq!(hits, 0);
            }
            if is_capped {
                capped_hits += hits;
            }
        }

        prop_assert!(result.len() <= always_enabled + count as usize);
        prop_assert!(capped_hits <= always_capped.max(usize::try_from(generated.max).unwrap_or(0)));
    }

    #[test]
    fn property_seeded_resolution_is_reproducible(
        specs in prop::collection::vec(entry_spec(), 1..12),
        count in 0_u32..20,
        seed in any::<u64>(),
    ) {
        let generated = build(&specs, count, -1);
        let a = generated.table.loot(None, &mut SeededRandom::new(seed));
        let b = generated.table.loot(None, &mut SeededRandom::new(seed));
        prop_assert_eq!(a.ids(), b.ids());
    }

    #[test]
    fn property_result_is_cached_until_loot(
        specs in prop::collection::vec(entry_spec(), 1..8),
        count in 0_u32..10,
        seed in any::<u64>(),
    ) {
        let generated = build(&specs, count, -1);
        let mut rng = SeededRandom::new(seed);

        let first = generated.table.result(None, &mut rng);
        let second = generated.table.result(None, &mut rng);
        prop_assert!(first.same_snapshot(&second));

        let rerolled = generated.table.loot(None, &mut rng);
        prop_assert!(!rerolled.same_snapshot(&first));
    }
}

#[test]
fn weight_proportionality() {
    let light = LootEntry::leaf(Reward::empty()).with_chance(1.0).shared();
    let heavy = LootEntry::leaf(Reward::empty()).with_chance(2.0).shared();
    let table = LootTable::new(1, vec![Arc::clone(&light), Arc::clone(&heavy)]);

    let mut rng = SeededRandom::new(2024);
    let (mut light_hits, mut heavy_hits) = (0_u32, 0_u32);
    for _ in 0..30_000 {
        let result = table.loot(None, &mut rng);
        light_hits += u32::try_from(result.count_of(light.id())).unwrap();
        heavy_hits += u32::try_from(result.count_of(heavy.id())).unwrap();
    }

    let ratio = f64::from(heavy_hits) / f64::from(light_hits);
    assert!((ratio - 2.0).abs() < 0.1, "ratio {ratio}");
}

/// Always returns the same draw.
struct FixedDraw(f64);

impl RandomSource for FixedDraw {
    fn roll(&mut self, _upper: f64) -> f64 {
        self.0
    }
}

#[test]
fn draw_boundary_is_strict() {
    let three = LootEntry::leaf(Reward::empty()).with_chance(3.0).shared();
    let seven = LootEntry::leaf(Reward::empty()).with_chance(7.0).shared();
    let table = LootTable::new(1, vec![Arc::clone(&three), Arc::clone(&seven)]);

    assert_eq!(table.loot(None, &mut FixedDraw(3.0)).ids(), vec![seven.id()]);
    assert_eq!(table.loot(None, &mut FixedDraw(2.999_999_9)).ids(), vec![three.id()]);
}

#[test]
fn nested_leaves_appended_contiguously() {
    let registry = Registry::with_builtin_types();
    let fragment: EntryConfig = toml::from_str(
        r#"
        count = 0

        [[rewards]]
        item = "bread"
        always = true

        [[rewards]]
        type = "table"
        always = true
        count = 0

        [[rewards.rewards]]
        item = "iron_ingot"
        always = true

        [[rewards.rewards]]
        item = "gold_ingot"
        always = true

        [[rewards]]
        command = "say done"
        always = true
        "#,
    )
    .unwrap();

    let entry = registry.load_table(&fragment).unwrap();
    let table = entry.as_table().unwrap();
    let result = table.loot(None, &mut SeededRandom::new(0));

    let items: Vec<String> = result
        .iter()
        .map(|leaf| {
            let reward = leaf.as_reward().unwrap();
            reward
                .params()
                .get("item")
                .or_else(|| reward.params().get("command"))
                .and_then(toml::Value::as_str)
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(items, ["bread", "iron_ingot", "gold_ingot", "say done"]);

    let nested: &Arc<LootEntry> = &table.contents()[1];
    let ids: Vec<EntryId> = result.ids();
    assert!(!ids.contains(&nested.id()));
}
