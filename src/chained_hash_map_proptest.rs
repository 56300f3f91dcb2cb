#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can look at
// capacity transitions next to the public API.

use crate::addressing::{DEFAULT_CAPACITY, MAX_LOAD_FACTOR};
use crate::chained_hash_map::ChainedHashMap;
use crate::error::MapError;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    GetOrInsertDefault(usize, i32),
    Erase(usize),
    At(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

// Pools go up to 40 keys so scenarios cross the 16 -> 32 -> 64 grow points
// and walk back down again.
fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,6}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::GetOrInsertDefault(i, d)),
            3 => idx.clone().prop_map(OpI::Erase),
            1 => idx.clone().prop_map(OpI::At),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,6}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn grown(len: usize, capacity: usize) -> usize {
    if len * 4 > capacity * 3 {
        capacity * 2
    } else {
        capacity
    }
}

fn shrunk(len: usize, capacity: usize) -> usize {
    if capacity > 1 && len * 4 < capacity {
        capacity / 2
    } else {
        capacity
    }
}

// State-machine equivalence against std::collections::HashMap.
// Checked after every op:
// - `insert` succeeds iff the key is absent and never overwrites.
// - `erase` reports presence; absent keys leave capacity untouched.
// - capacity doubles/halves exactly when the load crosses 0.75 / 0.25.
// - capacity is a power of two and load never exceeds 0.75.
// - `at`/`get` agree with the model for every pool key.
// - a cursor walk yields each live entry once, then reports OutOfRange.
fn run_scenario<S: BuildHasher>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();

    for op in ops {
        let cap_before = sut.capacity();
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let absent = !model.contains_key(&k);
                let inserted = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, absent, "insert succeeds iff key is absent");
                if inserted {
                    model.insert(k, v);
                    prop_assert_eq!(sut.capacity(), grown(model.len(), cap_before));
                } else {
                    prop_assert_eq!(sut.capacity(), cap_before);
                }
            }
            OpI::GetOrInsertDefault(i, d) => {
                let k = key_from(pool, i);
                let absent = !model.contains_key(&k);
                let v = sut.get_or_insert_default(k.clone());
                *v = v.saturating_add(d);
                let mv = model.entry(k).or_default();
                *mv = mv.saturating_add(d);
                if absent {
                    prop_assert_eq!(sut.capacity(), grown(model.len(), cap_before));
                } else {
                    prop_assert_eq!(sut.capacity(), cap_before);
                }
            }
            OpI::Erase(i) => {
                let k = key_from(pool, i);
                let removed = sut.erase(&k);
                prop_assert_eq!(removed, model.remove(&k).is_some());
                if removed {
                    prop_assert_eq!(sut.capacity(), shrunk(model.len(), cap_before));
                } else {
                    prop_assert_eq!(sut.capacity(), cap_before);
                }
            }
            OpI::At(i) => {
                let k = key_from(pool, i);
                match model.get(&k) {
                    Some(mv) => {
                        prop_assert_eq!(sut.at(&k), Ok(mv));
                    }
                    None => {
                        prop_assert_eq!(sut.at(&k), Err(MapError::KeyNotFound));
                    }
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match sut.at_mut(&k) {
                    Ok(vr) => {
                        *vr = vr.saturating_add(d);
                        let mv = model.get_mut(&k).expect("model tracks every live key");
                        *mv = mv.saturating_add(d);
                    }
                    Err(e) => {
                        prop_assert_eq!(e, MapError::KeyNotFound);
                        prop_assert!(!model.contains_key(&k));
                    }
                }
            }
            OpI::Iterate => {
                let mut walked: BTreeMap<Key, i32> = BTreeMap::new();
                let mut steps = 0;
                let mut c = sut.cursor();
                while !c.is_end() {
                    let (k, v) = c.get().expect("cursor before end resolves");
                    prop_assert!(walked.insert(k.clone(), *v).is_none(), "entry visited twice");
                    c.advance();
                    steps += 1;
                }
                prop_assert_eq!(c, sut.cursor_end());
                prop_assert_eq!(c.get().err(), Some(MapError::OutOfRange));
                prop_assert_eq!(steps, sut.len());
                prop_assert_eq!(sut.iter().len(), sut.len());
                let m_sorted: BTreeMap<Key, i32> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(walked, m_sorted);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap_before);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity().is_power_of_two());
        prop_assert!(sut.load_factor() <= MAX_LOAD_FACTOR);
        for i in 0..pool.len() {
            let k = key_from(pool, i);
            prop_assert_eq!(sut.get(&k), model.get(&k));
        }
    }
    Ok(())
}

// Collision variant: every key hashes to 0, so all entries share one chain
// and equality alone resolves lookups.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: ChainedHashMap<Key, i32, RandomState> = ChainedHashMap::new();
        prop_assert_eq!(sut.capacity(), DEFAULT_CAPACITY);
        run_scenario(sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::with_hasher(ConstBuildHasher);
        run_scenario(sut, &pool, ops)?;
    }
}

// Bulk construction matches a model built by sequential last-wins
// assignment, and its capacity comes from the raw length.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_from_parallel_last_wins(pairs in proptest::collection::vec((0u16..64, any::<i32>()), 0..200)) {
        let (keys, values): (Vec<u16>, Vec<i32>) = pairs.iter().copied().unzip();
        let raw = keys.len();
        let m = ChainedHashMap::from_parallel(keys, values).expect("equal lengths");

        let mut model: HashMap<u16, i32> = HashMap::new();
        for (k, v) in pairs {
            model.insert(k, v);
        }
        prop_assert_eq!(m.len(), model.len());
        prop_assert!(m.capacity() > raw);
        prop_assert!(raw * 4 <= m.capacity() * 3);
        // and no smaller power of two would do
        let half = m.capacity() / 2;
        prop_assert!(m.capacity() == DEFAULT_CAPACITY || half <= raw || raw * 4 > half * 3);
        for (k, v) in &model {
            prop_assert_eq!(m.at(k), Ok(v));
        }
        prop_assert_eq!(m.iter().count(), model.len());
    }

    #[test]
    fn prop_from_parallel_rejects_mismatch(nk in 0usize..20, nv in 0usize..20) {
        prop_assume!(nk != nv);
        let keys: Vec<usize> = (0..nk).collect();
        let values: Vec<usize> = (0..nv).collect();
        let r = ChainedHashMap::from_parallel(keys, values);
        prop_assert_eq!(r.err(), Some(MapError::MismatchedInput { keys: nk, values: nv }));
    }
}
