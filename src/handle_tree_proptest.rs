#![cfg(test)]

// Property tests for HandleTree kept inside the crate so they can reach
// `check_invariants` without feature gates.

use crate::handle_tree::{Duplicate, Handle, HandleTree};
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u8),
    Remove(u8),
    Find(u8),
    Ceiling(u8),
    Floor(u8),
    Higher(u8),
    Lower(u8),
    Walk,
    Drain,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => any::<u8>().prop_map(Op::Insert),
        5 => any::<u8>().prop_map(Op::Remove),
        2 => any::<u8>().prop_map(Op::Find),
        2 => any::<u8>().prop_map(Op::Ceiling),
        2 => any::<u8>().prop_map(Op::Floor),
        2 => any::<u8>().prop_map(Op::Higher),
        2 => any::<u8>().prop_map(Op::Lower),
        1 => Just(Op::Walk),
        1 => Just(Op::Drain),
    ]
}

fn ord(a: &u8, b: &u8) -> Ordering {
    a.cmp(b)
}

fn value_at(t: &HandleTree<u8>, h: Option<Handle>) -> Option<u8> {
    h.and_then(|h| t.get(h)).copied()
}

// Property: state-machine equivalence against std::collections::BTreeMap.
// Invariants exercised across random operation sequences:
// - Duplicates are rejected and hand back the offered value plus the live handle.
// - Bounded searches agree with BTreeMap range queries.
// - Handles of removed nodes never resolve again.
// - Red-black invariants hold after every mutation; len parity with the model.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in proptest::collection::vec(op(), 1..200)) {
        let mut sut: HandleTree<u8> = HandleTree::new();
        let mut model: BTreeMap<u8, Handle> = BTreeMap::new();
        let mut stale: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(v) => match sut.insert_by(v, ord) {
                    Ok(h) => {
                        prop_assert!(!model.contains_key(&v), "insert must fail on duplicate");
                        model.insert(v, h);
                    }
                    Err(Duplicate { rejected, existing }) => {
                        prop_assert_eq!(rejected, v);
                        prop_assert_eq!(model.get(&v), Some(&existing));
                    }
                },
                Op::Remove(v) => match model.remove(&v) {
                    Some(h) => {
                        prop_assert_eq!(sut.remove(h), Some(v));
                        stale.push(h);
                    }
                    None => prop_assert!(sut.find_by(|s| v.cmp(s)).is_none()),
                },
                Op::Find(v) => {
                    prop_assert_eq!(sut.find_by(|s| v.cmp(s)), model.get(&v).copied());
                }
                Op::Ceiling(v) => {
                    let want = model.range(v..).next().map(|(k, _)| *k);
                    prop_assert_eq!(value_at(&sut, sut.ceiling_by(|s| v.cmp(s))), want);
                }
                Op::Floor(v) => {
                    let want = model.range(..=v).next_back().map(|(k, _)| *k);
                    prop_assert_eq!(value_at(&sut, sut.floor_by(|s| v.cmp(s))), want);
                }
                Op::Higher(v) => {
                    let want = model
                        .range((std::ops::Bound::Excluded(v), std::ops::Bound::Unbounded))
                        .next()
                        .map(|(k, _)| *k);
                    prop_assert_eq!(value_at(&sut, sut.higher_by(|s| v.cmp(s))), want);
                }
                Op::Lower(v) => {
                    let want = model.range(..v).next_back().map(|(k, _)| *k);
                    prop_assert_eq!(value_at(&sut, sut.lower_by(|s| v.cmp(s))), want);
                }
                Op::Walk => {
                    let forward: Vec<u8> = sut.iter().map(|(_, v)| *v).collect();
                    let expected: Vec<u8> = model.keys().copied().collect();
                    prop_assert_eq!(&forward, &expected);

                    let mut backward = Vec::new();
                    let mut cur = sut.last();
                    while let Some(h) = cur {
                        backward.push(*sut.get(h).unwrap());
                        cur = sut.prev(h);
                    }
                    backward.reverse();
                    prop_assert_eq!(backward, expected);
                }
                Op::Drain => {
                    let drained = sut.drain();
                    let expected: Vec<u8> = model.keys().copied().collect();
                    prop_assert_eq!(drained, expected);
                    stale.extend(model.values().copied());
                    model.clear();
                }
            }

            sut.check_invariants();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            for &h in &stale {
                prop_assert!(!sut.contains(h), "stale handle must not resolve");
            }
        }
    }
}
