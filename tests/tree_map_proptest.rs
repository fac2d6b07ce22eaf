use proptest::prelude::*;
use rc_treemap::{Entry, ErrorKind, Owned, Scalar, TreeMap};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

#[derive(Clone, Debug)]
enum Op {
    Add(i16, u32),
    Set(i16, u32),
    Upsert(i16, u32),
    Remove(i16),
    RemoveEntry(usize),
    Clone,
}

fn op() -> impl Strategy<Value = Op> {
    let key = -64i16..64;
    prop_oneof![
        6 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Add(k, v)),
        2 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        2 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Upsert(k, v)),
        3 => key.prop_map(Op::Remove),
        2 => any::<usize>().prop_map(Op::RemoveEntry),
        1 => Just(Op::Clone),
    ]
}

type Map = TreeMap<Scalar<i16>, Owned<u32>>;

fn check_navigation(m: &Map, model: &BTreeMap<i16, u32>, probe: i16) -> Result<(), TestCaseError> {
    let expect = |v: Option<(&i16, &u32)>| v.map(|(_, v)| *v).ok_or(ErrorKind::KeyNotFound);
    prop_assert_eq!(m.ceiling(&probe).copied(), expect(model.range(probe..).next()));
    prop_assert_eq!(m.floor(&probe).copied(), expect(model.range(..=probe).next_back()));
    prop_assert_eq!(
        m.higher(&probe).copied(),
        expect(model.range((Excluded(probe), Unbounded)).next())
    );
    prop_assert_eq!(
        m.lower(&probe).copied(),
        expect(model.range((Unbounded, Excluded(probe))).next_back())
    );
    prop_assert_eq!(
        m.get(&probe).copied(),
        expect(model.range((Included(probe), Included(probe))).next())
    );
    Ok(())
}

// Property: TreeMap behaves like std::collections::BTreeMap.
// - add/set/insert_or_set/remove agree on success and failure kinds.
// - Iteration is in ascending key order and matches the model exactly.
// - Navigation (ceiling/floor/higher/lower) agrees with BTreeMap ranges.
// - A clone is independent of its source from the moment it is taken.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_map_matches_btreemap(
        ops in proptest::collection::vec(op(), 1..150),
        probes in proptest::collection::vec(-70i16..70, 8),
    ) {
        let mut m = Map::new();
        let mut model: BTreeMap<i16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Add(k, v) => {
                    let res = m.add(&k, &v).map(|_| ());
                    if let std::collections::btree_map::Entry::Vacant(slot) = model.entry(k) {
                        slot.insert(v);
                        prop_assert_eq!(res, Ok(()));
                    } else {
                        prop_assert_eq!(res, Err(ErrorKind::KeyAlreadyExists));
                    }
                }
                Op::Set(k, v) => {
                    let res = m.set(&k, &v);
                    match model.get_mut(&k) {
                        Some(slot) => {
                            *slot = v;
                            prop_assert_eq!(res, Ok(()));
                        }
                        None => prop_assert_eq!(res, Err(ErrorKind::KeyNotFound)),
                    }
                }
                Op::Upsert(k, v) => {
                    let e = m.insert_or_set(&k, &v);
                    prop_assert!(e.is_ok());
                    model.insert(k, v);
                }
                Op::Remove(k) => {
                    let expected = if model.remove(&k).is_some() { Ok(()) } else { Err(ErrorKind::KeyNotFound) };
                    prop_assert_eq!(m.remove(&k), expected);
                }
                Op::RemoveEntry(ix) => {
                    if !model.is_empty() {
                        let entries: Vec<Entry> = m.entries().collect();
                        let e = entries[ix % entries.len()];
                        let k = *m.entry_key(e).unwrap();
                        prop_assert_eq!(m.remove_entry(e), Ok(()));
                        prop_assert_eq!(m.remove_entry(e), Err(ErrorKind::EntryNotFound));
                        model.remove(&k);
                    }
                }
                Op::Clone => {
                    let mut copy = m.clone();
                    prop_assert!(copy.iter().eq(m.iter()));
                    copy.clear();
                    prop_assert_eq!(m.len(), model.len());
                }
            }
            prop_assert_eq!(m.len(), model.len());
        }

        let got: Vec<(i16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        let want: Vec<(i16, u32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, want);
        for p in probes {
            check_navigation(&m, &model, p)?;
        }
    }
}
