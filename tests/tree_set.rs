use rc_treemap::{ErrorKind, Owned, Scalar, TreeSet};

// Invariant: adding an equal string twice fails and keeps the count at one.
#[test]
fn duplicate_string_rejected() {
    let mut s: TreeSet<Owned<str>> = TreeSet::new();
    s.add("b").unwrap();
    assert_eq!(s.add("b"), Err(ErrorKind::ValueAlreadyExists));
    assert_eq!(s.len(), 1);
}

// Invariant: items resolve to the stored copy, not the caller's string.
#[test]
fn stored_strings_are_copies() {
    let mut s: TreeSet<Owned<str>> = TreeSet::new();
    let mut src = String::from("alpha");
    let item = s.add(&src).unwrap();
    src.push_str("-changed");
    assert_eq!(s.value(item).map(String::as_str), Ok("alpha"));
    assert!(s.contains("alpha"));
    assert!(!s.contains(&src));
}

// Invariant: ceiling/floor/higher/lower agree with a linear scan.
#[test]
fn navigation_matches_scan() {
    let values = [3, 9, 27, 81];
    let mut s: TreeSet<Scalar<i32>> = TreeSet::with_capacity(values.len());
    for v in values {
        s.add(&v).unwrap();
    }
    for probe in 0..100 {
        let at = |r: rc_treemap::Result<rc_treemap::Item>| r.ok().map(|i| *s.value(i).unwrap());
        assert_eq!(at(s.ceiling(&probe)), values.iter().copied().find(|v| *v >= probe));
        assert_eq!(at(s.higher(&probe)), values.iter().copied().find(|v| *v > probe));
        assert_eq!(at(s.floor(&probe)), values.iter().rev().copied().find(|v| *v <= probe));
        assert_eq!(at(s.lower(&probe)), values.iter().rev().copied().find(|v| *v < probe));
    }
}

// Invariant: stepping with next from first visits every element once, in
// ascending order; prev from last does the reverse.
#[test]
fn item_stepping_both_directions() {
    let mut s: TreeSet<Scalar<u16>> = TreeSet::new();
    for v in (0..64u16).rev().step_by(3) {
        s.add(&v).unwrap();
    }
    let mut forward = Vec::new();
    let mut cur = s.first();
    while let Ok(i) = cur {
        forward.push(*s.value(i).unwrap());
        cur = s.next(i);
    }
    assert_eq!(cur, Err(ErrorKind::EndOfSequence));
    let mut backward = Vec::new();
    let mut cur = s.last();
    while let Ok(i) = cur {
        backward.push(*s.value(i).unwrap());
        cur = s.prev(i);
    }
    backward.reverse();
    assert_eq!(forward, backward);
    assert_eq!(forward, s.iter().copied().collect::<Vec<_>>());
    assert!(forward.windows(2).all(|w| w[0] < w[1]));
}

// Invariant: take moves the stored element out; remove_item on the stale
// item then fails.
#[test]
fn take_and_stale_item() {
    let mut s: TreeSet<Owned<str>> = TreeSet::new();
    let item = s.add("gone").unwrap();
    assert_eq!(s.take("gone"), Ok(String::from("gone")));
    assert_eq!(s.remove_item(item), Err(ErrorKind::ItemNotFound));
    assert_eq!(s.remove("gone"), Err(ErrorKind::ValueNotFound));
    assert_eq!(s.first(), Err(ErrorKind::SetIsEmpty));
}

// Invariant: clear invalidates every item and leaves a usable set.
#[test]
fn clear_then_reuse() {
    let mut s: TreeSet<Scalar<i8>> = TreeSet::new();
    let items: Vec<_> = (-5..5).map(|v| s.add(&v).unwrap()).collect();
    s.clear();
    assert!(items.iter().all(|i| !s.contains_item(*i)));
    s.add(&1).unwrap();
    assert_eq!(s.items().count(), 1);
}
