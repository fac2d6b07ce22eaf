use rc_treemap::{ErrorKind, LinkedTreeSet, Owned, Scalar};

fn link_order(s: &LinkedTreeSet<Scalar<i32>>) -> Vec<i32> {
    s.link_iter().copied().collect()
}

// Invariant: tree order ignores placement; the last insertion can come first.
#[test]
fn prepend_is_first_in_tree_order_only_by_value() {
    let mut s: LinkedTreeSet<Scalar<i32>> = LinkedTreeSet::new();
    s.append(&1).unwrap();
    s.append(&2).unwrap();
    let zero = s.prepend(&0).unwrap();
    assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(s.first(), Ok(zero));
    assert_eq!(s.link_first(), Ok(zero));
    assert_eq!(link_order(&s), vec![0, 1, 2]);
}

// Invariant: link order follows placement while tree order follows value.
#[test]
fn two_orders_diverge() {
    let mut s: LinkedTreeSet<Owned<str>> = LinkedTreeSet::new();
    let m = s.add("m").unwrap();
    s.insert_after(m, "a").unwrap();
    s.insert_before(m, "z").unwrap();
    let links: Vec<&str> = s.link_iter().map(String::as_str).collect();
    let tree: Vec<&str> = s.iter().map(String::as_str).collect();
    assert_eq!(links, ["z", "m", "a"]);
    assert_eq!(tree, ["a", "m", "z"]);
    assert_eq!(format!("{:?}", s), r#"["z", "m", "a"]"#);
}

// Invariant: both orders hold the same items after every removal.
#[test]
fn removals_keep_orders_in_step() {
    let mut s: LinkedTreeSet<Scalar<i32>> = LinkedTreeSet::new();
    for v in [50, 10, 40, 20, 30] {
        s.append(&v).unwrap();
    }
    for gone in [40, 50, 30] {
        s.remove(&gone).unwrap();
        let mut links = link_order(&s);
        links.sort_unstable();
        assert_eq!(links, s.iter().copied().collect::<Vec<_>>());
    }
    assert_eq!(link_order(&s), vec![10, 20]);
}

// Invariant: link_next/link_prev walk link order and fail on stale items.
#[test]
fn link_walk() {
    let mut s: LinkedTreeSet<Scalar<i32>> = LinkedTreeSet::new();
    let c = s.append(&3).unwrap();
    let a = s.append(&1).unwrap();
    let b = s.append(&2).unwrap();
    assert_eq!(s.link_next(c), Ok(a));
    assert_eq!(s.link_next(a), Ok(b));
    assert_eq!(s.link_prev(c), Err(ErrorKind::EndOfSequence));
    assert_eq!(s.link_last(), Ok(b));
    assert_eq!(s.take_item(a), Ok(1));
    assert_eq!(s.link_next(a), Err(ErrorKind::ItemNotFound));
    assert_eq!(s.link_next(c), Ok(b));
    assert_eq!(s.link_prev(b), Ok(c));
}

// Invariant: a failed insert leaves the set and both orders untouched.
#[test]
fn failed_inserts_are_atomic() {
    let mut s: LinkedTreeSet<Scalar<i32>> = LinkedTreeSet::new();
    let one = s.append(&1).unwrap();
    assert_eq!(s.append(&1), Err(ErrorKind::ValueAlreadyExists));
    s.remove_item(one).unwrap();
    assert_eq!(s.insert_after(one, &2), Err(ErrorKind::ItemNotFound));
    assert!(s.is_empty());
    assert_eq!(s.link_first(), Err(ErrorKind::SetIsEmpty));
    assert_eq!(s.link_last(), Err(ErrorKind::SetIsEmpty));
}

// Invariant: tree navigation works unchanged through the linked set.
#[test]
fn tree_navigation_through_linked_set() {
    let mut s: LinkedTreeSet<Scalar<i32>> = LinkedTreeSet::with_capacity(8);
    for v in [8, 2, 6, 4] {
        s.prepend(&v).unwrap();
    }
    let val = |r: rc_treemap::Result<rc_treemap::Item>| r.map(|i| *s.value(i).unwrap());
    assert_eq!(val(s.ceiling(&5)), Ok(6));
    assert_eq!(val(s.floor(&5)), Ok(4));
    assert_eq!(val(s.higher(&8)), Err(ErrorKind::ValueNotFound));
    assert_eq!(val(s.lower(&2)), Err(ErrorKind::ValueNotFound));
    assert_eq!(val(s.get(&2)), Ok(2));
    assert_eq!(val(s.last()), Ok(8));
    assert_eq!(s.as_tree_set().len(), 4);
    assert!(s.contains(&6));
}
