//! Replication laws checked against the sample schema.

use mirrorsync_codec::{to_canonical_cbor, Value};
use mirrorsync_core::{mirrored_composite, Mirrored, MirroredList, MirroredMap};
use mirrorsync_testkit::prelude::*;
use proptest::prelude::*;

mirrored_composite! {
    /// A single counter field.
    pub struct Counter: Complex {
        x: i32 => set_x, x_mut;
    }
}

fn same(actual: &Value, expected: &Value) {
    assert_eq!(
        to_canonical_cbor(actual).unwrap(),
        to_canonical_cbor(expected).unwrap(),
        "\nactual:   {actual}\nexpected: {expected}"
    );
}

fn ints(values: &[i64]) -> Value {
    Value::Array(values.iter().copied().map(Value::Integer).collect())
}

#[test]
fn counter_delta_and_clean() {
    let mut counter = Counter::new();
    counter.set_x(5);
    same(
        &counter.write(true).unwrap(),
        &Value::object([("x", Value::Integer(5))]),
    );
    counter.mark_clean();
    assert!(!counter.is_dirty());
}

#[test]
fn list_structural_then_sparse() {
    let mut list = MirroredList::<i32>::new();
    list.set_all(vec![0, 1, 2]);
    let expected = Value::object([("size", Value::Integer(3)), ("values", ints(&[0, 1, 2]))]);
    same(&list.write(true).unwrap(), &expected);
    same(&list.write(false).unwrap(), &expected);

    list.mark_clean();
    list.set(1, 10);
    same(
        &list.write(true).unwrap(),
        &Value::object([("indices", ints(&[1])), ("values", ints(&[10]))]),
    );
}

#[test]
fn list_remove_writes_current_contents() {
    let mut list = MirroredList::from_vec(vec![0i32, 10, 2]);
    list.remove(0);
    same(
        &list.write(true).unwrap(),
        &Value::object([("size", Value::Integer(2)), ("values", ints(&[10, 2]))]),
    );
}

#[test]
fn map_changes_always_write_the_whole_map() {
    let mut map = MirroredMap::<String, i32>::new();
    map.insert("a".to_string(), 1);
    map.insert("b".to_string(), 2);
    map.mark_clean();

    map.insert("c".to_string(), 3);
    assert_eq!(map.write(true).unwrap(), map.write(false).unwrap());
    map.mark_clean();

    map.remove("a");
    let delta = map.write(true).unwrap();
    assert_eq!(delta.get("size"), Some(&Value::Integer(2)));
    assert!(delta.get("keys").is_some());
    assert!(delta.get("indices").is_none());
    map.mark_clean();

    map.clear();
    same(
        &map.write(true).unwrap(),
        &Value::object([
            ("size", Value::Integer(0)),
            ("keys", Value::Array(vec![])),
            ("values", Value::Array(vec![])),
        ]),
    );
}

#[test]
fn immutable_value_ignores_reads() {
    let mut shared = color("hello");
    let mut other = color("hello");
    other.set_value("goodbye".to_string());
    assert_eq!(other.value(), "goodbye");

    shared.read(&other.write(false).unwrap()).unwrap();
    assert_eq!(shared.value(), "hello");
}

#[test]
fn immutable_field_is_replaced_by_parent() {
    let mut sender = sample_player("p");
    let mut receiver = sample_player("p");
    sender.set_color(color("blue"));
    receiver.read(&sender.write(true).unwrap()).unwrap();
    assert_eq!(receiver.color().value(), "blue");
}

#[test]
fn nested_change_is_found_by_the_list() {
    let mut player = sample_player("p");
    assert!(!player.hand().is_dirty());
    if let Some(card) = player.hand_mut().get_mut(1) {
        card.set_rank(12);
    }
    assert!(player.hand().is_dirty());
    assert!(player.is_dirty());

    let delta = player.write(true).unwrap();
    let hand = delta.get("hand").unwrap();
    same(
        hand,
        &Value::object([
            ("indices", ints(&[1])),
            ("values", Value::Array(vec![Value::object([("rank", Value::Integer(12))])])),
        ]),
    );
}

#[test]
fn one_field_change_writes_one_field() {
    let mut player = sample_player("p");
    player.set_name("q".to_string());
    same(
        &player.write(true).unwrap(),
        &Value::object([("name", Value::from("q"))]),
    );
}

#[test]
fn any_policy_writes_all_or_nothing() {
    let mut player = sample_player("p");
    same(&player.vitals().write(true).unwrap(), &Value::empty_map());

    *player.vitals_mut().health_mut() = 40;
    let delta = player.write(true).unwrap();
    let vitals = delta.get("vitals").unwrap();
    assert_eq!(vitals.map_len(), 2);
    assert_eq!(vitals.get("health"), Some(&Value::Integer(40)));
}

#[test]
fn clean_player_writes_nothing() {
    let player = sample_player("p");
    same(&player.write(true).unwrap(), &Value::empty_map());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn full_write_round_trips(edits in prop::collection::vec(player_edit_strategy(), 0..16)) {
        let mut player = sample_player("p");
        for edit in &edits {
            apply_edit(&mut player, edit);
        }
        let mut receiver = Player::new();
        receiver.read(&player.write(false).unwrap()).unwrap();
        prop_assert!(receiver.content_equals(&player));
        prop_assert!(!receiver.is_dirty());
    }

    #[test]
    fn mark_clean_is_idempotent(edits in prop::collection::vec(player_edit_strategy(), 0..16)) {
        let mut player = sample_player("p");
        for edit in &edits {
            apply_edit(&mut player, edit);
        }
        player.mark_clean();
        prop_assert!(!player.is_dirty());
        player.mark_clean();
        prop_assert!(!player.is_dirty());
        prop_assert_eq!(player.write(true).unwrap(), Value::empty_map());
    }

    #[test]
    fn structural_list_change_writes_full(
        start in prop::collection::vec(any::<i32>(), 0..8),
        extra in any::<i32>(),
        pop in any::<bool>(),
    ) {
        let mut list = MirroredList::from_vec(start);
        if pop && !list.is_empty() {
            list.pop();
        } else {
            list.push(extra);
        }
        prop_assert_eq!(list.write(true).unwrap(), list.write(false).unwrap());
    }
}
