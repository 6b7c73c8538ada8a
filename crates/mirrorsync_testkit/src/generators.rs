//! Property-based test generators using proptest.
//!
//! Edits are generated as plain data and applied to a fixture afterwards, so
//! a failing case shrinks to a short, readable list of edits.

use crate::fixtures::{card, cat, color, dog, position, Cat, Dog, Player, Suit};
use mirrorsync_codec::Value;
use mirrorsync_core::{MirroredList, MirroredMap, MirroredRef};
use proptest::prelude::*;

/// Strategy for card suits.
pub fn suit_strategy() -> impl Strategy<Value = Suit> {
    prop::sample::select(Suit::VARIANTS)
}

/// Strategy for short lowercase names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

/// One local change to a [`Player`].
#[derive(Debug, Clone)]
pub enum PlayerEdit {
    /// Rename the player.
    Rename(String),
    /// Move in place through the position accessor.
    Step {
        /// Horizontal offset.
        dx: i32,
        /// Vertical offset.
        dy: i32,
    },
    /// Replace the whole position.
    Teleport(i32, i32),
    /// Change health inside the vitals record.
    Hurt(u32),
    /// Change energy inside the vitals record.
    Rest(u8),
    /// Replace the immutable color.
    Recolor(String),
    /// Append a card.
    Draw(Suit, u8),
    /// Remove the card at a position (modulo hand size).
    Discard(usize),
    /// Change a card's rank in place (position modulo hand size).
    Rerank(usize, u8),
    /// Replace a card (position modulo hand size).
    Swap(usize, Suit, u8),
    /// Set a score.
    Score(String, i32),
    /// Bump an existing score in place (key index modulo map size).
    Bump(usize),
    /// Remove a score.
    Forget(String),
    /// Replace the pet with a new cat.
    AdoptCat(String),
    /// Replace the pet with a new dog.
    AdoptDog(String),
    /// Remove the pet.
    Release,
    /// Rename the current pet in place.
    RenamePet(String),
    /// Set or clear the target.
    Aim(Option<(i32, i32)>),
    /// Nudge the target in place, if there is one.
    Nudge(i32),
    /// Assign a new position through the position accessor.
    Relocate(i32, i32),
    /// Assign or clear the target through the target accessor.
    Retarget(Option<(i32, i32)>),
    /// Assign a card through the hand's element accessor (position modulo
    /// hand size).
    Replace(usize, Suit, u8),
    /// Edit the immutable color in place through its accessor.
    Tint(String),
    /// Assign a whole new hand through the hand accessor.
    Deal(Vec<(Suit, u8)>),
    /// Assign an empty score map through the scores accessor.
    WipeScores,
    /// Assign a new reference to a cat through the pet accessor.
    Rehome(String),
}

/// Strategy for a single player edit.
pub fn player_edit_strategy() -> impl Strategy<Value = PlayerEdit> {
    let local = prop_oneof![
        name_strategy().prop_map(PlayerEdit::Rename),
        (-3i32..=3, -3i32..=3).prop_map(|(dx, dy)| PlayerEdit::Step { dx, dy }),
        (-50i32..50, -50i32..50).prop_map(|(x, y)| PlayerEdit::Teleport(x, y)),
        (0u32..=100).prop_map(PlayerEdit::Hurt),
        any::<u8>().prop_map(PlayerEdit::Rest),
        prop::sample::select(vec!["red", "green", "blue"])
            .prop_map(|c| PlayerEdit::Recolor(c.to_string())),
        (suit_strategy(), 1u8..=13).prop_map(|(s, r)| PlayerEdit::Draw(s, r)),
        any::<usize>().prop_map(PlayerEdit::Discard),
        (-2i32..=2).prop_map(PlayerEdit::Nudge),
    ];
    let owned = prop_oneof![
        (any::<usize>(), 1u8..=13).prop_map(|(i, r)| PlayerEdit::Rerank(i, r)),
        (any::<usize>(), suit_strategy(), 1u8..=13).prop_map(|(i, s, r)| PlayerEdit::Swap(i, s, r)),
        (name_strategy(), -20i32..20).prop_map(|(k, v)| PlayerEdit::Score(k, v)),
        any::<usize>().prop_map(PlayerEdit::Bump),
        name_strategy().prop_map(PlayerEdit::Forget),
        name_strategy().prop_map(PlayerEdit::AdoptCat),
        name_strategy().prop_map(PlayerEdit::AdoptDog),
        Just(PlayerEdit::Release),
        name_strategy().prop_map(PlayerEdit::RenamePet),
        prop::option::of((-9i32..9, -9i32..9)).prop_map(PlayerEdit::Aim),
    ];
    let assigned = prop_oneof![
        (-50i32..50, -50i32..50).prop_map(|(x, y)| PlayerEdit::Relocate(x, y)),
        prop::option::of((-9i32..9, -9i32..9)).prop_map(PlayerEdit::Retarget),
        (any::<usize>(), suit_strategy(), 1u8..=13)
            .prop_map(|(i, s, r)| PlayerEdit::Replace(i, s, r)),
        prop::sample::select(vec!["red", "green", "blue"])
            .prop_map(|c| PlayerEdit::Tint(c.to_string())),
        prop::collection::vec((suit_strategy(), 1u8..=13), 0..4).prop_map(PlayerEdit::Deal),
        Just(PlayerEdit::WipeScores),
        name_strategy().prop_map(PlayerEdit::Rehome),
    ];
    prop_oneof![local, owned, assigned]
}

/// Strategy for a sequence of ticks, each a batch of edits.
pub fn edit_ticks_strategy() -> impl Strategy<Value = Vec<Vec<PlayerEdit>>> {
    prop::collection::vec(prop::collection::vec(player_edit_strategy(), 0..6), 1..8)
}

/// Apply one edit through the player's public accessors.
pub fn apply_edit(player: &mut Player, edit: &PlayerEdit) {
    match edit {
        PlayerEdit::Rename(name) => player.set_name(name.clone()),
        PlayerEdit::Step { dx, dy } => {
            let p = player.position_mut();
            let (x, y) = (*p.x(), *p.y());
            p.set_x(x + dx);
            p.set_y(y + dy);
        }
        PlayerEdit::Teleport(x, y) => player.set_position(position(*x, *y)),
        PlayerEdit::Hurt(health) => player.vitals_mut().set_health(*health),
        PlayerEdit::Rest(level) => *player.vitals_mut().energy_mut() = f64::from(*level) / 255.0,
        PlayerEdit::Recolor(value) => player.set_color(color(value)),
        PlayerEdit::Draw(suit, rank) => player.hand_mut().push(card(*suit, *rank)),
        PlayerEdit::Discard(index) => {
            let hand = player.hand_mut();
            if !hand.is_empty() {
                let len = hand.len();
                hand.remove(index % len);
            }
        }
        PlayerEdit::Rerank(index, rank) => {
            let hand = player.hand_mut();
            if !hand.is_empty() {
                let len = hand.len();
                if let Some(c) = hand.get_mut(index % len) {
                    c.set_rank(*rank);
                }
            }
        }
        PlayerEdit::Swap(index, suit, rank) => {
            let hand = player.hand_mut();
            if !hand.is_empty() {
                let len = hand.len();
                hand.set(index % len, card(*suit, *rank));
            }
        }
        PlayerEdit::Score(key, value) => {
            player.scores_mut().insert(key.clone(), *value);
        }
        PlayerEdit::Bump(index) => {
            let scores = player.scores_mut();
            if !scores.is_empty() {
                let key = scores.keys().nth(index % scores.len()).cloned();
                if let Some(key) = key {
                    if let Some(score) = scores.get_mut(&key) {
                        *score += 1;
                    }
                }
            }
        }
        PlayerEdit::Forget(key) => {
            player.scores_mut().remove(key);
        }
        PlayerEdit::AdoptCat(name) => player.pet_mut().set(cat(name)),
        PlayerEdit::AdoptDog(name) => player.pet_mut().set(dog(name)),
        PlayerEdit::Release => player.pet_mut().clear(),
        PlayerEdit::RenamePet(name) => {
            let pet = player.pet_mut();
            if let Some(c) = pet.downcast_mut::<Cat>() {
                c.set_name(name.clone());
            } else if let Some(d) = pet.downcast_mut::<Dog>() {
                d.set_name(name.clone());
            }
        }
        PlayerEdit::Aim(target) => player.set_target(target.map(|(x, y)| position(x, y))),
        PlayerEdit::Nudge(dx) => {
            if player.target().is_none() {
                return;
            }
            if let Some(target) = player.target_mut() {
                let x = *target.x();
                target.set_x(x + dx);
            }
        }
        PlayerEdit::Relocate(x, y) => *player.position_mut() = position(*x, *y),
        PlayerEdit::Retarget(target) => {
            *player.target_mut() = target.map(|(x, y)| position(x, y));
        }
        PlayerEdit::Replace(index, suit, rank) => {
            let hand = player.hand_mut();
            if !hand.is_empty() {
                let len = hand.len();
                if let Some(c) = hand.get_mut(index % len) {
                    *c = card(*suit, *rank);
                }
            }
        }
        PlayerEdit::Tint(value) => player.color_mut().set_value(value.clone()),
        PlayerEdit::Deal(cards) => {
            *player.hand_mut() = cards.iter().map(|(s, r)| card(*s, *r)).collect::<MirroredList<_>>();
        }
        PlayerEdit::WipeScores => *player.scores_mut() = MirroredMap::new(),
        PlayerEdit::Rehome(name) => *player.pet_mut() = MirroredRef::with_target(cat(name)),
    }
}

/// Strategy for arbitrary message values without NaN, up to a small depth.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4).prop_map(|pairs| {
                let mut seen = std::collections::HashSet::new();
                Value::map(
                    pairs
                        .into_iter()
                        .filter(|(k, _)| seen.insert(k.clone()))
                        .map(|(k, v)| (Value::Text(k), v))
                        .collect(),
                )
            }),
        ]
    })
}
