//! Sample schemas and ready-made contexts.
//!
//! The schema models a small card game: a shared board, players with a hand
//! of cards, per-round scores, an optional target position and a pet chosen
//! from a polymorphic family. Between them the types cover every node kind
//! and every dirty policy.

use mirrorsync_core::{
    mirrored_composite, mirrored_enum, ContextConfig, Mirrored, MirroredArray, MirroredList,
    MirroredMap, MirroredRef, SyncContext, Tagged, TypeFamily, TypeRegistry,
};
use std::sync::OnceLock;

mirrored_enum! {
    /// A card suit.
    pub enum Suit {
        #[default]
        Hearts,
        Diamonds,
        Clubs,
        Spades,
    }
}

mirrored_composite! {
    /// A playing card.
    pub struct Card: Complex {
        suit: Suit => set_suit, suit_mut;
        rank: u8 = 1 => set_rank, rank_mut;
    }
}

mirrored_composite! {
    /// A display color. Shared by value and never patched by a sync pass.
    pub struct Color: Never, immutable {
        value: String => set_value, value_mut;
    }
}

mirrored_composite! {
    /// A board position.
    pub struct Position: Complex {
        x: i32 => set_x, x_mut;
        y: i32 => set_y, y_mut;
    }
}

mirrored_composite! {
    /// Health and energy, always sent together.
    pub struct Vitals: Any {
        health: u32 = 100 => set_health, health_mut;
        energy: f64 = 1.0 => set_energy, energy_mut;
    }
}

mirrored_composite! {
    /// A cat.
    pub struct Cat: Complex {
        name: String => set_name, name_mut;
        lives: u8 = 9 => set_lives, lives_mut;
    }
}

mirrored_composite! {
    /// A dog.
    pub struct Dog: Complex {
        name: String => set_name, name_mut;
        good: bool = true => set_good, good_mut;
    }
}

impl Tagged for Cat {
    const TYPE_TAG: &'static str = "Cat";
}

impl Tagged for Dog {
    const TYPE_TAG: &'static str = "Dog";
}

/// The family of pet types.
pub struct Pets;

impl TypeFamily for Pets {
    fn registry() -> &'static TypeRegistry {
        static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            TypeRegistry::builder()
                .register::<Cat>()
                .register::<Dog>()
                .build()
                .expect("pet tags are unique")
        })
    }
}

mirrored_composite! {
    /// A player and everything they own.
    pub struct Player: Complex {
        name: String => set_name, name_mut;
        position: Position => set_position, position_mut;
        vitals: Vitals => set_vitals, vitals_mut;
        color: Color => set_color, color_mut;
        hand: MirroredList<Card> => set_hand, hand_mut;
        scores: MirroredMap<String, i32> => set_scores, scores_mut;
        pet: MirroredRef<Pets> => set_pet, pet_mut;
        target: Option<Position> => set_target, target_mut;
    }
}

mirrored_composite! {
    /// Table state shared by every player.
    pub struct Board: Complex {
        turn: u32 => set_turn, turn_mut;
        lead: Suit => set_lead, lead_mut;
        cells: MirroredArray<u8> = MirroredArray::with_len(9) => set_cells, cells_mut;
    }
}

/// A clean color.
pub fn color(value: &str) -> Color {
    let mut c = Color::new();
    c.set_value(value.to_string());
    c.mark_clean();
    c
}

/// A clean card.
pub fn card(suit: Suit, rank: u8) -> Card {
    let mut c = Card::new();
    c.set_suit(suit);
    c.set_rank(rank);
    c.mark_clean();
    c
}

/// A clean position.
pub fn position(x: i32, y: i32) -> Position {
    let mut p = Position::new();
    p.set_x(x);
    p.set_y(y);
    p.mark_clean();
    p
}

/// A clean cat.
pub fn cat(name: &str) -> Cat {
    let mut c = Cat::new();
    c.set_name(name.to_string());
    c.mark_clean();
    c
}

/// A clean dog.
pub fn dog(name: &str) -> Dog {
    let mut d = Dog::new();
    d.set_name(name.to_string());
    d.mark_clean();
    d
}

/// A clean player with a few cards, a score and a cat.
pub fn sample_player(name: &str) -> Player {
    let mut p = Player::new();
    p.set_name(name.to_string());
    p.set_position(position(1, 2));
    p.set_color(color("red"));
    p.set_hand(MirroredList::from_vec(vec![
        card(Suit::Hearts, 10),
        card(Suit::Spades, 1),
        card(Suit::Clubs, 7),
    ]));
    p.scores_mut().insert("round1".to_string(), 12);
    p.set_pet(MirroredRef::with_target(cat("Tom")));
    p.mark_clean();
    p
}

/// A context with a `board` root and two sample players, `alice` and `bob`.
pub fn game_context(label: &str) -> SyncContext {
    let mut ctx = SyncContext::new(ContextConfig::new(label));
    ctx.register("board", Board::new())
        .expect("fresh context has no board");
    ctx.register("alice", sample_player("alice"))
        .expect("fresh context has no alice");
    ctx.register("bob", sample_player("bob"))
        .expect("fresh context has no bob");
    ctx
}

/// An empty context with the same roots as [`game_context`], every root at
/// its default. Used as a fresh receiver.
pub fn blank_game_context(label: &str) -> SyncContext {
    let mut ctx = SyncContext::new(ContextConfig::new(label));
    ctx.register("board", Board::new())
        .expect("fresh context has no board");
    ctx.register("alice", Player::new())
        .expect("fresh context has no alice");
    ctx.register("bob", Player::new())
        .expect("fresh context has no bob");
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_start_clean() {
        assert!(!sample_player("x").is_dirty());
        assert!(!game_context("a").is_dirty());
        assert_eq!(Board::new().cells().len(), 9);
    }

    #[test]
    fn pet_family_knows_both_pets() {
        let registry = Pets::registry();
        assert!(registry.contains("Cat"));
        assert!(registry.contains("Dog"));
        assert_eq!(registry.len(), 2);
    }
}
