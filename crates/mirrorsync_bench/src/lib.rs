//! Benchmark utilities.
//!
//! Builds contexts with many players and applies random edits to a few of
//! them, which is the shape of a typical game tick.

#![deny(unsafe_code)]

use mirrorsync_core::{ContextConfig, SyncContext};
use mirrorsync_testkit::{card, sample_player, Player, Suit};
use rand::Rng;

/// Root name of the `index`th player.
pub fn player_name(index: usize) -> String {
    format!("p{index}")
}

/// A context holding `players` sample players, all clean.
pub fn roster(players: usize) -> SyncContext {
    let mut ctx = SyncContext::new(ContextConfig::new("bench"));
    for index in 0..players {
        let name = player_name(index);
        let player = sample_player(&name);
        ctx.register(name, player)
            .unwrap_or_else(|e| panic!("roster names are unique: {e}"));
    }
    ctx
}

/// A context with the same roots as [`roster`], every player at its default.
pub fn blank_roster(players: usize) -> SyncContext {
    let mut ctx = SyncContext::new(ContextConfig::new("bench-receiver"));
    for index in 0..players {
        ctx.register(player_name(index), Player::new())
            .unwrap_or_else(|e| panic!("roster names are unique: {e}"));
    }
    ctx
}

/// Makes `edits` small changes to randomly chosen players.
pub fn random_edits(ctx: &mut SyncContext, players: usize, edits: usize, rng: &mut impl Rng) {
    for _ in 0..edits {
        let name = player_name(rng.gen_range(0..players));
        let Some(player) = ctx.get_mut::<Player>(&name) else {
            continue;
        };
        match rng.gen_range(0..4) {
            0 => player.vitals_mut().set_health(rng.gen_range(0..=100)),
            1 => {
                let x = rng.gen_range(-100..100);
                player.position_mut().set_x(x);
            }
            2 => {
                let rank = rng.gen_range(1..=13);
                if let Some(c) = player.hand_mut().get_mut(0) {
                    c.set_rank(rank);
                }
            }
            _ => player.hand_mut().push(card(Suit::Diamonds, rng.gen_range(1..=13))),
        }
    }
}
