#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure capture-detection system for player/foe contact.

use wire_tracer_core::{Command, EntityKind, Event};
use wire_tracer_world::{query, World};

/// Foes within this many pixels of the player on both axes catch it.
pub const CATCH_MARGIN: i32 = 10;

/// Pure system that reports player captures to the world.
#[derive(Debug, Default)]
pub struct Collision;

impl Collision {
    /// Consumes events and read-only views to emit capture commands.
    ///
    /// Entities move at tick granularity, so the check runs once per tick
    /// against the continuous positions the movement engine exposes.
    pub fn handle(&self, events: &[Event], world: &World, out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TickAdvanced { .. }))
        {
            return;
        }

        let Some(player) = query::player(world) else {
            return;
        };
        if player.dead {
            return;
        }

        for foe in query::entity_view(world).iter() {
            if foe.dead || !matches!(foe.kind, EntityKind::Foe(_)) {
                continue;
            }
            let gap = player.pos.offset_to(foe.pos);
            if gap.x().abs() < CATCH_MARGIN && gap.y().abs() < CATCH_MARGIN {
                out.push(Command::CatchPlayer { foe: foe.id });
                return;
            }
        }
    }
}
