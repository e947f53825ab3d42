//! Collision detection and response for stones
//!
//! Stone-stone contacts are resolved with a direct equal-mass impulse along
//! the contact normal. Stone-wall contacts take the stone out of play.

use glam::Vec2;

use super::state::{OutOfPlayReason, SimEvent, SimulationContext, Stone};
use crate::consts::*;

/// Below this separation the contact normal is undefined
const MIN_CONTACT_DISTANCE: f32 = 1e-6;

/// Result of a stone-stone contact check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactOutcome {
    /// Discs do not overlap
    Separated,
    /// Overlapping but already moving apart
    Receding,
    /// Impulse applied along the normal
    Resolved { impulse: f32, relative_speed: f32 },
    /// Centres coincide; resolution skipped
    DegenerateNormal,
}

/// Impulse magnitude for two equal masses: `(1 + e) * closing / 2`
///
/// `normal` points from the first stone to the second. Returns 0 when the
/// stones are not closing.
#[inline]
pub fn contact_impulse(vel_a: Vec2, vel_b: Vec2, normal: Vec2, restitution: f32) -> f32 {
    let closing = (vel_a - vel_b).dot(normal);
    if closing <= 0.0 {
        return 0.0;
    }
    (1.0 + restitution) * closing / 2.0
}

/// Detect and resolve a contact between two stones
pub fn resolve_stone_pair(a: &mut Stone, b: &mut Stone, restitution: f32) -> ContactOutcome {
    let offset = b.position - a.position;
    let distance = offset.length();
    if distance >= STONE_RADIUS * 2.0 {
        return ContactOutcome::Separated;
    }
    if distance < MIN_CONTACT_DISTANCE {
        return ContactOutcome::DegenerateNormal;
    }

    let normal = offset / distance;
    let relative_speed = (a.velocity - b.velocity).dot(normal);
    if relative_speed <= 0.0 {
        return ContactOutcome::Receding;
    }

    let impulse = contact_impulse(a.velocity, b.velocity, normal, restitution);
    a.velocity -= normal * impulse;
    b.velocity += normal * impulse;

    // Push apart so the pair does not re-trigger next tick
    let penetration = STONE_RADIUS * 2.0 - distance;
    a.position -= normal * (penetration * 0.5);
    b.position += normal * (penetration * 0.5);

    // A struck stone normalizes its curl onset against the speed it was given
    a.initial_speed = a.initial_speed.max(a.speed());
    b.initial_speed = b.initial_speed.max(b.speed());

    ContactOutcome::Resolved {
        impulse,
        relative_speed,
    }
}

/// Which boundary, if any, the stone is touching
pub fn wall_exit(position: Vec2, radius: f32) -> Option<OutOfPlayReason> {
    if position.x.abs() + radius >= SHEET_HALF_WIDTH {
        return Some(OutOfPlayReason::HitSideWall);
    }
    if position.y - radius > FAR_BACK_LINE_Y {
        return Some(OutOfPlayReason::WentPastBackLine);
    }
    None
}

/// Resolve every stone-stone contact among in-play stones (id order)
pub(crate) fn resolve_collisions(ctx: &mut SimulationContext) {
    let restitution = ctx.settings.collision.restitution;
    let count = ctx.stones.len();

    for i in 0..count {
        for j in (i + 1)..count {
            let (head, tail) = ctx.stones.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];
            if !a.is_in_play() || !b.is_in_play() {
                continue;
            }
            if !a.is_moving() && !b.is_moving() {
                continue;
            }

            match resolve_stone_pair(a, b, restitution) {
                ContactOutcome::Resolved { relative_speed, .. } => {
                    log::debug!(
                        "Collision {:?} <-> {:?} at {:.3} m/s",
                        a.id,
                        b.id,
                        relative_speed
                    );
                    let (id_a, id_b) = (a.id, b.id);
                    if ctx.active == Some(id_a) || ctx.active == Some(id_b) {
                        ctx.delivery.struck_stone = true;
                    }
                    ctx.events.push(SimEvent::CollisionOccurred {
                        a: id_a,
                        b: id_b,
                        relative_speed,
                    });
                }
                ContactOutcome::DegenerateNormal => {
                    log::warn!(
                        "Stones {:?} and {:?} share a centre; contact skipped",
                        a.id,
                        b.id
                    );
                }
                ContactOutcome::Separated | ContactOutcome::Receding => {}
            }
        }
    }
}

/// Take every in-play stone touching a boundary out of play
pub(crate) fn resolve_walls(ctx: &mut SimulationContext) {
    let exits: Vec<_> = ctx
        .in_play()
        .filter_map(|s| wall_exit(s.position, STONE_RADIUS).map(|reason| (s.id, reason)))
        .collect();
    for (id, reason) in exits {
        ctx.remove_from_play(id, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{StoneId, Team};
    use proptest::prelude::*;

    fn stone(id: u32, position: Vec2, velocity: Vec2) -> Stone {
        let mut s = Stone::new(StoneId(id), Team::Red, position);
        s.velocity = velocity;
        s
    }

    #[test]
    fn test_head_on_takeout() {
        let speed = 3.2;
        let mut shooter = stone(0, Vec2::new(0.0, 35.0), Vec2::new(0.0, speed));
        let mut target = stone(1, Vec2::new(0.0, 35.0 + STONE_RADIUS * 2.0 - 0.01), Vec2::ZERO);

        let outcome = resolve_stone_pair(&mut shooter, &mut target, 0.85);
        assert!(matches!(outcome, ContactOutcome::Resolved { .. }));
        assert!((shooter.velocity.y - 0.075 * speed).abs() < 1e-4);
        assert!((target.velocity.y - 0.925 * speed).abs() < 1e-4);
        assert!(shooter.velocity.x.abs() < 1e-6);
        assert!(target.velocity.x.abs() < 1e-6);
    }

    #[test]
    fn test_separated_and_receding() {
        let mut a = stone(0, Vec2::ZERO, Vec2::new(0.0, 1.0));
        let mut b = stone(1, Vec2::new(0.0, 1.0), Vec2::ZERO);
        assert_eq!(resolve_stone_pair(&mut a, &mut b, 0.85), ContactOutcome::Separated);

        let mut a = stone(0, Vec2::ZERO, Vec2::new(0.0, -1.0));
        let mut b = stone(1, Vec2::new(0.0, 0.2), Vec2::ZERO);
        assert_eq!(resolve_stone_pair(&mut a, &mut b, 0.85), ContactOutcome::Receding);
        assert_eq!(a.velocity, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_coincident_centres_are_skipped() {
        let mut a = stone(0, Vec2::new(0.0, 30.0), Vec2::new(0.0, 2.0));
        let mut b = stone(1, Vec2::new(0.0, 30.0), Vec2::ZERO);
        assert_eq!(
            resolve_stone_pair(&mut a, &mut b, 0.85),
            ContactOutcome::DegenerateNormal
        );
        assert_eq!(a.velocity, Vec2::new(0.0, 2.0));
        assert_eq!(b.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_struck_stone_gets_curl_reference_speed() {
        let mut a = stone(0, Vec2::ZERO, Vec2::new(0.0, 2.0));
        let mut b = stone(1, Vec2::new(0.0, 0.28), Vec2::ZERO);
        resolve_stone_pair(&mut a, &mut b, 0.85);
        assert!((b.initial_speed - b.speed()).abs() < 1e-6);
    }

    #[test]
    fn test_wall_exit() {
        assert_eq!(wall_exit(Vec2::new(0.0, 20.0), STONE_RADIUS), None);
        assert_eq!(
            wall_exit(Vec2::new(SHEET_HALF_WIDTH - 0.1, 20.0), STONE_RADIUS),
            Some(OutOfPlayReason::HitSideWall)
        );
        assert_eq!(
            wall_exit(Vec2::new(-SHEET_HALF_WIDTH, 20.0), STONE_RADIUS),
            Some(OutOfPlayReason::HitSideWall)
        );
        assert_eq!(
            wall_exit(Vec2::new(0.0, FAR_BACK_LINE_Y + STONE_RADIUS + 0.01), STONE_RADIUS),
            Some(OutOfPlayReason::WentPastBackLine)
        );
        // Biting the back line is still in play
        assert_eq!(wall_exit(Vec2::new(0.0, FAR_BACK_LINE_Y), STONE_RADIUS), None);
    }

    #[test]
    fn test_resolve_collisions_emits_event() {
        let mut ctx = SimulationContext::new(crate::Settings::default(), 3);
        let a = ctx.place_stone(Team::Red, Vec2::new(0.0, 35.0));
        let b = ctx.place_stone(Team::Yellow, Vec2::new(0.1, 35.25));
        ctx.stones[a.index()].velocity = Vec2::new(0.0, 2.0);
        ctx.drain_events();

        resolve_collisions(&mut ctx);
        let events = ctx.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            SimEvent::CollisionOccurred { a: ea, b: eb, relative_speed } if ea == a && eb == b && relative_speed > 0.0
        ));
    }

    #[test]
    fn test_out_of_play_stones_do_not_collide() {
        let mut ctx = SimulationContext::new(crate::Settings::default(), 3);
        let a = ctx.place_stone(Team::Red, Vec2::new(0.0, 35.0));
        let b = ctx.place_stone(Team::Yellow, Vec2::new(0.0, 35.2));
        ctx.stones[a.index()].velocity = Vec2::new(0.0, 2.0);
        ctx.stones[b.index()].state =
            crate::sim::state::StoneState::OutOfPlay(OutOfPlayReason::HitSideWall);
        resolve_collisions(&mut ctx);
        assert_eq!(ctx.stones[a.index()].velocity, Vec2::new(0.0, 2.0));
    }

    fn energy(a: Vec2, b: Vec2) -> f32 {
        0.5 * STONE_MASS * (a.length_squared() + b.length_squared())
    }

    proptest! {
        #[test]
        fn prop_collision_never_creates_energy(
            angle in 0.0f32..std::f32::consts::TAU,
            gap in 0.01f32..0.28,
            vax in -4.0f32..4.0, vay in -4.0f32..4.0,
            vbx in -4.0f32..4.0, vby in -4.0f32..4.0,
            restitution in 0.0f32..1.0,
        ) {
            let pa = Vec2::new(0.0, 30.0);
            let pb = pa + Vec2::from_angle(angle) * gap;
            let mut a = stone(0, pa, Vec2::new(vax, vay));
            let mut b = stone(1, pb, Vec2::new(vbx, vby));
            let before = energy(a.velocity, b.velocity);
            resolve_stone_pair(&mut a, &mut b, restitution);
            let after = energy(a.velocity, b.velocity);
            prop_assert!(after <= before * (1.0 + 1e-4) + 1e-3);
        }

        #[test]
        fn prop_impulse_along_normal_only(
            angle in 0.0f32..std::f32::consts::TAU,
            vax in -4.0f32..4.0, vay in -4.0f32..4.0,
            vbx in -4.0f32..4.0, vby in -4.0f32..4.0,
        ) {
            let restitution = 0.85;
            let normal = Vec2::from_angle(angle);
            let pa = Vec2::new(0.0, 30.0);
            let mut a = stone(0, pa, Vec2::new(vax, vay));
            let mut b = stone(1, pa + normal * 0.25, Vec2::new(vbx, vby));
            let (va, vb) = (a.velocity, b.velocity);
            let expected = contact_impulse(va, vb, normal, restitution);

            resolve_stone_pair(&mut a, &mut b, restitution);

            let tangent = normal.perp();
            prop_assert!((a.velocity.dot(tangent) - va.dot(tangent)).abs() < 1e-4);
            prop_assert!((b.velocity.dot(tangent) - vb.dot(tangent)).abs() < 1e-4);
            prop_assert!((a.velocity.dot(normal) - (va.dot(normal) - expected)).abs() < 1e-4);
            prop_assert!((b.velocity.dot(normal) - (vb.dot(normal) + expected)).abs() < 1e-4);
            // Total momentum is conserved
            prop_assert!(((a.velocity + b.velocity) - (va + vb)).length() < 1e-4);
        }
    }
}
