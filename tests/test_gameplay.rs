mod common;

use arcade_runtime::collision::{CollisionStrategy, HitPair};
use arcade_runtime::content::{ContentLibrary, ContentLoader, TextureHandle};
use arcade_runtime::entities::{Entity, Vec2};
use arcade_runtime::events::{EventKind, SoundCue};
use arcade_runtime::gameplay::GameplayState;
use arcade_runtime::input::{KeyCode, KeyboardSnapshot};
use arcade_runtime::registry::{EntityId, EntityRegistry};
use arcade_runtime::state::{GameState, GameTime, StatePhase};
use arcade_runtime::{GameError, Result};

use common::{at_ms, enter, enter_listening, enter_with, watch, RecordingSink};

fn space() -> KeyboardSnapshot {
    KeyboardSnapshot::from_keys([KeyCode::Char(' ')])
}

fn position(state: &GameplayState, id: EntityId) -> Vec2 {
    state.base().registry().get(id).unwrap().position
}

fn entity(state: &GameplayState, id: EntityId) -> &Entity {
    state.base().registry().get(id).unwrap()
}

/// Run frames `from..=to` (10 ms each) without input.
fn run_frames(state: &mut GameplayState, from: u64, to: u64) {
    for frame in from..=to {
        state.update(&at_ms(frame * 10)).unwrap();
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

#[test]
fn load_places_background_player_and_chopper() {
    let mut state = GameplayState::new(42);
    enter(&mut state);

    assert_eq!(state.phase(), StatePhase::Active);
    assert_eq!(state.base().registry().len(), 3);
    assert_eq!(state.enemies().len(), 1);

    let player = state.player().unwrap();
    assert_eq!(position(&state, player), Vec2::new(600.0, 610.0));
    assert_eq!(position(&state, state.enemies()[0]), Vec2::new(300.0, 100.0));

    let mut sink = RecordingSink::default();
    state.render(&mut sink);
    let kinds: Vec<&str> = sink.submitted.iter().map(|(kind, _, _)| *kind).collect();
    assert_eq!(kinds, vec!["background", "player", "chopper"]);
}

#[test]
fn missing_textures_fall_back() {
    let mut state = GameplayState::new(42);
    enter_with(&mut state, ContentLibrary::new());

    let player = entity(&state, state.player().unwrap());
    assert_eq!(
        player.texture,
        TextureHandle {
            id: 0,
            width: 1,
            height: 1
        }
    );
    assert_eq!(player.position, Vec2::new(639.5, 689.0));
}

#[test]
fn frames_before_enter_are_rejected() {
    let mut state = GameplayState::new(42);
    assert!(matches!(
        state.update(&GameTime::default()),
        Err(GameError::Phase { .. })
    ));
    assert!(state
        .handle_input(&mut KeyboardSnapshot::new(), &GameTime::default())
        .is_err());
}

// ── Player ────────────────────────────────────────────────────────────────────

#[test]
fn player_moves_and_stays_in_bounds() {
    let mut state = GameplayState::new(42);
    enter(&mut state);
    let player = state.player().unwrap();

    let mut left = KeyboardSnapshot::from_keys([KeyCode::Left]);
    state.handle_input(&mut left, &at_ms(0)).unwrap();
    assert_eq!(position(&state, player).x, 590.0);

    for frame in 1..100 {
        state.handle_input(&mut left, &at_ms(frame * 10)).unwrap();
    }
    assert_eq!(position(&state, player).x, 0.0);

    let mut right = KeyboardSnapshot::from_keys([KeyCode::Char('d')]);
    for frame in 100..300 {
        state.handle_input(&mut right, &at_ms(frame * 10)).unwrap();
    }
    assert_eq!(position(&state, player).x, 1200.0);
}

#[test]
fn shooting_spawns_bullets_and_missile() {
    let mut state = GameplayState::new(42);
    let played = enter(&mut state);
    let seen = watch(&mut state);

    state.handle_input(&mut space(), &at_ms(0)).unwrap();

    assert_eq!(state.bullets().len(), 2);
    assert_eq!(state.missiles().len(), 1);
    assert_eq!(position(&state, state.bullets()[0]), Vec2::new(600.0, 640.0));
    assert_eq!(position(&state, state.bullets()[1]), Vec2::new(650.0, 640.0));
    assert_eq!(position(&state, state.missiles()[0]), Vec2::new(633.0, 585.0));

    assert_eq!(
        *seen.borrow(),
        vec![EventKind::PlayerShootsBullets, EventKind::PlayerShootsMissile]
    );
    let played = played.borrow();
    assert_eq!(played.len(), 2);
    assert_eq!(played[0].1, SoundCue::default());
    assert_eq!(
        played[1].1,
        SoundCue {
            volume: 0.4,
            pitch: -0.2,
            pan: 0.0
        }
    );
}

#[test]
fn held_trigger_respects_cooldowns() {
    let mut state = GameplayState::new(42);
    let seen = watch_after_enter(&mut state);

    for frame in 0..50 {
        let time = at_ms(frame * 10);
        state.handle_input(&mut space(), &time).unwrap();
        state.update(&time).unwrap();
    }

    let seen = seen.borrow();
    let bullets = seen
        .iter()
        .filter(|kind| **kind == EventKind::PlayerShootsBullets)
        .count();
    let missiles = seen
        .iter()
        .filter(|kind| **kind == EventKind::PlayerShootsMissile)
        .count();
    assert_eq!(bullets, 3);
    assert_eq!(missiles, 1);
}

fn watch_after_enter(state: &mut GameplayState) -> common::Seen {
    enter(state);
    watch(state)
}

#[test]
fn escape_publishes_quit_once() {
    let mut state = GameplayState::new(42);
    let seen = watch_after_enter(&mut state);
    let mut esc = KeyboardSnapshot::from_keys([KeyCode::Esc]);

    state.handle_input(&mut esc, &at_ms(0)).unwrap();
    state.handle_input(&mut esc, &at_ms(10)).unwrap();
    assert_eq!(*seen.borrow(), vec![EventKind::GameQuit]);
}

// ── Projectiles and enemies ───────────────────────────────────────────────────

#[test]
fn projectiles_leave_the_view() {
    let mut state = GameplayState::new(42);
    enter(&mut state);
    state.handle_input(&mut space(), &at_ms(0)).unwrap();

    // bullets climb 10 per frame from y = 640
    run_frames(&mut state, 1, 69);
    assert_eq!(state.bullets().len(), 2);
    run_frames(&mut state, 70, 70);
    assert!(state.bullets().is_empty());
    assert_eq!(state.enemies().len(), 1);
}

#[test]
fn bullet_hit_damages_chopper() {
    let mut state = GameplayState::new(42);
    enter(&mut state);
    // right of the missile lane, over the right-hand bullet
    let chopper = state.spawn_chopper(Vec2::new(646.0, 560.0));
    state.handle_input(&mut space(), &at_ms(0)).unwrap();

    run_frames(&mut state, 1, 2);
    assert_eq!(entity(&state, chopper).life(), Some(40));
    run_frames(&mut state, 3, 3);
    assert_eq!(entity(&state, chopper).life(), Some(30));
    assert_eq!(state.bullets().len(), 1);
    assert!(state.explosions().is_empty());
}

#[test]
fn downed_chopper_explodes_and_is_removed_later() {
    let mut state = GameplayState::new(42);
    let seen = watch_after_enter(&mut state);
    let chopper = state.spawn_chopper(Vec2::new(590.0, 560.0));
    state.handle_input(&mut space(), &at_ms(0)).unwrap();

    // the missile starts inside the chopper's reach
    run_frames(&mut state, 1, 1);
    assert_eq!(entity(&state, chopper).life(), Some(0));
    assert!(!entity(&state, chopper).can_collide());
    assert_eq!(state.explosions().len(), 1);
    assert_eq!(
        position(&state, state.explosions()[0]),
        Vec2::new(552.0, 520.0)
    );
    assert_eq!(state.pending_actions(), 1);
    assert!(seen.borrow().contains(&EventKind::EnemyDestroyed));

    // bullets now pass through the wreck
    run_frames(&mut state, 2, 50);
    assert_eq!(state.bullets().len(), 2);
    assert!(state.base().registry().contains(chopper));

    run_frames(&mut state, 51, 51);
    assert!(!state.base().registry().contains(chopper));
    assert!(!state.enemies().contains(&chopper));
    assert_eq!(state.pending_actions(), 0);
}

#[test]
fn explosion_fades_then_expires() {
    let mut state = GameplayState::new(42);
    enter(&mut state);
    state.spawn_chopper(Vec2::new(590.0, 560.0));
    state.handle_input(&mut space(), &at_ms(0)).unwrap();
    run_frames(&mut state, 1, 1);
    let explosion = state.explosions()[0];

    let emitting = |state: &GameplayState| {
        entity(state, explosion)
            .as_explosion()
            .unwrap()
            .is_emitting()
    };

    run_frames(&mut state, 2, 76);
    assert!(emitting(&state));
    run_frames(&mut state, 77, 77);
    assert!(!emitting(&state));

    run_frames(&mut state, 78, 601);
    assert!(state.base().registry().contains(explosion));
    run_frames(&mut state, 602, 602);
    assert!(!state.base().registry().contains(explosion));
    assert!(state.explosions().is_empty());
}

#[test]
fn unload_clears_everything() {
    let mut state = GameplayState::new(42);
    enter(&mut state);
    state.spawn_chopper(Vec2::new(590.0, 560.0));
    state.handle_input(&mut space(), &at_ms(0)).unwrap();
    run_frames(&mut state, 1, 1);
    assert_eq!(state.pending_actions(), 1);

    state.unload_content();
    assert_eq!(state.phase(), StatePhase::Unloaded);
    assert!(state.base().registry().is_empty());
    assert_eq!(state.pending_actions(), 0);
    assert!(state.player().is_none());
    assert!(state
        .handle_input(&mut KeyboardSnapshot::new(), &at_ms(20))
        .is_err());
}

// ── Soundtrack ────────────────────────────────────────────────────────────────

#[test]
fn soundtrack_plays_in_order_and_stops_on_unload() {
    let mut library = ContentLibrary::shooter();
    let first = library.load_sound("FutureAmbient_1").unwrap();
    let second = library.load_sound("FutureAmbient_2").unwrap();

    let mut state = GameplayState::new(42);
    let (played, playing) = enter_listening(&mut state, ContentLibrary::shooter());
    assert!(played.borrow().is_empty());

    run_frames(&mut state, 1, 3);
    assert_eq!(state.base().current_track(), Some(first));
    assert_eq!(played.borrow().len(), 1);
    assert!(playing.borrow().contains(&first));

    playing.borrow_mut().remove(&first);
    run_frames(&mut state, 4, 4);
    assert_eq!(state.base().current_track(), Some(second));
    assert_eq!(played.borrow().len(), 2);

    state.unload_content();
    assert!(playing.borrow().is_empty());
    assert_eq!(state.base().current_track(), None);
}

// ── Strategy injection ────────────────────────────────────────────────────────

#[derive(Clone)]
struct NoHits;

impl CollisionStrategy for NoHits {
    fn scan<F>(
        &self,
        _registry: &mut EntityRegistry,
        _set_a: &[EntityId],
        _set_b: &[EntityId],
        _on_hit: F,
    ) -> Result<()>
    where
        F: FnMut(HitPair<'_>) -> Result<()>,
    {
        Ok(())
    }
}

#[test]
fn collision_strategy_is_swappable() {
    let mut state = GameplayState::with_strategy(42, NoHits);
    enter(&mut state);
    let chopper = state.spawn_chopper(Vec2::new(590.0, 560.0));
    state.handle_input(&mut space(), &at_ms(0)).unwrap();

    for frame in 1..=10 {
        state.update(&at_ms(frame * 10)).unwrap();
    }
    assert_eq!(
        state.base().registry().get(chopper).unwrap().life(),
        Some(40)
    );
    assert!(state.explosions().is_empty());
}

// ── Missile exhaust ───────────────────────────────────────────────────────────

#[test]
fn flying_missile_trails_exhaust_until_pruned() {
    let cloud = ContentLibrary::shooter().load_texture("Cloud").unwrap();
    let mut state = GameplayState::with_strategy(42, NoHits);
    enter(&mut state);
    state.handle_input(&mut space(), &at_ms(0)).unwrap();
    let missile = state.missiles()[0];

    for frame in 1..=3 {
        state.update(&at_ms(frame * 10)).unwrap();
    }
    let flying = state.base().registry().get(missile).unwrap();
    let exhaust = &flying.as_missile().unwrap().exhaust;
    assert_eq!(exhaust.texture(), cloud);
    assert_eq!(exhaust.particles().len(), 6);
    assert!(exhaust
        .particles()
        .iter()
        .all(|p| p.position.y > flying.position.y));

    // past the top edge within a couple of hundred frames
    for frame in 4..=200 {
        state.update(&at_ms(frame * 10)).unwrap();
    }
    assert!(state.missiles().is_empty());
    assert!(!state.base().registry().contains(missile));

    let mut sink = RecordingSink::default();
    state.render(&mut sink);
    assert!(sink.submitted.iter().all(|(kind, _, _)| *kind != "missile"));
}
