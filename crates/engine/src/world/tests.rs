use super::*;
use crate::hooks::{EventPriority, GameEvent, RecordingHooks, ScoreboardCall};
use crate::input::InputAction;
use crate::random::SequenceRandom;

const DT: f32 = 0.02;

struct Harness {
    world: World,
    events: RecordingHooks,
    scores: RecordingHooks,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    fn with_config(config: SimConfig) -> Self {
        Self {
            world: World::new(config, Box::new(SequenceRandom::constant(0.5))).expect("world"),
            events: RecordingHooks::default(),
            scores: RecordingHooks::default(),
        }
    }

    fn tick(&mut self, dt: f32, actions: &[InputAction]) -> TickReport {
        let input = InputSnapshot::from_actions(actions);
        let mut hooks = Hooks::new(&mut self.events, &mut self.scores);
        self.world.advance(dt, &input, &mut hooks).expect("tick")
    }

    fn ticks(&mut self, count: usize, dt: f32, actions: &[InputAction]) {
        for _ in 0..count {
            self.tick(dt, actions);
        }
    }

    fn guard(&self, id: EntityId) -> &Guard {
        self.world
            .find_entity(id)
            .and_then(Entity::as_guard)
            .expect("guard")
    }

    fn player(&self) -> &Player {
        self.world.player().map(|(_, player)| player).expect("player")
    }

    fn position(&self, id: EntityId) -> Vec2 {
        self.world.find_entity(id).expect("entity").body.position()
    }

    /// A player parked in the top-right corner, out of every guard's sight.
    fn spawn_distant_player(&mut self) -> EntityId {
        self.world.spawn_player(Vec2::new(700.0, 550.0), None)
    }

    fn spawn_guard(&mut self, kind: GuardKind, x: f32, y: f32) -> EntityId {
        self.world
            .spawn_guard(kind, "Bob", Vec2::new(x, y), PatrolConfig::default())
    }
}

#[test]
fn guards_without_a_player_are_a_precondition_failure() {
    let mut world = World::new(SimConfig::default(), Box::new(SequenceRandom::default()))
        .expect("world");
    world.spawn_guard(
        GuardKind::Human,
        "Bob",
        Vec2::new(100.0, 100.0),
        PatrolConfig::default(),
    );
    world.apply_pending();

    let mut events = RecordingHooks::default();
    let mut scores = RecordingHooks::default();
    let mut hooks = Hooks::new(&mut events, &mut scores);
    assert_eq!(
        world.advance(DT, &InputSnapshot::empty(), &mut hooks),
        Err(SimError::MissingPlayer)
    );
    assert!(matches!(
        world.advance(f32::NAN, &InputSnapshot::empty(), &mut hooks),
        Err(SimError::InvalidDelta { .. })
    ));
    assert_eq!(world.tick_count(), 0);
}

#[test]
fn spawned_entities_join_after_the_tick_that_created_them() {
    let mut harness = Harness::new();
    let player = harness.world.spawn_player(Vec2::new(100.0, 100.0), None);
    // Right in front of the player, where the thrown dagger appears.
    let guard = harness.spawn_guard(GuardKind::Human, 135.0, 100.0);
    assert_eq!(harness.world.entity_count(), 0);
    assert_eq!(harness.world.apply_pending(), 2);

    let report = harness.tick(DT, &[InputAction::Fire]);
    assert_eq!(report.promoted, 1);
    assert_eq!(report.live, 3);
    assert_eq!(harness.guard(guard).vitals().hp(), 2);
    assert_eq!(harness.player().daggers(), 9);
    assert_eq!(harness.events.count(GameEvent::ThrewDagger), 1);

    harness.tick(DT, &[]);
    assert_eq!(harness.guard(guard).vitals().hp(), 1);
    assert_eq!(harness.guard(guard).state(), GuardState::Chase);
    assert_eq!(harness.events.count(GameEvent::GuardHit(GuardKind::Human)), 1);
    assert_eq!(harness.events.count(GameEvent::PlayerSpotted), 1);
    assert!(harness.player().ever_spotted());
    let dagger = harness
        .world
        .entities()
        .iter()
        .find(|entity| entity.as_dagger().is_some())
        .expect("dagger");
    assert!(dagger.body.is_dying());
    assert_ne!(dagger.id, player);
}

#[test]
fn dead_entities_leave_the_live_set() {
    let mut harness = Harness::new();
    let dagger = harness
        .world
        .spawn_dagger(Vec2::new(790.0, 300.0), Vec2::new(1.0, 0.0));
    harness.world.apply_pending();

    let report = harness.tick(0.1, &[]);
    assert_eq!(report.removed, 1);
    assert!(harness.world.find_entity(dagger).is_none());

    let report = harness.tick(0.1, &[]);
    assert_eq!(report.updated, 0);
    assert_eq!(report.removed, 0);
}

#[test]
fn killed_guard_fades_out_then_is_removed() {
    let mut harness = Harness::new();
    harness.spawn_distant_player();
    let guard = harness.spawn_guard(GuardKind::Dog, 100.0, 300.0);
    harness
        .world
        .spawn_dagger(Vec2::new(110.0, 305.0), Vec2::new(0.0, 1.0));
    harness
        .world
        .spawn_dagger(Vec2::new(112.0, 310.0), Vec2::new(0.0, 1.0));
    harness.world.apply_pending();

    harness.tick(DT, &[]);
    assert!(harness.world.find_entity(guard).expect("guard").body.is_dying());
    assert_eq!(harness.events.count(GameEvent::GuardHit(GuardKind::Dog)), 1);
    assert_eq!(harness.events.count(GameEvent::GuardDeath(GuardKind::Dog)), 1);
    assert!(harness
        .scores
        .scoreboard
        .contains(&ScoreboardCall::AddKill("Bob the dog".to_owned())));
    assert!(harness.events.forgotten.contains(&guard));

    harness.ticks(40, DT, &[]);
    assert!(harness.world.find_entity(guard).is_some());
    harness.ticks(15, DT, &[]);
    assert!(harness.world.find_entity(guard).is_none());
}

#[test]
fn dying_guard_alerts_the_guards_around_it() {
    let mut config = SimConfig::default();
    config.guard.hp = 1;
    let mut harness = Harness::with_config(config);
    harness.spawn_distant_player();
    let struck = harness.spawn_guard(GuardKind::Human, 100.0, 300.0);
    let bystander = harness.spawn_guard(GuardKind::Human, 200.0, 300.0);
    harness
        .world
        .spawn_dagger(Vec2::new(110.0, 305.0), Vec2::new(0.0, 1.0));
    harness.world.apply_pending();

    harness.tick(DT, &[]);
    assert!(harness.world.find_entity(struck).expect("guard").body.is_dying());
    assert_eq!(harness.events.count(GameEvent::GuardDeath(GuardKind::Human)), 1);
    assert_eq!(harness.events.count(GameEvent::GuardHit(GuardKind::Human)), 0);
    assert!(!harness.player().ever_spotted());

    let bystander = harness.guard(bystander);
    assert_eq!(bystander.state(), GuardState::Alert);
    assert_eq!(bystander.alert_target(), Some(Vec2::new(116.5, 316.5)));
}

#[test]
fn living_entities_roll_back_instead_of_overlapping() {
    let mut harness = Harness::new();
    let player = harness.world.spawn_player(Vec2::new(100.0, 300.0), None);
    // Facing right, so the player approaching from the left stays unseen.
    harness.spawn_guard(GuardKind::Human, 140.0, 300.0);
    harness.world.apply_pending();

    harness.tick(0.1, &[InputAction::MoveRight]);
    assert_eq!(harness.position(player), Vec2::new(100.0, 300.0));
    let body = &harness.world.find_entity(player).expect("player").body;
    assert!((body.circle_collision_seconds() - 0.1).abs() < 1e-6);
    assert!(body.stuck_seconds() > 0.0);
}

fn visited_waypoints(looping: bool) -> Vec<usize> {
    let mut harness = Harness::new();
    harness.spawn_distant_player();
    let guard = harness.world.spawn_guard(
        GuardKind::Human,
        "Bob",
        Vec2::new(100.0, 100.0),
        PatrolConfig {
            waypoints: vec![Vec2::new(200.0, 100.0), Vec2::new(300.0, 100.0)],
            initial_facing: None,
            looping,
        },
    );
    harness.world.apply_pending();

    let mut visited = vec![harness.guard(guard).next_waypoint()];
    for _ in 0..2000 {
        harness.tick(DT, &[]);
        let next = harness.guard(guard).next_waypoint();
        if visited.last() != Some(&next) {
            visited.push(next);
        }
        if visited.len() == 7 {
            break;
        }
    }
    visited
}

#[test]
fn patrols_ping_pong_unless_looping() {
    assert_eq!(visited_waypoints(false), vec![1, 2, 1, 0, 1, 2, 1]);
    assert_eq!(visited_waypoints(true), vec![1, 2, 0, 1, 2, 0, 1]);
}

/// Guard at (100, 300) facing right; its center is (116.5, 316.5). Returns whether the
/// guard is chasing after one tick with the player's center at `offset` from it.
fn spots_player_at(kind: GuardKind, offset: Vec2) -> bool {
    let mut harness = Harness::new();
    let player_half = harness.world.config().player.size.scale(0.5);
    let guard_center = Vec2::new(116.5, 316.5);
    harness
        .world
        .spawn_player(guard_center + offset - player_half, None);
    let guard = harness.spawn_guard(kind, 100.0, 300.0);
    harness.world.apply_pending();
    harness.tick(DT, &[]);
    harness.guard(guard).state() == GuardState::Chase
}

#[test]
fn vision_stops_at_view_distance() {
    // Radii 14.5 + 13.5, so a 150 px gap is 178 px between centers.
    assert!(spots_player_at(GuardKind::Human, Vec2::new(177.9, 0.0)));
    assert!(!spots_player_at(GuardKind::Human, Vec2::new(178.1, 0.0)));
}

#[test]
fn vision_is_limited_to_the_facing_cone() {
    let sixty_degrees = Vec2::new(50.0, 86.6);
    assert!(!spots_player_at(GuardKind::Human, sixty_degrees));
    assert!(spots_player_at(GuardKind::Human, Vec2::new(100.0, 90.0)));
    assert!(!spots_player_at(GuardKind::Human, Vec2::new(-100.0, 0.0)));
}

#[test]
fn dogs_notice_players_slightly_behind_them_up_close() {
    let behind = Vec2::new(-20.0, 45.0);
    assert!(!spots_player_at(GuardKind::Human, behind));
    assert!(spots_player_at(GuardKind::Dog, behind));
}

#[test]
fn houses_block_line_of_sight() {
    let mut harness = Harness::new();
    harness.world.spawn_player(Vec2::new(228.0, 300.0), None);
    let guard = harness.spawn_guard(GuardKind::Human, 100.0, 300.0);
    harness
        .world
        .spawn_house(Vec2::new(133.0, 270.0), HouseSize::Small, None, 1.0);
    harness.world.apply_pending();

    harness.tick(DT, &[]);
    assert_eq!(harness.guard(guard).state(), GuardState::Patrol);
    assert!(!harness.player().ever_spotted());
}

#[test]
fn looting_a_house_for_its_full_duration_wins_the_level() {
    let mut harness = Harness::new();
    harness.world.spawn_player(Vec2::new(340.0, 240.0), None);
    let house = harness
        .world
        .spawn_house(Vec2::new(300.0, 300.0), HouseSize::Medium, Some(100), 1.0);
    harness.world.apply_pending();
    let chest = harness
        .world
        .find_entity(house)
        .and_then(Entity::as_house)
        .and_then(House::chest)
        .expect("chest");

    // First tick starts the attempt, the next eight spend the 2 s.
    harness.ticks(8, 0.25, &[InputAction::Loot]);
    assert_eq!(harness.world.outcome(), LevelOutcome::InProgress);
    assert_eq!(harness.scores.total_loot(), 0);

    let report = harness.tick(0.25, &[InputAction::Loot]);
    assert_eq!(report.outcome, LevelOutcome::Won);
    assert_eq!(harness.scores.total_loot(), 100);
    assert!(!harness.world.has_unlooted_house());
    assert_eq!(harness.events.count(GameEvent::WonLevel), 1);
    assert!(harness.scores.scoreboard.contains(&ScoreboardCall::SetWonLevel));
    assert_eq!(harness.player().loot_target(), None);
    assert!(harness.world.find_entity(chest).expect("chest").body.is_dying());

    harness.ticks(4, 0.25, &[]);
    assert!(harness.world.find_entity(chest).is_none());
}

#[test]
fn looting_at_fifty_hertz_takes_one_tick_past_two_seconds() {
    let mut harness = Harness::new();
    harness.world.spawn_player(Vec2::new(340.0, 240.0), None);
    harness
        .world
        .spawn_house(Vec2::new(300.0, 300.0), HouseSize::Medium, Some(100), 1.0);
    harness.world.apply_pending();

    // One tick to start; 100 steps of 0.02 s still leave a sliver on the f32 timer.
    harness.ticks(101, DT, &[InputAction::Loot]);
    assert_eq!(harness.world.outcome(), LevelOutcome::InProgress);
    assert_eq!(harness.scores.total_loot(), 0);

    let report = harness.tick(DT, &[InputAction::Loot]);
    assert_eq!(report.outcome, LevelOutcome::Won);
    assert_eq!(harness.scores.total_loot(), 100);
}

#[test]
fn walking_away_mid_loot_keeps_half_the_progress() {
    let mut harness = Harness::new();
    let player = harness.world.spawn_player(Vec2::new(340.0, 240.0), None);
    let house = harness
        .world
        .spawn_house(Vec2::new(300.0, 300.0), HouseSize::Medium, None, 1.0);
    harness.world.apply_pending();

    harness.ticks(5, 0.25, &[InputAction::Loot]);
    harness.tick(0.25, &[]);
    assert!(harness.scores.scoreboard.contains(&ScoreboardCall::StopLooting));
    let timer = harness
        .world
        .find_entity(house)
        .and_then(Entity::as_house)
        .and_then(House::loot_timer);
    assert_eq!(timer, Some(1.5));
    assert_eq!(harness.position(player), Vec2::new(340.0, 240.0));
}

#[test]
fn daggers_fly_straight_at_constant_speed() {
    let mut harness = Harness::new();
    let dagger = harness
        .world
        .spawn_dagger(Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0));
    harness.world.apply_pending();
    harness.ticks(4, 0.25, &[]);
    assert_eq!(harness.position(dagger), Vec2::new(400.0, 100.0));
    assert!(!harness.world.find_entity(dagger).expect("dagger").body.is_dying());
}

fn alerted_at_distance(distance: f32) -> Option<Vec2> {
    let mut harness = Harness::new();
    harness.spawn_distant_player();
    let struck = harness.spawn_guard(GuardKind::Human, 100.0, 300.0);
    let bystander = harness.spawn_guard(GuardKind::Human, 100.0 + distance, 300.0);
    harness
        .world
        .spawn_dagger(Vec2::new(110.0, 305.0), Vec2::new(0.0, 1.0));
    harness.world.apply_pending();

    harness.tick(DT, &[]);
    assert_eq!(harness.guard(struck).vitals().hp(), 1);
    let bystander = harness.guard(bystander);
    match bystander.state() {
        GuardState::Alert => bystander.alert_target(),
        _ => None,
    }
}

#[test]
fn struck_guard_alerts_guards_within_range() {
    assert_eq!(alerted_at_distance(119.0), Some(Vec2::new(116.5, 316.5)));
    assert_eq!(alerted_at_distance(121.0), None);
}

#[test]
fn dagger_hitting_a_house_alerts_nearby_guards() {
    let mut harness = Harness::new();
    harness.spawn_distant_player();
    harness
        .world
        .spawn_house(Vec2::new(300.0, 300.0), HouseSize::Medium, None, 1.0);
    let guard = harness.spawn_guard(GuardKind::Human, 250.0, 230.0);
    let dagger = harness
        .world
        .spawn_dagger(Vec2::new(280.0, 340.0), Vec2::new(1.0, 0.0));
    harness.world.apply_pending();

    harness.tick(DT, &[]);
    assert_eq!(harness.events.count(GameEvent::DaggerHitHouse), 1);
    assert_eq!(GameEvent::DaggerHitHouse.priority(), EventPriority::VeryLow);
    assert!(harness.world.find_entity(dagger).expect("dagger").body.is_dying());
    assert_eq!(harness.guard(guard).state(), GuardState::Alert);
    let target = harness.guard(guard).alert_target().expect("alert target");
    assert!((target.x - 294.0).abs() < 1e-3);
    assert!((target.y - 348.0).abs() < 1e-3);
}

#[test]
fn alerted_guard_pauses_then_resumes_patrol() {
    let mut harness = Harness::new();
    harness.spawn_distant_player();
    let guard = harness.spawn_guard(GuardKind::Human, 100.0, 300.0);
    harness.world.apply_pending();
    let center = harness.world.find_entity(guard).expect("guard").body.center();
    let alerted = harness
        .world
        .find_entity_mut(guard)
        .and_then(Entity::as_guard_mut)
        .map(|(_, guard)| guard.alert_to(center + Vec2::new(10.0, 0.0)));
    assert_eq!(alerted, Some(true));

    harness.ticks(10, 0.25, &[]);
    assert_eq!(harness.guard(guard).state(), GuardState::Alert);
    harness.tick(0.25, &[]);
    assert_eq!(harness.guard(guard).state(), GuardState::Patrol);
    assert_eq!(harness.guard(guard).alert_target(), None);
}

#[test]
fn chasing_guard_attacks_once_per_cooldown() {
    let mut harness = Harness::new();
    harness.world.spawn_player(Vec2::new(150.0, 300.0), None);
    let guard = harness.spawn_guard(GuardKind::Human, 100.0, 300.0);
    harness.world.apply_pending();

    harness.ticks(20, DT, &[]);
    assert_eq!(harness.guard(guard).state(), GuardState::Chase);
    assert_eq!(harness.events.count(GameEvent::GuardSawPlayer(GuardKind::Human)), 1);
    assert_eq!(harness.events.count(GameEvent::GuardHitPlayer(GuardKind::Human)), 1);
    assert_eq!(harness.player().vitals().hp(), 2);
    assert!(harness
        .scores
        .scoreboard
        .contains(&ScoreboardCall::UpdateHealth { hp: 2, max_hp: 3 }));
    assert!(harness.guard(guard).attack_cooldown().is_some());
}

#[test]
fn player_death_stops_the_guards() {
    let mut config = SimConfig::default();
    config.player.hp = 1;
    let mut harness = Harness::with_config(config);
    let player = harness.world.spawn_player(Vec2::new(150.0, 300.0), None);
    let guard = harness.spawn_guard(GuardKind::Human, 100.0, 300.0);
    harness.world.apply_pending();

    harness.ticks(12, DT, &[]);
    assert_eq!(harness.world.outcome(), LevelOutcome::PlayerDied);
    assert_eq!(harness.events.count(GameEvent::PlayerDeath), 1);
    assert!(harness.scores.scoreboard.contains(&ScoreboardCall::ReportDeath));

    harness.tick(DT, &[]);
    let guard_body = &harness.world.find_entity(guard).expect("guard").body;
    assert_eq!(guard_body.velocity, Vec2::ZERO);

    harness.ticks(60, DT, &[]);
    assert!(harness.world.find_entity(player).is_none());
    // Guards idle once the player is gone.
    harness.tick(DT, &[]);
}

#[test]
fn unaware_guards_can_be_pickpocketed_once() {
    let mut harness = Harness::new();
    harness.world.spawn_player(Vec2::new(164.0, 300.0), None);
    let guard = harness.spawn_guard(GuardKind::Human, 200.0, 300.0);
    harness.world.apply_pending();

    harness.tick(DT, &[InputAction::Loot]);
    assert_eq!(harness.guard(guard).pocket_loot(), 0);
    assert_eq!(harness.events.count(GameEvent::PickpocketedGuard), 1);
    assert!(harness.scores.scoreboard.contains(&ScoreboardCall::AddLoot {
        amount: 10,
        pickpocketed: Some("Bob the Guard".to_owned()),
    }));

    harness.tick(DT, &[InputAction::Loot]);
    assert_eq!(harness.events.count(GameEvent::PickpocketedGuard), 1);
}

#[test]
fn holding_fire_throws_a_single_dagger() {
    let mut harness = Harness::new();
    harness.world.spawn_player(Vec2::new(100.0, 300.0), Some(2));
    harness.world.apply_pending();

    harness.ticks(3, DT, &[InputAction::Fire]);
    assert_eq!(harness.events.count(GameEvent::ThrewDagger), 1);
    harness.tick(DT, &[]);
    harness.tick(DT, &[InputAction::Fire]);
    assert_eq!(harness.events.count(GameEvent::ThrewDagger), 2);
    harness.tick(DT, &[]);
    harness.tick(DT, &[InputAction::Fire]);
    assert_eq!(harness.events.count(GameEvent::ThrewDagger), 2);
    assert_eq!(harness.player().daggers(), 0);
    assert!(harness
        .scores
        .scoreboard
        .contains(&ScoreboardCall::DaggersChanged(0)));
}

#[test]
fn player_stays_inside_the_play_field() {
    let mut harness = Harness::new();
    let player = harness.world.spawn_player(Vec2::new(2.0, 52.0), None);
    harness.world.apply_pending();
    harness.ticks(10, DT, &[InputAction::MoveLeft, InputAction::MoveDown]);
    let rect = harness.world.find_entity(player).expect("player").body.rect();
    assert_eq!(rect.left, 0.0);
    assert_eq!(rect.bottom, 50.0);
    assert_eq!(harness.player().facing(), Vec2::new(-1.0, -1.0));
}

#[derive(Default)]
struct CollectingCanvas {
    drawn: Vec<RenderState>,
}

impl Canvas for CollectingCanvas {
    fn draw(&mut self, state: &RenderState) {
        self.drawn.push(state.clone());
    }
}

#[test]
fn draw_all_hands_every_live_entity_to_the_canvas() {
    let mut harness = Harness::new();
    harness.spawn_distant_player();
    harness.spawn_guard(GuardKind::Dog, 100.0, 300.0);
    harness
        .world
        .spawn_house(Vec2::new(300.0, 300.0), HouseSize::Medium, None, 1.0);
    harness.world.apply_pending();

    let mut canvas = CollectingCanvas::default();
    harness.world.draw_all(&mut canvas);
    let keys: Vec<&str> = canvas
        .drawn
        .iter()
        .map(|state| state.sprite.as_str())
        .collect();
    assert_eq!(keys, vec!["thief", "guards/dog", "houses/house3-2", "chest"]);
    assert!(canvas.drawn[1].vision.is_some());
    assert!(canvas.drawn[0].vision.is_none());
    assert!(canvas.drawn.iter().all(|state| state.opacity == 1.0));
}

#[test]
fn clear_all_resets_live_and_staged_sets() {
    let mut harness = Harness::new();
    harness.spawn_distant_player();
    harness.world.apply_pending();
    harness.spawn_guard(GuardKind::Human, 100.0, 300.0);
    assert_eq!(harness.world.entity_count(), 1);
    assert_eq!(harness.world.pending_count(), 1);

    harness.world.clear_all();
    assert_eq!(harness.world.entity_count(), 0);
    assert_eq!(harness.world.pending_count(), 0);
    assert_eq!(harness.world.player_id(), None);
    assert_eq!(harness.world.outcome(), LevelOutcome::InProgress);
}
