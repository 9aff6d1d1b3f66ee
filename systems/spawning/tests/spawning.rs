use dungeon_core::{
    CellCoord, ChaseProfile, Command, DungeonLevel, EnemyKind, Event, GridTransform, RoomId,
    SpawnError, SpawnRatio, SpawnableByLevel,
};
use dungeon_system_spawning::{Config, Spawning};
use dungeon_world::{
    self as world, query, DungeonContent, EnemyDetails, PenaltyRules, Room, RoomLayout, World,
    WorldSettings,
};

const IMP: EnemyKind = EnemyKind::new(0);
const OGRE: EnemyKind = EnemyKind::new(1);

fn build_world() -> World {
    let grid = RoomLayout::parse(["....", ".#..", "...."])
        .expect("valid layout")
        .to_cost_grid(GridTransform::default(), &PenaltyRules::default())
        .expect("valid grid");
    let tables = vec![
        SpawnableByLevel::new(
            DungeonLevel::new(1),
            vec![SpawnRatio::new(IMP, 3), SpawnRatio::new(OGRE, 1)],
        ),
        SpawnableByLevel::new(DungeonLevel::new(2), vec![SpawnRatio::new(OGRE, 1)]),
        SpawnableByLevel::new(DungeonLevel::new(3), vec![SpawnRatio::new(IMP, 0)]),
    ];
    let profile = ChaseProfile {
        move_speed: 4.0,
        engagement_radius: 6.0,
    };
    World::new(
        DungeonContent {
            enemies: vec![
                EnemyDetails::new("imp", profile),
                EnemyDetails::new("ogre", profile),
            ],
            rooms: vec![Room::new(RoomId::new(1), grid, tables)],
        },
        WorldSettings::default(),
    )
}

fn run(world: &mut World, spawning: &mut Spawning, command: Command) -> Vec<Event> {
    let mut log = Vec::new();
    let mut events = Vec::new();
    world::apply(world, command, &mut events);

    loop {
        log.extend(events.iter().cloned());
        let mut commands = Vec::new();
        spawning.handle(
            &events,
            query::spawn_tables(world),
            &*world,
            &mut commands,
        );
        if commands.is_empty() {
            break;
        }
        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
    log
}

fn spawned_kinds(events: &[Event]) -> Vec<EnemyKind> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

fn request_spawns(world: &mut World, spawning: &mut Spawning, count: usize) -> Vec<EnemyKind> {
    let mut kinds = Vec::new();
    for index in 0..count {
        let cell = CellCoord::new(u32::try_from(index % 4).expect("small index"), 0);
        let events = run(world, spawning, Command::RequestSpawn { cell });
        kinds.extend(spawned_kinds(&events));
    }
    kinds
}

fn enter_room(world: &mut World, spawning: &mut Spawning) {
    let _ = run(
        world,
        spawning,
        Command::EnterRoom {
            room: RoomId::new(1),
        },
    );
}

#[test]
fn spawn_request_produces_an_enemy_in_the_room() {
    let mut world = build_world();
    let mut spawning = Spawning::new(Config::new(0x1234_5678));
    enter_room(&mut world, &mut spawning);

    let events = run(
        &mut world,
        &mut spawning,
        Command::RequestSpawn {
            cell: CellCoord::new(2, 2),
        },
    );

    assert_eq!(spawned_kinds(&events).len(), 1);
    assert_eq!(query::enemy_view(&world).iter().count(), 1);
}

#[test]
fn requests_outside_a_room_are_ignored() {
    let mut world = build_world();
    let mut spawning = Spawning::new(Config::new(1));

    let events = run(
        &mut world,
        &mut spawning,
        Command::RequestSpawn {
            cell: CellCoord::new(0, 0),
        },
    );

    assert!(events.is_empty());
}

#[test]
fn level_filters_the_spawnable_kinds() {
    let mut world = build_world();
    let mut spawning = Spawning::new(Config::new(77));
    enter_room(&mut world, &mut spawning);

    let first_level = request_spawns(&mut world, &mut spawning, 200);
    assert_eq!(first_level.len(), 200);
    assert!(first_level.contains(&IMP));
    assert!(first_level.contains(&OGRE));
    let imps = first_level.iter().filter(|kind| **kind == IMP).count();
    assert!((120..=180).contains(&imps), "imp count was {imps}");

    let _ = run(
        &mut world,
        &mut spawning,
        Command::SetLevel {
            level: DungeonLevel::new(2),
        },
    );
    let second_level = request_spawns(&mut world, &mut spawning, 20);
    assert_eq!(second_level, vec![OGRE; 20]);
}

#[test]
fn zero_weight_and_missing_levels_spawn_nothing() {
    let mut world = build_world();
    let mut spawning = Spawning::new(Config::new(5));
    enter_room(&mut world, &mut spawning);

    for level in [3, 9] {
        let _ = run(
            &mut world,
            &mut spawning,
            Command::SetLevel {
                level: DungeonLevel::new(level),
            },
        );
        assert!(request_spawns(&mut world, &mut spawning, 10).is_empty());
    }
}

#[test]
fn blocked_cells_reject_the_selected_enemy() {
    let mut world = build_world();
    let mut spawning = Spawning::new(Config::new(5));
    enter_room(&mut world, &mut spawning);

    let events = run(
        &mut world,
        &mut spawning,
        Command::RequestSpawn {
            cell: CellCoord::new(1, 1),
        },
    );

    assert!(events.iter().any(|event| matches!(
        event,
        Event::SpawnRejected {
            reason: SpawnError::Blocked,
            ..
        }
    )));
    assert!(spawned_kinds(&events).is_empty());
}

#[test]
fn identical_seeds_replay_identical_spawns() {
    let replay = |seed| {
        let mut world = build_world();
        let mut spawning = Spawning::new(Config::new(seed));
        enter_room(&mut world, &mut spawning);
        request_spawns(&mut world, &mut spawning, 64)
    };

    assert_eq!(replay(0xdead_beef), replay(0xdead_beef));
}
