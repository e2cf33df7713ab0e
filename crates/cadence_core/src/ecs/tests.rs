use super::*;
use crate::define_component;
use crate::math::DeterministicRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(16);

#[derive(Debug, PartialEq)]
struct Health(i32);
define_component!(Health, 500, "Health");

#[derive(Debug)]
struct PlayerTag;
define_component!(PlayerTag, 501, "PlayerTag");

type Log = Rc<RefCell<Vec<String>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn lines(log: &Log, needle: &str) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|line| line.contains(needle))
        .cloned()
        .collect()
}

fn ids(entities: impl IntoIterator<Item = Entity>) -> Vec<u64> {
    entities.into_iter().map(|e| e.id()).collect()
}

/// Logs every hook and update. `K` only exists to give each instance its
/// own type, since the world keys systems by type.
struct Recorder<const K: usize> {
    descriptor: SystemDescriptor,
    log: Log,
}

impl<const K: usize> Recorder<K> {
    fn new(descriptor: SystemDescriptor, log: &Log) -> Self {
        Self {
            descriptor,
            log: Rc::clone(log),
        }
    }

    fn push(&self, line: String) {
        self.log.borrow_mut().push(line);
    }

    fn name(&self) -> &str {
        self.descriptor.name()
    }
}

impl<const K: usize> System for Recorder<K> {
    type State = ();

    fn descriptor(&self) -> SystemDescriptor {
        self.descriptor.clone()
    }

    fn on_add(&self, aspect: &mut AspectMut<'_, ()>) {
        self.push(format!("{} add {}", self.name(), aspect.entity()));
    }

    fn on_remove(&self, aspect: &mut AspectMut<'_, ()>) {
        self.push(format!("{} remove {}", self.name(), aspect.entity()));
    }

    fn on_enabled(&self, aspects: &mut AspectCache<()>) {
        self.push(format!("{} enabled {}", self.name(), aspects.len()));
    }

    fn on_disabled(&self, aspects: &mut AspectCache<()>) {
        self.push(format!("{} disabled {}", self.name(), aspects.len()));
    }

    fn on_clear(&self) {
        self.push(format!("{} clear", self.name()));
    }

    fn update(&self, _world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
        self.push(format!("{} update {:?}", self.name(), ids(frame.entities().iter().copied())));
        if let Some(dirty) = frame.dirty() {
            self.push(format!("{} dirty {:?}", self.name(), ids(dirty.iter())));
        }
        Ok(())
    }
}

/// Drops health to zero once and reports the change.
struct Executioner;

impl System for Executioner {
    type State = ();

    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("executioner").require::<Health>()
    }

    fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
        for &entity in frame.entities() {
            let Some(mut aspect) = world.aspect_mut::<Self>(entity) else {
                continue;
            };
            let health = aspect.get_mut::<Health>()?;
            if health.0 > 0 {
                health.0 = 0;
                aspect.dirty::<Health>()?;
            }
        }
        Ok(())
    }
}

#[test]
fn membership_requires_every_component() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("x")
                .require::<Health>()
                .require::<PlayerTag>(),
            &log,
        ))
        .unwrap();

    let e = world.create_entity();
    world.attach(e, Health(10)).unwrap();
    assert!(!world.is_member::<Recorder<0>>(e));
    assert!(log.borrow().is_empty());

    world.attach(e, PlayerTag).unwrap();
    assert!(world.is_member::<Recorder<0>>(e));

    world.detach::<Health>(e).unwrap();
    assert!(!world.is_member::<Recorder<0>>(e));
    world.attach(e, Health(3)).unwrap();
    assert!(world.is_member::<Recorder<0>>(e));

    assert_eq!(*log.borrow(), vec!["x add e1", "x remove e1", "x add e1"]);
}

#[test]
fn membership_stays_consistent_under_random_mutation() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("both")
                .require::<Health>()
                .require::<PlayerTag>(),
            &log,
        ))
        .unwrap();
    world
        .register_system(Recorder::<1>::new(
            SystemDescriptor::new("health").require::<Health>(),
            &log,
        ))
        .unwrap();

    let mut rng = DeterministicRng::new(7);
    for _ in 0..400 {
        let live: Vec<Entity> = world.entities().collect();
        let pick = (!live.is_empty()).then(|| live[(rng.next_u64() % live.len() as u64) as usize]);
        match (rng.next_u64() % 6, pick) {
            (0, _) | (_, None) => {
                world.create_entity();
            }
            (1, Some(e)) => world.destroy_entity(e).unwrap(),
            (2, Some(e)) => {
                if !world.has::<Health>(e) {
                    world.attach(e, Health(1)).unwrap();
                }
            }
            (3, Some(e)) => {
                if !world.has::<PlayerTag>(e) {
                    world.attach(e, PlayerTag).unwrap();
                }
            }
            (4, Some(e)) => {
                world.detach_if_exists::<Health>(e);
            }
            (_, Some(e)) => {
                world.detach_if_exists::<PlayerTag>(e);
            }
        }

        for e in world.entities() {
            let has_health = world.has::<Health>(e);
            let has_tag = world.has::<PlayerTag>(e);
            assert_eq!(world.is_member::<Recorder<0>>(e), has_health && has_tag);
            assert_eq!(world.is_member::<Recorder<1>>(e), has_health);
        }
    }

    for name in ["both", "health"] {
        let adds = lines(&log, &format!("{name} add")).len();
        let removes = lines(&log, &format!("{name} remove")).len();
        let members = match name {
            "both" => world.aspect_entities::<Recorder<0>>().unwrap().len(),
            _ => world.aspect_entities::<Recorder<1>>().unwrap().len(),
        };
        assert_eq!(adds - removes, members, "{name}");
    }
}

#[test]
fn empty_requirement_matches_every_entity() {
    let log = new_log();
    let mut world = World::new();
    let a = world.create_entity();
    let b = world.create_entity();
    world
        .register_system(Recorder::<0>::new(SystemDescriptor::new("all"), &log))
        .unwrap();
    let c = world.create_entity();

    assert_eq!(world.aspect_entities::<Recorder<0>>().unwrap(), vec![a, b, c]);
    assert_eq!(*log.borrow(), vec!["all add e1", "all add e2", "all add e3"]);
}

#[test]
fn attach_rejects_duplicates_and_detach_reports_missing() {
    let mut world = World::new();
    let e = world.create_entity();
    world.attach(e, Health(1)).unwrap();

    assert!(matches!(
        world.attach(e, Health(2)),
        Err(EcsError::DuplicateComponent { component: "Health", .. })
    ));
    assert_eq!(world.get::<Health>(e).unwrap(), &Health(1));
    assert_eq!(world.component_count::<Health>(), 1);

    assert!(matches!(
        world.detach::<PlayerTag>(e),
        Err(EcsError::MissingComponent { component: "PlayerTag", .. })
    ));
    assert_eq!(world.detach::<Health>(e).unwrap(), Health(1));
    assert!(world.try_get::<Health>(e).is_none());
    assert_eq!(world.component_count::<Health>(), 0);
}

#[test]
fn detach_if_exists_is_idempotent() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("r").require::<Health>(),
            &log,
        ))
        .unwrap();
    let e = world.create_entity();
    world.attach(e, Health(1)).unwrap();

    assert!(world.detach_if_exists::<Health>(e));
    assert!(!world.detach_if_exists::<Health>(e));
    assert!(!world.has::<Health>(e));
    assert_eq!(lines(&log, "remove"), vec!["r remove e1"]);

    world.destroy_entity(e).unwrap();
    assert!(!world.detach_if_exists::<Health>(e));
}

#[test]
fn destroy_runs_on_remove_in_registration_order() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("a").require::<Health>(),
            &log,
        ))
        .unwrap();
    world
        .register_system(Recorder::<1>::new(
            SystemDescriptor::new("b").require::<Health>(),
            &log,
        ))
        .unwrap();
    let e = world.create_entity();
    world.attach(e, Health(1)).unwrap();
    log.borrow_mut().clear();

    world.destroy_entity(e).unwrap();
    assert_eq!(*log.borrow(), vec!["a remove e1", "b remove e1"]);

    assert!(!world.contains(e));
    assert!(matches!(world.query(e), Err(EcsError::StaleEntity { .. })));
    assert!(matches!(world.destroy_entity(e), Err(EcsError::StaleEntity { .. })));
    assert!(matches!(world.attach(e, PlayerTag), Err(EcsError::StaleEntity { .. })));
    assert!(world.try_get::<Health>(e).is_none());
}

#[test]
fn on_remove_reads_final_values() {
    struct LastWords {
        seen: Rc<Cell<i32>>,
    }

    impl System for LastWords {
        type State = ();

        fn descriptor(&self) -> SystemDescriptor {
            SystemDescriptor::new("last_words").require::<Health>()
        }

        fn on_remove(&self, aspect: &mut AspectMut<'_, ()>) {
            self.seen.set(aspect.get::<Health>().map_or(-1, |h| h.0));
        }

        fn update(&self, _world: &mut World, _frame: &Frame<'_>) -> EcsResult<()> {
            Ok(())
        }
    }

    let seen = Rc::new(Cell::new(0));
    let mut world = World::new();
    world
        .register_system(LastWords { seen: Rc::clone(&seen) })
        .unwrap();
    let e = world.create_entity();
    world.attach(e, Health(10)).unwrap();
    world.modify(e, |h: &mut Health| h.0 = 7).unwrap();

    world.destroy_entity(e).unwrap();
    assert_eq!(seen.get(), 7);
}

#[test]
fn aspect_state_is_built_on_add_and_access_is_limited_to_declared_types() {
    struct Snapshot;

    impl System for Snapshot {
        type State = i32;

        fn descriptor(&self) -> SystemDescriptor {
            SystemDescriptor::new("snapshot").require::<Health>()
        }

        fn make_aspect(&self, entity: Entity) -> i32 {
            entity.id() as i32 * 100
        }

        fn on_add(&self, aspect: &mut AspectMut<'_, i32>) {
            let hp = aspect.get::<Health>().map_or(0, |h| h.0);
            *aspect.state_mut() += hp;
        }

        fn update(&self, _world: &mut World, _frame: &Frame<'_>) -> EcsResult<()> {
            Ok(())
        }
    }

    let mut world = World::new();
    world.register_system(Snapshot).unwrap();
    let e = world.create_entity();
    world.attach(e, PlayerTag).unwrap();
    world.attach(e, Health(5)).unwrap();

    let aspect = world.aspect::<Snapshot>(e).unwrap();
    assert_eq!(*aspect.state(), 105);
    assert!(aspect.has::<Health>());
    assert!(!aspect.has::<PlayerTag>());
    assert!(matches!(
        aspect.get::<PlayerTag>(),
        Err(EcsError::MissingComponent { .. })
    ));

    let mut aspect = world.aspect_mut::<Snapshot>(e).unwrap();
    aspect.get_mut::<Health>().unwrap().0 = 9;
    assert!(aspect.dirty::<PlayerTag>().is_err());
    assert_eq!(world.get::<Health>(e).unwrap().0, 9);
}

#[test]
fn dirty_marks_reach_later_systems_in_the_same_frame_only() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("early").watch::<Health>(),
            &log,
        ))
        .unwrap();
    world.register_system(Executioner).unwrap();
    world
        .register_system(Recorder::<1>::new(
            SystemDescriptor::new("late").watch::<Health>(),
            &log,
        ))
        .unwrap();

    let e = world.create_entity();
    world.attach(e, Health(3)).unwrap();

    // Health drops to zero in the executioner: only "late" hears about it.
    let report = world.run_frame(TICK).unwrap();
    assert_eq!(report.dirty_records, 1);
    assert_eq!(lines(&log, "dirty"), vec!["early dirty []", "late dirty [1]"]);

    // No further change, no further report.
    log.borrow_mut().clear();
    world.run_frame(TICK).unwrap();
    assert_eq!(lines(&log, "dirty"), vec!["early dirty []", "late dirty []"]);

    // A change made between frames is visible to everyone in the next one.
    log.borrow_mut().clear();
    world.modify(e, |h: &mut Health| h.0 = 2).unwrap();
    world.run_frame(TICK).unwrap();
    assert_eq!(lines(&log, "dirty"), vec!["early dirty [1]", "late dirty [1]"]);
}

#[test]
fn dirty_sets_only_cover_members_and_watched_types() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("tagged")
                .watch::<Health>()
                .require::<PlayerTag>(),
            &log,
        ))
        .unwrap();
    world
        .register_system(Recorder::<1>::new(
            SystemDescriptor::new("quiet").require::<Health>(),
            &log,
        ))
        .unwrap();

    let player = world.create_entity();
    world.attach(player, Health(1)).unwrap();
    world.attach(player, PlayerTag).unwrap();
    let npc = world.create_entity();
    world.attach(npc, Health(1)).unwrap();

    world.mark_dirty::<Health>(player).unwrap();
    world.mark_dirty::<Health>(npc).unwrap();
    assert!(world.mark_dirty::<PlayerTag>(npc).is_err());
    world.run_frame(TICK).unwrap();

    assert_eq!(lines(&log, "dirty"), vec!["tagged dirty [1]"]);
}

#[test]
fn systems_can_destroy_and_spawn_during_update() {
    struct Reaper {
        log: Log,
        spawned: Cell<bool>,
    }

    impl System for Reaper {
        type State = ();

        fn descriptor(&self) -> SystemDescriptor {
            SystemDescriptor::new("reaper").require::<Health>()
        }

        fn on_add(&self, aspect: &mut AspectMut<'_, ()>) {
            self.log
                .borrow_mut()
                .push(format!("add {}", aspect.entity()));
        }

        fn on_remove(&self, aspect: &mut AspectMut<'_, ()>) {
            let hp = aspect.get::<Health>().map_or(-1, |h| h.0);
            self.log
                .borrow_mut()
                .push(format!("remove {} hp={hp}", aspect.entity()));
        }

        fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
            self.log
                .borrow_mut()
                .push(format!("update {:?}", ids(frame.entities().iter().copied())));
            for &entity in frame.entities() {
                let dead = match world.aspect::<Self>(entity) {
                    Some(aspect) => aspect.get::<Health>()?.0 <= 0,
                    None => continue,
                };
                if dead {
                    world.destroy_entity(entity)?;
                }
            }
            if !self.spawned.replace(true) {
                let fresh = world.create_entity();
                world.attach(fresh, Health(5))?;
            }
            Ok(())
        }
    }

    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Reaper {
            log: Rc::clone(&log),
            spawned: Cell::new(false),
        })
        .unwrap();
    let doomed = world.create_entity();
    world.attach(doomed, Health(0)).unwrap();
    let survivor = world.create_entity();
    world.attach(survivor, Health(4)).unwrap();

    world.run_frame(TICK).unwrap();
    world.run_frame(TICK).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "add e1",
            "add e2",
            "update [1, 2]",
            "remove e1 hp=0",
            "add e3",
            "update [2, 3]",
        ]
    );
    assert!(!world.contains(doomed));
    assert!(world.aspect::<Reaper>(doomed).is_none());
    assert!(world.is_member::<Reaper>(survivor));
}

#[test]
fn disabled_systems_keep_tracking_but_skip_updates() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("r").require::<Health>(),
            &log,
        ))
        .unwrap();
    let a = world.create_entity();
    world.attach(a, Health(1)).unwrap();

    world.disable_system::<Recorder<0>>().unwrap();
    world.disable_system::<Recorder<0>>().unwrap();
    assert!(!world.is_enabled::<Recorder<0>>().unwrap());

    let b = world.create_entity();
    world.attach(b, Health(1)).unwrap();
    let report = world.run_frame(TICK).unwrap();
    assert_eq!(report.systems_run, 0);

    world.enable_system::<Recorder<0>>().unwrap();
    world.run_frame(TICK).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "r add e1",
            "r disabled 1",
            "r add e2",
            "r enabled 2",
            "r update [1, 2]",
        ]
    );

    assert!(!world.toggle_system_by_name("r").unwrap());
    assert!(world.toggle_system_by_name("r").unwrap());
}

#[test]
fn unknown_systems_are_reported() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(SystemDescriptor::new("known"), &log))
        .unwrap();

    assert_eq!(world.system::<Recorder<0>>().unwrap().name(), "known");
    assert!(matches!(
        world.system::<Recorder<1>>(),
        Err(EcsError::UnknownSystem { .. })
    ));
    assert!(world.enable_system::<Recorder<1>>().is_err());
    assert!(world.aspect_entities::<Recorder<1>>().is_err());
    match world.toggle_system_by_name("missing") {
        Err(EcsError::UnknownSystem { name }) => assert_eq!(name, "missing"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn registration_rejects_conflicts() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(SystemDescriptor::new("dup"), &log))
        .unwrap();

    assert!(matches!(
        world.register_system(Recorder::<0>::new(SystemDescriptor::new("other"), &log)),
        Err(EcsError::Registration(SystemRegistrationError::DuplicateType { .. }))
    ));
    assert!(matches!(
        world.register_system(Recorder::<1>::new(SystemDescriptor::new("dup"), &log)),
        Err(EcsError::Registration(SystemRegistrationError::DuplicateName { .. }))
    ));
    assert!(matches!(
        world.register_system(Recorder::<2>::new(
            SystemDescriptor::new("loose").watches([Health::ID]),
            &log,
        )),
        Err(EcsError::Registration(SystemRegistrationError::DirtyNotRequired {
            component: 500,
            ..
        }))
    ));
    assert_eq!(world.system_names(), vec!["dup"]);
}

#[test]
fn failing_update_stops_the_frame() {
    struct Strict;

    impl System for Strict {
        type State = ();

        fn descriptor(&self) -> SystemDescriptor {
            SystemDescriptor::new("strict").require::<Health>()
        }

        fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
            for &entity in frame.entities() {
                world.get::<PlayerTag>(entity)?;
            }
            Ok(())
        }
    }

    let log = new_log();
    let mut world = World::new();
    world.register_system(Strict).unwrap();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("after").require::<Health>(),
            &log,
        ))
        .unwrap();
    let e = world.create_entity();
    world.attach(e, Health(1)).unwrap();

    let err = world.run_frame(TICK).unwrap_err();
    assert!(matches!(
        err,
        EcsError::MissingComponent { component: "PlayerTag", .. }
    ));
    assert!(lines(&log, "update").is_empty());

    world.attach(e, PlayerTag).unwrap();
    assert_eq!(world.run_frame(TICK).unwrap().systems_run, 2);
}

#[test]
fn clear_destroys_everything_then_notifies_systems() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(SystemDescriptor::new("all"), &log))
        .unwrap();
    world
        .register_system(Recorder::<1>::new(
            SystemDescriptor::new("health").require::<Health>(),
            &log,
        ))
        .unwrap();
    let a = world.create_entity();
    world.attach(a, Health(1)).unwrap();
    world.create_entity();
    log.borrow_mut().clear();

    world.clear();

    assert_eq!(
        *log.borrow(),
        vec![
            "all remove e1",
            "health remove e1",
            "all remove e2",
            "all clear",
            "health clear",
        ]
    );
    assert_eq!(world.entity_count(), 0);
    assert_eq!(world.system_count(), 2);
    assert_eq!(world.create_entity().id(), 3);
}

#[test]
fn slow_motion_skips_logic_time_but_still_runs_systems() {
    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(SystemDescriptor::new("r"), &log))
        .unwrap();
    world
        .slow_motion_mut()
        .request(2, Duration::from_millis(100));

    let first = world.run_frame(Duration::from_millis(10)).unwrap();
    let second = world.run_frame(Duration::from_millis(10)).unwrap();

    assert_eq!(first.granted, Duration::ZERO);
    assert_eq!(first.systems_run, 1);
    assert_eq!(second.granted, Duration::from_millis(10));
    assert_eq!(world.gametime(), Duration::from_millis(10));
    assert_eq!(world.clock().skipped_frames(), 1);
    #[cfg(feature = "metrics")]
    assert_eq!(world.counters().get("frames.skipped"), 1);
}

#[test]
fn spawn_macro_attaches_all_or_nothing() {
    let mut world = World::new();
    let e = crate::spawn!(world, Health(3), PlayerTag).unwrap();
    assert!(world.has::<Health>(e) && world.has::<PlayerTag>(e));

    let failed = crate::spawn!(world, Health(1), Health(2));
    assert!(matches!(failed, Err(EcsError::DuplicateComponent { .. })));
    assert_eq!(world.entity_count(), 1);
    #[cfg(feature = "metrics")]
    assert_eq!(world.counters().get("entities.destroyed"), 1);
}

#[test]
fn failed_frame_does_not_replay_dirty_marks() {
    struct Flaky {
        failed: Cell<bool>,
    }

    impl System for Flaky {
        type State = ();

        fn descriptor(&self) -> SystemDescriptor {
            SystemDescriptor::new("flaky")
        }

        fn update(&self, _world: &mut World, _frame: &Frame<'_>) -> EcsResult<()> {
            if self.failed.replace(true) {
                Ok(())
            } else {
                Err(EcsError::UnknownSystem {
                    name: "flaky".to_string(),
                })
            }
        }
    }

    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("w").watch::<Health>(),
            &log,
        ))
        .unwrap();
    world
        .register_system(Flaky {
            failed: Cell::new(false),
        })
        .unwrap();
    let e = world.create_entity();
    world.attach(e, Health(1)).unwrap();

    world.mark_dirty::<Health>(e).unwrap();
    assert!(world.run_frame(TICK).is_err());
    world.run_frame(TICK).unwrap();
    world.run_frame(TICK).unwrap();

    assert_eq!(
        lines(&log, "dirty"),
        vec!["w dirty [1]", "w dirty []", "w dirty []"]
    );
}

#[test]
fn membership_changes_reach_later_systems_in_the_same_frame() {
    struct Tagger;

    impl System for Tagger {
        type State = ();

        fn descriptor(&self) -> SystemDescriptor {
            SystemDescriptor::new("tagger").require::<Health>()
        }

        fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
            for &entity in frame.entities() {
                if !world.has::<PlayerTag>(entity) {
                    world.attach(entity, PlayerTag)?;
                }
            }
            Ok(())
        }
    }

    let log = new_log();
    let mut world = World::new();
    world
        .register_system(Recorder::<0>::new(
            SystemDescriptor::new("before").require::<PlayerTag>(),
            &log,
        ))
        .unwrap();
    world.register_system(Tagger).unwrap();
    world
        .register_system(Recorder::<1>::new(
            SystemDescriptor::new("after").require::<PlayerTag>(),
            &log,
        ))
        .unwrap();
    let e = world.create_entity();
    world.attach(e, Health(1)).unwrap();

    world.run_frame(TICK).unwrap();
    world.run_frame(TICK).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "before update []",
            "before add e1",
            "after add e1",
            "after update [1]",
            "before update [1]",
            "after update [1]",
        ]
    );

    // Detaching mid-frame is symmetric: "after" loses the entity at once.
    log.borrow_mut().clear();
    world.detach::<PlayerTag>(e).unwrap();
    assert_eq!(*log.borrow(), vec!["before remove e1", "after remove e1"]);
}
