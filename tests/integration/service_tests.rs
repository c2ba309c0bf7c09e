//! End-to-end tests of the command → station → event pipeline.

use barista::config::InteractionType;
use barista::events::StationEvent;
use barista::{
    AppCommand, AppEvent, CafeService, CommandOutcome, Cup, GrindSize, GroundCoffee, Item,
    ItemKind, MachineConfig, MachineState, Portafilter, Rejection, StationKind,
};

use crate::mock::{RecordingSink, run};

fn make_bar() -> (CafeService, RecordingSink) {
    let mut svc = CafeService::new(MachineConfig::default()).unwrap();
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);
    (svc, sink)
}

fn drop_on(target: StationKind, slot: Option<usize>, item: Item) -> AppCommand {
    AppCommand::Drop { target, slot, item }
}

fn lever(station: StationKind) -> AppCommand {
    AppCommand::PullLever {
        station,
        slot: None,
    }
}

fn ground(grams: f32) -> Item {
    Item::GroundCoffee(GroundCoffee {
        size: GrindSize::Large,
        grams,
        quality: 1.0,
    })
}

// ── Whole bar ─────────────────────────────────────────────────

#[test]
fn beans_to_espresso_at_level_zero() {
    let (mut svc, mut sink) = make_bar();

    assert!(svc.handle_command(AppCommand::AddBeans { fills: 5 }, &mut sink).is_done());
    for expected in [GrindSize::Small, GrindSize::Medium, GrindSize::Large] {
        assert!(svc.handle_command(lever(StationKind::Grinder), &mut sink).is_done());
        run(&mut svc, &mut sink, 2.0);
        assert_eq!(svc.grinder().state().output_size(), Some(expected));
    }
    assert_eq!(
        svc.handle_command(lever(StationKind::Grinder), &mut sink)
            .rejection(),
        Some(Rejection::MaxGrindSize)
    );
    assert_eq!(svc.grinder().state().bean_fills(), 2);

    let CommandOutcome::Item(coffee) = svc.handle_command(
        AppCommand::Take {
            target: StationKind::Grinder,
            slot: None,
            kind: ItemKind::GroundCoffee,
        },
        &mut sink,
    ) else {
        panic!("grinder should hand out coffee");
    };
    assert!(svc.handle_command(drop_on(StationKind::Dosing, None, coffee), &mut sink).is_done());
    assert_eq!(svc.dosing().state().stock(), 18.0);

    let empty = Item::Portafilter(Portafilter::empty());
    assert!(svc.handle_command(drop_on(StationKind::Dosing, None, empty), &mut sink).is_done());
    for _ in 0..3 {
        assert!(svc.handle_command(lever(StationKind::Dosing), &mut sink).is_done());
        run(&mut svc, &mut sink, 1.0);
    }
    assert!((svc.dosing().state().output() - 18.0).abs() < 1e-3);

    let CommandOutcome::Item(dosed) = svc.handle_command(
        AppCommand::Take {
            target: StationKind::Dosing,
            slot: None,
            kind: ItemKind::Portafilter,
        },
        &mut sink,
    ) else {
        panic!("doser should hand out the portafilter");
    };
    svc.handle_command(drop_on(StationKind::Espresso, None, dosed), &mut sink);
    svc.handle_command(drop_on(StationKind::Espresso, None, Item::Cup(Cup::empty())), &mut sink);
    assert!(svc.espresso().slot(0).unwrap().is_ready_to_brew());

    assert!(svc.handle_command(lever(StationKind::Espresso), &mut sink).is_done());
    run(&mut svc, &mut sink, 5.0);

    let CommandOutcome::Item(Item::Cup(cup)) = svc.handle_command(
        AppCommand::Take {
            target: StationKind::Espresso,
            slot: None,
            kind: ItemKind::Cup,
        },
        &mut sink,
    ) else {
        panic!("espresso machine should hand out the cup");
    };
    let shot = cup.espresso.expect("cup should hold a shot");
    assert!(shot.quality > 0.9);
    assert_eq!(sink.rejections(), 1);
}

// ── Doser ─────────────────────────────────────────────────────

#[test]
fn doser_walks_idle_ready_processing_complete() {
    let (mut svc, mut sink) = make_bar();
    svc.handle_command(drop_on(StationKind::Dosing, None, ground(50.0)), &mut sink);
    assert_eq!(svc.dosing().machine_state(), MachineState::Idle);

    svc.handle_command(
        drop_on(StationKind::Dosing, None, Item::Portafilter(Portafilter::empty())),
        &mut sink,
    );
    svc.handle_command(lever(StationKind::Dosing), &mut sink);
    run(&mut svc, &mut sink, 1.0);

    assert_eq!(
        sink.transitions(StationKind::Dosing),
        vec![
            MachineState::Ready,
            MachineState::Processing,
            MachineState::Complete,
            MachineState::Ready,
        ]
    );
    assert!((svc.dosing().state().stock() - 44.0).abs() < 1e-3);
    assert!(
        sink.station(StationKind::Dosing)
            .iter()
            .any(|e| matches!(e, StationEvent::Completed { .. }))
    );
}

#[test]
fn doser_refuses_the_wrong_control() {
    let (mut svc, mut sink) = make_bar();
    let outcome = svc.handle_command(
        AppCommand::PressButton {
            station: StationKind::Dosing,
            slot: None,
        },
        &mut sink,
    );
    assert_eq!(
        outcome.rejection(),
        Some(Rejection::WrongInteraction {
            expected: InteractionType::ManualLever
        })
    );
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::Rejected {
            station: Some(StationKind::Dosing),
            ..
        })
    ));
}

#[test]
fn automatic_doser_fills_to_ideal_and_stops() {
    let (mut svc, mut sink) = make_bar();
    svc.handle_command(drop_on(StationKind::Dosing, None, ground(50.0)), &mut sink);
    svc.handle_command(
        drop_on(StationKind::Dosing, None, Item::Portafilter(Portafilter::empty())),
        &mut sink,
    );
    svc.handle_command(
        AppCommand::Upgrade {
            station: StationKind::Dosing,
            level: 2,
        },
        &mut sink,
    );
    run(&mut svc, &mut sink, 2.0);

    assert!((svc.dosing().state().output() - 18.0).abs() < 1e-3);
    assert!((svc.dosing().state().stock() - 32.0).abs() < 1e-3);
    assert_ne!(svc.dosing().machine_state(), MachineState::Processing);
    assert!(sink.notices().iter().any(|n| n.contains("upgraded")));
}

#[test]
fn removing_portafilter_mid_dose_aborts() {
    let (mut svc, mut sink) = make_bar();
    svc.handle_command(drop_on(StationKind::Dosing, None, ground(50.0)), &mut sink);
    svc.handle_command(
        drop_on(StationKind::Dosing, None, Item::Portafilter(Portafilter::empty())),
        &mut sink,
    );
    svc.handle_command(lever(StationKind::Dosing), &mut sink);
    run(&mut svc, &mut sink, 0.4);

    let outcome = svc.handle_command(
        AppCommand::Take {
            target: StationKind::Dosing,
            slot: None,
            kind: ItemKind::Portafilter,
        },
        &mut sink,
    );
    assert_eq!(outcome, CommandOutcome::Item(Item::Portafilter(Portafilter::empty())));
    assert_eq!(svc.dosing().state().stock(), 50.0);
    assert_eq!(svc.dosing().machine_state(), MachineState::Idle);
}

// ── Espresso ──────────────────────────────────────────────────

#[test]
fn slot_outside_level_bounces_the_item() {
    let (mut svc, mut sink) = make_bar();
    let outcome = svc.handle_command(
        drop_on(StationKind::Espresso, Some(2), Item::Cup(Cup::empty())),
        &mut sink,
    );
    assert_eq!(
        outcome,
        CommandOutcome::Rejected {
            reason: Rejection::InvalidSlot {
                index: 2,
                available: 2
            },
            returned: Some(Item::Cup(Cup::empty())),
        }
    );
}

#[test]
fn level_two_brews_four_shots_automatically() {
    let (mut svc, mut sink) = make_bar();
    svc.handle_command(
        AppCommand::Upgrade {
            station: StationKind::Espresso,
            level: 2,
        },
        &mut sink,
    );
    assert_eq!(svc.espresso().available_slot_count(), 4);
    for _ in 0..4 {
        let filter = Item::Portafilter(Portafilter::with_dose(18.0, 0.2));
        assert!(svc.handle_command(drop_on(StationKind::Espresso, None, filter), &mut sink).is_done());
        assert!(
            svc.handle_command(drop_on(StationKind::Espresso, None, Item::Cup(Cup::empty())), &mut sink)
                .is_done()
        );
    }
    svc.tick(0.1, &mut sink);
    assert_eq!(svc.espresso().machine_state(), MachineState::Processing);
    run(&mut svc, &mut sink, 2.5);

    for index in 0..4 {
        let slot = svc.espresso().slot(index).unwrap();
        let shot = slot.cup().and_then(|c| c.espresso).expect("shot in every slot");
        assert!(shot.quality >= 0.7, "level 2 guarantees good shots");
        assert!(!slot.coffee_present());
    }
}

#[test]
fn downgrade_reports_occupied_closed_slots() {
    let (mut svc, mut sink) = make_bar();
    svc.handle_command(
        AppCommand::Upgrade {
            station: StationKind::Espresso,
            level: 2,
        },
        &mut sink,
    );
    svc.handle_command(drop_on(StationKind::Espresso, Some(2), Item::Cup(Cup::empty())), &mut sink);
    svc.handle_command(drop_on(StationKind::Espresso, Some(3), Item::Cup(Cup::empty())), &mut sink);
    svc.handle_command(
        AppCommand::Upgrade {
            station: StationKind::Espresso,
            level: 0,
        },
        &mut sink,
    );

    assert_eq!(svc.espresso().validation().invalid.as_slice(), &[2, 3]);
    assert!(sink.notices().iter().any(|n| n.contains("Slots 3, 4")));

    let outcome = svc.handle_command(
        AppCommand::Take {
            target: StationKind::Espresso,
            slot: Some(3),
            kind: ItemKind::Cup,
        },
        &mut sink,
    );
    assert_eq!(outcome, CommandOutcome::Item(Item::Cup(Cup::empty())));
}

// ── Service ───────────────────────────────────────────────────

#[test]
fn taking_nothing_is_rejected_and_reported() {
    let (mut svc, mut sink) = make_bar();
    let outcome = svc.handle_command(
        AppCommand::Take {
            target: StationKind::Grinder,
            slot: None,
            kind: ItemKind::GroundCoffee,
        },
        &mut sink,
    );
    assert_eq!(
        outcome.rejection(),
        Some(Rejection::NothingToTake(ItemKind::GroundCoffee))
    );
    assert_eq!(sink.rejections(), 1);
}

#[test]
fn reset_one_station_leaves_the_others() {
    let (mut svc, mut sink) = make_bar();
    svc.handle_command(AppCommand::AddBeans { fills: 3 }, &mut sink);
    svc.handle_command(drop_on(StationKind::Dosing, None, ground(20.0)), &mut sink);
    svc.handle_command(
        AppCommand::Reset {
            station: Some(StationKind::Grinder),
        },
        &mut sink,
    );
    assert_eq!(svc.grinder().state().bean_fills(), 0);
    assert_eq!(svc.dosing().state().stock(), 20.0);
}
