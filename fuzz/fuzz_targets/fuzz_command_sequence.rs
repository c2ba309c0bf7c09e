//! Fuzz target: random command sequences against `CafeService`
//!
//! Each pair of input bytes is decoded into a command plus a tick, and
//! after every step:
//! - doser stock stays within [0, capacity]
//! - grinder beans stay within [0, capacity]
//! - every progress value stays within [0, 1]
//!
//! cargo fuzz run fuzz_command_sequence

#![no_main]

use barista::app::events::AppEvent;
use barista::app::ports::EventSink;
use barista::{
    AppCommand, CafeService, Cup, GrindSize, GroundCoffee, Item, ItemKind, MachineConfig,
    Portafilter, StationKind,
};
use libfuzzer_sys::fuzz_target;

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fn station(b: u8) -> StationKind {
    match b % 3 {
        0 => StationKind::Grinder,
        1 => StationKind::Dosing,
        _ => StationKind::Espresso,
    }
}

fn slot(b: u8) -> Option<usize> {
    match b % 6 {
        5 => None,
        n => Some(n as usize),
    }
}

fn item(b: u8) -> Item {
    match b % 5 {
        0 => Item::Portafilter(Portafilter::empty()),
        1 => Item::Portafilter(Portafilter::with_dose(f32::from(b % 25), 0.8)),
        2 => Item::Cup(Cup::empty()),
        3 => Item::GroundCoffee(GroundCoffee {
            size: GrindSize::Large,
            grams: f32::from(b) / 4.0,
            quality: 0.9,
        }),
        _ => Item::BeanBag {
            fills: u32::from(b % 4),
        },
    }
}

fn command(op: u8, arg: u8) -> AppCommand {
    match op % 8 {
        0 => AppCommand::AddBeans {
            fills: u32::from(arg % 12),
        },
        1 => AppCommand::Drop {
            target: station(arg),
            slot: slot(arg >> 2),
            item: item(arg >> 1),
        },
        2 => AppCommand::Take {
            target: station(arg),
            slot: slot(arg >> 2),
            kind: [
                ItemKind::Portafilter,
                ItemKind::Cup,
                ItemKind::GroundCoffee,
                ItemKind::BeanBag,
            ][usize::from(arg >> 6)],
        },
        3 => AppCommand::PullLever {
            station: station(arg),
            slot: slot(arg >> 2),
        },
        4 => AppCommand::PressButton {
            station: station(arg),
            slot: slot(arg >> 2),
        },
        5 => AppCommand::Transfer {
            grams: f32::from(arg) / 8.0 - 4.0,
        },
        6 => AppCommand::Upgrade {
            station: station(arg),
            level: arg >> 2,
        },
        _ => AppCommand::Reset {
            station: (arg % 2 == 0).then(|| station(arg >> 1)),
        },
    }
}

fuzz_target!(|data: &[u8]| {
    let config = MachineConfig::default();
    let Ok(mut svc) = CafeService::new(config.clone()) else {
        return;
    };
    let mut sink = NullSink;

    for pair in data.chunks_exact(2) {
        svc.handle_command(command(pair[0], pair[1]), &mut sink);
        svc.tick(f32::from(pair[0] >> 3) / 16.0, &mut sink);

        let stock = svc.dosing().state().stock();
        assert!((0.0..=config.dosing.capacity_g).contains(&stock));
        assert!(svc.grinder().state().bean_fills() <= config.grinder.bean_capacity);
        assert!((0.0..=1.0).contains(&svc.dosing().progress()));
        assert!((0.0..=1.0).contains(&svc.grinder().progress()));
        for index in 0..4 {
            if let Some(p) = svc.espresso().progress(index) {
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }
});
