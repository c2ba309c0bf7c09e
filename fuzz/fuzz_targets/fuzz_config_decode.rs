//! Fuzz target: configuration decoding
//!
//! Feeds arbitrary bytes to both config decoders and verifies:
//! - No panics on malformed postcard blobs or JSON text
//! - Anything that decodes also validates and builds a service
//! - That service survives a reset and a few ticks
//!
//! cargo fuzz run fuzz_config_decode

#![no_main]

use barista::adapters::LogEventSink;
use barista::{AppCommand, CafeService, MachineConfig};
use libfuzzer_sys::fuzz_target;

fn exercise(cfg: MachineConfig) {
    let mut svc = match CafeService::new(cfg) {
        Ok(svc) => svc,
        Err(e) => panic!("decoded config refused: {e}"),
    };
    let mut sink = LogEventSink::new();
    svc.start(&mut sink);
    svc.handle_command(AppCommand::Reset { station: None }, &mut sink);
    for _ in 0..8 {
        svc.tick(0.25, &mut sink);
    }
}

fuzz_target!(|data: &[u8]| {
    if let Ok(cfg) = MachineConfig::from_bytes(data) {
        assert!(cfg.validate().is_ok());
        exercise(cfg);
    }

    if let Ok(text) = core::str::from_utf8(data) {
        if let Ok(cfg) = MachineConfig::from_json(text) {
            exercise(cfg);
        }
    }
});
