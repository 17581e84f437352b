#![no_main]

use fsa_core::Automaton;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must come back as an automaton or an error, never
    // a panic or runaway allocation.
    let mut reader = data;
    if let Ok(automaton) = Automaton::read_from(&mut reader) {
        let mut bytes = Vec::new();
        if automaton.write_to(&mut bytes).is_ok() {
            let _ = Automaton::read_from(&mut bytes.as_slice());
        }
    }
});
