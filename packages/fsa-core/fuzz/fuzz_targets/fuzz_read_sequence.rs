#![no_main]

use fsa_core::IntSeq;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = data;
    let _ = IntSeq::read_from(&mut reader);
});
