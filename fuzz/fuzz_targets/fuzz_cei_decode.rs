#![no_main]

use ceinfo_codec::{decode_cei, locate_cei};
use ceinfo_core::CodingType;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for coding in [CodingType::Avc, CodingType::Hevc, CodingType::Avs3] {
        if let Some(location) = locate_cei(data, coding) {
            let _ = decode_cei(location.region(data), coding);
        }
    }
});
