#![no_main]

use ceinfo_codec::parsers::strip_emulation_bytes;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut buf = data.to_vec();
    let len = buf.len();
    let stripped = strip_emulation_bytes(&mut buf, 0, len);
    assert_eq!(stripped.end + stripped.removed, len);
});
