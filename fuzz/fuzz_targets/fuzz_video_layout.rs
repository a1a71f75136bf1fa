#![no_main]

use bytes::BytesMut;
use ceinfo_codec::compute_video_layout;
use ceinfo_core::CodingType;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let coding = match selector % 3 {
        0 => CodingType::Avc,
        1 => CodingType::Hevc,
        _ => CodingType::Avs3,
    };
    let mut buf = BytesMut::from(rest);
    if let Ok(layout) = compute_video_layout(&mut buf, coding, selector & 0x80 != 0) {
        assert_eq!(layout.total_len(), buf.len() as u64);
    }
});
