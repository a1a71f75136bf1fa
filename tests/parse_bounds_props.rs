//! 解析边界的 Property-Based Testing
//!
//! 任意输入都不应 panic, 子样本之和始终等于 (处理后的) 访问单元长度

use bytes::BytesMut;
use ceinfo::CencOrchestrator;
use ceinfo::codec::cei::{decode_cei, locate_cei};
use ceinfo::codec::layout::{CIPHER_BLOCK_SIZE, compute_video_layout};
use ceinfo::codec::parsers::emulation::strip_emulation_bytes;
use ceinfo::core::{CodingType, Subsample};
use proptest::prelude::*;

fn coding_type() -> impl Strategy<Value = CodingType> {
    prop_oneof![
        Just(CodingType::Avc),
        Just(CodingType::Hevc),
        Just(CodingType::Avs3),
        Just(CodingType::None),
    ]
}

/// 偏向起始码与零字节的任意字节流
fn annex_b_like() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            4 => any::<u8>(),
            2 => Just(0x00u8),
            1 => Just(0x01u8),
            1 => Just(0x03u8),
        ],
        0..512,
    )
}

/// 不含 0x03 的原始数据
fn raw_without_escape_byte() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            2 => Just(0x00u8),
            1 => Just(0x01u8),
            1 => Just(0x02u8),
            3 => 0x04u8..=0xFF,
        ],
        0..256,
    )
}

/// 按编码端规则插入防竞争字节
fn escape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + raw.len() / 2);
    let mut zeros = 0usize;
    for &byte in raw {
        if zeros >= 2 && byte <= 0x03 {
            out.push(0x03);
            zeros = 0;
        }
        out.push(byte);
        zeros = if byte == 0x00 { zeros + 1 } else { 0 };
    }
    out
}

fn strip_all(data: &[u8]) -> Vec<u8> {
    let mut buf = data.to_vec();
    let len = buf.len();
    let stripped = strip_emulation_bytes(&mut buf, 0, len);
    buf.truncate(stripped.end);
    buf
}

fn has_start_code(data: &[u8]) -> bool {
    data.windows(3).any(|w| w == [0x00, 0x00, 0x01])
}

proptest! {
    #[test]
    fn locate_and_decode_never_panic(data in annex_b_like(), coding in coding_type()) {
        if let Some(location) = locate_cei(&data, coding) {
            prop_assert!(location.start < location.end);
            prop_assert!(location.end <= data.len());
            let _ = decode_cei(location.region(&data), coding);
        }
        let _ = decode_cei(&data, coding);
    }

    #[test]
    fn layout_covers_whole_unit(
        data in annex_b_like(),
        coding in coding_type(),
        ambiguous in any::<bool>(),
    ) {
        let mut buf = BytesMut::from(&data[..]);
        let layout = compute_video_layout(&mut buf, coding, ambiguous).unwrap();
        prop_assert_eq!(layout.total_len(), buf.len() as u64);
        prop_assert!(buf.len() <= data.len());
        for subsample in layout.subsamples() {
            prop_assert_eq!(subsample.payload_len as usize % CIPHER_BLOCK_SIZE, 0);
        }
    }

    #[test]
    fn layout_without_start_code_is_clear(data in prop::collection::vec(any::<u8>(), 0..256)) {
        prop_assume!(!has_start_code(&data));
        let mut buf = BytesMut::from(&data[..]);
        let layout = compute_video_layout(&mut buf, CodingType::Avc, true).unwrap();
        prop_assert_eq!(layout.subsamples(), &[Subsample::new(data.len() as u32, 0)][..]);
        prop_assert_eq!(&buf[..], &data[..]);
    }

    #[test]
    fn strip_restores_escaped_payload(raw in raw_without_escape_byte()) {
        let stripped = strip_all(&escape(&raw));
        prop_assert_eq!(&stripped, &raw);
        // 原始数据不含 0x03, 再次移除不变
        prop_assert_eq!(strip_all(&stripped), stripped);
    }

    #[test]
    fn strip_keeps_window_with_large_follower(
        prefix in raw_without_escape_byte(),
        follower in 0x04u8..=0xFF,
    ) {
        let mut data = prefix;
        data.extend_from_slice(&[0x00, 0x00, 0x03, follower]);
        prop_assert_eq!(strip_all(&data), data);
    }

    #[test]
    fn orchestrator_resolves_any_unit(data in annex_b_like(), codec in prop_oneof![
        Just("video/avc"),
        Just("video/hevc"),
        Just("video/avs3"),
    ]) {
        let mut orch = CencOrchestrator::new(codec);
        let mut au = BytesMut::from(&data[..]);
        let desc = orch.resolve_video(&mut au, None).unwrap();
        prop_assert_eq!(desc.total_len(), au.len() as u64);
    }
}
