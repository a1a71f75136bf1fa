//! 子样本布局计算.
//!
//! # 视频
//! ```text
//! 0        frame_start            frame_end - trim   frame_end        len
//! │ ...... │ skip │ payload │ tail │ trailing zeros │ rest of buffer │
//! └─── clear_header_len ───┘
//!                  └ 密文 ┘└──────────── 第二个子样本 (明文) ──────────┘
//! ```
//! 密文长度按 16 字节对齐; 对齐后余数为 0 时仍保留最后一整块为明文.
//!
//! # 音频
//! CTR 整段加密; CBC 对齐到 16 字节, 余数部分为明文.

use bytes::BytesMut;
use ceinfo_core::{CencAlgorithm, CencError, CencResult, CodingType, Subsample};
use log::debug;

use crate::parsers::emulation::strip_emulation_bytes_in_place;
use crate::parsers::nal::find_frame_nal;

/// 加密块大小
pub const CIPHER_BLOCK_SIZE: usize = 16;

/// 布局中的最大子样本数
pub const MAX_LAYOUT_SUBSAMPLES: usize = 2;

/// 子样本布局 (至多 2 个)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsampleLayout {
    entries: [Subsample; MAX_LAYOUT_SUBSAMPLES],
    count: usize,
}

impl SubsampleLayout {
    /// 整个缓冲区为明文
    pub fn clear(len: usize) -> CencResult<Self> {
        Ok(Self {
            entries: [Subsample::new(to_u32(len)?, 0), Subsample::default()],
            count: 1,
        })
    }

    fn pair(first: Subsample, second: Subsample) -> Self {
        Self {
            entries: [first, second],
            count: 2,
        }
    }

    /// 子样本序列
    pub fn subsamples(&self) -> &[Subsample] {
        &self.entries[..self.count]
    }

    /// 覆盖的总字节数
    pub fn total_len(&self) -> u64 {
        self.subsamples().iter().map(Subsample::total_len).sum()
    }

    /// 是否不含密文
    pub fn is_clear(&self) -> bool {
        self.subsamples().iter().all(|s| s.payload_len == 0)
    }
}

/// 计算视频访问单元的子样本布局
///
/// `is_ambiguous` 为真时先移除帧数据 NAL 内的防竞争字节, 缓冲区随之截短,
/// 所有长度按截短后的数据计算. 找不到帧数据 NAL 时整个缓冲区为明文.
pub fn compute_video_layout(
    buf: &mut BytesMut,
    coding_type: CodingType,
    is_ambiguous: bool,
) -> CencResult<SubsampleLayout> {
    let Some(frame) = find_frame_nal(buf, coding_type) else {
        debug!("{coding_type}: 未找到帧数据 NAL, 按整帧明文处理, len={}", buf.len());
        return SubsampleLayout::clear(buf.len());
    };

    let mut frame_end = frame.end;
    if is_ambiguous {
        let stripped = strip_emulation_bytes_in_place(buf, frame.start, frame.end);
        frame_end = stripped.end;
        if stripped.removed > 0 {
            debug!(
                "{coding_type}: 帧数据移除防竞争字节, removed={}, len={}",
                stripped.removed,
                buf.len()
            );
        }
    }

    frame_layout(buf, frame.start, frame_end, coding_type.skip_bytes())
}

/// 按帧数据 NAL 区间计算两段子样本
///
/// `frame_start < frame_end <= buf.len()` 由调用方保证.
pub fn frame_layout(
    buf: &[u8],
    frame_start: usize,
    frame_end: usize,
    skip_bytes: usize,
) -> CencResult<SubsampleLayout> {
    let frame_end = frame_end.min(buf.len());
    let clear_header_len = frame_start.saturating_add(skip_bytes).min(frame_end);

    // 下标 0 不参与尾部零统计
    let mut trim_len = 0usize;
    for i in (1..frame_end).rev() {
        if buf[i] != 0x00 {
            break;
        }
        trim_len += 1;
    }
    let trim_len = trim_len.min(frame_end - clear_header_len);

    let raw_payload_len = frame_end - clear_header_len - trim_len;
    let mut tail = raw_payload_len % CIPHER_BLOCK_SIZE;
    if tail == 0 && raw_payload_len > 0 {
        tail = CIPHER_BLOCK_SIZE;
    }
    let encrypted_len = raw_payload_len - tail;

    Ok(SubsampleLayout::pair(
        Subsample::new(to_u32(clear_header_len)?, to_u32(encrypted_len)?),
        Subsample::new(to_u32(tail + trim_len + (buf.len() - frame_end))?, 0),
    ))
}

/// 计算音频访问单元的子样本布局
pub fn compute_audio_layout(len: usize, algorithm: CencAlgorithm) -> CencResult<SubsampleLayout> {
    if algorithm.is_ctr() {
        return Ok(SubsampleLayout {
            entries: [Subsample::new(0, to_u32(len)?), Subsample::default()],
            count: 1,
        });
    }
    if !algorithm.is_cbc() {
        return SubsampleLayout::clear(len);
    }

    let tail = len % CIPHER_BLOCK_SIZE;
    let aligned = to_u32(len - tail)?;
    if tail == 0 {
        Ok(SubsampleLayout {
            entries: [Subsample::new(0, aligned), Subsample::default()],
            count: 1,
        })
    } else {
        Ok(SubsampleLayout::pair(
            Subsample::new(0, aligned),
            Subsample::new(tail as u32, 0),
        ))
    }
}

fn to_u32(len: usize) -> CencResult<u32> {
    u32::try_from(len)
        .map_err(|_| CencError::InvalidArgument(format!("访问单元长度超出 u32 范围, len={len}")))
}
