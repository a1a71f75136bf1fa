//! CEI (CENC Extra Info) 带内描述符的定位与解码.
//!
//! CEI 藏在各编码的附加数据语法中:
//! - AVC: SEI `user_data_unregistered` (payload_type = 5) + 固定 UUID
//! - HEVC: PREFIX_SEI (39) `user_data_unregistered` + 固定 UUID
//! - AVS3: `extension_and_user_data` (0xB5) 中的 CENC 扩展 (高 4 位 0xD)
//!
//! 定位时按起始码顺序遍历 NAL, 遇到帧数据 NAL 即停止: CEI 只会出现在帧数据之前.

mod avc;
mod avs3;
pub mod descriptor;
mod hevc;

use ceinfo_core::CodingType;
use log::debug;

use crate::parsers::nal::{NalBoundary, NalUnits, is_frame_nal_type};

pub use descriptor::{CeiFlags, CeiInfo, decode_cei, map_video_algorithm};

/// CEI 的 user_data_unregistered UUID
pub const CEI_UUID: [u8; 16] = [
    0x70, 0xC1, 0xDB, 0x9F, 0x66, 0xAE, 0x41, 0x27, 0xBF, 0xC0, 0xBB, 0x19, 0x81, 0x69, 0x4B, 0x66,
];

/// SEI payload_type: user_data_unregistered
pub const SEI_USER_DATA_UNREGISTERED: u8 = 0x05;

/// CEI 所在 NAL 的半开区间 (含起始码)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CeiLocation {
    /// 起始码首字节位置
    pub start: usize,
    /// 下一个起始码位置或缓冲区长度
    pub end: usize,
}

impl CeiLocation {
    /// 在缓冲区中对应的字节
    pub fn region<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.start..self.end]
    }
}

/// 在访问单元中查找 CEI 所在 NAL
pub fn locate_cei(buf: &[u8], coding_type: CodingType) -> Option<CeiLocation> {
    for nal in NalUnits::new(buf, coding_type) {
        if is_frame_nal_type(coding_type, nal.nal_type) {
            debug!(
                "{coding_type}: 帧数据 NAL 之前未发现 CEI, frame_start={}",
                nal.start
            );
            return None;
        }
        if !is_cei_nal(buf, &nal, coding_type) {
            continue;
        }
        if nal.start < nal.end && nal.end <= buf.len() {
            debug!(
                "{coding_type}: 定位到 CEI, start={}, end={}",
                nal.start, nal.end
            );
            return Some(CeiLocation {
                start: nal.start,
                end: nal.end,
            });
        }
    }
    None
}

fn is_cei_nal(buf: &[u8], nal: &NalBoundary, coding_type: CodingType) -> bool {
    let Some(region) = buf.get(nal.start..nal.end) else {
        return false;
    };
    match coding_type {
        CodingType::Avc => avc::is_cei_nal(region, nal.nal_type),
        CodingType::Hevc => hevc::is_cei_nal(region, nal.nal_type),
        CodingType::Avs3 => avs3::is_cei_nal(region),
        CodingType::None => false,
    }
}

/// CEI 区间内加密标志字节的位置 (相对区间起点)
///
/// 返回的位置可能等于区间长度, 由解码端做越界检查.
pub(crate) fn flag_offset(region: &[u8], coding_type: CodingType) -> Option<usize> {
    match coding_type {
        CodingType::Avc => avc::flag_offset(region),
        CodingType::Hevc => hevc::flag_offset(region),
        CodingType::Avs3 => avs3::flag_offset(region),
        CodingType::None => None,
    }
}

/// 从 `from` 起查找 CEI UUID, 返回 UUID 之后第一个字节的位置
fn find_uuid_end(region: &[u8], from: usize) -> Option<usize> {
    let tail = region.get(from..)?;
    tail.windows(CEI_UUID.len())
        .position(|w| w == CEI_UUID)
        .map(|idx| from + idx + CEI_UUID.len())
}
