//! Annex B NAL 单元边界扫描.
//!
//! # 起始码
//!
//! 仅识别 3 字节起始码 `00 00 01`; 4 字节起始码 `00 00 00 01` 的首个 `00`
//! 归入前一个 NAL, 由子样本布局计算中的尾部零裁剪处理.
//!
//! # NAL 头部
//! ```text
//! AVC  (1 字节): forbidden(1) | ref_idc(2) | type(5)
//! HEVC (2 字节): forbidden(1) | type(6) | layer_id(6) | tid(3)
//! AVS3 (1 字节): start_code_value(8)
//! ```
//!
//! 边界 `start` 指向起始码首字节, `end` 为下一个起始码位置 (或缓冲区末尾).

use ceinfo_core::CodingType;

/// 起始码长度
pub const START_CODE_LEN: usize = 3;

/// 一个 NAL 单元在访问单元缓冲区中的半开区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalBoundary {
    /// 起始码首字节位置
    pub start: usize,
    /// 下一个起始码位置或缓冲区长度
    pub end: usize,
    /// 按编码类型解出的 NAL 类型
    pub nal_type: u8,
}

impl NalBoundary {
    /// 区间长度 (含起始码)
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// 区间是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// NAL 头部首字节位置
    pub fn header_pos(&self) -> usize {
        self.start + START_CODE_LEN
    }
}

/// 从 `from` 开始查找下一个 `00 00 01`
///
/// 只在 `pos + 3 < buf.len()` 范围内扫描, 保证起始码后至少还有一个头部字节.
pub fn find_next_start_code(buf: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while pos + START_CODE_LEN < buf.len() {
        if buf[pos] == 0x00 && buf[pos + 1] == 0x00 && buf[pos + 2] == 0x01 {
            return Some(pos);
        }
        pos += 1;
    }
    None
}

/// 读取 `pos` 处起始码之后的 NAL 类型
pub fn nal_type(buf: &[u8], pos: usize, coding_type: CodingType) -> Option<u8> {
    let header = *buf.get(pos.checked_add(START_CODE_LEN)?)?;
    match coding_type {
        CodingType::Avc => Some(header & 0x1F),
        CodingType::Hevc => Some((header >> 1) & 0x3F),
        CodingType::Avs3 => Some(header),
        CodingType::None => None,
    }
}

/// NAL 类型是否为帧数据 (编码片)
///
/// - AVC: 非 IDR 片 (1) 与 IDR 片 (5)
/// - HEVC: 全部 VCL 类型 (0..=31)
/// - AVS3: 片起始码 (0x00)
pub fn is_frame_nal_type(coding_type: CodingType, nal_type: u8) -> bool {
    match coding_type {
        CodingType::Avc => matches!(nal_type, 1 | 5),
        CodingType::Hevc => nal_type <= 31,
        CodingType::Avs3 => nal_type == 0,
        CodingType::None => false,
    }
}

/// `pos` 处的 NAL 为帧数据时返回其类型
pub fn classify_nal(buf: &[u8], pos: usize, coding_type: CodingType) -> Option<u8> {
    let nal_type = nal_type(buf, pos, coding_type)?;
    is_frame_nal_type(coding_type, nal_type).then_some(nal_type)
}

/// 查找第一个帧数据 NAL 的边界
///
/// 找不到时返回 `None`, 调用方应将整个缓冲区视为明文.
pub fn find_frame_nal(buf: &[u8], coding_type: CodingType) -> Option<NalBoundary> {
    NalUnits::new(buf, coding_type).find(|nal| is_frame_nal_type(coding_type, nal.nal_type))
}

/// 按起始码依次产出 NAL 边界的迭代器
#[derive(Debug, Clone)]
pub struct NalUnits<'a> {
    buf: &'a [u8],
    coding_type: CodingType,
    next: Option<usize>,
}

impl<'a> NalUnits<'a> {
    /// 创建迭代器
    pub fn new(buf: &'a [u8], coding_type: CodingType) -> Self {
        let next = if coding_type.supports_in_band() {
            find_next_start_code(buf, 0)
        } else {
            None
        };
        Self {
            buf,
            coding_type,
            next,
        }
    }
}

impl Iterator for NalUnits<'_> {
    type Item = NalBoundary;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next?;
        let following = find_next_start_code(self.buf, start + START_CODE_LEN);
        self.next = following;
        let nal_type = nal_type(self.buf, start, self.coding_type)?;
        Some(NalBoundary {
            start,
            end: following.unwrap_or(self.buf.len()),
            nal_type,
        })
    }
}
