//! 视频编码类型.
//!
//! 由解码器名称字符串解析得到, 决定 NAL 头解析方式、CEI 承载位置以及
//! 帧头固定明文长度 (skip bytes).

use std::fmt;

/// 码流语法类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodingType {
    /// 未识别, 关闭带内解析
    #[default]
    None,
    /// H.264 / AVC
    Avc,
    /// H.265 / HEVC
    Hevc,
    /// AVS3
    Avs3,
}

impl CodingType {
    /// 由解码器名称解析编码类型
    ///
    /// 名称中包含 `avc`/`h264` 视为 AVC, `hevc`/`h265` 视为 HEVC, `avs` 视为 AVS3,
    /// 大小写不敏感. 其余名称返回 [`CodingType::None`].
    pub fn from_codec_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("avc") || name.contains("h264") {
            Self::Avc
        } else if name.contains("hevc") || name.contains("h265") {
            Self::Hevc
        } else if name.contains("avs") {
            Self::Avs3
        } else {
            Self::None
        }
    }

    /// 帧数据起始处始终保持明文的字节数
    ///
    /// 为经验常量, 下游解密端按此布局解密, 不可改为由片头解析推导.
    pub const fn skip_bytes(&self) -> usize {
        match self {
            Self::Avc => 35,
            Self::Hevc => 68,
            Self::Avs3 => 4,
            Self::None => 0,
        }
    }

    /// 是否支持带内 CEI 解析
    pub const fn supports_in_band(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// 人类可读名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Avc => "avc",
            Self::Hevc => "hevc",
            Self::Avs3 => "avs3",
        }
    }
}

impl fmt::Display for CodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
