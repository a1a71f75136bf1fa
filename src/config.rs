//! 流配置.

use serde::{Deserialize, Serialize};

/// 单路流的配置
///
/// 通常随解码器一起下发, 可由 JSON 等格式反序列化.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StreamOptions {
    /// 解码器名称, 用于识别编码类型 (如 `video/avc`)
    pub codec_name: String,
    /// 是否走安全视频通路
    #[serde(default)]
    pub secure_video_path: bool,
}

impl StreamOptions {
    /// 创建配置
    pub fn new(codec_name: impl Into<String>) -> Self {
        Self {
            codec_name: codec_name.into(),
            secure_video_path: false,
        }
    }

    /// 设置安全视频通路标志
    pub fn with_secure_video_path(mut self, enabled: bool) -> Self {
        self.secure_video_path = enabled;
        self
    }
}
