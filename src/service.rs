//! 外部安全解密服务边界.
//!
//! 真正的解密由外部服务完成, 本 crate 只负责给出描述符与缓冲区句柄.

use std::fmt;
use std::sync::Arc;

use ceinfo_core::{BufferHandle, CencDescriptor};

/// 安全解密服务
///
/// 实现方负责超时等行为; 调用方不会重试.
pub trait DecryptService: Send + Sync {
    /// 按描述符把 `input` 中的数据解密到 `output`
    ///
    /// # 返回
    /// - `Ok(())`: 解密成功
    /// - `Err(code)`: 服务返回的原始错误码
    fn decrypt_media_data(
        &self,
        secure_video_path: bool,
        info: &CencDescriptor,
        input: &BufferHandle,
        output: &BufferHandle,
    ) -> Result<(), i32>;
}

/// 解密配置: 服务句柄 + 安全视频通路标志
#[derive(Clone)]
pub struct DecryptConfig {
    /// 服务句柄
    pub service: Arc<dyn DecryptService>,
    /// 是否走安全视频通路 (svp)
    pub secure_video_path: bool,
}

impl DecryptConfig {
    /// 创建配置
    pub fn new(service: Arc<dyn DecryptService>, secure_video_path: bool) -> Self {
        Self {
            service,
            secure_video_path,
        }
    }
}

impl fmt::Debug for DecryptConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptConfig")
            .field("secure_video_path", &self.secure_video_path)
            .finish_non_exhaustive()
    }
}
