//! 统一错误类型定义.
//!
//! 所有 ceinfo crate 共用的错误类型. 解析阶段只产生 `InvalidData` / `Unsupported`,
//! 编排层据此降级为明文; `NotConfigured` 与 `Service` 则原样返回给调用方.

use thiserror::Error;

/// ceinfo 统一错误类型
#[derive(Debug, Error)]
pub enum CencError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 无效数据 (截断、越界的 CEI 字段等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 不支持的取值 (未知算法编号等)
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 解密前未设置安全解密服务
    #[error("解密配置缺失: {0}")]
    NotConfigured(String),

    /// 外部安全解密服务返回失败
    #[error("解密服务失败: code={code}, {message}")]
    Service {
        /// 服务返回的原始错误码
        code: i32,
        /// 附加描述
        message: String,
    },

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

impl CencError {
    /// 是否属于可在访问单元粒度降级处理的解析错误
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::InvalidData(_) | Self::Unsupported(_))
    }
}

/// ceinfo 统一 Result 类型
pub type CencResult<T> = Result<T, CencError>;
