//! # ceinfo-core
//!
//! ceinfo 核心库, 提供错误处理、编码类型与 CENC 描述符等基础类型.
//!
//! 本 crate 不包含任何解析逻辑, 供 `ceinfo-codec` 与上层编排共用.

pub mod buffer;
pub mod cenc_info;
pub mod coding_type;
pub mod error;

// 重导出常用类型
pub use buffer::{BufferBacking, BufferHandle, MemoryFlags};
pub use cenc_info::{
    BlockPattern, CencAlgorithm, CencDescriptor, DescriptorMode, MAX_IV_LEN, MAX_KEY_ID_LEN,
    MAX_SUBSAMPLES, Subsample,
};
pub use coding_type::CodingType;
pub use error::{CencError, CencResult};
