//! # ceinfo
//!
//! 加密媒体访问单元的 CENC 信息提取与解密编排.
//!
//! 对每个压缩访问单元, 从码流带内 (AVC / HEVC / AVS3 的 CEI) 或容器中得到
//! key_id、iv、算法、分组模式与子样本布局, 组装成描述符交给外部安全解密服务.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bytes::BytesMut;
//! use ceinfo::core::{BufferHandle, CencDescriptor};
//! use ceinfo::{CencOrchestrator, DecryptService};
//!
//! struct Service;
//!
//! impl DecryptService for Service {
//!     fn decrypt_media_data(
//!         &self,
//!         _svp: bool,
//!         _info: &CencDescriptor,
//!         _input: &BufferHandle,
//!         _output: &BufferHandle,
//!     ) -> Result<(), i32> {
//!         Ok(())
//!     }
//! }
//!
//! let mut orch = CencOrchestrator::new("video/avc");
//! orch.set_decrypt_config(Arc::new(Service), false).unwrap();
//!
//! let mut au = BytesMut::from(&[0x00, 0x00, 0x01, 0x65, 0x88][..]);
//! let input = BufferHandle::virtual_memory(au.len() as u32, 4096);
//! let output = BufferHandle::virtual_memory(0, 4096);
//! let desc = orch.decrypt_video(&mut au, None, input, &output).unwrap();
//! println!("algorithm={}, subsamples={:?}", desc.algorithm, desc.subsamples());
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `ceinfo-core` | 描述符、缓冲区句柄、错误类型 |
//! | `ceinfo-codec` | NAL 扫描、CEI 解析、子样本布局 |

/// 描述符与基础类型
pub use ceinfo_core as core;

/// 带内信息解析
pub use ceinfo_codec as codec;

pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod service;

pub use config::StreamOptions;
pub use orchestrator::{CencOrchestrator, ModeState};
pub use service::{DecryptConfig, DecryptService};

/// 获取 ceinfo 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
