//! # ceinfo-codec
//!
//! 加密视频访问单元的带内 CENC 信息解析.
//!
//! 处理流程:
//! 1. [`cei::locate_cei`] 按起始码遍历 NAL, 在帧数据之前找到 CEI 所在 NAL
//! 2. [`cei::decode_cei`] 解出 key_id / iv / 算法 / 分组模式
//! 3. [`layout::compute_video_layout`] 按帧数据 NAL 计算明文头与对齐后的密文长度
//!
//! 所有阶段都是对调用方缓冲区的纯函数, 不做 I/O, 可在多线程中对不同缓冲区并发调用.
//!
//! ## 使用示例
//!
//! ```rust
//! use bytes::BytesMut;
//! use ceinfo_codec::{cei, layout};
//! use ceinfo_core::CodingType;
//!
//! let mut au = BytesMut::from(&[0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x21][..]);
//! assert!(cei::locate_cei(&au, CodingType::Avc).is_none());
//! let layout = layout::compute_video_layout(&mut au, CodingType::Avc, false).unwrap();
//! assert_eq!(layout.total_len(), 7);
//! ```

pub mod cei;
pub mod layout;
pub mod parsers;

// 重导出常用类型
pub use cei::{CeiFlags, CeiInfo, CeiLocation, decode_cei, locate_cei};
pub use layout::{SubsampleLayout, compute_audio_layout, compute_video_layout};
pub use parsers::{NalBoundary, Stripped};
