//! 码流底层解析工具.
//!
//! - NAL 起始码扫描与按编码类型的 NAL 类型识别
//! - 防竞争字节移除

pub mod emulation;
pub mod nal;

pub use emulation::{Stripped, strip_emulation_bytes, strip_emulation_bytes_in_place};
pub use nal::{
    NalBoundary, NalUnits, START_CODE_LEN, classify_nal, find_frame_nal, find_next_start_code,
    is_frame_nal_type, nal_type,
};
