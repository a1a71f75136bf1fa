//! 防竞争字节 (emulation prevention byte) 移除.
//!
//! 码流中 `00 00` 之后若出现 `00..=03`, 编码端会插入一个 `03`:
//! ```text
//! 00 00 03 X  (X ∈ 0..=3)  →  00 00 X
//! ```
//! 移除在原缓冲区内就地完成, 区间之后的数据不移动, 由调用方负责.

use bytes::BytesMut;

/// 一次移除的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stripped {
    /// 移除后区间的新结束位置
    pub end: usize,
    /// 移除的字节数
    pub removed: usize,
}

/// 就地移除 `[offset, end)` 内的防竞争字节
///
/// 只匹配完整的 4 字节窗口 `00 00 03 X`; 移除后从 `X` 处继续扫描, 不回看.
/// 单次遍历完成, 不会越过 `buf.len()`.
pub fn strip_emulation_bytes(buf: &mut [u8], offset: usize, end: usize) -> Stripped {
    let end = end.min(buf.len());
    if offset >= end {
        return Stripped { end, removed: 0 };
    }

    let mut read = offset;
    let mut write = offset;
    let mut zeros = 0usize;
    while read < end {
        let byte = buf[read];
        // write <= read, read + 1 处仍是原始数据
        if zeros >= 2 && byte == 0x03 && read + 1 < end && buf[read + 1] <= 0x03 {
            read += 1;
            zeros = 0;
            continue;
        }
        buf[write] = byte;
        write += 1;
        read += 1;
        zeros = if byte == 0x00 { zeros + 1 } else { 0 };
    }

    Stripped {
        end: write,
        removed: end - write,
    }
}

/// 移除 `[offset, end)` 内的防竞争字节, 并把区间之后的数据前移、截短缓冲区
pub fn strip_emulation_bytes_in_place(buf: &mut BytesMut, offset: usize, end: usize) -> Stripped {
    let end = end.min(buf.len());
    let stripped = strip_emulation_bytes(buf, offset, end);
    if stripped.removed > 0 {
        let len = buf.len();
        buf.copy_within(end..len, stripped.end);
        buf.truncate(len - stripped.removed);
    }
    stripped
}
