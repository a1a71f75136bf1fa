//! 安全解密服务使用的缓冲区句柄.
//!
//! 句柄只描述内存, 不持有数据; 数据的读写由外部解密服务完成.

use bitflags::bitflags;

/// 缓冲区后备存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum BufferBacking {
    /// 进程内虚拟内存
    #[default]
    Virtual = 0,
    /// 共享内存 (通过文件描述符传递)
    SharedMemory = 1,
    /// 图形 Surface
    Surface = 2,
}

bitflags! {
    /// 缓冲区访问标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemoryFlags: u32 {
        /// 可读
        const READ = 1 << 0;
        /// 可写
        const WRITE = 1 << 1;
        /// 安全内存 (仅 TEE 可访问)
        const SECURE = 1 << 2;
        /// 读写
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// 缓冲区句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferHandle {
    /// 后备存储类型
    pub backing: BufferBacking,
    /// 文件描述符, 虚拟内存为 `None`
    pub fd: Option<i32>,
    /// 有效数据长度
    pub length: u32,
    /// 已分配长度
    pub allocated_length: u32,
    /// 数据在后备存储中的偏移
    pub offset: u32,
    /// 访问标志
    pub flags: MemoryFlags,
}

impl BufferHandle {
    /// 创建虚拟内存句柄
    pub fn virtual_memory(length: u32, allocated_length: u32) -> Self {
        Self {
            backing: BufferBacking::Virtual,
            fd: None,
            length,
            allocated_length,
            offset: 0,
            flags: MemoryFlags::READ_WRITE,
        }
    }

    /// 创建共享内存句柄
    pub fn shared_memory(fd: i32, length: u32, allocated_length: u32, flags: MemoryFlags) -> Self {
        Self {
            backing: BufferBacking::SharedMemory,
            fd: Some(fd),
            length,
            allocated_length,
            offset: 0,
            flags,
        }
    }

    /// 有效数据是否落在已分配范围内
    pub fn is_consistent(&self) -> bool {
        u64::from(self.offset) + u64::from(self.length) <= u64::from(self.allocated_length)
    }
}
