//! CENC 描述符数据模型.
//!
//! 描述符交给外部安全解密服务, 因此所有字段使用定长数组加显式长度,
//! 并以 `#[repr(C)]` 固定内存布局.
//!
//! # 子样本
//!
//! 每个子样本先是 `clear_header_len` 字节明文, 随后是 `payload_len` 字节密文:
//! ```text
//! ┌──────────────┬────────────────┐┌──────────────┬────────────────┐
//! │ clear header │ encrypted data ││ clear header │ encrypted data │ ...
//! └──────────────┴────────────────┘└──────────────┴────────────────┘
//! ```

use std::fmt;

use crate::error::{CencError, CencResult};

/// Key ID 最大长度 (字节)
pub const MAX_KEY_ID_LEN: usize = 16;

/// IV 最大长度 (字节)
pub const MAX_IV_LEN: usize = 16;

/// 描述符可容纳的子样本上限
pub const MAX_SUBSAMPLES: usize = 64;

/// 加密算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum CencAlgorithm {
    /// 未加密
    #[default]
    Unencrypted = 0,
    /// AES-CTR (仅音频)
    AesCtr = 1,
    /// AES-CBC
    AesCbc = 2,
    /// SM4-CBC
    Sm4Cbc = 3,
    /// SM4-CTR (仅音频)
    Sm4Ctr = 4,
}

impl CencAlgorithm {
    /// 是否为 CBC 模式
    pub const fn is_cbc(&self) -> bool {
        matches!(self, Self::AesCbc | Self::Sm4Cbc)
    }

    /// 是否为 CTR 模式
    pub const fn is_ctr(&self) -> bool {
        matches!(self, Self::AesCtr | Self::Sm4Ctr)
    }

    /// 是否需要解密
    pub const fn is_encrypted(&self) -> bool {
        !matches!(self, Self::Unencrypted)
    }
}

impl fmt::Display for CencAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unencrypted => "unencrypted",
            Self::AesCtr => "aes-ctr",
            Self::AesCbc => "aes-cbc",
            Self::Sm4Cbc => "sm4-cbc",
            Self::Sm4Ctr => "sm4-ctr",
        };
        f.write_str(name)
    }
}

/// 分组加密模式 (以 16 字节块为单位)
///
/// 仅在算法不是 [`CencAlgorithm::Unencrypted`] 时有意义.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct BlockPattern {
    /// 每轮加密的块数
    pub encrypt_blocks: u32,
    /// 每轮跳过的块数
    pub skip_blocks: u32,
}

impl BlockPattern {
    /// cbcs: 加密 1 块, 跳过 9 块
    pub const CBCS: Self = Self::new(1, 9);

    /// cbc1: 无跳过模式, 整段加密
    pub const CBC1: Self = Self::new(0, 0);

    /// 创建分组模式
    pub const fn new(encrypt_blocks: u32, skip_blocks: u32) -> Self {
        Self {
            encrypt_blocks,
            skip_blocks,
        }
    }

    /// 是否为整段加密 (无跳过模式)
    pub const fn is_full(&self) -> bool {
        self.encrypt_blocks == 0 && self.skip_blocks == 0
    }
}

/// 子样本: 明文头长度 + 密文长度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Subsample {
    /// 明文字节数
    pub clear_header_len: u32,
    /// 紧随其后的密文字节数
    pub payload_len: u32,
}

impl Subsample {
    /// 创建子样本
    pub const fn new(clear_header_len: u32, payload_len: u32) -> Self {
        Self {
            clear_header_len,
            payload_len,
        }
    }

    /// 子样本覆盖的总字节数
    pub const fn total_len(&self) -> u64 {
        self.clear_header_len as u64 + self.payload_len as u64
    }
}

/// 描述符来源模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum DescriptorMode {
    /// 容器已提供完整的 key/iv/子样本信息, 无需带内解析
    ContainerSupplied = 0,
    /// 需要 (或已经) 从码流带内解析
    #[default]
    InBandRequired = 1,
}

/// CENC 描述符
///
/// 每个访问单元新建一份, 交给解密服务后不再修改.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CencDescriptor {
    /// 加密算法
    pub algorithm: CencAlgorithm,
    /// 分组模式
    pub pattern: BlockPattern,
    key_id: [u8; MAX_KEY_ID_LEN],
    key_id_len: u32,
    iv: [u8; MAX_IV_LEN],
    iv_len: u32,
    subsamples: [Subsample; MAX_SUBSAMPLES],
    subsample_count: u32,
    /// 来源模式
    pub mode: DescriptorMode,
}

impl Default for CencDescriptor {
    fn default() -> Self {
        Self::new(DescriptorMode::default())
    }
}

impl CencDescriptor {
    /// 创建空描述符 (未加密, 无子样本)
    pub fn new(mode: DescriptorMode) -> Self {
        Self {
            algorithm: CencAlgorithm::Unencrypted,
            pattern: BlockPattern::default(),
            key_id: [0; MAX_KEY_ID_LEN],
            key_id_len: 0,
            iv: [0; MAX_IV_LEN],
            iv_len: 0,
            subsamples: [Subsample::default(); MAX_SUBSAMPLES],
            subsample_count: 0,
            mode,
        }
    }

    /// 创建覆盖整个缓冲区的明文描述符
    pub fn clear(len: u32, mode: DescriptorMode) -> Self {
        let mut desc = Self::new(mode);
        desc.subsamples[0] = Subsample::new(len, 0);
        desc.subsample_count = 1;
        desc
    }

    /// 设置算法与分组模式
    pub fn set_algorithm(&mut self, algorithm: CencAlgorithm, pattern: BlockPattern) {
        self.algorithm = algorithm;
        self.pattern = pattern;
    }

    /// Key ID
    pub fn key_id(&self) -> &[u8] {
        &self.key_id[..self.key_id_len as usize]
    }

    /// 设置 Key ID, 超过 16 字节返回错误
    pub fn set_key_id(&mut self, key_id: &[u8]) -> CencResult<()> {
        if key_id.len() > MAX_KEY_ID_LEN {
            return Err(CencError::InvalidArgument(format!(
                "key_id 长度超限, len={}, max={MAX_KEY_ID_LEN}",
                key_id.len()
            )));
        }
        self.key_id = [0; MAX_KEY_ID_LEN];
        self.key_id[..key_id.len()].copy_from_slice(key_id);
        self.key_id_len = key_id.len() as u32;
        Ok(())
    }

    /// IV
    pub fn iv(&self) -> &[u8] {
        &self.iv[..self.iv_len as usize]
    }

    /// 设置 IV, 超过 16 字节返回错误
    pub fn set_iv(&mut self, iv: &[u8]) -> CencResult<()> {
        if iv.len() > MAX_IV_LEN {
            return Err(CencError::InvalidArgument(format!(
                "iv 长度超限, len={}, max={MAX_IV_LEN}",
                iv.len()
            )));
        }
        self.iv = [0; MAX_IV_LEN];
        self.iv[..iv.len()].copy_from_slice(iv);
        self.iv_len = iv.len() as u32;
        Ok(())
    }

    /// 已填写的子样本
    pub fn subsamples(&self) -> &[Subsample] {
        &self.subsamples[..self.subsample_count as usize]
    }

    /// 追加子样本
    pub fn push_subsample(&mut self, subsample: Subsample) -> CencResult<()> {
        let count = self.subsample_count as usize;
        if count >= MAX_SUBSAMPLES {
            return Err(CencError::InvalidArgument(format!(
                "子样本数量超限, max={MAX_SUBSAMPLES}"
            )));
        }
        self.subsamples[count] = subsample;
        self.subsample_count += 1;
        Ok(())
    }

    /// 清空子样本
    pub fn clear_subsamples(&mut self) {
        self.subsamples = [Subsample::default(); MAX_SUBSAMPLES];
        self.subsample_count = 0;
    }

    /// 以新的子样本序列替换现有子样本
    pub fn set_subsamples(&mut self, subsamples: &[Subsample]) -> CencResult<()> {
        if subsamples.len() > MAX_SUBSAMPLES {
            return Err(CencError::InvalidArgument(format!(
                "子样本数量超限, len={}, max={MAX_SUBSAMPLES}",
                subsamples.len()
            )));
        }
        self.clear_subsamples();
        self.subsamples[..subsamples.len()].copy_from_slice(subsamples);
        self.subsample_count = subsamples.len() as u32;
        Ok(())
    }

    /// 所有子样本覆盖的总字节数
    pub fn total_len(&self) -> u64 {
        self.subsamples().iter().map(Subsample::total_len).sum()
    }
}
