//! CEI 负载解码.
//!
//! # 负载结构
//! ```text
//! flag(8): encryption(1) | next_key_id(1) | drm_descriptor(1) | not_ambiguity(1) | reserved(4)
//! [encryption]     key_id(128)
//! [next_key_id]    next_key_id(128)        // 不使用, 跳过
//!                  iv_len(8) | iv(iv_len*8)
//! [drm_descriptor] reserved(16) | reserved(4) | video_algorithm(4)
//! ```
//!
//! flag 之后的字节可能带有防竞争字节, 解码前先在副本上移除.
//! 任何字段越界都会中止整个解码, 不产生半成品.

use ceinfo_core::{
    BlockPattern, CencAlgorithm, CencDescriptor, CencError, CencResult, CodingType, MAX_IV_LEN,
    MAX_KEY_ID_LEN,
};
use log::debug;

use crate::parsers::emulation::strip_emulation_bytes;

/// CEI 标志字节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CeiFlags {
    /// 本帧是否加密
    pub encryption: bool,
    /// 是否携带下一个 key_id
    pub next_key_id: bool,
    /// 是否携带 DRM 描述 (算法)
    pub drm_descriptor: bool,
    /// 帧数据中不存在需移除的防竞争字节
    pub not_ambiguity: bool,
}

impl CeiFlags {
    /// 从标志字节解析
    pub fn from_byte(byte: u8) -> Self {
        Self {
            encryption: byte & 0x80 != 0,
            next_key_id: byte & 0x40 != 0,
            drm_descriptor: byte & 0x20 != 0,
            not_ambiguity: byte & 0x10 != 0,
        }
    }

    /// 帧数据解密前是否需要移除防竞争字节
    pub fn is_ambiguous(&self) -> bool {
        !self.not_ambiguity
    }
}

/// 解码后的 CEI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CeiInfo {
    /// 标志
    pub flags: CeiFlags,
    /// Key ID, 未加密时为 `None`
    pub key_id: Option<[u8; MAX_KEY_ID_LEN]>,
    iv: [u8; MAX_IV_LEN],
    iv_len: usize,
    /// DRM 描述中的算法与分组模式, 未携带时为 `None`
    pub algorithm: Option<(CencAlgorithm, BlockPattern)>,
}

impl CeiInfo {
    /// IV
    pub fn iv(&self) -> &[u8] {
        &self.iv[..self.iv_len]
    }

    /// 本帧是否需要解密
    pub fn is_encrypted(&self) -> bool {
        self.flags.encryption
            && !matches!(self.algorithm, Some((CencAlgorithm::Unencrypted, _)))
    }

    /// 帧数据解密前是否需要移除防竞争字节
    pub fn is_ambiguous(&self) -> bool {
        self.flags.is_ambiguous()
    }

    /// 写入描述符
    ///
    /// 未携带 DRM 描述时保留 `desc` 原有算法; 原算法为未加密则取 cbcs (AES-CBC 1:9).
    pub fn apply_to(&self, desc: &mut CencDescriptor) -> CencResult<()> {
        if !self.is_encrypted() {
            desc.set_algorithm(CencAlgorithm::Unencrypted, BlockPattern::CBC1);
            return Ok(());
        }
        if let Some(key_id) = &self.key_id {
            desc.set_key_id(key_id)?;
        }
        desc.set_iv(self.iv())?;
        match self.algorithm {
            Some((algorithm, pattern)) => desc.set_algorithm(algorithm, pattern),
            None if !desc.algorithm.is_cbc() => {
                desc.set_algorithm(CencAlgorithm::AesCbc, BlockPattern::CBCS)
            }
            None => {}
        }
        Ok(())
    }
}

/// 视频算法编号映射
pub fn map_video_algorithm(value: u8) -> CencResult<(CencAlgorithm, BlockPattern)> {
    match value {
        0x0 => Ok((CencAlgorithm::Unencrypted, BlockPattern::CBC1)),
        0x1 => Ok((CencAlgorithm::Sm4Cbc, BlockPattern::CBCS)),
        0x2 => Ok((CencAlgorithm::AesCbc, BlockPattern::CBCS)),
        0x3 => Ok((CencAlgorithm::Sm4Cbc, BlockPattern::CBC1)),
        0x5 => Ok((CencAlgorithm::AesCbc, BlockPattern::CBC1)),
        _ => Err(CencError::Unsupported(format!(
            "CEI: 未知视频算法编号, value={value:#x}"
        ))),
    }
}

/// 解码 CEI 区间 (含起始码)
///
/// `region` 不会被修改, 防竞争字节在内部副本上移除.
pub fn decode_cei(region: &[u8], coding_type: CodingType) -> CencResult<CeiInfo> {
    let flag_pos = super::flag_offset(region, coding_type).ok_or_else(|| {
        CencError::InvalidData(format!("{coding_type}: CEI 标识不匹配, len={}", region.len()))
    })?;

    let mut scratch = region.to_vec();
    let mut reader = FieldReader::new(&scratch, flag_pos, coding_type);
    let flags = CeiFlags::from_byte(reader.read_u8("flag")?);
    let body = reader.pos;

    let len = scratch.len();
    let stripped = strip_emulation_bytes(&mut scratch, body, len);
    scratch.truncate(stripped.end);
    if stripped.removed > 0 {
        debug!(
            "{coding_type}: CEI 移除防竞争字节, removed={}",
            stripped.removed
        );
    }

    let mut reader = FieldReader::new(&scratch, body, coding_type);
    if !flags.encryption {
        return Ok(CeiInfo {
            flags,
            algorithm: Some((CencAlgorithm::Unencrypted, BlockPattern::CBC1)),
            ..Default::default()
        });
    }

    let mut key_id = [0u8; MAX_KEY_ID_LEN];
    key_id.copy_from_slice(reader.read_bytes(MAX_KEY_ID_LEN, "key_id")?);
    if flags.next_key_id {
        reader.skip(MAX_KEY_ID_LEN, "next_key_id")?;
    }

    let iv_len = usize::from(reader.read_u8("iv_len")?);
    if iv_len > MAX_IV_LEN {
        return Err(CencError::InvalidData(format!(
            "{coding_type}: CEI iv_len 超限, value={iv_len}, max={MAX_IV_LEN}"
        )));
    }
    let mut iv = [0u8; MAX_IV_LEN];
    iv[..iv_len].copy_from_slice(reader.read_bytes(iv_len, "iv")?);

    let algorithm = if flags.drm_descriptor {
        reader.skip(2, "drm_descriptor")?;
        Some(map_video_algorithm(reader.read_u8("video_algorithm")? & 0x0F)?)
    } else {
        None
    };

    Ok(CeiInfo {
        flags,
        key_id: Some(key_id),
        iv,
        iv_len,
        algorithm,
    })
}

/// 带越界检查的顺序读取
struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
    coding_type: CodingType,
}

impl<'a> FieldReader<'a> {
    fn new(data: &'a [u8], pos: usize, coding_type: CodingType) -> Self {
        Self {
            data,
            pos,
            coding_type,
        }
    }

    fn read_bytes(&mut self, len: usize, name: &str) -> CencResult<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.data.len());
        let Some(end) = end else {
            return Err(CencError::InvalidData(format!(
                "{}: CEI {name} 截断, need={len}, remain={}",
                self.coding_type,
                self.data.len().saturating_sub(self.pos)
            )));
        };
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u8(&mut self, name: &str) -> CencResult<u8> {
        Ok(self.read_bytes(1, name)?[0])
    }

    fn skip(&mut self, len: usize, name: &str) -> CencResult<()> {
        self.read_bytes(len, name).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::super::CEI_UUID;
    use super::*;
    use ceinfo_core::DescriptorMode;

    const KEY_ID: [u8; 16] = [
        0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E,
        0x1F,
    ];

    fn avc_region(flag: u8, body: &[u8]) -> Vec<u8> {
        let mut region = vec![0x00, 0x00, 0x01, 0x06, 0x05, 0x30];
        region.extend_from_slice(&CEI_UUID);
        region.push(flag);
        region.extend_from_slice(body);
        region
    }

    #[test]
    fn test_flags_from_byte() {
        let flags = CeiFlags::from_byte(0xF0);
        assert!(flags.encryption && flags.next_key_id && flags.drm_descriptor);
        assert!(!flags.is_ambiguous());
        let flags = CeiFlags::from_byte(0x80);
        assert!(flags.encryption);
        assert!(!flags.drm_descriptor);
        assert!(flags.is_ambiguous());
    }

    #[test]
    fn test_map_video_algorithm() {
        assert_eq!(
            map_video_algorithm(0x1).unwrap(),
            (CencAlgorithm::Sm4Cbc, BlockPattern::CBCS)
        );
        assert_eq!(
            map_video_algorithm(0x2).unwrap(),
            (CencAlgorithm::AesCbc, BlockPattern::CBCS)
        );
        assert_eq!(
            map_video_algorithm(0x3).unwrap(),
            (CencAlgorithm::Sm4Cbc, BlockPattern::CBC1)
        );
        assert_eq!(
            map_video_algorithm(0x5).unwrap(),
            (CencAlgorithm::AesCbc, BlockPattern::CBC1)
        );
        assert_eq!(
            map_video_algorithm(0x0).unwrap(),
            (CencAlgorithm::Unencrypted, BlockPattern::CBC1)
        );
        assert!(map_video_algorithm(0x4).is_err());
        assert!(map_video_algorithm(0xF).is_err());
    }

    #[test]
    fn test_decode_full_descriptor() {
        let mut body = KEY_ID.to_vec();
        body.push(8);
        body.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        body.extend_from_slice(&[0xFF, 0xFF, 0x02]);
        let info = decode_cei(&avc_region(0xB0, &body), CodingType::Avc).unwrap();
        assert_eq!(info.key_id, Some(KEY_ID));
        assert_eq!(info.iv(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            info.algorithm,
            Some((CencAlgorithm::AesCbc, BlockPattern::CBCS))
        );
        assert!(!info.is_ambiguous());
        assert!(info.is_encrypted());
    }

    #[test]
    fn test_decode_skip_next_key_id() {
        let mut body = KEY_ID.to_vec();
        body.extend_from_slice(&[0xEE; 16]);
        body.push(2);
        body.extend_from_slice(&[0xA1, 0xA2]);
        let info = decode_cei(&avc_region(0xC0, &body), CodingType::Avc).unwrap();
        assert_eq!(info.key_id, Some(KEY_ID));
        assert_eq!(info.iv(), &[0xA1, 0xA2]);
        assert_eq!(info.algorithm, None);
        assert!(info.is_ambiguous());
    }

    #[test]
    fn test_decode_unencrypted_stops_early() {
        let info = decode_cei(&avc_region(0x10, &[]), CodingType::Avc).unwrap();
        assert!(!info.is_encrypted());
        assert_eq!(info.key_id, None);
        assert!(info.iv().is_empty());
    }

    #[test]
    fn test_decode_strip_emulation_in_key_id() {
        // key_id 含 00 00 01, 码流中被转义为 00 00 03 01
        let mut raw_key = [0x20u8; 16];
        raw_key[4] = 0x00;
        raw_key[5] = 0x00;
        raw_key[6] = 0x01;
        let mut body = raw_key[..6].to_vec();
        body.push(0x03);
        body.extend_from_slice(&raw_key[6..]);
        body.push(0);
        let info = decode_cei(&avc_region(0x80, &body), CodingType::Avc).unwrap();
        assert_eq!(info.key_id, Some(raw_key));
        assert!(info.iv().is_empty());
    }

    #[test]
    fn test_decode_iv_overrun() {
        let mut body = KEY_ID.to_vec();
        body.push(16);
        body.extend_from_slice(&[0x01; 4]);
        let err = decode_cei(&avc_region(0x80, &body), CodingType::Avc).expect_err("iv 截断应返回错误");
        let msg = format!("{err}");
        assert!(msg.contains("iv 截断"), "错误信息应包含 iv 截断, actual={msg}");
    }

    #[test]
    fn test_decode_iv_len_too_large() {
        let mut body = KEY_ID.to_vec();
        body.push(17);
        body.extend_from_slice(&[0x01; 17]);
        assert!(decode_cei(&avc_region(0x80, &body), CodingType::Avc).is_err());
    }

    #[test]
    fn test_decode_truncated_key_id() {
        let err = decode_cei(&avc_region(0x80, &[0x01; 10]), CodingType::Avc).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_decode_unknown_algorithm() {
        let mut body = KEY_ID.to_vec();
        body.push(0);
        body.extend_from_slice(&[0x00, 0x00, 0x07]);
        let err = decode_cei(&avc_region(0xA0, &body), CodingType::Avc).unwrap_err();
        assert!(matches!(err, CencError::Unsupported(_)));
    }

    #[test]
    fn test_decode_avs3() {
        let mut region = vec![0x00, 0x00, 0x01, 0xB5, 0xD0, 0xA0];
        region.extend_from_slice(&KEY_ID);
        region.push(16);
        region.extend_from_slice(&[0x5A; 16]);
        region.extend_from_slice(&[0x00, 0x00, 0x01]);
        let info = decode_cei(&region, CodingType::Avs3).unwrap();
        assert_eq!(info.key_id, Some(KEY_ID));
        assert_eq!(info.iv(), &[0x5A; 16]);
        assert_eq!(
            info.algorithm,
            Some((CencAlgorithm::Sm4Cbc, BlockPattern::CBCS))
        );
    }

    #[test]
    fn test_decode_region_mismatch() {
        assert!(decode_cei(&[0x00, 0x00, 0x01, 0x06], CodingType::Avc).is_err());
        assert!(decode_cei(&avc_region(0x80, &[]), CodingType::None).is_err());
    }

    #[test]
    fn test_apply_to_descriptor() {
        let mut body = KEY_ID.to_vec();
        body.push(4);
        body.extend_from_slice(&[9, 9, 9, 9]);
        let info = decode_cei(&avc_region(0x90, &body), CodingType::Avc).unwrap();

        let mut desc = CencDescriptor::new(DescriptorMode::InBandRequired);
        info.apply_to(&mut desc).unwrap();
        assert_eq!(desc.key_id(), &KEY_ID);
        assert_eq!(desc.iv(), &[9, 9, 9, 9]);
        // 未携带 DRM 描述, 默认 cbcs
        assert_eq!(desc.algorithm, CencAlgorithm::AesCbc);
        assert_eq!(desc.pattern, BlockPattern::CBCS);

        let mut base = CencDescriptor::new(DescriptorMode::InBandRequired);
        base.set_algorithm(CencAlgorithm::Sm4Cbc, BlockPattern::CBC1);
        info.apply_to(&mut base).unwrap();
        assert_eq!(base.algorithm, CencAlgorithm::Sm4Cbc);
        assert_eq!(base.pattern, BlockPattern::CBC1);
    }
}
