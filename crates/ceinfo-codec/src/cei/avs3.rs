//! AVS3 extension_and_user_data 中的 CENC 扩展识别.
//!
//! ```text
//! 00 00 01 | B5 | D? | flag ...
//! ```
//! 该位置没有其他竞争的负载类型, 不做 UUID 校验.

use crate::parsers::nal::START_CODE_LEN;

const EXTENSION_AND_USER_DATA: u8 = 0xB5;
const CENC_EXTENSION_ID: u8 = 0xD0;

pub(super) fn is_cei_nal(region: &[u8]) -> bool {
    region.get(START_CODE_LEN) == Some(&EXTENSION_AND_USER_DATA)
        && region
            .get(START_CODE_LEN + 1)
            .is_some_and(|b| b & 0xF0 == CENC_EXTENSION_ID)
}

/// 加密标志位于 0xB5 之后第 2 字节
pub(super) fn flag_offset(region: &[u8]) -> Option<usize> {
    is_cei_nal(region).then_some(START_CODE_LEN + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avs3_cenc_extension() {
        let region = [0x00, 0x00, 0x01, 0xB5, 0xD3, 0x80];
        assert!(is_cei_nal(&region));
        assert_eq!(flag_offset(&region), Some(5));

        let user_data = [0x00, 0x00, 0x01, 0xB5, 0x20, 0x80];
        assert!(!is_cei_nal(&user_data));
        assert!(!is_cei_nal(&[0x00, 0x00, 0x01, 0xB5]));
    }
}
