//! AVC SEI 中的 CEI 识别.
//!
//! ```text
//! 00 00 01 | nal_header(type=6) | payload_type(5) | payload_size ... | UUID(16) | flag ...
//! ```

use super::{SEI_USER_DATA_UNREGISTERED, find_uuid_end};
use crate::parsers::nal::START_CODE_LEN;

const NAL_SEI: u8 = 6;

/// 区间内 payload_type 字节位置 (紧跟 1 字节 NAL 头)
const PAYLOAD_TYPE_POS: usize = START_CODE_LEN + 1;

pub(super) fn is_cei_nal(region: &[u8], nal_type: u8) -> bool {
    nal_type == NAL_SEI && flag_offset(region).is_some()
}

pub(super) fn flag_offset(region: &[u8]) -> Option<usize> {
    if *region.get(PAYLOAD_TYPE_POS)? != SEI_USER_DATA_UNREGISTERED {
        return None;
    }
    find_uuid_end(region, PAYLOAD_TYPE_POS + 1)
}

#[cfg(test)]
mod tests {
    use super::super::CEI_UUID;
    use super::*;

    #[test]
    fn test_avc_flag_offset() {
        let mut region = vec![0x00, 0x00, 0x01, 0x06, 0x05, 0x11];
        region.extend_from_slice(&CEI_UUID);
        region.push(0x80);
        assert_eq!(flag_offset(&region), Some(22));
        assert!(is_cei_nal(&region, 6));
        assert!(!is_cei_nal(&region, 5));

        // payload_type 不是 5
        region[4] = 0x04;
        assert_eq!(flag_offset(&region), None);
        assert_eq!(flag_offset(&region[..4]), None);
    }
}
