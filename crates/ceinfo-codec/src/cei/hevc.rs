//! HEVC PREFIX_SEI 中的 CEI 识别.

use super::{SEI_USER_DATA_UNREGISTERED, find_uuid_end};
use crate::parsers::nal::START_CODE_LEN;

const NAL_PREFIX_SEI: u8 = 39;

/// HEVC NAL 头为 2 字节, payload_type 位于区间第 5 字节
const PAYLOAD_TYPE_POS: usize = START_CODE_LEN + 2;

pub(super) fn is_cei_nal(region: &[u8], nal_type: u8) -> bool {
    nal_type == NAL_PREFIX_SEI && flag_offset(region).is_some()
}

pub(super) fn flag_offset(region: &[u8]) -> Option<usize> {
    if *region.get(PAYLOAD_TYPE_POS)? != SEI_USER_DATA_UNREGISTERED {
        return None;
    }
    find_uuid_end(region, PAYLOAD_TYPE_POS + 1)
}
