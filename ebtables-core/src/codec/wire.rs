//! Wire layout constants for the flat relocatable blob (spec §4.2).
//!
//! The blob is a flat byte buffer holding, in order: every populated
//! standard chain (ascending hook index) followed by every UDC (creation
//! order), each as a chain header immediately followed by its entries.
//! A one-byte discriminator at the start of every header/entry lets a
//! single forward pass tell the two apart without needing an external
//! index (mirrors the kernel's `ebt_entries`/`ebt_entry` union-by-position
//! layout in `ebtables_u.h`, simplified to an explicit tag byte since we
//! don't need bit-for-bit compatibility with the kernel ABI).

/// Tag byte at the start of a chain header.
pub const TAG_CHAIN: u8 = 0;
/// Tag byte at the start of a rule entry.
pub const TAG_ENTRY: u8 = 1;

/// Chain header, fixed portion (tag, hook_mask, policy, entry_count, name_len):
/// `1 + 4 + 4 + 4 + 1 = 14` bytes, followed by `name_len` bytes of UTF-8 name.
pub const CHAIN_HEADER_FIXED_LEN: usize = 1 + 4 + 4 + 4 + 1;

/// Policy encoding within a chain header: UDCs store [`POLICY_NONE`].
pub const POLICY_ACCEPT: i32 = -1;
pub const POLICY_DROP: i32 = -2;
pub const POLICY_NONE: i32 = 0;

/// Entry fixed portion: tag, bitmask, invflags, ethproto, 4 interface name
/// fields (16 bytes each), 4 MAC addresses (6 bytes each), watchers_offset,
/// target_offset, next_offset, packet counter, byte counter. Matches,
/// watchers, and the target follow immediately after, variable-length.
pub const ENTRY_FIXED_LEN: usize = 1 + 4 + 4 + 2 + (16 * 4) + (6 * 4) + 4 + 4 + 4 + 8 + 8;

/// Sentinel `next_offset` value meaning "this is the chain's last entry".
pub const NO_NEXT: u32 = u32::MAX;

use crate::error::{EbtError, Result};
use crate::model::{IFNAME_WIRE_LEN, InterfaceName, NAME_MAXLEN, NAME_WIRE_LEN, WILDCARD_BYTE};

/// Encode a chain/extension name into a fixed [`NAME_WIRE_LEN`]-byte,
/// NUL-terminated field.
pub fn encode_name_field(name: &str) -> Result<[u8; NAME_WIRE_LEN]> {
    if name.len() > NAME_MAXLEN {
        return Err(EbtError::Config(format!(
            "name '{name}' exceeds {NAME_MAXLEN} bytes"
        )));
    }
    let mut out = [0u8; NAME_WIRE_LEN];
    out[..name.len()].copy_from_slice(name.as_bytes());
    Ok(out)
}

/// Decode a fixed-width name field, stopping at the first NUL.
pub fn decode_name_field(bytes: &[u8]) -> Result<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8(bytes[..end].to_vec())
        .map_err(|_| EbtError::Corrupt("name field is not valid UTF-8".to_string()))
}

/// Encode an interface name field the way the kernel does: the prefix
/// bytes, then (if wildcarded) a single [`WILDCARD_BYTE`] marker, the rest
/// NUL-padded to [`super::super::model::IFNAME_WIRE_LEN`] bytes.
pub fn encode_ifname_field(iface: &InterfaceName) -> Result<[u8; IFNAME_WIRE_LEN]> {
    let prefix = iface.prefix();
    let marker_len = if iface.has_wildcard() { 1 } else { 0 };
    if prefix.len() + marker_len >= IFNAME_WIRE_LEN {
        return Err(EbtError::Config(format!(
            "interface name '{iface}' does not fit in {IFNAME_WIRE_LEN} bytes"
        )));
    }
    let mut out = [0u8; IFNAME_WIRE_LEN];
    out[..prefix.len()].copy_from_slice(prefix.as_bytes());
    if iface.has_wildcard() {
        out[prefix.len()] = WILDCARD_BYTE;
    }
    Ok(out)
}

/// Decode an interface name field, recognizing the trailing
/// [`WILDCARD_BYTE`] marker before the NUL padding.
pub fn decode_ifname_field(bytes: &[u8]) -> Result<InterfaceName> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let content = &bytes[..end];
    let (prefix_bytes, wildcard) = match content.split_last() {
        Some((&last, rest)) if last == WILDCARD_BYTE => (rest, true),
        _ => (content, false),
    };
    let prefix = String::from_utf8(prefix_bytes.to_vec())
        .map_err(|_| EbtError::Corrupt("interface name field is not valid UTF-8".to_string()))?;
    let rendered = if wildcard { format!("{prefix}+") } else { prefix };
    InterfaceName::parse(&rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_field_round_trips() {
        let field = encode_name_field("INPUT").unwrap();
        assert_eq!(decode_name_field(&field).unwrap(), "INPUT");
    }

    #[test]
    fn ifname_field_round_trips_wildcard() {
        let iface = InterfaceName::parse("eth+").unwrap();
        let field = encode_ifname_field(&iface).unwrap();
        let decoded = decode_ifname_field(&field).unwrap();
        assert_eq!(decoded, iface);
    }

    #[test]
    fn ifname_field_round_trips_exact() {
        let iface = InterfaceName::parse("eth0").unwrap();
        let field = encode_ifname_field(&iface).unwrap();
        let decoded = decode_ifname_field(&field).unwrap();
        assert_eq!(decoded, iface);
    }
}
