//! TLV trailer areas.
//!
//! An image is followed by an optional protected TLV area (covered by the
//! image hash) and a mandatory unprotected TLV area. Each area starts with a
//! 4-byte info header followed by entries:
//!
//! ```text
//! +-----------+-----------+----------------------------+
//! | magic u16 | total u16 | entries[total - 4 bytes]   |
//! +-----------+-----------+----------------------------+
//!
//! entry:
//! +---------+---------+-------------+
//! | tag u16 | len u16 | value[len]  |
//! +---------+---------+-------------+
//! ```
//!
//! `total` counts the info header itself. All fields are little-endian.

use crate::error::{ImageError, Result};
use crate::header::read_u16_le;

/// Magic of the unprotected TLV area.
pub const TLV_INFO_MAGIC: u16 = 0x6907;
/// Magic of the protected TLV area.
pub const TLV_PROT_INFO_MAGIC: u16 = 0x6908;
/// Size of an area info header (magic + total length).
pub const TLV_INFO_SIZE: usize = 4;
/// Size of an entry header (tag + length).
pub const TLV_ENTRY_HEADER_SIZE: usize = 4;

// ============================================================================
// Tags
// ============================================================================

/// Hash of the public key used to sign the image.
pub const TLV_KEYHASH: u16 = 0x01;
/// Full public key used to sign the image.
pub const TLV_PUBKEY: u16 = 0x02;
/// SHA-256 of header, payload and protected TLVs.
pub const TLV_SHA256: u16 = 0x10;
/// RSA-2048 PSS signature.
pub const TLV_RSA2048_PSS: u16 = 0x20;
/// ECDSA P-224 signature.
pub const TLV_ECDSA224: u16 = 0x21;
/// ECDSA P-256 signature.
pub const TLV_ECDSA256: u16 = 0x22;
/// RSA-3072 PSS signature.
pub const TLV_RSA3072_PSS: u16 = 0x23;
/// Ed25519 signature.
pub const TLV_ED25519: u16 = 0x24;
/// Key encrypted with RSA-OAEP-2048.
pub const TLV_ENC_RSA2048: u16 = 0x30;
/// Key encrypted with AES-KW.
pub const TLV_ENC_KW: u16 = 0x31;
/// Key encrypted with ECIES-P256.
pub const TLV_ENC_EC256: u16 = 0x32;
/// Key encrypted with ECIES-X25519.
pub const TLV_ENC_X25519: u16 = 0x33;
/// Image dependency.
pub const TLV_DEPENDENCY: u16 = 0x40;
/// Security counter.
pub const TLV_SEC_CNT: u16 = 0x50;

/// Human-readable name of a known tag.
pub fn tag_name(tag: u16) -> Option<&'static str> {
    let name = match tag {
        TLV_KEYHASH => "keyhash",
        TLV_PUBKEY => "pubkey",
        TLV_SHA256 => "sha256",
        TLV_RSA2048_PSS => "rsa2048-pss",
        TLV_ECDSA224 => "ecdsa224",
        TLV_ECDSA256 => "ecdsa256",
        TLV_RSA3072_PSS => "rsa3072-pss",
        TLV_ED25519 => "ed25519",
        TLV_ENC_RSA2048 => "enc-rsa2048",
        TLV_ENC_KW => "enc-kw",
        TLV_ENC_EC256 => "enc-ec256",
        TLV_ENC_X25519 => "enc-x25519",
        TLV_DEPENDENCY => "dependency",
        TLV_SEC_CNT => "sec-cnt",
        _ => return None,
    };
    Some(name)
}

/// A single TLV entry borrowed from the image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvEntry<'a> {
    /// Entry tag.
    pub tag: u16,
    /// Entry value.
    pub value: &'a [u8],
}

/// Which trailer area is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvArea {
    /// Area covered by the image hash.
    Protected,
    /// Trailing area not covered by the hash.
    Unprotected,
}

impl TlvArea {
    /// Magic expected at the start of this area.
    pub fn magic(self) -> u16 {
        match self {
            TlvArea::Protected => TLV_PROT_INFO_MAGIC,
            TlvArea::Unprotected => TLV_INFO_MAGIC,
        }
    }

    fn magic_error(self, offset: usize, found: Option<u16>) -> ImageError {
        match self {
            TlvArea::Protected => ImageError::BadProtectedTlvMagic { offset, found },
            TlvArea::Unprotected => ImageError::BadTlvMagic { offset, found },
        }
    }
}

/// Read the TLV area of `kind` starting at `base`.
///
/// Returns the entries and the offset just past the area.
pub fn read_area(image: &[u8], base: usize, kind: TlvArea) -> Result<(Vec<TlvEntry<'_>>, usize)> {
    if base + TLV_INFO_SIZE > image.len() {
        let found = (base + 2 <= image.len()).then(|| read_u16_le(image, base));
        return Err(kind.magic_error(base, found));
    }

    let magic = read_u16_le(image, base);
    if magic != kind.magic() {
        return Err(kind.magic_error(base, Some(magic)));
    }

    let total = read_u16_le(image, base + 2) as usize;
    if total < TLV_INFO_SIZE {
        return Err(ImageError::bad_tlv(
            base,
            format!("area length {} shorter than its header", total),
        ));
    }
    let end = base + total;
    if end > image.len() {
        return Err(ImageError::bad_tlv(
            base,
            format!("area length {} runs past end of image", total),
        ));
    }

    let entries = read_entries(image, base + TLV_INFO_SIZE, end)?;
    Ok((entries, end))
}

/// Iterate TLV entries in `image[start..end]`.
pub fn read_entries(image: &[u8], start: usize, end: usize) -> Result<Vec<TlvEntry<'_>>> {
    let mut entries = Vec::new();
    let mut pos = start;

    while pos < end {
        if pos + TLV_ENTRY_HEADER_SIZE > end {
            return Err(ImageError::bad_tlv(pos, "truncated entry header"));
        }
        let tag = read_u16_le(image, pos);
        let len = read_u16_le(image, pos + 2) as usize;
        let value_start = pos + TLV_ENTRY_HEADER_SIZE;
        if value_start + len > end {
            return Err(ImageError::bad_tlv(
                pos,
                format!("entry 0x{:02x} of {} bytes overruns area", tag, len),
            ));
        }
        entries.push(TlvEntry {
            tag,
            value: &image[value_start..value_start + len],
        });
        pos = value_start + len;
    }

    Ok(entries)
}
