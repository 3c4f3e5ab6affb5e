//! MCUboot firmware image parsing.
//!
//! This crate validates a firmware image before it is uploaded and
//! describes it: fixed header, version, TLV trailer entries and the
//! content hash the bootloader will check.
//!
//! ```text
//! +--------+-----------+---------------------+-----------------------+
//! | header | payload   | protected TLV area  | unprotected TLV area  |
//! +--------+-----------+---------------------+-----------------------+
//! |<------------- hashed ----------------->|
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let descriptor = mcuboot_image::parse(&std::fs::read("zephyr.signed.bin")?)?;
//! println!("{} {}", descriptor.version, descriptor.hash_hex());
//! if !descriptor.hash_valid {
//!     // caller decides whether to refuse the upload
//! }
//! ```

mod error;
mod hash;
mod header;
pub mod tlv;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use error::{ImageError, Result};
pub use hash::{sha256, ImageHash, HASH_SIZE};
pub use header::{ImageHeader, ImageVersion, IMAGE_HEADER_SIZE, IMAGE_MAGIC};
pub use tlv::{TlvArea, TlvEntry};

/// Description of a parsed image. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Size of the header region.
    pub header_size: u16,
    /// Size of the payload.
    pub image_size: u32,
    /// Size of the protected TLV area, zero when absent.
    pub protected_tlv_area_size: u16,
    /// Image version.
    pub version: ImageVersion,
    /// SHA-256 over header, payload and protected TLV area.
    pub computed_hash: ImageHash,
    /// True when the trailer carries a SHA-256 TLV equal to `computed_hash`.
    pub hash_valid: bool,
    /// TLV values by tag. Unprotected entries replace protected ones of the same tag.
    pub tags: BTreeMap<u16, Vec<u8>>,
}

impl ImageDescriptor {
    /// Value of a TLV tag, if present.
    pub fn tag(&self, tag: u16) -> Option<&[u8]> {
        self.tags.get(&tag).map(Vec::as_slice)
    }

    /// Computed hash as lowercase hex.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.computed_hash)
    }

    /// Number of bytes covered by the hash.
    pub fn hashed_size(&self) -> usize {
        self.header_size as usize + self.image_size as usize + self.protected_tlv_area_size as usize
    }
}

/// Parse and validate a firmware image.
///
/// Fails on the first structural violation. A missing or mismatching hash
/// TLV does not fail; it is reported through
/// [`ImageDescriptor::hash_valid`].
pub fn parse(image: &[u8]) -> Result<ImageDescriptor> {
    let header = ImageHeader::parse(image)?;
    let payload_end = header.payload_end();
    let hashed_end = payload_end + header.protected_tlv_size as usize;

    let mut tags = BTreeMap::new();

    if header.protected_tlv_size > 0 {
        let (entries, _) = tlv::read_area(image, payload_end, TlvArea::Protected)?;
        if hashed_end > image.len() {
            return Err(ImageError::bad_tlv(
                payload_end,
                format!(
                    "protected TLV size {} runs past end of image",
                    header.protected_tlv_size
                ),
            ));
        }
        for entry in entries {
            tags.insert(entry.tag, entry.value.to_vec());
        }
    }

    let computed_hash = sha256(&image[..hashed_end]);

    let (entries, _) = tlv::read_area(image, hashed_end, TlvArea::Unprotected)?;
    for entry in entries {
        tags.insert(entry.tag, entry.value.to_vec());
    }

    let hash_valid = match tags.get(&tlv::TLV_SHA256) {
        Some(value) if value.len() == HASH_SIZE => value.as_slice() == computed_hash.as_slice(),
        _ => false,
    };

    Ok(ImageDescriptor {
        header_size: header.header_size,
        image_size: header.image_size,
        protected_tlv_area_size: header.protected_tlv_size,
        version: header.version,
        computed_hash,
        hash_valid,
        tags,
    })
}
