//! Fixed image header.
//!
//! ## Header Format
//!
//! All fields are little-endian.
//!
//! | Offset | Size | Field                  |
//! |--------|------|------------------------|
//! | 0      | 4    | magic (`0x96f3b83d`)   |
//! | 4      | 4    | load address           |
//! | 8      | 2    | header size            |
//! | 10     | 2    | protected TLV size     |
//! | 12     | 4    | image size             |
//! | 16     | 4    | flags                  |
//! | 20     | 1    | version major          |
//! | 21     | 1    | version minor          |
//! | 22     | 2    | version revision       |
//! | 24     | 4    | version build number   |
//! | 28     | 4    | padding                |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ImageError, Result};

/// Size of the fixed image header.
pub const IMAGE_HEADER_SIZE: usize = 32;

/// Magic identifying an MCUboot image.
pub const IMAGE_MAGIC: u32 = 0x96f3_b83d;

/// Image version as stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ImageVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Revision.
    pub revision: u16,
    /// Build number.
    pub build_number: u32,
}

impl fmt::Display for ImageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)?;
        if self.build_number != 0 {
            write!(f, "+{}", self.build_number)?;
        }
        Ok(())
    }
}

/// Decoded fixed header of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// Size of the header region preceding the payload.
    pub header_size: u16,
    /// Size of the protected TLV area, zero when absent.
    pub protected_tlv_size: u16,
    /// Size of the payload following the header.
    pub image_size: u32,
    /// Image version.
    pub version: ImageVersion,
}

impl ImageHeader {
    /// Parse and validate the header at the start of `image`.
    ///
    /// Checks are applied in header order and the first failure is returned.
    pub fn parse(image: &[u8]) -> Result<Self> {
        if image.len() < IMAGE_HEADER_SIZE {
            return Err(ImageError::ImageTooShort {
                expected: IMAGE_HEADER_SIZE,
                actual: image.len(),
            });
        }

        let magic = read_u32_le(image, 0);
        if magic != IMAGE_MAGIC {
            return Err(ImageError::BadMagic(magic));
        }

        let load_addr = read_u32_le(image, 4);
        if load_addr != 0 {
            return Err(ImageError::BadLoadAddress(load_addr));
        }

        let header_size = read_u16_le(image, 8);
        let protected_tlv_size = read_u16_le(image, 10);
        let image_size = read_u32_le(image, 12);

        if (image.len() as u64) < image_size as u64 + header_size as u64 {
            return Err(ImageError::BadImageSize {
                header_size,
                image_size,
                actual: image.len(),
            });
        }

        let flags = read_u32_le(image, 16);
        if flags != 0 {
            return Err(ImageError::BadFlags(flags));
        }

        let version = ImageVersion {
            major: image[20],
            minor: image[21],
            revision: read_u16_le(image, 22),
            build_number: read_u32_le(image, 24),
        };

        Ok(ImageHeader {
            header_size,
            protected_tlv_size,
            image_size,
            version,
        })
    }

    /// Offset of the first byte after the payload.
    pub fn payload_end(&self) -> usize {
        self.header_size as usize + self.image_size as usize
    }
}

pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        let mut buf = vec![0u8; IMAGE_HEADER_SIZE];
        buf[0..4].copy_from_slice(&IMAGE_MAGIC.to_le_bytes());
        buf[8..10].copy_from_slice(&(IMAGE_HEADER_SIZE as u16).to_le_bytes());
        buf[20] = 1;
        buf[21] = 2;
        buf[22..24].copy_from_slice(&3u16.to_le_bytes());
        buf[24..28].copy_from_slice(&4u32.to_le_bytes());
        buf
    }

    #[test]
    fn test_parse_header_fields() {
        let header = ImageHeader::parse(&header_bytes()).unwrap();
        assert_eq!(header.header_size, 32);
        assert_eq!(header.protected_tlv_size, 0);
        assert_eq!(header.image_size, 0);
        assert_eq!(
            header.version,
            ImageVersion {
                major: 1,
                minor: 2,
                revision: 3,
                build_number: 4
            }
        );
        assert_eq!(header.payload_end(), 32);
    }

    #[test]
    fn test_image_size_exceeds_buffer() {
        let mut buf = header_bytes();
        buf[12..16].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(
            ImageHeader::parse(&buf),
            Err(ImageError::BadImageSize { image_size: 1, .. })
        ));
    }

    #[test]
    fn test_size_checked_before_flags() {
        let mut buf = header_bytes();
        buf[12..16].copy_from_slice(&100u32.to_le_bytes());
        buf[16] = 1;
        assert!(matches!(
            ImageHeader::parse(&buf),
            Err(ImageError::BadImageSize { .. })
        ));
    }

    #[test]
    fn test_version_display() {
        let v = ImageVersion {
            major: 1,
            minor: 4,
            revision: 12,
            build_number: 0,
        };
        assert_eq!(v.to_string(), "1.4.12");

        let v = ImageVersion {
            build_number: 77,
            ..v
        };
        assert_eq!(v.to_string(), "1.4.12+77");
    }
}
