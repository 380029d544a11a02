//! The system ROM image that the reflash sequence programs and verifies.
//!
//! A [`RomImage`] is immutable once built.  On the board it is compiled into
//! the controller firmware (`RomImage::from_static(include_bytes!(..))`); the
//! host build loads it from a file.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

/// Flash erase granularity.
pub const SECTOR_SIZE: u32 = 4096;
/// Programming progress is reported at this address granularity.
pub const PROGRESS_INTERVAL: u32 = 1024;
/// Size of one bank-switched page in the fabric's address window.
pub const PAGE_SIZE: u32 = 0x4000;
/// Pages reachable through an 8-bit bank-select register.
pub const PAGE_COUNT: u32 = 256;
/// First flash address the bank registers cannot map (4 MiB).
pub const ADDRESSABLE_LIMIT: u32 = PAGE_COUNT * PAGE_SIZE;

/// Errors raised while building a [`RomImage`].
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("ROM image is empty")]
    Empty,

    /// Sector erases are driven by address alignment, so the image must start on a sector.
    #[error("image base 0x{0:05X} is not aligned to a 4096-byte sector")]
    UnalignedBase(u32),

    #[error("image of {len} bytes at 0x{base:05X} runs past the 4 MiB bank-addressable space")]
    OutOfRange { base: u32, len: usize },

    #[error("failed to read ROM image from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Half-open span of flash addresses covered by the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRange {
    pub start: u32,
    pub end: u32,
}

impl ImageRange {
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn addresses(&self) -> Range<u32> {
        self.start..self.end
    }
}

/// Immutable ROM contents plus the flash address of their first byte.
#[derive(Debug, Clone)]
pub struct RomImage {
    base: u32,
    bytes: Arc<[u8]>,
}

impl RomImage {
    /// Builds an image placed at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Empty`] for an empty image,
    /// [`ImageError::UnalignedBase`] if `base` is not sector aligned, and
    /// [`ImageError::OutOfRange`] if the image does not end within
    /// [`ADDRESSABLE_LIMIT`].
    pub fn new(base: u32, bytes: impl Into<Arc<[u8]>>) -> Result<Self, ImageError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if base % SECTOR_SIZE != 0 {
            return Err(ImageError::UnalignedBase(base));
        }
        let len = bytes.len();
        if u32::try_from(len)
            .ok()
            .and_then(|l| base.checked_add(l))
            .map_or(true, |end| end > ADDRESSABLE_LIMIT)
        {
            return Err(ImageError::OutOfRange { base, len });
        }
        Ok(Self { base, bytes })
    }

    /// Wraps an image embedded in the firmware binary.
    ///
    /// # Errors
    ///
    /// See [`RomImage::new`].
    pub fn from_static(base: u32, bytes: &'static [u8]) -> Result<Self, ImageError> {
        Self::new(base, bytes)
    }

    /// Reads an image file.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Io`] if the file cannot be read, otherwise see
    /// [`RomImage::new`].
    pub fn load(base: u32, path: &Path) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path).map_err(|source| ImageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!("read {} byte ROM image from {}", bytes.len(), path.display());
        Self::new(base, bytes)
    }

    pub fn range(&self) -> ImageRange {
        ImageRange {
            start: self.base,
            end: self.base + self.bytes.len() as u32,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterates `(address, byte)` pairs in increasing address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.range().addresses().zip(self.bytes.iter().copied())
    }
}

/// `true` if a sector erase must precede the write at `addr`.
pub fn is_sector_start(addr: u32) -> bool {
    addr % SECTOR_SIZE == 0
}

/// `true` if `addr` is a programming progress heartbeat.
pub fn is_progress_mark(addr: u32) -> bool {
    addr % PROGRESS_INTERVAL == 0
}

/// Splits a flash address into (bank page, offset within the page window).
///
/// Returns `None` for addresses at or above [`ADDRESSABLE_LIMIT`].
pub fn page_and_offset(addr: u32) -> Option<(u8, u16)> {
    let page = u8::try_from(addr / PAGE_SIZE).ok()?;
    Some((page, (addr % PAGE_SIZE) as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_covers_every_byte() {
        let image = RomImage::new(0x1000, vec![1u8, 2, 3]).unwrap();
        assert_eq!(image.range(), ImageRange { start: 0x1000, end: 0x1003 });
        assert_eq!(image.range().len(), 3);
        let pairs: Vec<(u32, u8)> = image.iter().collect();
        assert_eq!(pairs, vec![(0x1000, 1), (0x1001, 2), (0x1002, 3)]);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        assert!(matches!(RomImage::new(0, Vec::new()), Err(ImageError::Empty)));
    }

    #[test]
    fn test_unaligned_base_is_rejected() {
        let result = RomImage::new(0x0800, vec![0u8; 16]);
        assert!(matches!(result, Err(ImageError::UnalignedBase(0x0800))));
    }

    #[test]
    fn test_overflowing_image_is_rejected() {
        let result = RomImage::new(0xFFFF_F000, vec![0u8; 0x2000]);
        assert!(matches!(result, Err(ImageError::OutOfRange { .. })));
    }

    #[test]
    fn test_base_beyond_bank_addressable_space_is_rejected() {
        let result = RomImage::new(ADDRESSABLE_LIMIT, vec![0x42u8; 16]);
        assert!(matches!(
            result,
            Err(ImageError::OutOfRange { base: 0x40_0000, len: 16 })
        ));
    }

    #[test]
    fn test_image_may_end_exactly_at_addressable_limit() {
        let base = ADDRESSABLE_LIMIT - SECTOR_SIZE;
        assert!(RomImage::new(base, vec![0u8; SECTOR_SIZE as usize]).is_ok());
        assert!(matches!(
            RomImage::new(base, vec![0u8; SECTOR_SIZE as usize + 1]),
            Err(ImageError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_from_static_accepts_embedded_bytes() {
        static ROM: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
        let image = RomImage::from_static(0, &ROM).unwrap();
        assert_eq!(image.bytes(), &ROM);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let result = RomImage::load(0, Path::new("/nonexistent/path/system.rom"));
        assert!(matches!(result, Err(ImageError::Io { .. })));
    }

    #[test]
    fn test_sector_and_progress_boundaries() {
        assert!(is_sector_start(0));
        assert!(is_sector_start(0x3000));
        assert!(!is_sector_start(0x0400));
        assert!(is_progress_mark(0x0400));
        assert!(!is_progress_mark(0x0401));
    }

    #[test]
    fn test_page_and_offset_split() {
        assert_eq!(page_and_offset(0x0000), Some((0, 0x0000)));
        assert_eq!(page_and_offset(0x3FFF), Some((0, 0x3FFF)));
        assert_eq!(page_and_offset(0x4000), Some((1, 0x0000)));
        assert_eq!(page_and_offset(0x1_2345), Some((4, 0x2345)));
        assert_eq!(page_and_offset(ADDRESSABLE_LIMIT - 1), Some((255, 0x3FFF)));
        assert_eq!(page_and_offset(ADDRESSABLE_LIMIT), None);
    }
}
