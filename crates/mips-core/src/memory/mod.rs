//! Byte-addressable address space built from disjoint memory regions.

/// Alignment policy helpers.
pub mod access;
/// Standard region map and address decoder.
pub mod map;

pub use access::{validate_alignment, validate_word_alignment, AccessWidth};
pub use map::{
    decode_memory_region, MemoryRegion, RegionDescriptor, DATA_END, DATA_START, KDATA_END,
    KDATA_START, KTEXT_END, KTEXT_START, MIPS_MEMORY_REGIONS, REGION_BYTES, STACK_END,
    STACK_START, TEXT_END, TEXT_START,
};

use thiserror::Error;

use crate::FaultCode;

/// Rejected region table passed to [`AddressSpace::with_regions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LayoutError {
    /// A descriptor's `end` is below its `start`.
    #[error("region {region:?} has end {end:#010x} below start {start:#010x}")]
    InvertedBounds {
        /// Offending region.
        region: MemoryRegion,
        /// Inclusive start address.
        start: u32,
        /// Inclusive end address.
        end: u32,
    },
    /// A descriptor does not start on a word boundary or does not span whole words.
    #[error("region {region:?} is not word aligned")]
    Misaligned {
        /// Offending region.
        region: MemoryRegion,
    },
    /// Two descriptors share at least one address.
    #[error("regions {first:?} and {second:?} overlap")]
    Overlapping {
        /// Earlier descriptor in the table.
        first: MemoryRegion,
        /// Later descriptor in the table.
        second: MemoryRegion,
    },
    /// The table has no text region to load programs into.
    #[error("layout has no text region")]
    MissingText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
struct RegionBuffer {
    descriptor: RegionDescriptor,
    bytes: Box<[u8]>,
}

impl RegionBuffer {
    fn new(descriptor: RegionDescriptor) -> Self {
        Self {
            descriptor,
            bytes: vec![0; descriptor.len_bytes()].into_boxed_slice(),
        }
    }
}

/// Ordered set of disjoint little-endian memory regions.
///
/// Reads from addresses outside every region return zero and writes to them
/// are dropped. This keeps the model total; it is not reported as a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AddressSpace {
    regions: Vec<RegionBuffer>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::standard()
    }
}

impl AddressSpace {
    /// Allocates the five standard zeroed regions.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            regions: MIPS_MEMORY_REGIONS
                .iter()
                .copied()
                .map(RegionBuffer::new)
                .collect(),
        }
    }

    /// Allocates zeroed regions for a custom layout.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] when a descriptor has inverted bounds, is not
    /// word aligned, or overlaps another descriptor.
    pub fn with_regions(descriptors: &[RegionDescriptor]) -> Result<Self, LayoutError> {
        for (index, descriptor) in descriptors.iter().enumerate() {
            if descriptor.end < descriptor.start {
                return Err(LayoutError::InvertedBounds {
                    region: descriptor.region,
                    start: descriptor.start,
                    end: descriptor.end,
                });
            }
            if descriptor.start % 4 != 0 || descriptor.len_bytes() % 4 != 0 {
                return Err(LayoutError::Misaligned {
                    region: descriptor.region,
                });
            }
            if let Some(other) = descriptors[..index].iter().find(|d| d.overlaps(descriptor)) {
                return Err(LayoutError::Overlapping {
                    first: other.region,
                    second: descriptor.region,
                });
            }
        }

        Ok(Self {
            regions: descriptors.iter().copied().map(RegionBuffer::new).collect(),
        })
    }

    /// Iterates over the region descriptors in table order.
    pub fn descriptors(&self) -> impl Iterator<Item = RegionDescriptor> + '_ {
        self.regions.iter().map(|region| region.descriptor)
    }

    /// Returns the first descriptor labelled `kind`.
    #[must_use]
    pub fn region(&self, kind: MemoryRegion) -> Option<RegionDescriptor> {
        self.descriptors().find(|descriptor| descriptor.region == kind)
    }

    /// Returns the region containing `addr`, if any.
    #[must_use]
    pub fn region_at(&self, addr: u32) -> Option<RegionDescriptor> {
        self.descriptors().find(|descriptor| descriptor.contains(addr))
    }

    /// Returns `true` when `addr` falls inside some region.
    #[must_use]
    pub fn is_mapped(&self, addr: u32) -> bool {
        self.region_at(addr).is_some()
    }

    /// Zeroes every region in place.
    pub fn clear(&mut self) {
        for region in &mut self.regions {
            region.bytes.fill(0);
        }
    }

    fn locate(&self, addr: u32, width: AccessWidth) -> Option<&[u8]> {
        let region = self
            .regions
            .iter()
            .find(|region| region.descriptor.contains(addr))?;
        let offset = (addr - region.descriptor.start) as usize;
        region
            .bytes
            .get(offset..offset + width.bytes() as usize)
    }

    fn locate_mut(&mut self, addr: u32, width: AccessWidth) -> Option<&mut [u8]> {
        let region = self
            .regions
            .iter_mut()
            .find(|region| region.descriptor.contains(addr))?;
        let offset = (addr - region.descriptor.start) as usize;
        region
            .bytes
            .get_mut(offset..offset + width.bytes() as usize)
    }

    /// Reads a naturally aligned value of `width`, zero-extended to 32 bits.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnalignedAccess`] when `addr` is not aligned to
    /// `width`.
    pub fn read(&self, addr: u32, width: AccessWidth) -> Result<u32, FaultCode> {
        validate_alignment(addr, width)?;
        Ok(self.locate(addr, width).map_or(0, |bytes| {
            bytes
                .iter()
                .rev()
                .fold(0_u32, |acc, byte| (acc << 8) | u32::from(*byte))
        }))
    }

    /// Writes the low `width` bytes of `value` at a naturally aligned address.
    ///
    /// Bytes outside the access are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnalignedAccess`] when `addr` is not aligned to
    /// `width`.
    pub fn write(&mut self, addr: u32, width: AccessWidth, value: u32) -> Result<(), FaultCode> {
        validate_alignment(addr, width)?;
        if let Some(bytes) = self.locate_mut(addr, width) {
            let len = bytes.len();
            bytes.copy_from_slice(&value.to_le_bytes()[..len]);
        }
        Ok(())
    }

    /// Reads one byte; unmapped addresses read zero.
    #[must_use]
    pub fn read8(&self, addr: u32) -> u8 {
        self.locate(addr, AccessWidth::Byte)
            .and_then(|bytes| bytes.first().copied())
            .unwrap_or(0)
    }

    /// Writes one byte; unmapped addresses are ignored.
    pub fn write8(&mut self, addr: u32, value: u8) {
        if let Some(bytes) = self.locate_mut(addr, AccessWidth::Byte) {
            bytes.fill(value);
        }
    }

    /// Reads an aligned little-endian halfword.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnalignedAccess`] when `addr` is odd.
    pub fn read16(&self, addr: u32) -> Result<u16, FaultCode> {
        let value = self.read(addr, AccessWidth::Half)?;
        Ok(u16::try_from(value).unwrap_or_default())
    }

    /// Writes an aligned little-endian halfword.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnalignedAccess`] when `addr` is odd.
    pub fn write16(&mut self, addr: u32, value: u16) -> Result<(), FaultCode> {
        self.write(addr, AccessWidth::Half, u32::from(value))
    }

    /// Reads an aligned little-endian word.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnalignedAccess`] when `addr` is not a multiple of 4.
    pub fn read32(&self, addr: u32) -> Result<u32, FaultCode> {
        self.read(addr, AccessWidth::Word)
    }

    /// Writes an aligned little-endian word.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnalignedAccess`] when `addr` is not a multiple of 4.
    pub fn write32(&mut self, addr: u32, value: u32) -> Result<(), FaultCode> {
        self.write(addr, AccessWidth::Word, value)
    }

    /// Fetches the instruction word at `addr`.
    ///
    /// Unlike data reads, fetching outside every region is a fault.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnalignedAccess`] for a misaligned `addr` and
    /// [`FaultCode::UnmappedFetch`] when no region contains it.
    pub fn fetch(&self, addr: u32) -> Result<u32, FaultCode> {
        validate_word_alignment(addr)?;
        if !self.is_mapped(addr) {
            return Err(FaultCode::UnmappedFetch);
        }
        self.read32(addr)
    }
}
