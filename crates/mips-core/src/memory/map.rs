//! Standard MIPS memory-region map and decoding helpers.

/// Size in bytes of each standard region (1 MiB).
pub const REGION_BYTES: u32 = 0x0010_0000;

/// Inclusive start address of the text segment.
pub const TEXT_START: u32 = 0x0040_0000;
/// Inclusive end address of the text segment.
pub const TEXT_END: u32 = TEXT_START + REGION_BYTES - 1;
/// Inclusive start address of the data segment.
pub const DATA_START: u32 = 0x1000_0000;
/// Inclusive end address of the data segment.
pub const DATA_END: u32 = DATA_START + REGION_BYTES - 1;
/// Inclusive start address of the stack segment.
pub const STACK_START: u32 = 0x7FF0_0000;
/// Inclusive end address of the stack segment.
pub const STACK_END: u32 = STACK_START + REGION_BYTES - 1;
/// Inclusive start address of the kernel text segment.
pub const KTEXT_START: u32 = 0x8000_0000;
/// Inclusive end address of the kernel text segment.
pub const KTEXT_END: u32 = KTEXT_START + REGION_BYTES - 1;
/// Inclusive start address of the kernel data segment.
pub const KDATA_START: u32 = 0x9000_0000;
/// Inclusive end address of the kernel data segment.
pub const KDATA_END: u32 = KDATA_START + REGION_BYTES - 1;

/// Region classification for architectural addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryRegion {
    /// Program text; `load` writes here and `PC` starts here.
    Text,
    /// Static data.
    Data,
    /// Stack.
    Stack,
    /// Kernel text.
    KernelText,
    /// Kernel data.
    KernelData,
}

impl MemoryRegion {
    /// Returns the standard inclusive bounds for this region.
    #[must_use]
    pub const fn bounds(self) -> (u32, u32) {
        match self {
            Self::Text => (TEXT_START, TEXT_END),
            Self::Data => (DATA_START, DATA_END),
            Self::Stack => (STACK_START, STACK_END),
            Self::KernelText => (KTEXT_START, KTEXT_END),
            Self::KernelData => (KDATA_START, KDATA_END),
        }
    }

    /// Returns `true` when `addr` belongs to this region's standard bounds.
    #[must_use]
    pub const fn contains(self, addr: u32) -> bool {
        let (start, end) = self.bounds();
        addr >= start && addr <= end
    }

    /// Returns the standard descriptor for this region.
    #[must_use]
    pub const fn descriptor(self) -> RegionDescriptor {
        let (start, end) = self.bounds();
        RegionDescriptor {
            region: self,
            start,
            end,
        }
    }
}

/// A contiguous, inclusive address range labelled with its region kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegionDescriptor {
    /// Region classification.
    pub region: MemoryRegion,
    /// Inclusive start address.
    pub start: u32,
    /// Inclusive end address.
    pub end: u32,
}

impl RegionDescriptor {
    /// Returns `true` when `addr` lies within `start..=end`.
    #[must_use]
    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr <= self.end
    }

    /// Number of bytes covered by this descriptor.
    #[must_use]
    pub const fn len_bytes(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// Returns `true` when the two inclusive ranges share at least one address.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Standard region layout in ascending address order.
pub const MIPS_MEMORY_REGIONS: [RegionDescriptor; 5] = [
    MemoryRegion::Text.descriptor(),
    MemoryRegion::Data.descriptor(),
    MemoryRegion::Stack.descriptor(),
    MemoryRegion::KernelText.descriptor(),
    MemoryRegion::KernelData.descriptor(),
];

const _: () = assert_standard_region_layout();

const fn assert_standard_region_layout() {
    let mut index = 0;
    while index < MIPS_MEMORY_REGIONS.len() {
        let descriptor = MIPS_MEMORY_REGIONS[index];
        assert!(
            descriptor.start <= descriptor.end,
            "region start cannot be greater than end"
        );
        assert!(descriptor.start % 4 == 0, "region start must be word aligned");
        assert!(
            (descriptor.end - descriptor.start + 1) % 4 == 0,
            "region size must be a whole number of words"
        );

        if index > 0 {
            let previous = MIPS_MEMORY_REGIONS[index - 1];
            assert!(
                previous.end < descriptor.start,
                "standard regions must be ascending and disjoint"
            );
        }

        index += 1;
    }
}

/// Decodes an address into its standard region, if any.
///
/// Addresses between regions are unmapped.
#[must_use]
pub const fn decode_memory_region(addr: u32) -> Option<MemoryRegion> {
    match addr {
        TEXT_START..=TEXT_END => Some(MemoryRegion::Text),
        DATA_START..=DATA_END => Some(MemoryRegion::Data),
        STACK_START..=STACK_END => Some(MemoryRegion::Stack),
        KTEXT_START..=KTEXT_END => Some(MemoryRegion::KernelText),
        KDATA_START..=KDATA_END => Some(MemoryRegion::KernelData),
        _ => None,
    }
}
