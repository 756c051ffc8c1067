//! Region layout.
//!
//! This module tracks which byte ranges of the input file must survive
//! stripping and where each of them lands in the output file.

use crate::utils::align_down;

/// A contiguous range of the input file that is copied to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Offset of the region in the input file.
    pub offset: u64,
    /// Size of the region in bytes. Always non-zero.
    pub size: u64,
    /// Page-aligned distance the region moves towards the start of the file.
    pub displacement: u64,
    /// Offset of the region in the output file.
    pub output_offset: u64,
}

impl Region {
    fn new(offset: u64, size: u64) -> Self {
        Self {
            offset,
            size,
            displacement: 0,
            output_offset: offset,
        }
    }

    /// One past the last input byte covered by this region.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// Whether `[offset, offset + size)` lies entirely inside this region.
    pub fn contains(&self, offset: u64, size: u64) -> bool {
        offset >= self.offset && offset + size <= self.end()
    }
}

/// The sorted, disjoint set of regions to keep.
///
/// After every [`RegionMap::insert`] the regions are ordered by offset and no
/// two of them overlap or touch.
#[derive(Debug, Default, Clone)]
pub struct RegionMap {
    regions: Vec<Region>,
}

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `[offset, offset + size)` to the map, merging it with every
    /// region it overlaps or touches. Empty ranges are ignored.
    pub fn insert(&mut self, offset: u64, size: u64) {
        if size == 0 {
            return;
        }

        // Every region before `pos` starts strictly before `offset`.
        let pos = self.regions.partition_point(|r| r.offset < offset);
        let current = match pos.checked_sub(1) {
            Some(prev) if self.regions[prev].end() >= offset => {
                let region = &mut self.regions[prev];
                region.size = region.size.max(offset + size - region.offset);
                prev
            }
            _ => {
                self.regions.insert(pos, Region::new(offset, size));
                pos
            }
        };

        while let Some(next) = self.regions.get(current + 1).copied() {
            if next.offset > self.regions[current].end() {
                break;
            }
            self.regions.remove(current + 1);
            let region = &mut self.regions[current];
            region.size = region.size.max(next.end() - region.offset);
        }
    }

    /// Assigns every region its output placement.
    ///
    /// Each region moves back by a whole number of pages, just far enough
    /// that less than one page of slack remains after the previous region.
    pub fn plan(&mut self, page_size: u64) {
        let mut cursor = 0;
        for region in &mut self.regions {
            region.displacement = align_down(region.offset - cursor, page_size);
            region.output_offset = region.offset - region.displacement;
            cursor = region.output_offset + region.size;

            tracing::debug!(
                "region offset={:#x}, size={:#x}, displace by -{:#x} to {:#x}",
                region.offset,
                region.size,
                region.displacement,
                region.output_offset,
            );
        }
    }

    /// Finds the region that fully contains `[offset, offset + size)`.
    pub fn covering(&self, offset: u64, size: u64) -> Option<&Region> {
        let pos = self.regions.partition_point(|r| r.offset <= offset);
        let candidate = self.regions.get(pos.checked_sub(1)?)?;
        candidate.contains(offset, size).then_some(candidate)
    }

    /// Length of the output file once every region has been written.
    pub fn output_size(&self) -> u64 {
        self.regions
            .last()
            .map(|r| r.output_offset + r.size)
            .unwrap_or(0)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
