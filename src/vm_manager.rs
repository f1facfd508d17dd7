//! The translator context.
//!
//! [`VMManager`] owns physical memory, the paging disk and the free frame
//! list, and walks segment table -> page table -> page for each address.
//! With demand paging on, a page table or page that is still on disk is
//! copied into the next free frame and the mapping is updated in place, so
//! later translations see it resident.

use log::{debug, info};

use crate::constants::PAGE_SIZE;
use crate::error::{FaultKind, Result, VmError};
use crate::io::InitData;
use crate::memory::{Disk, Entry, FreeFrameList, PhysicalMemory};
use crate::translation::{TranslationResult, VirtualAddress};

/// Counters over the lifetime of a [`VMManager`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub translations: usize,
    pub successes: usize,
    pub failures: usize,
    pub page_table_faults: usize,
    pub page_faults: usize,
}

impl TranslationStats {
    pub fn faults(&self) -> usize {
        self.page_table_faults + self.page_faults
    }
}

pub struct VMManager {
    pm: PhysicalMemory,
    disk: Disk,
    free_frames: FreeFrameList,
    demand_paging: bool,
    stats: TranslationStats,
}

impl VMManager {
    pub fn new(
        pm: PhysicalMemory,
        disk: Disk,
        free_frames: FreeFrameList,
        demand_paging: bool,
    ) -> Self {
        VMManager {
            pm,
            disk,
            free_frames,
            demand_paging,
            stats: TranslationStats::default(),
        }
    }

    /// Initialize memory of `num_frames` frames from `init` and derive the free frames
    pub fn from_init(
        init: &InitData,
        num_frames: usize,
        disk: Disk,
        demand_paging: bool,
    ) -> Result<Self> {
        let (pm, free_frames) = init.build(num_frames)?;
        info!(
            "initialized {} frames, {} free, demand paging {}",
            pm.num_frames(),
            free_frames.free_count(),
            if demand_paging { "on" } else { "off" }
        );
        Ok(Self::new(pm, disk, free_frames, demand_paging))
    }

    pub fn demand_paging(&self) -> bool {
        self.demand_paging
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.pm
    }

    pub fn free_frames(&self) -> &FreeFrameList {
        &self.free_frames
    }

    pub fn disk(&self) -> &Disk {
        &self.disk
    }

    pub fn stats(&self) -> TranslationStats {
        self.stats
    }

    /// Translate one virtual address.
    ///
    /// Unmappable addresses come back as a failure [`TranslationResult`].
    /// `Err` means a fault could not be serviced and the run must stop.
    pub fn translate(&mut self, raw_va: i64) -> Result<TranslationResult> {
        let va = VirtualAddress::from_raw(raw_va);
        let result = self.walk(&va)?;

        self.stats.translations += 1;
        if result.is_success() {
            self.stats.successes += 1;
        } else {
            self.stats.failures += 1;
        }
        debug!("{} -> {}", va, result);
        Ok(result)
    }

    /// Translate a batch of virtual addresses, one output word per input, in order
    pub fn translate_batch(&mut self, vas: &[i64]) -> Result<Vec<i64>> {
        vas.iter()
            .map(|&va| self.translate(va).map(|r| r.to_output()))
            .collect()
    }

    fn walk(&mut self, va: &VirtualAddress) -> Result<TranslationResult> {
        let length = self.pm.segment_length(va.s);
        if length <= 0 {
            return Ok(TranslationResult::InvalidSegment);
        }
        if va.pw() >= length as i64 {
            return Ok(TranslationResult::SegmentBoundaryViolation);
        }

        let pt_frame = match self.pm.segment_entry(va.s) {
            Entry::Resident(frame) => frame,
            Entry::Invalid => return Ok(TranslationResult::InvalidPageTable),
            Entry::OnDisk(_) if !self.demand_paging => {
                return Ok(TranslationResult::PageTableNotResident)
            }
            Entry::OnDisk(block) => {
                let frame = self.fault_in(FaultKind::PageTable, va.s, block)?;
                self.pm.set_segment_pointer(va.s, Entry::Resident(frame))?;
                self.stats.page_table_faults += 1;
                frame
            }
        };

        let page_frame = match self.pm.page_entry(pt_frame, va.p) {
            Entry::Resident(frame) => frame,
            Entry::Invalid => return Ok(TranslationResult::InvalidPage),
            Entry::OnDisk(_) if !self.demand_paging => {
                return Ok(TranslationResult::PageNotResident)
            }
            Entry::OnDisk(block) => {
                let frame = self.fault_in(FaultKind::Page, va.s, block)?;
                self.pm
                    .set_page_entry(pt_frame, va.p, Entry::Resident(frame).encode()?);
                self.stats.page_faults += 1;
                frame
            }
        };

        // page table contents come from disk, so the frame may lie outside memory
        let pa = page_frame as i64 * PAGE_SIZE as i64 + va.w as i64;
        Ok(TranslationResult::Success(pa))
    }

    /// Copy `block` into the next free frame and return that frame.
    ///
    /// The block is looked up before a frame is taken, so a bad block id
    /// leaves the free list untouched.
    fn fault_in(&mut self, kind: FaultKind, segment: u32, block: usize) -> Result<usize> {
        let data = self.disk.block(block)?;
        let frame = self
            .free_frames
            .pop()
            .ok_or(VmError::OutOfFrames { kind, segment })?;
        self.pm.load_block(frame, data);
        info!(
            "{} fault in segment {}: disk block {} -> frame {} ({} frames left)",
            kind,
            segment,
            block,
            frame,
            self.free_frames.free_count()
        );
        Ok(frame)
    }
}
