use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::constants::*;
use crate::error::{Result, VmError};

/// Decoded form of a segment-table pointer or page-table entry.
///
/// In memory these are stored as signed words: positive is a resident frame,
/// zero is invalid, negative is the (negated) disk block holding the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Invalid,
    Resident(usize),
    OnDisk(usize),
}

impl Entry {
    pub fn decode(word: i32) -> Self {
        match word {
            0 => Entry::Invalid,
            w if w > 0 => Entry::Resident(w as usize),
            w => Entry::OnDisk(w.unsigned_abs() as usize),
        }
    }

    pub fn encode(self) -> Result<i32> {
        let word = match self {
            Entry::Invalid => Some(0),
            Entry::Resident(frame) => i32::try_from(frame).ok(),
            Entry::OnDisk(block) => i64::try_from(block)
                .ok()
                .and_then(|b| i32::try_from(-b).ok()),
        };
        word.ok_or(VmError::EntryOverflow {
            value: match self {
                Entry::Invalid => 0,
                Entry::Resident(v) | Entry::OnDisk(v) => v,
            },
        })
    }
}

pub struct PhysicalMemory {
    data: Vec<i32>,
    num_frames: usize,
}

impl PhysicalMemory {
    /// Create a physical memory of `NUM_FRAMES` frames, all zero
    pub fn new() -> Self {
        Self::with_frames(NUM_FRAMES)
    }

    /// Create a physical memory of `num_frames` frames, all zero.
    ///
    /// The segment table always lives in the first `ST_FRAMES` frames, so the
    /// memory is never smaller than that, and never larger than `MAX_FRAMES`.
    pub fn with_frames(num_frames: usize) -> Self {
        let num_frames = num_frames.clamp(ST_FRAMES, MAX_FRAMES);
        PhysicalMemory {
            data: vec![0i32; num_frames * FRAME_SIZE],
            num_frames,
        }
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Read a word from physical memory
    #[inline]
    pub fn read(&self, address: usize) -> i32 {
        self.data[address]
    }

    /// Write a word to physical memory
    #[cfg(test)]
    pub(crate) fn write(&mut self, address: usize, value: i32) {
        self.data[address] = value;
    }

    /// Get the length of a segment from the Segment Table
    #[inline]
    pub fn segment_length(&self, segment: u32) -> i32 {
        self.data[2 * segment as usize]
    }

    /// Raw PT pointer word of a segment
    #[inline]
    pub fn segment_pointer(&self, segment: u32) -> i32 {
        self.data[2 * segment as usize + 1]
    }

    #[inline]
    pub fn segment_entry(&self, segment: u32) -> Entry {
        Entry::decode(self.segment_pointer(segment))
    }

    /// Set a Segment Table entry
    pub fn set_segment_entry(&mut self, segment: u32, length: i32, pointer: i32) {
        let base = 2 * segment as usize;
        self.data[base] = length;
        self.data[base + 1] = pointer;
    }

    /// Point a segment at its (now resident) page table
    pub fn set_segment_pointer(&mut self, segment: u32, entry: Entry) -> Result<()> {
        self.data[2 * segment as usize + 1] = entry.encode()?;
        Ok(())
    }

    /// Address of entry `page` inside the page table held in `pt_frame`
    #[inline]
    pub fn page_entry_address(pt_frame: usize, page: u32) -> usize {
        Self::frame_to_address(pt_frame) + page as usize
    }

    #[inline]
    pub fn page_entry(&self, pt_frame: usize, page: u32) -> Entry {
        Entry::decode(self.data[Self::page_entry_address(pt_frame, page)])
    }

    /// Set a Page Table entry
    pub fn set_page_entry(&mut self, pt_frame: usize, page: u32, value: i32) {
        self.data[Self::page_entry_address(pt_frame, page)] = value;
    }

    /// Calculate the starting address of a frame
    #[inline]
    pub fn frame_to_address(frame: usize) -> usize {
        frame * FRAME_SIZE
    }

    /// The words of one frame
    pub fn frame(&self, frame: usize) -> &[i32] {
        let base = Self::frame_to_address(frame);
        &self.data[base..base + FRAME_SIZE]
    }

    /// Overwrite a whole frame with the contents of a disk block
    pub fn load_block(&mut self, frame: usize, block: &Block) {
        let base = Self::frame_to_address(frame);
        self.data[base..base + FRAME_SIZE].copy_from_slice(block);
    }
}

impl Default for PhysicalMemory {
    fn default() -> Self {
        Self::new()
    }
}

pub type Block = [i32; BLOCK_SIZE];

static ZERO_BLOCK: Block = [0i32; BLOCK_SIZE];

/// Paging disk: a read-only sequence of frame-sized blocks.
///
/// Only blocks with content are stored; the rest read as zeros.
#[derive(Debug, Clone)]
pub struct Disk {
    blocks: BTreeMap<usize, Block>,
    block_count: usize,
}

impl Disk {
    /// A disk with `DISK_BLOCKS` zeroed blocks
    pub fn new() -> Self {
        Self::zeroed(DISK_BLOCKS)
    }

    pub fn zeroed(blocks: usize) -> Self {
        Disk {
            blocks: BTreeMap::new(),
            block_count: blocks.min(MAX_DISK_BLOCKS),
        }
    }

    /// A disk with no blocks at all; any fault against it fails
    pub fn empty() -> Self {
        Self::zeroed(0)
    }

    /// Build a disk from per-block word lists.
    ///
    /// Short blocks are padded with zeros.
    pub fn from_blocks(blocks: Vec<Vec<i32>>) -> Result<Self> {
        let mut disk = Self::zeroed(blocks.len());
        for (id, words) in blocks.into_iter().enumerate() {
            for (offset, value) in words.into_iter().enumerate() {
                disk.set_word(id, offset, value)?;
            }
        }
        Ok(disk)
    }

    /// Build a disk of at least `block_count` blocks from sparse
    /// `(block, offset, value)` words.
    pub fn from_words<I>(block_count: usize, words: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, i32)>,
    {
        let mut disk = Self::zeroed(block_count);
        for (block, offset, value) in words {
            if block >= MAX_DISK_BLOCKS {
                return Err(VmError::parse(
                    "disk block",
                    format!("block {} exceeds max {}", block, MAX_DISK_BLOCKS - 1),
                ));
            }
            disk.block_count = disk.block_count.max(block + 1);
            disk.set_word(block, offset, value)?;
        }
        Ok(disk)
    }

    fn set_word(&mut self, block: usize, offset: usize, value: i32) -> Result<()> {
        if offset >= BLOCK_SIZE {
            return Err(VmError::parse(
                "disk block",
                format!("block {} offset {} exceeds max {}", block, offset, BLOCK_SIZE - 1),
            ));
        }
        self.blocks.entry(block).or_insert([0i32; BLOCK_SIZE])[offset] = value;
        Ok(())
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Read an entire block
    #[inline]
    pub fn read(&self, block: usize) -> Option<&Block> {
        if block >= self.block_count {
            return None;
        }
        Some(self.blocks.get(&block).unwrap_or(&ZERO_BLOCK))
    }

    /// Like [`Disk::read`], but a missing block is an error
    pub fn block(&self, block: usize) -> Result<&Block> {
        self.read(block).ok_or(VmError::BlockOutOfRange {
            block,
            blocks: self.block_count,
        })
    }
}

impl Default for Disk {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames available for servicing faults.
///
/// Frames come out lowest id first and are never handed back.
#[derive(Debug, Clone, Default)]
pub struct FreeFrameList {
    frames: VecDeque<usize>,
}

impl FreeFrameList {
    /// All frames in `0..num_frames` that are not in `used`, ascending
    pub fn from_used(num_frames: usize, used: &BTreeSet<usize>) -> Self {
        FreeFrameList {
            frames: (0..num_frames).filter(|f| !used.contains(f)).collect(),
        }
    }

    /// Take the next free frame, or `None` once the list is exhausted
    pub fn pop(&mut self) -> Option<usize> {
        self.frames.pop_front()
    }

    pub fn free_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.iter().copied()
    }
}

impl FromIterator<usize> for FreeFrameList {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        FreeFrameList { frames: iter.into_iter().collect() }
    }
}
