use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::trace;

use crate::constants::*;
use crate::error::{Result, VmError};
use crate::memory::{Disk, FreeFrameList, PhysicalMemory};

/// Segment table record: (segment, length, PT pointer)
pub type StEntry = (u32, i32, i32);
/// Page table record: (segment, page, page pointer)
pub type PtEntry = (u32, u32, i32);

/// The two record sets of an initialization file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InitData {
    pub st_entries: Vec<StEntry>,
    pub pt_entries: Vec<PtEntry>,
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| VmError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_int<T: std::str::FromStr>(token: &str, what: &'static str) -> Result<T> {
    token
        .parse()
        .map_err(|_| VmError::parse(what, format!("not an integer: {:?}", token)))
}

fn triples<'a>(line: &'a str, what: &'static str) -> Result<Vec<[&'a str; 3]>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() % 3 != 0 {
        return Err(VmError::parse(
            what,
            format!("{} tokens, expected a multiple of 3", tokens.len()),
        ));
    }
    Ok(tokens.chunks(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn check_segment(s: u32, what: &'static str) -> Result<()> {
    if s as usize >= MAX_SEGMENTS {
        return Err(VmError::parse(
            what,
            format!("segment {} exceeds max {}", s, MAX_SEGMENTS - 1),
        ));
    }
    Ok(())
}

impl InitData {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&read_file(path.as_ref())?)
    }

    /// Parse the two-line init format. A missing second line means no PT records.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines();
        let st_entries = Self::parse_st_line(lines.next().unwrap_or(""))?;
        let pt_entries = Self::parse_pt_line(lines.next().unwrap_or(""))?;

        Ok(InitData { st_entries, pt_entries })
    }

    fn parse_st_line(line: &str) -> Result<Vec<StEntry>> {
        const WHAT: &str = "segment table line";
        let mut entries = Vec::new();
        for [s, z, f] in triples(line, WHAT)? {
            let s: u32 = parse_int(s, WHAT)?;
            check_segment(s, WHAT)?;
            entries.push((s, parse_int(z, WHAT)?, parse_int(f, WHAT)?));
        }
        Ok(entries)
    }

    fn parse_pt_line(line: &str) -> Result<Vec<PtEntry>> {
        const WHAT: &str = "page table line";
        let mut entries = Vec::new();
        for [s, p, f] in triples(line, WHAT)? {
            let s: u32 = parse_int(s, WHAT)?;
            let p: u32 = parse_int(p, WHAT)?;
            check_segment(s, WHAT)?;
            if p as usize >= PT_SIZE {
                return Err(VmError::parse(
                    WHAT,
                    format!("page {} exceeds max {}", p, PT_SIZE - 1),
                ));
            }
            entries.push((s, p, parse_int(f, WHAT)?));
        }
        Ok(entries)
    }

    /// True if any structure starts out on disk
    pub fn needs_demand_paging(&self) -> bool {
        self.st_entries.iter().any(|&(_, _, f)| f < 0)
            || self.pt_entries.iter().any(|&(_, _, f)| f < 0)
    }

    /// Write both record sets into `pm` and return the frames now in use.
    ///
    /// A PT record whose page table is not resident is not written, but its
    /// frame still counts as used.
    pub fn apply(&self, pm: &mut PhysicalMemory) -> Result<BTreeSet<usize>> {
        let num_frames = pm.num_frames();
        let mut used: BTreeSet<usize> = (0..ST_FRAMES).collect();

        for &(segment, length, pointer) in &self.st_entries {
            // page tables are indexed into memory, so they must be in range
            if pointer > 0 && pointer as usize >= num_frames {
                return Err(VmError::parse(
                    "init data",
                    format!("page table frame {} exceeds max {}", pointer, num_frames - 1),
                ));
            }
            trace!("ST[{}] = (length={}, pointer={})", segment, length, pointer);
            pm.set_segment_entry(segment, length, pointer);
            if pointer > 0 {
                used.insert(pointer as usize);
            }
        }

        for &(segment, page, pointer) in &self.pt_entries {
            let pt_frame = pm.segment_pointer(segment);
            if pt_frame > 0 {
                trace!("PT[{}][{}] = {} (frame {})", segment, page, pointer, pt_frame);
                pm.set_page_entry(pt_frame as usize, page, pointer);
            } else {
                trace!("PT[{}][{}] skipped, page table not resident", segment, page);
            }
            if pointer > 0 {
                used.insert(pointer as usize);
            }
        }

        Ok(used)
    }

    /// Fresh memory of `num_frames` frames plus the matching free frame list
    pub fn build(&self, num_frames: usize) -> Result<(PhysicalMemory, FreeFrameList)> {
        if num_frames > MAX_FRAMES {
            return Err(VmError::parse(
                "frame count",
                format!("{} exceeds max {}", num_frames, MAX_FRAMES),
            ));
        }
        let mut pm = PhysicalMemory::with_frames(num_frames);
        let used = self.apply(&mut pm)?;
        let ffl = FreeFrameList::from_used(pm.num_frames(), &used);
        Ok((pm, ffl))
    }
}

pub fn parse_virtual_addresses(content: &str) -> Result<Vec<i64>> {
    content
        .split_whitespace()
        .map(|token| parse_int(token, "virtual address"))
        .collect()
}

pub fn read_virtual_addresses<P: AsRef<Path>>(path: P) -> Result<Vec<i64>> {
    parse_virtual_addresses(&read_file(path.as_ref())?)
}

pub fn format_results(results: &[i64]) -> String {
    results
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn write_results<P: AsRef<Path>>(path: P, results: &[i64]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_results(results)).map_err(|source| VmError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a disk image of `block offset value` triples.
///
/// Words not mentioned are zero. The disk always has at least `DISK_BLOCKS`
/// blocks.
pub fn parse_disk_image(content: &str) -> Result<Disk> {
    const WHAT: &str = "disk image";
    let mut words: Vec<(usize, usize, i32)> = Vec::new();
    for [b, o, v] in triples(content, WHAT)? {
        words.push((parse_int(b, WHAT)?, parse_int(o, WHAT)?, parse_int(v, WHAT)?));
    }
    Disk::from_words(DISK_BLOCKS, words)
}

pub fn read_disk_image<P: AsRef<Path>>(path: P) -> Result<Disk> {
    parse_disk_image(&read_file(path.as_ref())?)
}
