use crate::constants::*;

/// Represents the decomposed components of a Virtual Address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: i64,
    pub s: u32,
    pub p: u32,
    pub w: u32,
}

impl VirtualAddress {
    /// Decompose a raw VA into its components.
    ///
    /// Only the low `VA_BITS` bits take part; anything above is dropped.
    pub fn from_raw(va: i64) -> Self {
        let s = ((va >> S_SHIFT) & S_MASK) as u32;
        let p = ((va >> P_SHIFT) & P_MASK) as u32;
        let w = (va & W_MASK) as u32;

        VirtualAddress { va, s, p, w }
    }

    /// Assemble a VA from its fields (each masked to 9 bits)
    #[cfg(test)]
    pub(crate) fn from_parts(s: u32, p: u32, w: u32) -> Self {
        let raw = ((s as i64 & S_MASK) << S_SHIFT) | ((p as i64 & P_MASK) << P_SHIFT) | (w as i64 & W_MASK);
        Self::from_raw(raw)
    }

    /// Offset within the segment: `p * PAGE_SIZE + w`
    #[inline]
    pub fn pw(&self) -> i64 {
        self.p as i64 * PAGE_SIZE as i64 + self.w as i64
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({}) = (s={}, p={}, w={})", self.va, self.s, self.p, self.w)
    }
}

/// Result of an address translation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationResult {
    Success(i64),
    /// Segment length is zero or negative.
    InvalidSegment,
    SegmentBoundaryViolation,
    /// Segment table pointer is 0.
    InvalidPageTable,
    /// Page table is on disk and demand paging is off.
    PageTableNotResident,
    /// Page table entry is 0.
    InvalidPage,
    /// Page is on disk and demand paging is off.
    PageNotResident,
}

impl TranslationResult {
    /// Convert to the output format (-1 for errors, PA otherwise)
    pub fn to_output(&self) -> i64 {
        match self {
            TranslationResult::Success(pa) => *pa,
            _ => INVALID_ADDRESS,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranslationResult::Success(_))
    }
}

impl std::fmt::Display for TranslationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationResult::Success(pa) => write!(f, "PA {}", pa),
            TranslationResult::InvalidSegment => write!(f, "ERROR: Invalid segment"),
            TranslationResult::SegmentBoundaryViolation => {
                write!(f, "ERROR: Segment boundary violation")
            }
            TranslationResult::InvalidPageTable => write!(f, "ERROR: Invalid page table"),
            TranslationResult::PageTableNotResident => {
                write!(f, "ERROR: Page table not resident")
            }
            TranslationResult::InvalidPage => write!(f, "ERROR: Invalid page"),
            TranslationResult::PageNotResident => write!(f, "ERROR: Page not resident"),
        }
    }
}
