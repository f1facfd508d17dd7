pub const S_BITS: u32 = 9;
pub const P_BITS: u32 = 9;
pub const W_BITS: u32 = 9;

/// Width of a virtual address; higher bits are discarded on decode.
pub const VA_BITS: u32 = S_BITS + P_BITS + W_BITS;

pub const PAGE_SIZE: usize = 1 << W_BITS;
pub const FRAME_SIZE: usize = PAGE_SIZE;
pub const PT_SIZE: usize = 1 << P_BITS;
pub const MAX_SEGMENTS: usize = 1 << S_BITS;
pub const ST_SIZE: usize = MAX_SEGMENTS * 2;

pub const NUM_FRAMES: usize = 1024;
// keeps every frame id and word address within an i32 memory word
pub const MAX_FRAMES: usize = 1 << (31 - W_BITS);
pub const PM_SIZE: usize = NUM_FRAMES * FRAME_SIZE;
// frames 0 and 1 hold the segment table
pub const ST_FRAMES: usize = ST_SIZE / FRAME_SIZE;

pub const DISK_BLOCKS: usize = 1024;
// largest block magnitude a negative i32 word can name, plus one
pub const MAX_DISK_BLOCKS: usize = 1 << 31;
pub const BLOCK_SIZE: usize = FRAME_SIZE;

pub const S_MASK: i64 = (1 << S_BITS) - 1;
pub const P_MASK: i64 = (1 << P_BITS) - 1;
pub const W_MASK: i64 = (1 << W_BITS) - 1;

pub const P_SHIFT: u32 = W_BITS;
pub const S_SHIFT: u32 = P_BITS + W_BITS;

pub const INVALID_ADDRESS: i64 = -1;
