pub mod constants;
pub mod error;
pub mod io;
pub mod memory;
pub mod translation;
pub mod vm_manager;

// Re-export commonly used items for convenience
pub use constants::*;
pub use error::{FaultKind, Result, VmError};
pub use memory::{Disk, Entry, FreeFrameList, PhysicalMemory};
pub use translation::{TranslationResult, VirtualAddress};
pub use vm_manager::{TranslationStats, VMManager};
