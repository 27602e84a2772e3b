pub mod config;
pub mod core_map;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod page_table;
pub mod policy;
pub mod program;
pub mod vm;

// Re-export commonly used items for convenience
pub use config::{PolicyKind, VmConfig};
pub use cpu::{Cpu, Machine, MachineError};
pub use error::{VmError, VmResult};
pub use program::Program;
pub use vm::{VmManager, VmStats};
