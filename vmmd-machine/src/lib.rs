//! # vmmd-machine
//!
//! VM lifecycle backend for vmmd: the default [`CommandHandler`]
//! implementation, supervising a single virtual machine as a hypervisor
//! child process.
//!
//! [`CommandHandler`]: vmmd_server::CommandHandler

pub mod error;
pub mod hypervisor;
pub mod machine;

pub use error::MachineError;
pub use hypervisor::LaunchSpec;
pub use machine::Machine;
