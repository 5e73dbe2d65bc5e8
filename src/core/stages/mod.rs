//! The five pipeline stages, each a free function operating on a
//! `Simulator`. Stages run in reverse pipeline order within one
//! `Simulator::step` call so that a latch is always read before it is
//! overwritten in the same cycle.

mod decode;
mod execute;
mod fetch;
mod memory_access;
mod write_back;

pub use decode::decode_stage;
pub use execute::execute_stage;
pub use fetch::fetch_stage;
pub use memory_access::mem_stage;
pub use write_back::wb_stage;
