//! Umbrella crate for the `planescale` workspace.
//!
//! Re-exports the sample planes, the kernel variants and the frame scaler.

pub use ps_core::*;
pub use ps_kernel::*;
pub use ps_scale::*;
