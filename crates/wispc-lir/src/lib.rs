//! Activation-record layout and System V calling-convention helpers shared
//! by x86-64 emission (spec.md §4.4). No register allocator lives here —
//! spec.md's Non-goals rule out anything past fixed register assignments,
//! so every TAC operand gets a fixed stack slot ([`layout::FrameLayout`])
//! and every call argument a fixed register or stack slot
//! ([`calling_convention`]).

pub mod calling_convention;
pub mod layout;

pub use layout::{FrameLayout, Location};
