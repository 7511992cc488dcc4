//! System V AMD64 argument-register assignment.
//!
//! Only the integer/pointer argument class is modeled: every value in this
//! language (int, bool, string pointer) is passed in a general-purpose
//! register or, past the sixth argument, on the stack. There is no
//! floating-point surface syntax, so the `XMM*` argument class the ABI
//! defines is simply absent here.

/// Argument registers in System V order. Index 0 is the first argument.
pub const ARG_REGS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

/// The register the return value is passed back in.
pub const RET_REG: &str = "rax";

/// `None` once `index` (0-based) has spilled past the register file onto
/// the stack.
pub fn arg_reg(index: usize) -> Option<&'static str> {
    ARG_REGS.get(index).copied()
}

/// Offset, in bytes past the callee's (already `+16`-adjusted, see
/// [`crate::layout`]) `%rbp`, of the `index`th (0-based, so `index == 6` is
/// the 7th argument) stack-passed argument.
pub fn stack_arg_offset(index: usize) -> i32 {
    debug_assert!(index >= ARG_REGS.len());
    8 * (index - ARG_REGS.len()) as i32
}

/// Whether a call passing `arg_count` total arguments needs a padding push
/// to keep `%rsp` 16-byte aligned at the `call` instruction: only once
/// arguments spill onto the stack at all, and only when that spilled count
/// is odd (an even number of pushes preserves whatever alignment held
/// before the first one).
pub fn needs_alignment_pad(arg_count: usize) -> bool {
    arg_count > ARG_REGS.len() && (arg_count - ARG_REGS.len()) % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_six_args_use_registers() {
        assert_eq!(arg_reg(0), Some("rdi"));
        assert_eq!(arg_reg(5), Some("r9"));
        assert_eq!(arg_reg(6), None);
    }

    #[test]
    fn seventh_arg_is_first_stack_slot() {
        assert_eq!(stack_arg_offset(6), 0);
        assert_eq!(stack_arg_offset(7), 8);
    }

    #[test]
    fn alignment_pad_only_for_odd_stack_counts() {
        assert!(!needs_alignment_pad(6)); // no spill at all
        assert!(needs_alignment_pad(7)); // 1 spilled arg, odd
        assert!(!needs_alignment_pad(8)); // 2 spilled args, even
        assert!(needs_alignment_pad(9)); // 3 spilled args, odd
    }
}
