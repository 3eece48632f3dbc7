use clvmr::MEMPOOL_MODE as CLVM_MEMPOOL_MODE;

// flags controlling condition parsing. They are combined in the same field
// as the clvm_rs flags controlling CLVM execution; CLVM flags live in the
// lower two bytes, parsing and validation flags in the top two.

/// unknown condition opcodes are disallowed (strict mode). This is meant
/// for mempool-mode
pub const NO_UNKNOWN_CONDS: u32 = 0x2_0000;

/// conditions must carry exactly the number of arguments currently
/// supported for their opcode. This is meant for mempool-mode
pub const STRICT_ARGS_COUNT: u32 = 0x8_0000;

/// A combination of flags suitable for mempool-mode, with stricter checking
pub const MEMPOOL_MODE: u32 = CLVM_MEMPOOL_MODE | NO_UNKNOWN_CONDS | STRICT_ARGS_COUNT;
