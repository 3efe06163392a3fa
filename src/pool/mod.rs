//! The constant pool (component B) and variable pool (component C): the two
//! deduplicated, insertion-ordered registries every emitted SPIR-V id must
//! resolve against, per the constant-pool-closure and variable-pool-closure
//! testable properties.
pub mod constant;
pub mod variable;

pub use constant::{ConstTy, ConstantPool};
pub use variable::VariablePool;
