//! Operand model: classification and scalar-name rendering (component A).
//!
//! Every function here is pure and takes only a [`ShaderOperand`] (plus, for
//! `variable_name`, a `shift` into its register range). No pool, context or
//! I/O is touched — these are the building blocks the operand loader and the
//! instruction rules call into.
use crate::model::{OperandType, ShaderOperand};

/// The SPIR-V scalar type a variable or constant is natively typed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpirvScalarType {
    Float,
    Int,
    Uint,
}

impl SpirvScalarType {
    pub fn spirv_name(self) -> &'static str {
        match self {
            SpirvScalarType::Float => "float",
            SpirvScalarType::Int => "int",
            SpirvScalarType::Uint => "uint",
        }
    }
}

pub fn is_constant(op: &ShaderOperand) -> bool {
    matches!(
        op.ty,
        OperandType::LiteralConstant | OperandType::IntegerInlineConstant | OperandType::FloatInlineConstant
    )
}

pub fn is_variable(op: &ShaderOperand) -> bool {
    matches!(
        op.ty,
        OperandType::Vgpr
            | OperandType::Sgpr
            | OperandType::VccLo
            | OperandType::VccHi
            | OperandType::ExecLo
            | OperandType::ExecHi
            | OperandType::ExecZ
            | OperandType::Scc
            | OperandType::M0
    )
}

pub fn is_exec(op: &ShaderOperand) -> bool {
    matches!(op.ty, OperandType::ExecLo | OperandType::ExecHi | OperandType::ExecZ)
}

/// The scalar SPIR-V variable name and native type for `op` at `shift`
/// registers past its base (`shift` must be in `0..op.size`).
///
/// Per invariant 3 of the data model: `VccLo size=2` expands to
/// `{vcc_lo, vcc_hi}` rather than `{vcc_lo@0, vcc_lo@1}`, and likewise for
/// `ExecLo`.
pub fn variable_name(op: &ShaderOperand, shift: u32) -> (String, SpirvScalarType) {
    debug_assert!(shift < op.size.max(1));
    match op.ty {
        OperandType::Vgpr => (format!("v{}", op.register_id + shift), SpirvScalarType::Float),
        OperandType::Sgpr => (format!("s{}", op.register_id + shift), SpirvScalarType::Uint),
        OperandType::VccLo => {
            let name = if shift == 0 { "vcc_lo" } else { "vcc_hi" };
            (name.to_owned(), SpirvScalarType::Uint)
        }
        OperandType::VccHi => ("vcc_hi".to_owned(), SpirvScalarType::Uint),
        OperandType::ExecLo => {
            let name = if shift == 0 { "exec_lo" } else { "exec_hi" };
            (name.to_owned(), SpirvScalarType::Uint)
        }
        OperandType::ExecHi => ("exec_hi".to_owned(), SpirvScalarType::Uint),
        OperandType::ExecZ => ("execz".to_owned(), SpirvScalarType::Uint),
        OperandType::Scc => ("scc".to_owned(), SpirvScalarType::Uint),
        OperandType::M0 => ("m0".to_owned(), SpirvScalarType::Uint),
        OperandType::LiteralConstant | OperandType::IntegerInlineConstant | OperandType::FloatInlineConstant => {
            panic!("variable_name called on a constant operand; check is_variable first")
        }
    }
}

/// All `(name, ty)` pairs a register operand expands to, honoring `size`
/// per invariant 3.
pub fn variable_names(op: &ShaderOperand) -> Vec<(String, SpirvScalarType)> {
    (0..op.size.max(1)).map(|shift| variable_name(op, shift)).collect()
}
