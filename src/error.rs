//! Error and result types reported by the recompiler.
use std::error;
use std::fmt;

use crate::model::{InstrFormat, InstrType};

/// A fatal failure of the translation pipeline.
///
/// All variants are fatal by design (see the error-handling design notes):
/// the recompiler never produces a partial module, so there is nothing to
/// recover into. Each variant carries enough context to be logged and acted
/// on without the caller having to re-walk `ShaderCode` itself.
#[derive(Debug)]
pub enum Error {
    /// No rule matches `(type, format)` for the instruction at `pc`.
    UnsupportedInstruction {
        pc: u32,
        ty: InstrType,
        format: InstrFormat,
        disassembly: String,
    },
    /// A rule matched but a precondition on operand type, size or modifier
    /// failed.
    UnsupportedOperandShape { pc: u32, disassembly: String, reason: String },
    /// A rule needs a resource that the binding info does not declare.
    UnsupportedBindingConfig { reason: String },
    /// Stage info and shader type disagree, or more than one stage info was
    /// supplied.
    InvalidStageCombination { reason: String },
    /// A pool lookup returned the sentinel id, or an internal precondition
    /// of the emitter itself failed. Indicates a bug in the recompiler, not
    /// in the input.
    Bug { reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            UnsupportedInstruction { pc, ty, format, disassembly } => write!(
                f,
                "unsupported instruction at pc={}: {:?}/{:?} ({})",
                pc, ty, format, disassembly
            ),
            UnsupportedOperandShape { pc, disassembly, reason } => write!(
                f,
                "unsupported operand shape at pc={} ({}): {}",
                pc, disassembly, reason
            ),
            UnsupportedBindingConfig { reason } => {
                write!(f, "unsupported binding configuration: {}", reason)
            }
            InvalidStageCombination { reason } => {
                write!(f, "invalid stage combination: {}", reason)
            }
            Bug { reason } => write!(f, "internal recompiler bug: {}", reason),
        }
    }
}
impl error::Error for Error {}

impl Error {
    /// Logs the error at `error` level before returning it, so the core
    /// contributes one diagnosable line regardless of whether the host
    /// application logs translation failures itself.
    pub(crate) fn logged(self) -> Self {
        log::error!("{}", self);
        self
    }
}

pub type Result<T> = std::result::Result<T, Error>;
