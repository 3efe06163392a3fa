//! Constant pool (component B).
use fnv::FnvHashSet;

use crate::model::{OperandType, ShaderCode, ShaderOperand};
use crate::operand::is_constant;

/// SPIR-V scalar type a constant is declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstTy {
    Int,
    Uint,
    Float,
}

/// An id returned for a pool lookup that missed. Must never appear in
/// well-formed output — the test suite uses it as an oracle for a bad pool
/// lookup, and the emitter treats seeing it as `Error::Bug`.
pub const SENTINEL_ID: &str = "_const_sentinel_missing_";

/// Deduplicated, insertion-ordered registry of `(type, bits)` constants.
pub struct ConstantPool {
    seen: FnvHashSet<(ConstTy, u32)>,
    order: Vec<(ConstTy, u32)>,
}

impl ConstantPool {
    pub fn new() -> Self {
        ConstantPool { seen: FnvHashSet::default(), order: Vec::new() }
    }

    /// Renders the stable SPIR-V id for `(ty, bits)`. Pure; does not touch
    /// pool membership.
    pub fn id(ty: ConstTy, bits: u32) -> String {
        match ty {
            ConstTy::Uint => {
                if bits < 256 {
                    format!("uint_{}", bits)
                } else {
                    format!("uint_0x{:08x}", bits)
                }
            }
            ConstTy::Int => format!("int_{}", bits as i32),
            ConstTy::Float => {
                let v = f32::from_bits(bits);
                let rendered = format!("{:?}", v).replace('.', "_").replace('-', "m");
                format!("float_{}", rendered)
            }
        }
    }

    /// Inserts `(ty, bits)` if not already present, returning its id.
    pub fn insert(&mut self, ty: ConstTy, bits: u32) -> String {
        if self.seen.insert((ty, bits)) {
            self.order.push((ty, bits));
        }
        Self::id(ty, bits)
    }

    /// Looks up `(ty, bits)` without inserting; returns [`SENTINEL_ID`] if
    /// it is not present.
    pub fn lookup(&self, ty: ConstTy, bits: u32) -> String {
        if self.seen.contains(&(ty, bits)) {
            Self::id(ty, bits)
        } else {
            SENTINEL_ID.to_owned()
        }
    }

    /// Looks up the constant backing `op` (an operand satisfying
    /// [`is_constant`]), interpreted under `ty`. Inserts if missing so that
    /// later emission is guaranteed not to reference a dangling id, and
    /// logs at `trace` level when that insert was unexpected (the full
    /// pre-pass in [`ConstantPool::walk_instructions`] should have already
    /// covered every constant operand in the shader).
    pub fn get_or_insert_operand(&mut self, ty: ConstTy, op: &ShaderOperand) -> String {
        debug_assert!(is_constant(op));
        let already_present = self.seen.contains(&(ty, op.constant));
        let id = self.insert(ty, op.constant);
        if !already_present {
            log::trace!("constant pool: late insert of {}", id);
        }
        id
    }

    /// Pre-seeds the minimum fixed set, plus the stage-conditional extras
    /// and compute workgroup dimensions when applicable.
    pub fn seed(&mut self, any_stage_info_present: bool, compute_threads: Option<[u32; 3]>) {
        for f in [0.0f32, 0.5, 1.0, 2.0, 4.0] {
            self.insert(ConstTy::Float, f.to_bits());
        }
        for v in 0..16u32 {
            self.insert(ConstTy::Int, v);
            self.insert(ConstTy::Uint, v);
        }
        if any_stage_info_present {
            for v in [12i32, 16, 31, 36, 119] {
                self.insert(ConstTy::Int, v as u32);
            }
            for v in [24u32, 31, 72, 127, 0x3fff, 0xffffff] {
                self.insert(ConstTy::Uint, v);
            }
        }
        if let Some(threads) = compute_threads {
            for t in threads {
                self.insert(ConstTy::Uint, t);
            }
        }
    }

    /// Full pass over every instruction: adds the constant for each source
    /// operand satisfying [`is_constant`], so that ids are stable before
    /// any instruction is emitted (the ordering guarantee in the
    /// concurrency & resource model section).
    pub fn walk_instructions(&mut self, code: &ShaderCode) {
        for inst in &code.instructions {
            for src in inst.srcs() {
                if is_constant(src) {
                    let ty = match src.ty {
                        OperandType::FloatInlineConstant => ConstTy::Float,
                        _ => ConstTy::Int,
                    };
                    self.insert(ty, src.constant);
                    if ty == ConstTy::Int {
                        // Most integer constants are consumed as uint bit
                        // patterns (masks, offsets); seed both views so the
                        // operand loader never has to fall back to a late
                        // insert for the common case.
                        self.insert(ConstTy::Uint, src.constant);
                    }
                }
            }
        }
    }

    /// Emits one `OpConstant` declaration per pooled entry, in insertion
    /// order, satisfying the constant-pool-closure property.
    pub fn emit_declarations(&self) -> String {
        let mut out = String::new();
        for (ty, bits) in &self.order {
            let id = Self::id(*ty, *bits);
            match ty {
                ConstTy::Uint => out.push_str(&format!("%{} = OpConstant %uint {}\n", id, bits)),
                ConstTy::Int => out.push_str(&format!("%{} = OpConstant %int {}\n", id, *bits as i32)),
                ConstTy::Float => {
                    out.push_str(&format!("%{} = OpConstant %float {:?}\n", id, f32::from_bits(*bits)))
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_uint_renders_decimal_large_renders_hex() {
        assert_eq!(ConstantPool::id(ConstTy::Uint, 5), "uint_5");
        assert_eq!(ConstantPool::id(ConstTy::Uint, 0x3fff), "uint_0x00003fff");
    }

    #[test]
    fn float_id_swaps_dot_and_minus() {
        assert_eq!(ConstantPool::id(ConstTy::Float, 0.5f32.to_bits()), "float_0_5");
        assert_eq!(ConstantPool::id(ConstTy::Float, (-1.0f32).to_bits()), "float_m1_0");
    }

    #[test]
    fn duplicate_insert_is_deduplicated() {
        let mut pool = ConstantPool::new();
        let a = pool.insert(ConstTy::Uint, 42);
        let b = pool.insert(ConstTy::Uint, 42);
        assert_eq!(a, b);
        assert_eq!(pool.order.len(), 1);
    }

    #[test]
    fn missing_lookup_is_sentinel() {
        let pool = ConstantPool::new();
        assert_eq!(pool.lookup(ConstTy::Uint, 999), SENTINEL_ID);
    }

    #[test]
    fn seed_without_stage_info_omits_extras() {
        let mut pool = ConstantPool::new();
        pool.seed(false, None);
        assert_eq!(pool.lookup(ConstTy::Uint, 127), SENTINEL_ID);
        assert_ne!(pool.lookup(ConstTy::Uint, 15), SENTINEL_ID);
    }

    #[test]
    fn seed_with_stage_info_includes_extras() {
        let mut pool = ConstantPool::new();
        pool.seed(true, Some([64, 1, 1]));
        assert_ne!(pool.lookup(ConstTy::Uint, 127), SENTINEL_ID);
        assert_ne!(pool.lookup(ConstTy::Uint, 64), SENTINEL_ID);
    }
}
