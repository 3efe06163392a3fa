//! Variable pool (component C).
use fnv::FnvHashSet;

use crate::input::{ComputeInputInfo, PixelInputInfo, ShaderResources, VertexInputInfo};
use crate::model::{OperandType, ShaderCode, ShaderOperand};
use crate::operand::{variable_names, SpirvScalarType};

/// Deduplicated, insertion-ordered registry of scalar SSA-addressable
/// variables (`vgprN`, `sgprN`, `vcc_lo/hi`, `exec_lo/hi`, `execz`, `scc`,
/// `m0`) that must be declared as `OpVariable … Function` in the main
/// function's local-variable block.
pub struct VariablePool {
    seen: FnvHashSet<String>,
    order: Vec<(String, SpirvScalarType)>,
}

impl VariablePool {
    pub fn new() -> Self {
        VariablePool { seen: FnvHashSet::default(), order: Vec::new() }
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: SpirvScalarType) {
        let name = name.into();
        if self.seen.insert(name.clone()) {
            self.order.push((name, ty));
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    fn insert_operand(&mut self, op: &ShaderOperand) {
        for (name, ty) in variable_names(op) {
            self.insert(name, ty);
        }
    }

    /// Seeds `Vgpr(0)`, `ExecLo` (expanding to `exec_lo`/`exec_hi`),
    /// `ExecZ`, `Scc`, `VccLo` (expanding to `vcc_lo`/`vcc_hi`) — always
    /// materialized regardless of shader content. `vcc_lo`/`vcc_hi` are
    /// written directly by the vector-compare rule family without ever
    /// routing a `VccLo`-typed operand through [`crate::operand::variable_name`],
    /// so [`Self::walk_instructions`] alone would miss them.
    pub fn seed(&mut self) {
        self.insert_operand(&ShaderOperand::reg(OperandType::Vgpr, 0));
        self.insert_operand(&ShaderOperand::reg_sized(OperandType::ExecLo, 0, 2));
        self.insert_operand(&ShaderOperand::special(OperandType::ExecZ));
        self.insert_operand(&ShaderOperand::special(OperandType::Scc));
        self.insert_operand(&ShaderOperand::reg_sized(OperandType::VccLo, 0, 2));
    }

    /// Walks every instruction's `dst`, `dst2` and `src[i]` (skipping
    /// constants), expanded by `size`.
    pub fn walk_instructions(&mut self, code: &ShaderCode) {
        for inst in &code.instructions {
            if crate::operand::is_variable(&inst.dst) {
                self.insert_operand(&inst.dst);
            }
            if crate::operand::is_variable(&inst.dst2) {
                self.insert_operand(&inst.dst2);
            }
            for src in inst.srcs() {
                if crate::operand::is_variable(src) {
                    self.insert_operand(src);
                }
            }
        }
    }

    pub fn seed_vertex_stage(&mut self, info: &VertexInputInfo) {
        for r in &info.resources {
            for i in 0..r.registers_num {
                self.insert(format!("v{}", r.register_start + i), SpirvScalarType::Float);
            }
        }
    }

    pub fn seed_pixel_stage(&mut self, info: &PixelInputInfo) {
        if info.ps_pos_xy {
            self.insert("v2", SpirvScalarType::Float);
            self.insert("v3", SpirvScalarType::Float);
        }
    }

    pub fn seed_compute_stage(&mut self, info: &ComputeInputInfo) {
        self.insert(format!("s{}", info.workgroup_register), SpirvScalarType::Uint);
    }

    /// Reserves the whole register range backing each bound resource
    /// descriptor: 4 SGPRs per storage buffer, 8 per texture, 8 per
    /// sampler.
    pub fn seed_resources(&mut self, resources: &ShaderResources) {
        for (kind, binding) in resources.slot_order() {
            let width = kind.register_width();
            for i in 0..width {
                self.insert(format!("s{}", binding.start_register + i), SpirvScalarType::Uint);
            }
        }
    }

    /// Emits one `OpVariable` declaration per pooled entry, in insertion
    /// order, satisfying the variable-pool-closure property.
    pub fn emit_declarations(&self) -> String {
        let mut out = String::new();
        for (name, ty) in &self.order {
            let ptr_ty = match ty {
                SpirvScalarType::Float => "_ptr_Function_float",
                SpirvScalarType::Int => "_ptr_Function_int",
                SpirvScalarType::Uint => "_ptr_Function_uint",
            };
            out.push_str(&format!("%{} = OpVariable %{} Function\n", name, ptr_ty));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FetchResource;

    #[test]
    fn seed_covers_base_registers() {
        let mut pool = VariablePool::new();
        pool.seed();
        assert!(pool.contains("v0"));
        assert!(pool.contains("exec_lo"));
        assert!(pool.contains("exec_hi"));
        assert!(pool.contains("execz"));
        assert!(pool.contains("scc"));
        assert!(pool.contains("vcc_lo"));
        assert!(pool.contains("vcc_hi"));
    }

    #[test]
    fn vertex_fetch_targets_are_reserved() {
        let mut pool = VariablePool::new();
        let info = VertexInputInfo {
            resources: vec![FetchResource { register_start: 1, registers_num: 3, attr_index: 0 }],
            export_count: 1,
            fetch: true,
        };
        pool.seed_vertex_stage(&info);
        assert!(pool.contains("v1"));
        assert!(pool.contains("v2"));
        assert!(pool.contains("v3"));
        assert!(!pool.contains("v4"));
    }
}
