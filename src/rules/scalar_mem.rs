//! Scalar memory rule families: `SLoadDwordx{4,8}` (push-constant extended
//! mapping) and `SBufferLoadDword{,x2,x4,x8,x16}` (storage-buffer reads).
use crate::context::TranslationContext;
use crate::error::{Error, Result};
use crate::input::ShaderResources;
use crate::loader::load_uint;
use crate::model::ShaderInstruction;
use crate::operand::variable_name;
use crate::pool::ConstTy;

/// `SLoadDwordx{4,8} dst, src0` — `src0.register_id` gives the SGPR the
/// extended mapping table is indexed from; `src0.register_id -
/// resources.extended_start_register` is the base row, and each of the `n`
/// consecutive rows resolves to a `(buffer, field)` pair set up during
/// resource binding before the main body walk, loaded into the matching
/// `dst` register.
pub fn load_dwordx_n(inst: &ShaderInstruction, ctx: &mut TranslationContext, resources: &ShaderResources, n: u32) -> Result<String> {
    if !resources.extended_used || inst.src[0].register_id < resources.extended_start_register {
        return Err(Error::UnsupportedBindingConfig {
            reason: format!(
                "SLoadDwordx{} at register {} requires an extended push-constant mapping",
                n, inst.src[0].register_id
            ),
        }
        .logged());
    }
    let mut out = String::new();
    let base_row = (inst.src[0].register_id - resources.extended_start_register) as usize;
    for i in 0..n {
        let row = base_row + i as usize;
        let (buffer, field) = ctx.extended_mapping(row).ok_or_else(|| {
            Error::UnsupportedBindingConfig { reason: format!("extended mapping row {} is not bound", row) }.logged()
        })?;
        let buf_id = ctx.consts.insert(ConstTy::Int, buffer);
        let field_id = ctx.consts.insert(ConstTy::Int, field);
        let gep = ctx.next_index();
        out += &format!(
            "%{g} = OpAccessChain %_ptr_PushConstant_uint %push_constants %{buf} %{field}\n",
            g = gep,
            buf = buf_id,
            field = field_id
        );
        let val = ctx.next_index();
        out += &format!("%{v} = OpLoad %uint %{g}\n", v = val, g = gep);
        let (name, _) = variable_name(&inst.dst, i);
        out += &format!("OpStore %{} %{}\n", name, val);
    }
    Ok(out)
}

/// `SBufferLoadDword{,xN} dst, src0, src1` — `src1` identifies the bound
/// storage-buffer descriptor, `src0` the byte offset within it. Reads `n`
/// consecutive dwords into `dst`.
pub fn sbuffer_load(inst: &ShaderInstruction, ctx: &mut TranslationContext, n: u32) -> Result<String> {
    let mut out = String::new();
    let offset = ctx.next_index();
    out += &load_uint(&inst.src[0], &offset, &offset, None, &mut ctx.consts)?;
    for i in 0..n {
        let delta_id = ctx.consts.insert(ConstTy::Uint, i * 4);
        let byte_off = ctx.next_index();
        out += &format!("%{b} = OpIAdd %uint %{o} %{c}\n", b = byte_off, o = offset, c = delta_id);
        let word_idx = ctx.next_index();
        out += &format!("%{w} = OpUDiv %uint %{b} %uint_4\n", w = word_idx, b = byte_off);
        let gep = ctx.next_index();
        out += &format!(
            "%{g} = OpAccessChain %_ptr_StorageBuffer_uint %sbuffer_res_{slot} %uint_0 %{idx}\n",
            g = gep,
            slot = inst.src[1].register_id,
            idx = word_idx
        );
        let val = ctx.next_index();
        out += &format!("%{v} = OpLoad %uint %{g}\n", v = val, g = gep);
        let (name, _) = variable_name(&inst.dst, i);
        out += &format!("OpStore %{} %{}\n", name, val);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerateConfig;
    use crate::model::{InstrFormat, OperandType, ShaderOperand};

    fn sload_inst(reg: u32, dst: u32, size: u32) -> ShaderInstruction {
        ShaderInstruction {
            pc: 0,
            ty: InstrType::SLoadDwordx4,
            format: InstrFormat::None,
            dst: ShaderOperand::reg_sized(OperandType::Sgpr, dst, size),
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::reg(OperandType::Sgpr, reg), ShaderOperand::unused(), ShaderOperand::unused(), ShaderOperand::unused()],
            src_num: 1,
        }
    }

    #[test]
    fn load_dwordx_n_rejects_unbound_extended_mapping() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let resources = ShaderResources::default();
        let inst = sload_inst(10, 20, 4);
        let err = load_dwordx_n(&inst, &mut ctx, &resources, 4).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBindingConfig { .. }));
    }

    #[test]
    fn load_dwordx_n_resolves_each_row_to_its_mapped_buffer_field() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let mut resources = ShaderResources::default();
        resources.extended_used = true;
        resources.extended_start_register = 10;
        for row in 0..4 {
            ctx.set_extended_mapping(row, 2, row as u32);
        }
        let inst = sload_inst(10, 20, 4);
        let text = load_dwordx_n(&inst, &mut ctx, &resources, 4).unwrap();
        assert_eq!(text.matches("OpAccessChain %_ptr_PushConstant_uint %push_constants").count(), 4);
        for reg in 20..24 {
            assert!(text.contains(&format!("OpStore %s{}", reg)), "missing store into s{}", reg);
        }
    }

    #[test]
    fn sbuffer_load_reads_n_consecutive_dwords_at_increasing_byte_offsets() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = ShaderInstruction {
            pc: 0,
            ty: InstrType::SBufferLoadDwordx4,
            format: InstrFormat::None,
            dst: ShaderOperand::reg_sized(OperandType::Sgpr, 20, 4),
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::uint_const(0), ShaderOperand::reg(OperandType::Sgpr, 0), ShaderOperand::unused(), ShaderOperand::unused()],
            src_num: 2,
        };
        let text = sbuffer_load(&inst, &mut ctx, 4).unwrap();
        assert_eq!(text.matches("OpAccessChain %_ptr_StorageBuffer_uint %sbuffer_res_0").count(), 4);
        for reg in 20..24 {
            assert!(text.contains(&format!("OpStore %s{}", reg)));
        }
    }
}
