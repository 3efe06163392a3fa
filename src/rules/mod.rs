//! Instruction rules (component E): the single dispatch point mapping a
//! decoded [`ShaderInstruction`] to the SPIR-V text it expands to.
//!
//! Per the design notes' recommendation, dispatch is one `match` over
//! `(inst.ty, inst.format)` rather than a function-pointer table — every
//! arm is a thin call into a family submodule, so the match itself stays
//! readable even as families accrete variants.
pub mod export;
pub mod gds;
pub mod image;
pub mod pack_interp;
pub mod scalar_alu;
pub mod scalar_branch;
pub mod scalar_cmp;
pub mod scalar_mem;
pub mod vector_alu;
pub mod vector_cmp;
pub mod vector_mem;
pub mod vertex_fetch;

use crate::context::TranslationContext;
use crate::error::{Error, Result};
use crate::model::{InstrFormat, InstrType, ShaderInstruction};
use crate::stage::TranslationInputs;

/// Branch-edge label ids resolved by the body emitter from the
/// instruction's position in the branch table before dispatch, since
/// rule functions never see label bookkeeping directly.
pub struct BranchLabels<'a> {
    pub taken: &'a str,
    pub fallthrough: &'a str,
}

fn unsupported(inst: &ShaderInstruction) -> Error {
    Error::UnsupportedInstruction { pc: inst.pc, ty: inst.ty, format: inst.format.clone(), disassembly: inst.disassemble() }
        .logged()
}

/// Translates one instruction into its SPIR-V expansion. `branch_labels`
/// must be `Some` for `SCbranchScc0`/`SCbranchExecz` and is ignored
/// otherwise. `prev_was_kill_export` is only consulted by `SEndpgm`, which
/// must not re-terminate a block the preceding kill-only `Exp` already
/// closed with `OpKill`.
pub fn recompile_instruction(
    inst: &ShaderInstruction,
    ctx: &mut TranslationContext,
    inputs: &TranslationInputs,
    branch_labels: Option<BranchLabels>,
    prev_was_kill_export: bool,
) -> Result<String> {
    use InstrType::*;

    match inst.ty {
        SAndB32 => scalar_alu::bitwise_b32(inst, ctx, "OpBitwiseAnd", true),
        SLshlB32 => scalar_alu::bitwise_b32(inst, ctx, "OpShiftLeftLogical", true),
        SLshrB32 => scalar_alu::bitwise_b32(inst, ctx, "OpShiftRightLogical", true),
        SCselectB32 => scalar_alu::cselect_b32(inst, ctx),

        SAddI32 => scalar_alu::add_i32(inst, ctx),
        SMulI32 => scalar_alu::mul_i32(inst, ctx),

        SAndB64 => scalar_alu::logical_b64(inst, ctx, "OpBitwiseAnd"),
        SOrB64 => scalar_alu::logical_b64(inst, ctx, "OpBitwiseOr"),
        SXorB64 => scalar_alu::logical_b64(inst, ctx, "OpBitwiseXor"),

        SMovB32 => scalar_alu::mov_b32(inst, ctx),
        SMovB64 => scalar_alu::mov_b64(inst, ctx),
        SAndSaveexecB64 => scalar_alu::and_saveexec_b64(inst, ctx),

        SCmpEqU32 => scalar_cmp::cmp_u32(inst, ctx, "OpIEqual"),
        SCmpLgU32 => scalar_cmp::cmp_u32(inst, ctx, "OpINotEqual"),
        SCmpGtU32 => scalar_cmp::cmp_u32(inst, ctx, "OpUGreaterThan"),
        SCmpGeU32 => scalar_cmp::cmp_u32(inst, ctx, "OpUGreaterThanEqual"),
        SCmpLtU32 => scalar_cmp::cmp_u32(inst, ctx, "OpULessThan"),
        SCmpLeU32 => scalar_cmp::cmp_u32(inst, ctx, "OpULessThanEqual"),

        SCbranchScc0 => {
            let labels = branch_labels.ok_or_else(|| Error::Bug { reason: "SCbranchScc0 dispatched without branch labels".into() })?;
            Ok(scalar_branch::cbranch_scc0(ctx, labels.taken, labels.fallthrough))
        }
        SCbranchExecz => {
            let labels = branch_labels.ok_or_else(|| Error::Bug { reason: "SCbranchExecz dispatched without branch labels".into() })?;
            Ok(scalar_branch::cbranch_execz(ctx, labels.taken, labels.fallthrough))
        }
        SEndpgm => Ok(scalar_branch::endpgm(prev_was_kill_export)),
        SWaitcnt => Ok(scalar_branch::waitcnt()),

        SLoadDwordx4 => scalar_mem::load_dwordx_n(inst, ctx, inputs.resources, 4),
        SLoadDwordx8 => scalar_mem::load_dwordx_n(inst, ctx, inputs.resources, 8),
        SBufferLoadDword => scalar_mem::sbuffer_load(inst, ctx, 1),
        SBufferLoadDwordx2 => scalar_mem::sbuffer_load(inst, ctx, 2),
        SBufferLoadDwordx4 => scalar_mem::sbuffer_load(inst, ctx, 4),
        SBufferLoadDwordx8 => scalar_mem::sbuffer_load(inst, ctx, 8),
        SBufferLoadDwordx16 => scalar_mem::sbuffer_load(inst, ctx, 16),

        BufferLoadDword => vector_mem::buffer_load_dword(inst, ctx),
        BufferLoadFormatX => vector_mem::buffer_load_format_x(inst, ctx),
        BufferStoreDword => vector_mem::buffer_store_dword(inst, ctx),
        BufferStoreFormatX => vector_mem::buffer_store_format_x(inst, ctx),
        TBufferLoadFormatXyzw => vector_mem::tbuffer_load_format_xyzw(inst, ctx),

        ImageSample => match &inst.format {
            InstrFormat::Vdata4Vaddr3StSsDmask { dmask } => image::image_sample(inst, ctx, *dmask),
            _ => Err(unsupported(inst)),
        },

        VAddF32 => vector_alu::float_binary(inst, ctx, "OpFAdd", false),
        VMulF32 => vector_alu::float_binary(inst, ctx, "OpFMul", false),
        VMinF32 => vector_alu::float_binary_ext(inst, ctx, "FMin"),
        VMaxF32 => vector_alu::float_binary_ext(inst, ctx, "FMax"),
        VSubF32 => vector_alu::float_binary(inst, ctx, "OpFSub", false),
        VSubrevF32 => vector_alu::float_binary(inst, ctx, "OpFSub", true),
        VMacF32 => vector_alu::mac_f32(inst, ctx),
        VRcpF32 => vector_alu::rcp_f32(inst, ctx),
        VRsqF32 => vector_alu::float_unary_ext(inst, ctx, "InverseSqrt"),
        VSqrtF32 => vector_alu::float_unary_ext(inst, ctx, "Sqrt"),
        VCvtF32I32 => vector_alu::cvt_f32(inst, ctx, true),
        VCvtF32U32 => vector_alu::cvt_f32(inst, ctx, false),

        VMulU32U24 => vector_alu::mul_u24(inst, ctx, false),
        VMadU32U24 => vector_alu::mul_u24(inst, ctx, true),
        VMulLoI32 => vector_alu::mul_lo_i32(inst, ctx),
        VMadF32 => vector_alu::mac_f32(inst, ctx),
        VSadU32 => vector_alu::sad_u32(inst, ctx),
        VBfeU32 => vector_alu::bfe_u32(inst, ctx),
        VAddI32 => vector_alu::add_sub_i32_carry(inst, ctx, false, false),
        VSubI32 => vector_alu::add_sub_i32_carry(inst, ctx, true, false),
        VSubrevI32 => vector_alu::add_sub_i32_carry(inst, ctx, true, true),
        VLshlB32 => vector_alu::shift_logical(inst, ctx, "OpShiftLeftLogical"),
        VLshrB32 => vector_alu::shift_logical(inst, ctx, "OpShiftRightLogical"),
        VAshrrevI32 => vector_alu::ashrrev_i32(inst, ctx),

        VCmpEqF32 => vector_cmp::cmp_f32(inst, ctx, "OpFOrdEqual"),
        VCmpLtF32 => vector_cmp::cmp_f32(inst, ctx, "OpFOrdLessThan"),
        VCmpLeF32 => vector_cmp::cmp_f32(inst, ctx, "OpFOrdLessThanEqual"),
        VCmpGtF32 => vector_cmp::cmp_f32(inst, ctx, "OpFOrdGreaterThan"),
        VCmpGeF32 => vector_cmp::cmp_f32(inst, ctx, "OpFOrdGreaterThanEqual"),
        VCmpNeF32 => vector_cmp::cmp_f32(inst, ctx, "OpFOrdNotEqual"),
        VCmpEqI32 => vector_cmp::cmp_i32(inst, ctx, "OpIEqual"),
        VCmpLtI32 => vector_cmp::cmp_i32(inst, ctx, "OpSLessThan"),
        VCmpEqU32 => vector_cmp::cmp_u32(inst, ctx, "OpIEqual"),
        VCmpLtU32 => vector_cmp::cmp_u32(inst, ctx, "OpULessThan"),
        VCmpxEqI32 => vector_cmp::cmpx_i32(inst, ctx, "OpIEqual"),
        VCmpxGtU32 => vector_cmp::cmpx_u32(inst, ctx, "OpUGreaterThan"),

        VCndmaskB32 => vector_cmp::cndmask_b32(inst, ctx),

        VCvtPkrtzF16F32 => pack_interp::cvt_pkrtz_f16_f32(inst, ctx),

        VInterpP1F32 => Ok(pack_interp::interp_p1_f32()),
        VInterpP2F32 => match &inst.format {
            InstrFormat::AttrChan { attr, chan } => pack_interp::interp_p2_f32(inst, ctx, *attr, *chan),
            _ => Err(unsupported(inst)),
        },

        Exp => match &inst.format {
            InstrFormat::Mrt0Vsrc0Vsrc1ComprVmDone => export::mrt0_packed_half(inst, ctx),
            InstrFormat::Mrt0Vsrc0Vsrc1Vsrc2Vsrc3VmDone => export::mrt0_four_float(inst, ctx),
            InstrFormat::Mrt0OffOffComprVmDone => {
                Ok(export::mrt0_kill_only(inputs.pixel().map(|p| p.ps_pixel_kill_enable).unwrap_or(false)))
            }
            InstrFormat::ParamVsrc0Vsrc1Vsrc2Vsrc3 { param } => export::param(inst, ctx, *param),
            InstrFormat::Pos0Vsrc0Vsrc1Vsrc2Vsrc3Done => export::pos0(inst, ctx),
            _ => Err(unsupported(inst)),
        },

        SSwappcB64 => match inputs.vertex() {
            Some(v) => {
                let mut out = String::new();
                for resource in &v.resources {
                    out += &vertex_fetch::expand(ctx, resource);
                }
                Ok(out)
            }
            None => Err(Error::InvalidStageCombination { reason: "SSwappcB64 vertex-fetch thunk used outside the vertex stage".into() }.logged()),
        },

        DsAppend => gds::ds_append(inst, ctx),
        DsConsume => gds::ds_consume(inst, ctx),

        SWqmB64 => scalar_alu::wqm_b64(inst),
    }
}
