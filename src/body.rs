//! Main-function emission (component G): local variable declarations,
//! EXEC/EXECZ/SCC initialization, stage-specific input wiring, resource
//! descriptor binding (including the extended push-constant mapping table
//! `SLoadDwordx*` consults), the instruction walk with structured label
//! placement, and the trailing `OpFunctionEnd`.
use crate::context::TranslationContext;
use crate::error::{Error, Result};
use crate::input::ShaderResources;
use crate::model::{InstrFormat, InstrType, ShaderCode, ShaderInstruction, ShaderType};
use crate::rules::{self, BranchLabels};
use crate::stage::TranslationInputs;

fn is_branch(ty: InstrType) -> bool {
    matches!(ty, InstrType::SCbranchScc0 | InstrType::SCbranchExecz)
}

/// The kill-only pixel export (`Exp mrt0, off, off compr vm done`) is a
/// terminator exactly when kill-enable is set: the export rule has
/// already emitted `OpKill` in that case (see `rules::export::
/// mrt0_kill_only`), so nothing downstream may add another terminator to
/// the same block.
fn is_kill_export(inst: &ShaderInstruction, inputs: &TranslationInputs) -> bool {
    matches!(inst.ty, InstrType::Exp)
        && matches!(inst.format, InstrFormat::Mrt0OffOffComprVmDone)
        && inputs.pixel().map(|p| p.ps_pixel_kill_enable).unwrap_or(false)
}

fn is_terminator(inst: &ShaderInstruction, inputs: &TranslationInputs) -> bool {
    matches!(inst.ty, InstrType::SEndpgm) || is_branch(inst.ty) || is_kill_export(inst, inputs)
}

/// Assigns every bound resource its push-constant slot range and, for the
/// ones marked `extended`, records the `(buffer, field)` pair each of its
/// rows resolves to. Slot indices advance for every bound resource in ABI
/// order regardless of `extended`, since the layout is shared ground truth
/// with the pipeline-layout builder on the other side of the ABI.
fn bind_resources(ctx: &mut TranslationContext, resources: &ShaderResources) {
    let mut next_buffer_slot = 0u32;
    for (kind, binding) in resources.slot_order() {
        let width = kind.register_width();
        if binding.extended {
            for w in 0..width {
                let buffer = next_buffer_slot + w / 4;
                let field = w % 4;
                let row = (binding.start_register - resources.extended_start_register + w) as usize;
                ctx.set_extended_mapping(row, buffer, field);
            }
        }
        next_buffer_slot += (width + 3) / 4;
    }
}

/// Stage-specific prolog: the fixed wiring from builtin inputs into the
/// general-purpose register file every shader of that stage starts with,
/// per the recompiler specification's main-body design.
fn stage_prolog(ctx: &mut TranslationContext, ty: ShaderType, inputs: &TranslationInputs) -> String {
    let mut out = String::new();
    match ty {
        ShaderType::Vertex => {
            let idx = ctx.next_index();
            out += &format!("%{idx} = OpLoad %int %gl_VertexIndex\n", idx = idx);
            let bitcast = ctx.next_index();
            out += &format!("%{b} = OpBitcast %float %{i}\n", b = bitcast, i = idx);
            out += &format!("OpStore %v0 %{}\n", bitcast);
        }
        ShaderType::Pixel => {
            if inputs.pixel().map(|p| p.ps_pos_xy).unwrap_or(false) {
                let frag = ctx.next_index();
                out += &format!("%{f} = OpLoad %v4float %gl_FragCoord\n", f = frag);
                let x = ctx.next_index();
                out += &format!("%{x} = OpCompositeExtract %float %{f} 0\n", x = x, f = frag);
                out += &format!("OpStore %v2 %{}\n", x);
                let y = ctx.next_index();
                out += &format!("%{y} = OpCompositeExtract %float %{f} 1\n", y = y, f = frag);
                out += &format!("OpStore %v3 %{}\n", y);
            }
        }
        ShaderType::Compute => {
            let local_id = ctx.next_index();
            out += &format!("%{l} = OpLoad %v3uint %gl_LocalInvocationID\n", l = local_id);
            let local_x = ctx.next_index();
            out += &format!("%{x} = OpCompositeExtract %uint %{l} 0\n", x = local_x, l = local_id);
            let local_xf = ctx.next_index();
            out += &format!("%{xf} = OpBitcast %float %{x}\n", xf = local_xf, x = local_x);
            out += &format!("OpStore %v0 %{}\n", local_xf);

            let workgroup_id = ctx.next_index();
            out += &format!("%{w} = OpLoad %v3uint %gl_WorkGroupID\n", w = workgroup_id);
            let workgroup_x = ctx.next_index();
            out += &format!("%{x} = OpCompositeExtract %uint %{w} 0\n", x = workgroup_x, w = workgroup_id);
            if let Some(c) = inputs.compute() {
                out += &format!("OpStore %s{reg} %{val}\n", reg = c.workgroup_register, val = workgroup_x);
            }
        }
    }
    out
}

/// Emits `%main`'s body, from `OpFunction` through `OpFunctionEnd`.
pub fn emit_body(code: &ShaderCode, ctx: &mut TranslationContext, inputs: &TranslationInputs) -> Result<String> {
    bind_resources(ctx, inputs.resources);

    let mut text = String::new();
    text += "%main = OpFunction %void None %fn_void\n";
    text += "%entry = OpLabel\n";
    text += &ctx.vars.emit_declarations();
    text += "OpStore %scc %uint_0\nOpStore %exec_lo %uint_1\nOpStore %exec_hi %uint_0\nOpStore %execz %uint_0\n";
    text += &stage_prolog(ctx, code.ty, inputs);

    let dst_pcs: std::collections::BTreeSet<u32> = code.labels.iter().map(|l| l.dst_pc).collect();
    let instrs = &code.instructions;
    let mut emitted_labels: std::collections::BTreeSet<u32> = std::collections::BTreeSet::new();

    let mut prev_was_terminator = false;
    let mut prev_was_kill_export = false;
    for (pos, inst) in instrs.iter().enumerate() {
        if pos != 0 && dst_pcs.contains(&inst.pc) && !emitted_labels.contains(&inst.pc) {
            if !prev_was_terminator {
                text += &format!("OpBranch %block_{}\n", inst.pc);
            }
            text += &format!("%block_{} = OpLabel\n", inst.pc);
            emitted_labels.insert(inst.pc);
        }

        let (taken, fallthrough) = if is_branch(inst.ty) {
            let target_pc = code
                .labels
                .iter()
                .find(|l| l.src_pc == inst.pc)
                .map(|l| l.dst_pc)
                .ok_or_else(|| Error::Bug { reason: format!("branch at pc={} has no resolved label", inst.pc) })?;
            let fallthrough_pc = instrs.get(pos + 1).map(|n| n.pc).unwrap_or(inst.pc);
            (Some(format!("block_{}", target_pc)), Some(format!("block_{}", fallthrough_pc)))
        } else {
            (None, None)
        };
        let branch_labels = match (&taken, &fallthrough) {
            (Some(t), Some(f)) => Some(BranchLabels { taken: t, fallthrough: f }),
            _ => None,
        };

        text += &rules::recompile_instruction(inst, ctx, inputs, branch_labels, prev_was_kill_export)?;
        prev_was_kill_export = is_kill_export(inst, inputs);

        if is_branch(inst.ty) {
            let fallthrough_pc = instrs.get(pos + 1).map(|n| n.pc).unwrap_or(inst.pc);
            if !emitted_labels.contains(&fallthrough_pc) {
                text += &format!("%block_{} = OpLabel\n", fallthrough_pc);
                emitted_labels.insert(fallthrough_pc);
            }
        }
        prev_was_terminator = is_terminator(inst, inputs);
    }
    if !prev_was_terminator {
        text += "OpReturn\n";
    }
    text += "OpFunctionEnd\n";
    Ok(text)
}
