//! `gcn-spirv-recompiler`: translates a decoded GCN shader
//! ([`model::ShaderCode`]) plus its pipeline-resource binding info
//! ([`input::ShaderResources`] and one of [`input::VertexInputInfo`],
//! [`input::PixelInputInfo`], [`input::ComputeInputInfo`]) into a textual
//! SPIR-V assembly module a downstream assembler can turn into a binary.
//!
//! The crate has two entry points, [`generate`] and [`generate_with_config`];
//! everything else is the machinery behind them:
//!
//! - [`model`] — the input data model (no emission logic).
//! - [`input`] — per-stage I/O description and resource-binding layout.
//! - [`operand`] — operand classification and scalar-name rendering.
//! - [`pool`] — the constant pool and variable pool, the two deduplicated
//!   registries every emitted id resolves against.
//! - [`loader`] — the `int`/`uint`/`float` operand loader.
//! - [`context`] — the per-invocation translation state.
//! - [`stage`] — stage-info validation and the bundle threaded through
//!   rule dispatch.
//! - [`header`] — capabilities, entry point, types, resource declarations.
//! - [`body`] — the main function: prolog, instruction walk, terminator.
//! - [`rules`] — the instruction-to-SPIR-V dispatch table and its families.
//! - [`support`] — conditionally appended helper functions.
//! - [`embedded`] — the fixed-function embedded-shader registry.
//! - [`config`] — the generation configuration builder.
//! - [`error`] — the error and result types.
//!
//! Two independent calls never share state — each owns its own
//! [`context::TranslationContext`] — so there is nothing to synchronize
//! when translating multiple shaders concurrently.
pub mod body;
pub mod config;
pub mod context;
pub mod embedded;
pub mod error;
pub mod header;
pub mod input;
pub mod loader;
pub mod model;
pub mod operand;
pub mod pool;
pub mod rules;
pub mod stage;
pub mod support;

pub use config::GenerateConfig;
pub use embedded::{get_embedded_ps, get_embedded_vs};
pub use error::{Error, Result};
pub use input::{
    ComputeInputInfo, FetchResource, PixelInputInfo, ResourceBinding, ResourceClass, ResourceKind, ShaderResources,
    TargetOutputMode, VertexInputInfo,
};
pub use model::{InstrFormat, InstrType, Label, OperandType, ShaderCode, ShaderInstruction, ShaderOperand, ShaderType};

use context::TranslationContext;
use pool::ConstTy;
use stage::StageInfo;
use support::SupportFlags;

/// Translates `code` into a SPIR-V text module using the default
/// [`GenerateConfig`]. Exactly one of `vs_info`/`ps_info`/`cs_info` must be
/// `Some`, matching `code.ty`.
pub fn generate(
    code: &ShaderCode,
    vs_info: Option<&VertexInputInfo>,
    ps_info: Option<&PixelInputInfo>,
    cs_info: Option<&ComputeInputInfo>,
    resources: &ShaderResources,
) -> Result<String> {
    generate_with_config(code, vs_info, ps_info, cs_info, resources, GenerateConfig::new())
}

/// Like [`generate`], with an explicit [`GenerateConfig`]. Nothing in
/// `config` changes the SPIR-V instructions produced — only what gets
/// emitted alongside them for diagnostics.
pub fn generate_with_config(
    code: &ShaderCode,
    vs_info: Option<&VertexInputInfo>,
    ps_info: Option<&PixelInputInfo>,
    cs_info: Option<&ComputeInputInfo>,
    resources: &ShaderResources,
    config: GenerateConfig,
) -> Result<String> {
    log::debug!("generating SPIR-V for a {:?} shader, {} instructions", code.ty, code.instructions.len());
    let inputs = stage::resolve_stage(code.ty, vs_info, ps_info, cs_info, resources)?;
    let mut ctx = TranslationContext::new(config);

    ctx.consts.seed(true, inputs.compute().map(|c| c.threads_num));
    if resources.extended_used {
        ctx.consts.insert(ConstTy::Uint, header::total_push_constant_slots(resources));
    }
    ctx.consts.walk_instructions(code);

    ctx.vars.seed();
    match &inputs.stage {
        StageInfo::Vertex(v) => ctx.vars.seed_vertex_stage(v),
        StageInfo::Pixel(p) => ctx.vars.seed_pixel_stage(p),
        StageInfo::Compute(c) => ctx.vars.seed_compute_stage(c),
    }
    ctx.vars.seed_resources(resources);
    ctx.vars.walk_instructions(code);

    let support_flags = SupportFlags::compute(code);

    let body_text = body::emit_body(code, &mut ctx, &inputs)?;
    let header_text = header::emit_header(
        code.ty,
        &inputs,
        &ctx.consts,
        &support_flags,
        ctx.config.emit_disassembly_comments,
        ctx.config.target_env,
    );
    let support_text = support::emit_functions(&support_flags);

    let mut module = String::with_capacity(header_text.len() + body_text.len() + support_text.len());
    module += &header_text;
    module += &body_text;
    module += &support_text;
    log::trace!("generated module is {} bytes", module.len());
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstrFormat, ShaderInstruction};

    fn endpgm(pc: u32) -> ShaderInstruction {
        ShaderInstruction {
            pc,
            ty: InstrType::SEndpgm,
            format: InstrFormat::None,
            dst: ShaderOperand::unused(),
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::unused(); 4],
            src_num: 0,
        }
    }

    // E1: a minimal vertex shader with no instructions but the mandatory
    // terminator produces a structurally complete module.
    #[test]
    fn e1_minimal_vertex_shader_generates_a_complete_module() {
        let code = ShaderCode::new(ShaderType::Vertex, vec![endpgm(0)], vec![]);
        let vs_info = VertexInputInfo::default();
        let resources = ShaderResources::default();
        let text = generate(&code, Some(&vs_info), None, None, &resources).unwrap();
        assert!(text.contains("OpCapability Shader"));
        assert!(text.contains("OpEntryPoint Vertex %main \"main\""));
        assert!(text.contains("%main = OpFunction %void None %fn_void"));
        assert!(text.contains("OpFunctionEnd"));
    }

    // E2: SAddI32 writes its sum and the matched-signs-with-sign-change
    // overflow flag into SCC.
    #[test]
    fn e2_scalar_add_sets_scc_from_signed_overflow() {
        let add = ShaderInstruction {
            pc: 0,
            ty: InstrType::SAddI32,
            format: InstrFormat::SdstSsrc0Ssrc1,
            dst: ShaderOperand::reg(OperandType::Sgpr, 2),
            dst2: ShaderOperand::unused(),
            src: [
                ShaderOperand::reg(OperandType::Sgpr, 0),
                ShaderOperand::reg(OperandType::Sgpr, 1),
                ShaderOperand::unused(),
                ShaderOperand::unused(),
            ],
            src_num: 2,
        };
        let code = ShaderCode::new(ShaderType::Vertex, vec![add, endpgm(4)], vec![]);
        let vs_info = VertexInputInfo::default();
        let resources = ShaderResources::default();
        let text = generate(&code, Some(&vs_info), None, None, &resources).unwrap();
        assert!(text.contains("OpIAdd %int"));
        assert!(text.contains("OpStore %scc"));
        assert!(text.contains("OpStore %s2"));
    }

    // E3: the canonical three-instruction kill pattern (`SMovB64 EXEC, 0 ;
    // Exp mrt0, off, off compr vm done ; SEndpgm`) with kill-enable set
    // expands to exactly one OpKill and no OpReturn — the Exp rule emits
    // the OpKill, and SEndpgm recognizes the block is already terminated.
    #[test]
    fn e3_pixel_kill_pattern_expands_to_opkill_only() {
        let zero_exec = ShaderInstruction {
            pc: 0,
            ty: InstrType::SMovB64,
            format: InstrFormat::Sdst2Ssrc02,
            dst: ShaderOperand::reg_sized(OperandType::ExecLo, 0, 2),
            dst2: ShaderOperand::unused(),
            src: [
                ShaderOperand::uint_const(0),
                ShaderOperand::unused(),
                ShaderOperand::unused(),
                ShaderOperand::unused(),
            ],
            src_num: 1,
        };
        let kill_export = ShaderInstruction {
            pc: 4,
            ty: InstrType::Exp,
            format: InstrFormat::Mrt0OffOffComprVmDone,
            dst: ShaderOperand::unused(),
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::unused(); 4],
            src_num: 0,
        };
        let code = ShaderCode::new(ShaderType::Pixel, vec![zero_exec, kill_export, endpgm(8)], vec![]);
        let ps_info = PixelInputInfo { ps_pixel_kill_enable: true, ..Default::default() };
        let resources = ShaderResources::default();
        let text = generate(&code, None, Some(&ps_info), None, &resources).unwrap();
        assert_eq!(text.matches("OpKill").count(), 1);
        assert!(!text.contains("OpReturn"));
    }

    // A pixel shader that merely has kill-enable set in the pipeline but
    // never emits the kill-only export still returns normally: the
    // pattern, not the flag alone, gates OpKill.
    #[test]
    fn kill_enable_without_the_kill_pattern_still_returns() {
        let code = ShaderCode::new(ShaderType::Pixel, vec![endpgm(0)], vec![]);
        let ps_info = PixelInputInfo { ps_pixel_kill_enable: true, ..Default::default() };
        let resources = ShaderResources::default();
        let text = generate(&code, None, Some(&ps_info), None, &resources).unwrap();
        assert!(!text.contains("OpKill"));
        assert!(text.contains("OpReturn"));
    }

    // E4: a compute shader's execution mode reflects the caller's actual
    // workgroup dimensions, and the workgroup-id prolog feeds the bound
    // workgroup register.
    #[test]
    fn e4_compute_workgroup_dims_and_wiring() {
        let code = ShaderCode::new(ShaderType::Compute, vec![endpgm(0)], vec![]);
        let cs_info = ComputeInputInfo { threads_num: [8, 4, 1], workgroup_register: 3 };
        let resources = ShaderResources::default();
        let text = generate(&code, None, None, Some(&cs_info), &resources).unwrap();
        assert!(text.contains("OpExecutionMode %main LocalSize 8 4 1"));
        assert!(text.contains("OpStore %s3"));
        assert!(text.contains("%gl_WorkGroupID = OpVariable"));
    }

    // E5: a storage-buffer load resolves against the bound descriptor's
    // register, not an arbitrary fixed name.
    #[test]
    fn e5_buffer_load_resolves_bound_descriptor() {
        let load = ShaderInstruction {
            pc: 0,
            ty: InstrType::BufferLoadDword,
            format: InstrFormat::Vdata1Vaddr1SsssOffenIdxen,
            dst: ShaderOperand::reg(OperandType::Vgpr, 5),
            dst2: ShaderOperand::unused(),
            src: [
                ShaderOperand::reg(OperandType::Vgpr, 0),
                ShaderOperand::reg(OperandType::Sgpr, 0),
                ShaderOperand::unused(),
                ShaderOperand::unused(),
            ],
            src_num: 2,
        };
        let code = ShaderCode::new(ShaderType::Vertex, vec![load, endpgm(4)], vec![]);
        let vs_info = VertexInputInfo::default();
        let mut resources = ShaderResources::default();
        resources.storage_buffers.bindings.push(ResourceBinding { binding_index: 0, start_register: 0, extended: false });
        let text = generate(&code, Some(&vs_info), None, None, &resources).unwrap();
        assert!(text.contains("%sbuffer_res_0 = OpVariable"));
        assert!(text.contains("OpAccessChain %_ptr_StorageBuffer_uint %sbuffer_res_0"));
    }

    // E6: ImageSample with a full dmask samples the bound texture/sampler
    // pair and writes all four destination components.
    #[test]
    fn e6_image_sample_dmask_f_writes_four_components() {
        let sample = ShaderInstruction {
            pc: 0,
            ty: InstrType::ImageSample,
            format: InstrFormat::Vdata4Vaddr3StSsDmask { dmask: 0xF },
            dst: ShaderOperand::reg(OperandType::Vgpr, 0),
            dst2: ShaderOperand::unused(),
            src: [
                ShaderOperand::reg(OperandType::Vgpr, 1),
                ShaderOperand::reg(OperandType::Vgpr, 2),
                ShaderOperand::reg(OperandType::Sgpr, 4),
                ShaderOperand::reg(OperandType::Sgpr, 8),
            ],
            src_num: 4,
        };
        let code = ShaderCode::new(ShaderType::Pixel, vec![sample, endpgm(4)], vec![]);
        let ps_info = PixelInputInfo::default();
        let mut resources = ShaderResources::default();
        resources.textures2d.bindings.push(ResourceBinding { binding_index: 0, start_register: 4, extended: false });
        resources.samplers.bindings.push(ResourceBinding { binding_index: 1, start_register: 8, extended: false });
        let text = generate(&code, None, Some(&ps_info), None, &resources).unwrap();
        assert!(text.contains("OpImageSampleImplicitLod"));
        assert!(text.contains("texture_res_4"));
        assert!(text.contains("sampler_res_8"));
        assert_eq!(text.matches("OpCompositeExtract %float").count(), 4);
    }

    // E7: the embedded full-screen shader pair round-trips independently of
    // the recompiler pipeline.
    #[test]
    fn e7_embedded_shader_round_trip() {
        let vs = get_embedded_vs(0).unwrap();
        let ps = get_embedded_ps(0).unwrap();
        assert!(vs.contains("OpEntryPoint Vertex"));
        assert!(ps.contains("OpEntryPoint Fragment"));
        assert!(get_embedded_vs(99).is_err());
    }

    #[test]
    fn generation_is_deterministic() {
        let code = ShaderCode::new(ShaderType::Vertex, vec![endpgm(0)], vec![]);
        let vs_info = VertexInputInfo::default();
        let resources = ShaderResources::default();
        let a = generate(&code, Some(&vs_info), None, None, &resources).unwrap();
        let b = generate(&code, Some(&vs_info), None, None, &resources).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn config_comments_do_not_change_computed_instructions() {
        let code = ShaderCode::new(ShaderType::Vertex, vec![endpgm(0)], vec![]);
        let vs_info = VertexInputInfo::default();
        let resources = ShaderResources::default();
        let bare = generate(&code, Some(&vs_info), None, None, &resources).unwrap();
        let mut config = GenerateConfig::new();
        config.emit_disassembly_comments(true);
        let commented = generate_with_config(&code, Some(&vs_info), None, None, &resources, config).unwrap();
        let strip_comments = |s: &str| -> String {
            s.lines().filter(|l| !l.trim_start().starts_with(';')).collect::<Vec<_>>().join("\n")
        };
        assert_eq!(strip_comments(&bare), strip_comments(&commented));
    }

    #[test]
    fn supplying_two_stage_infos_is_rejected() {
        let code = ShaderCode::new(ShaderType::Vertex, vec![endpgm(0)], vec![]);
        let vs_info = VertexInputInfo::default();
        let ps_info = PixelInputInfo::default();
        let resources = ShaderResources::default();
        let err = generate(&code, Some(&vs_info), Some(&ps_info), None, &resources).unwrap_err();
        assert!(matches!(err, Error::InvalidStageCombination { .. }));
    }

    // The crate never initializes a logger itself (no global state, per the
    // design notes); it's up to whatever links it. Here that's the test
    // harness, same as the teacher's own examples call `env_logger::init()`
    // before touching the library.
    #[test]
    fn failed_generation_logs_through_the_caller_installed_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
        let bad = ShaderInstruction {
            pc: 0,
            ty: InstrType::ImageSample,
            format: InstrFormat::None,
            dst: ShaderOperand::unused(),
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::unused(); 4],
            src_num: 0,
        };
        let code = ShaderCode::new(ShaderType::Pixel, vec![bad, endpgm(4)], vec![]);
        let ps_info = PixelInputInfo::default();
        let resources = ShaderResources::default();
        let err = generate(&code, None, Some(&ps_info), None, &resources).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInstruction { .. }));
    }
}
