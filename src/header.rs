//! Header emission (component F): capabilities, entry point, execution
//! mode, decorations, standard types, resource types, and the pooled
//! constant/variable declarations.
use crate::input::{ResourceKind, ShaderResources};
use crate::model::ShaderType;
use crate::pool::ConstantPool;
use crate::stage::TranslationInputs;
use crate::support::SupportFlags;

fn stage_execution_model(ty: ShaderType) -> &'static str {
    match ty {
        ShaderType::Vertex => "Vertex",
        ShaderType::Pixel => "Fragment",
        ShaderType::Compute => "GLCompute",
    }
}

fn resource_prefix(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::StorageBuffer => "sbuffer_res",
        ResourceKind::Texture2d => "texture_res",
        ResourceKind::Sampler => "sampler_res",
        ResourceKind::GdsPointer => "gds_pointer_res",
    }
}

fn fetch_vec_type(registers_num: u32) -> &'static str {
    match registers_num.clamp(1, 4) {
        1 => "float",
        2 => "v2float",
        3 => "v3float",
        _ => "v4float",
    }
}

/// Total push-constant slot count spanned by every bound resource, in the
/// ABI order from [`ShaderResources::slot_order`]. One slot is 16 bytes
/// (four `uint` fields); a resource occupies `ceil(register_width / 4)` of
/// them.
pub fn total_push_constant_slots(resources: &ShaderResources) -> u32 {
    resources
        .slot_order()
        .iter()
        .map(|(kind, _)| (kind.register_width() + 3) / 4)
        .sum::<u32>()
        .max(1)
}

/// Interface variable names that must be listed on `OpEntryPoint`, beyond
/// the always-present special registers.
fn interface_variables(ty: ShaderType, inputs: &TranslationInputs, resources: &ShaderResources) -> Vec<String> {
    let mut names = Vec::new();
    match ty {
        ShaderType::Vertex => {
            names.push("gl_Position".to_owned());
            names.push("gl_VertexIndex".to_owned());
            if let Some(v) = inputs.vertex() {
                for r in &v.resources {
                    names.push(format!("attr{}", r.attr_index));
                }
                for i in 0..v.export_count {
                    names.push(format!("param{}", i));
                }
            }
        }
        ShaderType::Pixel => {
            names.push("frag_color_0".to_owned());
            if let Some(p) = inputs.pixel() {
                if p.ps_pos_xy {
                    names.push("gl_FragCoord".to_owned());
                }
                for i in 0..p.input_num {
                    names.push(format!("attr{}", i));
                }
            }
        }
        ShaderType::Compute => {
            names.push("gl_LocalInvocationID".to_owned());
            names.push("gl_WorkGroupID".to_owned());
        }
    }
    for (kind, binding) in resources.slot_order() {
        names.push(format!("{}_{}", resource_prefix(kind), binding.start_register));
    }
    names
}

/// Renders the module preamble, up to and including the pooled constant
/// declarations. `Function`-storage-class local variables are *not*
/// declared here — SPIR-V requires those as the first instructions of
/// the function's entry block, so `crate::body` emits them.
///
/// Must be called only after every rule has finished emitting body text,
/// so that `consts` reflects every id ever allocated (including the late
/// inserts some rules make for literal offsets not covered by the
/// upfront pre-pass) — SPIR-V text order still comes out correct because
/// the caller concatenates this output *before* the body text it
/// describes.
pub fn emit_header(
    ty: ShaderType,
    inputs: &TranslationInputs,
    consts: &ConstantPool,
    support_flags: &SupportFlags,
    emit_disassembly_comments: bool,
    target_env: &str,
) -> String {
    let resources = inputs.resources;
    let mut out = String::new();
    if emit_disassembly_comments {
        out += &format!("; target_env = {}\n", target_env);
    }
    out += "OpCapability Shader\n";
    out += "%glsl_std_450 = OpExtInstImport \"GLSL.std.450\"\n";
    out += "OpMemoryModel Logical GLSL450\n";

    let interfaces = interface_variables(ty, inputs, resources);
    out += &format!(
        "OpEntryPoint {model} %main \"main\"{ifaces}\n",
        model = stage_execution_model(ty),
        ifaces = interfaces.iter().fold(String::new(), |mut acc, n| {
            acc.push_str(" %");
            acc.push_str(n);
            acc
        })
    );
    match ty {
        ShaderType::Pixel => out += "OpExecutionMode %main OriginUpperLeft\n",
        ShaderType::Compute => {
            let threads = inputs.compute().map(|c| c.threads_num).unwrap_or([64, 1, 1]);
            out += &format!(
                "OpExecutionMode %main LocalSize {} {} {}\n",
                threads[0], threads[1], threads[2]
            );
        }
        ShaderType::Vertex => {}
    }

    if matches!(ty, ShaderType::Vertex) {
        out += "OpDecorate %gl_Position BuiltIn Position\n";
        out += "OpDecorate %gl_VertexIndex BuiltIn VertexIndex\n";
        if let Some(v) = inputs.vertex() {
            for r in &v.resources {
                out += &format!("OpDecorate %attr{idx} Location {idx}\n", idx = r.attr_index);
            }
            for i in 0..v.export_count {
                out += &format!("OpDecorate %param{i} Location {i}\n", i = i);
            }
        }
    }
    if matches!(ty, ShaderType::Pixel) {
        out += "OpDecorate %frag_color_0 Location 0\n";
        if let Some(p) = inputs.pixel() {
            if p.ps_pos_xy {
                out += "OpDecorate %gl_FragCoord BuiltIn FragCoord\n";
            }
            for i in 0..p.input_num {
                out += &format!("OpDecorate %attr{i} Location {i}\n", i = i);
            }
        }
    }
    if matches!(ty, ShaderType::Compute) {
        out += "OpDecorate %gl_LocalInvocationID BuiltIn LocalInvocationId\n";
        out += "OpDecorate %gl_WorkGroupID BuiltIn WorkgroupId\n";
    }
    for (kind, binding) in resources.slot_order() {
        let prefix = resource_prefix(kind);
        out += &format!(
            "OpDecorate %{prefix}_{reg} DescriptorSet {set}\nOpDecorate %{prefix}_{reg} Binding {binding}\n",
            prefix = prefix,
            reg = binding.start_register,
            set = resources.descriptor_set_slot,
            binding = binding.binding_index
        );
    }

    out += "%void = OpTypeVoid\n";
    out += "%fn_void = OpTypeFunction %void\n";
    out += "%bool = OpTypeBool\n";
    out += "%float = OpTypeFloat 32\n";
    out += "%int = OpTypeInt 32 1\n";
    out += "%uint = OpTypeInt 32 0\n";
    out += "%v2float = OpTypeVector %float 2\n";
    out += "%v3float = OpTypeVector %float 3\n";
    out += "%v4float = OpTypeVector %float 4\n";
    out += "%v3uint = OpTypeVector %uint 3\n";
    out += "%_ptr_Function_float = OpTypePointer Function %float\n";
    out += "%_ptr_Function_int = OpTypePointer Function %int\n";
    out += "%_ptr_Function_uint = OpTypePointer Function %uint\n";
    out += "%_ptr_PushConstant_uint = OpTypePointer PushConstant %uint\n";
    out += "%_ptr_StorageBuffer_uint = OpTypePointer StorageBuffer %uint\n";
    out += "%_ptr_StorageBuffer_float = OpTypePointer StorageBuffer %float\n";
    out += "%_ptr_Output_v4float = OpTypePointer Output %v4float\n";
    out += "%_ptr_Input_int = OpTypePointer Input %int\n";
    out += "%_ptr_Input_float = OpTypePointer Input %float\n";
    out += "%_ptr_Input_v2float = OpTypePointer Input %v2float\n";
    out += "%_ptr_Input_v3float = OpTypePointer Input %v3float\n";
    out += "%_ptr_Input_v4float = OpTypePointer Input %v4float\n";
    out += "%_ptr_Input_v3uint = OpTypePointer Input %v3uint\n";
    out += "%_ptr_Private_float = OpTypePointer Private %float\n";
    out += "%_ptr_Private_v2float = OpTypePointer Private %v2float\n";
    out += "%_ptr_Private_v3float = OpTypePointer Private %v3float\n";
    out += "%_ptr_Private_v4float = OpTypePointer Private %v4float\n";
    out += "%image_2d = OpTypeImage %float 2D 0 0 0 1 Unknown\n";
    out += "%sampler = OpTypeSampler\n";
    out += "%sampled_image_2d = OpTypeSampledImage %image_2d\n";

    // Storage-buffer-backed resources (plain buffers and the GDS counter)
    // are two views of the same bytes: a `uint` view (used for raw dword
    // loads/stores and the GDS atomic) and a `float` view (used by the
    // formatted-buffer rules). `Aliased` records that overlap explicitly
    // rather than leaving it implicit.
    if resources.storage_buffers.count() > 0 {
        out += "%rtarr_uint = OpTypeRuntimeArray %uint\n";
        out += "%rtarr_float = OpTypeRuntimeArray %float\n";
        out += "OpDecorate %rtarr_uint ArrayStride 4\n";
        out += "OpDecorate %rtarr_float ArrayStride 4\n";
        out += "%sb_block = OpTypeStruct %rtarr_uint %rtarr_float\n";
        out += "OpDecorate %sb_block Block\n";
        out += "OpMemberDecorate %sb_block 0 Offset 0\n";
        out += "OpMemberDecorate %sb_block 1 Offset 0\n";
        out += "%_ptr_StorageBuffer_sb_block = OpTypePointer StorageBuffer %sb_block\n";
    }
    if resources.gds_pointers.count() > 0 {
        out += "%gds_block = OpTypeStruct %uint\n";
        out += "OpDecorate %gds_block Block\n";
        out += "OpMemberDecorate %gds_block 0 Offset 0\n";
        out += "%_ptr_StorageBuffer_gds_block = OpTypePointer StorageBuffer %gds_block\n";
    }

    for (kind, binding) in resources.slot_order() {
        let prefix = resource_prefix(kind);
        let (ty_name, storage_class) = match kind {
            ResourceKind::StorageBuffer => ("_ptr_StorageBuffer_sb_block", "StorageBuffer"),
            ResourceKind::GdsPointer => ("_ptr_StorageBuffer_gds_block", "StorageBuffer"),
            ResourceKind::Texture2d => ("image_2d", "UniformConstant"),
            ResourceKind::Sampler => ("sampler", "UniformConstant"),
        };
        out += &format!(
            "%{prefix}_{reg} = OpVariable %{ty} {storage}\n",
            prefix = prefix,
            reg = binding.start_register,
            ty = ty_name,
            storage = storage_class
        );
    }
    if resources.extended_used {
        let total_slots = total_push_constant_slots(resources);
        let len_id = consts.lookup(crate::pool::ConstTy::Uint, total_slots);
        out += "%pc_slot = OpTypeStruct %uint %uint %uint %uint\n";
        out += "OpMemberDecorate %pc_slot 0 Offset 0\n";
        out += "OpMemberDecorate %pc_slot 1 Offset 4\n";
        out += "OpMemberDecorate %pc_slot 2 Offset 8\n";
        out += "OpMemberDecorate %pc_slot 3 Offset 12\n";
        out += &format!("%pc_array = OpTypeArray %pc_slot %{}\n", len_id);
        out += "OpDecorate %pc_array ArrayStride 16\n";
        out += "%_ptr_PushConstant_pc_array = OpTypePointer PushConstant %pc_array\n";
        out += "%push_constants = OpVariable %_ptr_PushConstant_pc_array PushConstant\n";
    }

    match ty {
        ShaderType::Vertex => {
            out += "%gl_Position = OpVariable %_ptr_Output_v4float Output\n";
            out += "%gl_VertexIndex = OpVariable %_ptr_Input_int Input\n";
            if let Some(v) = inputs.vertex() {
                for r in &v.resources {
                    let vec_ty = fetch_vec_type(r.registers_num);
                    out += &format!(
                        "%attr{idx} = OpVariable %_ptr_Input_{ty} Input\n",
                        idx = r.attr_index,
                        ty = vec_ty
                    );
                }
                for i in 0..v.export_count {
                    out += &format!("%param{i} = OpVariable %_ptr_Output_v4float Output\n", i = i);
                }
                if v.fetch {
                    out += "%temp_float = OpVariable %_ptr_Private_float Private\n";
                    out += "%temp_v2float = OpVariable %_ptr_Private_v2float Private\n";
                    out += "%temp_v3float = OpVariable %_ptr_Private_v3float Private\n";
                    out += "%temp_v4float = OpVariable %_ptr_Private_v4float Private\n";
                }
            }
        }
        ShaderType::Pixel => {
            out += "%frag_color_0 = OpVariable %_ptr_Output_v4float Output\n";
            if let Some(p) = inputs.pixel() {
                if p.ps_pos_xy {
                    out += "%gl_FragCoord = OpVariable %_ptr_Input_v4float Input\n";
                }
                for i in 0..p.input_num {
                    out += &format!("%attr{i} = OpVariable %_ptr_Input_v4float Input\n", i = i);
                }
            }
        }
        ShaderType::Compute => {
            out += "%gl_LocalInvocationID = OpVariable %_ptr_Input_v3uint Input\n";
            out += "%gl_WorkGroupID = OpVariable %_ptr_Input_v3uint Input\n";
        }
    }

    out += &support_flags_type_decls(support_flags);
    out += &consts.emit_declarations();
    out
}

fn support_flags_type_decls(flags: &SupportFlags) -> String {
    crate::support::emit_type_decls(flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ComputeInputInfo, PixelInputInfo, ShaderResources};
    use crate::pool::ConstantPool;
    use crate::stage::{StageInfo, TranslationInputs};
    use crate::support::SupportFlags;

    #[test]
    fn pixel_header_declares_an_attr_input_per_input_num() {
        let resources = ShaderResources::default();
        let info = PixelInputInfo { input_num: 2, ..Default::default() };
        let inputs = TranslationInputs { stage: StageInfo::Pixel(&info), resources: &resources };
        let consts = ConstantPool::new();
        let flags = SupportFlags::default();
        let text = emit_header(ShaderType::Pixel, &inputs, &consts, &flags, false, "SPV_ENV_VULKAN_1_0");
        assert!(text.contains("%attr0 = OpVariable %_ptr_Input_v4float Input"));
        assert!(text.contains("%attr1 = OpVariable %_ptr_Input_v4float Input"));
        assert!(text.contains("OpDecorate %attr0 Location 0"));
        assert!(text.contains("OpDecorate %attr1 Location 1"));
    }

    #[test]
    fn compute_header_uses_actual_thread_dims() {
        let resources = ShaderResources::default();
        let info = ComputeInputInfo { threads_num: [8, 8, 1], workgroup_register: 10 };
        let inputs = TranslationInputs { stage: StageInfo::Compute(&info), resources: &resources };
        let consts = ConstantPool::new();
        let flags = SupportFlags::default();
        let text = emit_header(ShaderType::Compute, &inputs, &consts, &flags, false, "SPV_ENV_VULKAN_1_0");
        assert!(text.contains("OpExecutionMode %main LocalSize 8 8 1"));
    }
}
