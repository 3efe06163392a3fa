//! Embedded-shader registry (component I).
//!
//! A handful of fixed-function passes the pipeline needs outside of any
//! game-supplied GCN code — a full-screen blit triangle being the
//! canonical one — are carried as literal SPIR-V text rather than run
//! through the recompiler, since there is no GCN source to recompile them
//! from. `id` is an opaque index the caller picks from a small fixed set
//! known ahead of time; nothing here inspects [`crate::model::ShaderCode`].
use crate::error::{Error, Result};

// Both embedded shaders implement the classic "one big triangle"
// full-screen pass: `uv = vec2((vertexID << 1) & 2, vertexID & 2)` gives the
// three corners (0,0), (2,0), (0,2); `gl_Position = uv * 2 - 1` places them
// at (-1,-1), (3,-1), (-1,3), which covers the viewport once clipped. The
// unscaled `uv` (halved back to 0..1) is passed through as the texcoord the
// paired pixel shader samples.
const FULLSCREEN_VS: &str = "\
OpCapability Shader
%glsl_std_450 = OpExtInstImport \"GLSL.std.450\"
OpMemoryModel Logical GLSL450
OpEntryPoint Vertex %main \"main\" %gl_Position %gl_VertexIndex %uv
OpDecorate %gl_Position BuiltIn Position
OpDecorate %gl_VertexIndex BuiltIn VertexIndex
OpDecorate %uv Location 0
%void = OpTypeVoid
%fn_void = OpTypeFunction %void
%float = OpTypeFloat 32
%int = OpTypeInt 32 1
%v2float = OpTypeVector %float 2
%v4float = OpTypeVector %float 4
%_ptr_Output_v4float = OpTypePointer Output %v4float
%_ptr_Output_v2float = OpTypePointer Output %v2float
%_ptr_Input_int = OpTypePointer Input %int
%gl_Position = OpVariable %_ptr_Output_v4float Output
%gl_VertexIndex = OpVariable %_ptr_Input_int Input
%uv = OpVariable %_ptr_Output_v2float Output
%int_1 = OpConstant %int 1
%int_2 = OpConstant %int 2
%float_0 = OpConstant %float 0
%float_1 = OpConstant %float 1
%float_2 = OpConstant %float 2
%float_0_5 = OpConstant %float 0.5
%main = OpFunction %void None %fn_void
%entry = OpLabel
%idx = OpLoad %int %gl_VertexIndex
%shl = OpShiftLeftLogical %int %idx %int_1
%u_i = OpBitwiseAnd %int %shl %int_2
%v_i = OpBitwiseAnd %int %idx %int_2
%u_f = OpConvertSToF %float %u_i
%v_f = OpConvertSToF %float %v_i
%u2 = OpFMul %float %u_f %float_2
%pos_x = OpFSub %float %u2 %float_1
%v2 = OpFMul %float %v_f %float_2
%pos_y = OpFSub %float %v2 %float_1
%clip = OpCompositeConstruct %v4float %pos_x %pos_y %float_0 %float_1
OpStore %gl_Position %clip
%u_uv = OpFMul %float %u_f %float_0_5
%v_uv = OpFMul %float %v_f %float_0_5
%uv_vec = OpCompositeConstruct %v2float %u_uv %v_uv
OpStore %uv %uv_vec
OpReturn
OpFunctionEnd
";

const FULLSCREEN_PS: &str = "\
OpCapability Shader
%glsl_std_450 = OpExtInstImport \"GLSL.std.450\"
OpMemoryModel Logical GLSL450
OpEntryPoint Fragment %main \"main\" %frag_color_0 %uv
OpExecutionMode %main OriginUpperLeft
OpDecorate %frag_color_0 Location 0
OpDecorate %uv Location 0
OpDecorate %tex_sampler_0 DescriptorSet 0
OpDecorate %tex_sampler_0 Binding 0
%void = OpTypeVoid
%fn_void = OpTypeFunction %void
%float = OpTypeFloat 32
%v2float = OpTypeVector %float 2
%v4float = OpTypeVector %float 4
%_ptr_Output_v4float = OpTypePointer Output %v4float
%_ptr_Input_v2float = OpTypePointer Input %v2float
%image_2d = OpTypeImage %float 2D 0 0 0 1 Unknown
%sampler = OpTypeSampler
%sampled_image_2d = OpTypeSampledImage %image_2d
%_ptr_UniformConstant_sampled_image_2d = OpTypePointer UniformConstant %sampled_image_2d
%frag_color_0 = OpVariable %_ptr_Output_v4float Output
%uv = OpVariable %_ptr_Input_v2float Input
%tex_sampler_0 = OpVariable %_ptr_UniformConstant_sampled_image_2d UniformConstant
%main = OpFunction %void None %fn_void
%entry = OpLabel
%coord = OpLoad %v2float %uv
%img = OpLoad %sampled_image_2d %tex_sampler_0
%sample = OpImageSampleImplicitLod %v4float %img %coord
OpStore %frag_color_0 %sample
OpReturn
OpFunctionEnd
";

fn unknown(kind: &str, id: u32) -> Error {
    Error::UnsupportedBindingConfig { reason: format!("no embedded {} shader registered for id {}", kind, id) }.logged()
}

/// Looks up the embedded vertex shader for `id`. `id == 0` is the
/// full-screen-triangle pass every other embedded pixel shader pairs with.
pub fn get_embedded_vs(id: u32) -> Result<String> {
    match id {
        0 => Ok(FULLSCREEN_VS.to_owned()),
        _ => Err(unknown("vertex", id)),
    }
}

/// Looks up the embedded pixel shader for `id`.
pub fn get_embedded_ps(id: u32) -> Result<String> {
    match id {
        0 => Ok(FULLSCREEN_PS.to_owned()),
        _ => Err(unknown("pixel", id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_zero_round_trips_both_stages() {
        assert!(get_embedded_vs(0).unwrap().contains("OpEntryPoint Vertex"));
        assert!(get_embedded_ps(0).unwrap().contains("OpEntryPoint Fragment"));
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert!(get_embedded_vs(7).is_err());
        assert!(get_embedded_ps(7).is_err());
    }

    #[test]
    fn embedded_vs_positions_each_vertex_from_its_own_index() {
        let text = get_embedded_vs(0).unwrap();
        assert!(text.contains("OpLoad %int %gl_VertexIndex"));
        assert!(text.contains("OpShiftLeftLogical"));
        assert!(text.contains("OpStore %uv %uv_vec"));
    }

    #[test]
    fn embedded_ps_samples_the_bound_texture_instead_of_a_flat_color() {
        let text = get_embedded_ps(0).unwrap();
        assert!(text.contains("OpImageSampleImplicitLod"));
        assert!(text.contains("OpDecorate %tex_sampler_0 Binding 0"));
        assert!(!text.contains("OpConstantComposite"));
    }
}
