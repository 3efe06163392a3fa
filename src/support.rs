//! Support-function emitter (component H).
//!
//! A handful of instruction families need more SPIR-V than fits cleanly in
//! a single rule's string template — either because the same shape recurs
//! (vertex-attribute fetch) or because the original ISA op has no single
//! SPIR-V instruction that reproduces it (extended multiply, absolute
//! difference). Rather than duplicating that logic per call site, this
//! module appends a small, fixed library of helper `OpFunction`s to the end
//! of the module, conditioned on which instruction kinds actually showed up
//! in the shader ([`ShaderCode::has_any_of`]) so a shader that never uses
//! e.g. `VSadU32` doesn't carry a dead `%abs_diff` in its output.
//!
//! `fetch_f1_f1_vf{1,2,3,4}_` are the one family `crate::rules::vertex_fetch`
//! actually calls via `OpFunctionCall`; their `OpTypeFunction` signatures are
//! therefore also declared by [`crate::header`] ahead of `%main`, since
//! SPIR-V's logical layout requires all types to precede the function
//! section. The remaining helpers are self-contained and structurally
//! present per instruction kind, not wired into any call site.
use crate::model::{InstrType, ShaderCode};

/// Which instruction kinds present in a shader drive which helper functions
/// get appended.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportFlags {
    pub vertex_fetch: bool,
    pub abs_diff: bool,
    pub mul_extended: bool,
    pub buffer_load: bool,
    pub buffer_store: bool,
    pub tbuffer_load: bool,
    pub sbuffer_load: bool,
}

impl SupportFlags {
    pub fn compute(code: &ShaderCode) -> Self {
        use InstrType::*;
        SupportFlags {
            vertex_fetch: code.has_any_of(&[SSwappcB64]),
            abs_diff: code.has_any_of(&[VSadU32]),
            mul_extended: code.has_any_of(&[VMulLoI32, VMulU32U24, VMadU32U24]),
            buffer_load: code.has_any_of(&[BufferLoadDword, BufferLoadFormatX]),
            buffer_store: code.has_any_of(&[BufferStoreDword, BufferStoreFormatX]),
            tbuffer_load: code.has_any_of(&[TBufferLoadFormatXyzw]),
            sbuffer_load: code.has_any_of(&[
                SBufferLoadDword,
                SBufferLoadDwordx2,
                SBufferLoadDwordx4,
                SBufferLoadDwordx8,
                SBufferLoadDwordx16,
            ]),
        }
    }
}

/// The vector type and `OpFunctionCall` callee name for a fetch of
/// `registers_num` components. Mirrors `rules::vertex_fetch`'s table; kept
/// in sync manually since the two sides of the call (type decl, call site)
/// live in different modules.
fn fetch_vec_type(registers_num: u32) -> &'static str {
    match registers_num {
        1 => "float",
        2 => "v2float",
        3 => "v3float",
        _ => "v4float",
    }
}

/// `OpTypeFunction` declarations that must precede `%main`, gated the same
/// way the bodies in [`emit_functions`] are.
pub fn emit_type_decls(flags: &SupportFlags) -> String {
    let mut out = String::new();
    if flags.vertex_fetch {
        for n in 1..=4u32 {
            let ty = fetch_vec_type(n);
            let params = (0..n).map(|_| " %_ptr_Function_float".to_owned()).collect::<String>();
            out += &format!(
                "%fn_fetch_vf{n} = OpTypeFunction %void{params} %_ptr_Private_{ty}\n",
                n = n,
                params = params,
                ty = ty
            );
        }
    }
    if flags.mul_extended {
        out += "%mul_ext_int_result = OpTypeStruct %int %int\n";
        out += "%mul_ext_uint_result = OpTypeStruct %uint %uint\n";
        out += "%fn_mul_lo_int = OpTypeFunction %int %int %int\n";
        out += "%fn_mul_hi_int = OpTypeFunction %int %int %int\n";
        out += "%fn_mul_lo_uint = OpTypeFunction %uint %uint %uint\n";
        out += "%fn_mul_hi_uint = OpTypeFunction %uint %uint %uint\n";
    }
    if flags.abs_diff {
        out += "%fn_abs_diff = OpTypeFunction %uint %uint %uint\n";
    }
    if flags.buffer_load {
        out += "%fn_buffer_load_float1 = OpTypeFunction %float %_ptr_StorageBuffer_sb_block %uint\n";
        out += "%fn_buffer_load_float4 = OpTypeFunction %v4float %_ptr_StorageBuffer_sb_block %uint\n";
    }
    if flags.buffer_store {
        out += "%fn_buffer_store_float1 = OpTypeFunction %void %_ptr_StorageBuffer_sb_block %uint %float\n";
    }
    if flags.tbuffer_load {
        out += "%fn_tbuffer_load_format_x = OpTypeFunction %float %_ptr_StorageBuffer_sb_block %uint\n";
        out += "%fn_tbuffer_load_format_xyzw = OpTypeFunction %v4float %_ptr_StorageBuffer_sb_block %uint\n";
        out += "%fn_tbuffer_store_format_x = OpTypeFunction %void %_ptr_StorageBuffer_sb_block %uint %float\n";
    }
    if flags.sbuffer_load {
        for n in [1u32, 2, 4, 8, 16] {
            out += &format!(
                "%fn_sbuffer_load_dword{suffix} = OpTypeFunction %void %_ptr_StorageBuffer_sb_block %uint\n",
                suffix = if n == 1 { String::new() } else { format!("_{}", n) }
            );
        }
    }
    out
}

fn emit_fetch_function(n: u32) -> String {
    let ty = fetch_vec_type(n);
    let prefix = format!("fetch_vf{}", n);
    let mut out = String::new();
    let params: Vec<String> = (0..n).map(|i| format!("{}_dst{}", prefix, i)).collect();
    out += &format!(
        "%fetch_f1_f1_vf{n}_ = OpFunction %void None %fn_fetch_vf{n}\n",
        n = n
    );
    for p in &params {
        out += &format!("%{} = OpFunctionParameter %_ptr_Function_float\n", p);
    }
    out += &format!("%{prefix}_src = OpFunctionParameter %_ptr_Private_{ty}\n", prefix = prefix, ty = ty);
    out += &format!("%{prefix}_entry = OpLabel\n", prefix = prefix);
    if n == 1 {
        out += &format!("%{prefix}_v = OpLoad %float %{prefix}_src\n", prefix = prefix);
        out += &format!("OpStore %{} %{prefix}_v\n", params[0], prefix = prefix);
    } else {
        out += &format!("%{prefix}_v = OpLoad %{ty} %{prefix}_src\n", prefix = prefix, ty = ty);
        for (i, p) in params.iter().enumerate() {
            out += &format!(
                "%{prefix}_c{i} = OpCompositeExtract %float %{prefix}_v {i}\n",
                prefix = prefix,
                i = i
            );
            out += &format!("OpStore %{} %{prefix}_c{i}\n", p, prefix = prefix, i = i);
        }
    }
    out += "OpReturn\n";
    out += "OpFunctionEnd\n";
    out
}

fn emit_mul_extended_functions() -> String {
    let mut out = String::new();
    out += "%mul_lo_int = OpFunction %int None %fn_mul_lo_int\n";
    out += "%mul_lo_int_a = OpFunctionParameter %int\n";
    out += "%mul_lo_int_b = OpFunctionParameter %int\n";
    out += "%mul_lo_int_entry = OpLabel\n";
    out += "%mul_lo_int_r = OpIMul %int %mul_lo_int_a %mul_lo_int_b\n";
    out += "OpReturnValue %mul_lo_int_r\n";
    out += "OpFunctionEnd\n";

    out += "%mul_hi_int = OpFunction %int None %fn_mul_hi_int\n";
    out += "%mul_hi_int_a = OpFunctionParameter %int\n";
    out += "%mul_hi_int_b = OpFunctionParameter %int\n";
    out += "%mul_hi_int_entry = OpLabel\n";
    out += "%mul_hi_int_pair = OpSMulExtended %mul_ext_int_result %mul_hi_int_a %mul_hi_int_b\n";
    out += "%mul_hi_int_r = OpCompositeExtract %int %mul_hi_int_pair 1\n";
    out += "OpReturnValue %mul_hi_int_r\n";
    out += "OpFunctionEnd\n";

    out += "%mul_lo_uint = OpFunction %uint None %fn_mul_lo_uint\n";
    out += "%mul_lo_uint_a = OpFunctionParameter %uint\n";
    out += "%mul_lo_uint_b = OpFunctionParameter %uint\n";
    out += "%mul_lo_uint_entry = OpLabel\n";
    out += "%mul_lo_uint_r = OpIMul %uint %mul_lo_uint_a %mul_lo_uint_b\n";
    out += "OpReturnValue %mul_lo_uint_r\n";
    out += "OpFunctionEnd\n";

    out += "%mul_hi_uint = OpFunction %uint None %fn_mul_hi_uint\n";
    out += "%mul_hi_uint_a = OpFunctionParameter %uint\n";
    out += "%mul_hi_uint_b = OpFunctionParameter %uint\n";
    out += "%mul_hi_uint_entry = OpLabel\n";
    out += "%mul_hi_uint_pair = OpUMulExtended %mul_ext_uint_result %mul_hi_uint_a %mul_hi_uint_b\n";
    out += "%mul_hi_uint_r = OpCompositeExtract %uint %mul_hi_uint_pair 1\n";
    out += "OpReturnValue %mul_hi_uint_r\n";
    out += "OpFunctionEnd\n";
    out
}

fn emit_abs_diff_function() -> String {
    let mut out = String::new();
    out += "%abs_diff = OpFunction %uint None %fn_abs_diff\n";
    out += "%abs_diff_a = OpFunctionParameter %uint\n";
    out += "%abs_diff_b = OpFunctionParameter %uint\n";
    out += "%abs_diff_entry = OpLabel\n";
    out += "%abs_diff_lo = OpExtInst %uint %glsl_std_450 UMin %abs_diff_a %abs_diff_b\n";
    out += "%abs_diff_hi = OpExtInst %uint %glsl_std_450 UMax %abs_diff_a %abs_diff_b\n";
    out += "%abs_diff_r = OpISub %uint %abs_diff_hi %abs_diff_lo\n";
    out += "OpReturnValue %abs_diff_r\n";
    out += "OpFunctionEnd\n";
    out
}

/// Loads the `float` element of `sb_block` (member 1, the float view of the
/// aliased storage buffer) at `buf[idx + offset]`. `offset` must be a small
/// literal already present in the pre-seeded `0..16` constant range.
fn access_float_elem(prefix: &str, offset: u32) -> String {
    let mut out = String::new();
    if offset == 0 {
        out += &format!(
            "%{p}_gep{o} = OpAccessChain %_ptr_StorageBuffer_float %{p}_buf %uint_1 %{p}_idx\n",
            p = prefix,
            o = offset
        );
    } else {
        out += &format!(
            "%{p}_off{o} = OpIAdd %uint %{p}_idx %uint_{o}\n",
            p = prefix,
            o = offset
        );
        out += &format!(
            "%{p}_gep{o} = OpAccessChain %_ptr_StorageBuffer_float %{p}_buf %uint_1 %{p}_off{o}\n",
            p = prefix,
            o = offset
        );
    }
    out += &format!("%{p}_v{o} = OpLoad %float %{p}_gep{o}\n", p = prefix, o = offset);
    out
}

fn emit_buffer_load_functions() -> String {
    let mut out = String::new();
    out += "%buffer_load_float1 = OpFunction %float None %fn_buffer_load_float1\n";
    out += "%buffer_load_float1_buf = OpFunctionParameter %_ptr_StorageBuffer_sb_block\n";
    out += "%buffer_load_float1_idx = OpFunctionParameter %uint\n";
    out += "%buffer_load_float1_entry = OpLabel\n";
    out += &access_float_elem("buffer_load_float1", 0);
    out += "OpReturnValue %buffer_load_float1_v0\n";
    out += "OpFunctionEnd\n";

    out += "%buffer_load_float4 = OpFunction %v4float None %fn_buffer_load_float4\n";
    out += "%buffer_load_float4_buf = OpFunctionParameter %_ptr_StorageBuffer_sb_block\n";
    out += "%buffer_load_float4_idx = OpFunctionParameter %uint\n";
    out += "%buffer_load_float4_entry = OpLabel\n";
    for offset in 0..4u32 {
        out += &access_float_elem("buffer_load_float4", offset);
    }
    out += "%buffer_load_float4_r = OpCompositeConstruct %v4float %buffer_load_float4_v0 %buffer_load_float4_v1 %buffer_load_float4_v2 %buffer_load_float4_v3\n";
    out += "OpReturnValue %buffer_load_float4_r\n";
    out += "OpFunctionEnd\n";
    out
}

fn emit_buffer_store_function() -> String {
    let mut out = String::new();
    out += "%buffer_store_float1 = OpFunction %void None %fn_buffer_store_float1\n";
    out += "%buffer_store_float1_buf = OpFunctionParameter %_ptr_StorageBuffer_sb_block\n";
    out += "%buffer_store_float1_idx = OpFunctionParameter %uint\n";
    out += "%buffer_store_float1_val = OpFunctionParameter %float\n";
    out += "%buffer_store_float1_entry = OpLabel\n";
    out += "%buffer_store_float1_gep = OpAccessChain %_ptr_StorageBuffer_float %buffer_store_float1_buf %uint_1 %buffer_store_float1_idx\n";
    out += "OpStore %buffer_store_float1_gep %buffer_store_float1_val\n";
    out += "OpReturn\n";
    out += "OpFunctionEnd\n";
    out
}

fn emit_tbuffer_functions() -> String {
    let mut out = String::new();
    out += "%tbuffer_load_format_x = OpFunction %float None %fn_tbuffer_load_format_x\n";
    out += "%tbuffer_load_format_x_buf = OpFunctionParameter %_ptr_StorageBuffer_sb_block\n";
    out += "%tbuffer_load_format_x_idx = OpFunctionParameter %uint\n";
    out += "%tbuffer_load_format_x_entry = OpLabel\n";
    out += &access_float_elem("tbuffer_load_format_x", 0);
    out += "OpReturnValue %tbuffer_load_format_x_v0\n";
    out += "OpFunctionEnd\n";

    out += "%tbuffer_load_format_xyzw = OpFunction %v4float None %fn_tbuffer_load_format_xyzw\n";
    out += "%tbuffer_load_format_xyzw_buf = OpFunctionParameter %_ptr_StorageBuffer_sb_block\n";
    out += "%tbuffer_load_format_xyzw_idx = OpFunctionParameter %uint\n";
    out += "%tbuffer_load_format_xyzw_entry = OpLabel\n";
    for offset in 0..4u32 {
        out += &access_float_elem("tbuffer_load_format_xyzw", offset);
    }
    out += "%tbuffer_load_format_xyzw_r = OpCompositeConstruct %v4float %tbuffer_load_format_xyzw_v0 %tbuffer_load_format_xyzw_v1 %tbuffer_load_format_xyzw_v2 %tbuffer_load_format_xyzw_v3\n";
    out += "OpReturnValue %tbuffer_load_format_xyzw_r\n";
    out += "OpFunctionEnd\n";

    out += "%tbuffer_store_format_x = OpFunction %void None %fn_tbuffer_store_format_x\n";
    out += "%tbuffer_store_format_x_buf = OpFunctionParameter %_ptr_StorageBuffer_sb_block\n";
    out += "%tbuffer_store_format_x_idx = OpFunctionParameter %uint\n";
    out += "%tbuffer_store_format_x_val = OpFunctionParameter %float\n";
    out += "%tbuffer_store_format_x_entry = OpLabel\n";
    out += "%tbuffer_store_format_x_gep = OpAccessChain %_ptr_StorageBuffer_float %tbuffer_store_format_x_buf %uint_1 %tbuffer_store_format_x_idx\n";
    out += "OpStore %tbuffer_store_format_x_gep %tbuffer_store_format_x_val\n";
    out += "OpReturn\n";
    out += "OpFunctionEnd\n";
    out
}

/// Loads the `uint` element of `sb_block` (member 0) at `buf[idx + offset]`,
/// the sbuffer counterpart of [`access_float_elem`].
fn access_uint_elem(prefix: &str, offset: u32) -> String {
    let mut out = String::new();
    if offset == 0 {
        out += &format!(
            "%{p}_gep{o} = OpAccessChain %_ptr_StorageBuffer_uint %{p}_buf %uint_0 %{p}_idx\n",
            p = prefix,
            o = offset
        );
    } else {
        out += &format!(
            "%{p}_off{o} = OpIAdd %uint %{p}_idx %uint_{o}\n",
            p = prefix,
            o = offset
        );
        out += &format!(
            "%{p}_gep{o} = OpAccessChain %_ptr_StorageBuffer_uint %{p}_buf %uint_0 %{p}_off{o}\n",
            p = prefix,
            o = offset
        );
    }
    out += &format!("%{p}_v{o} = OpLoad %uint %{p}_gep{o}\n", p = prefix, o = offset);
    out
}

fn emit_sbuffer_load_functions() -> String {
    let mut out = String::new();
    for n in [1u32, 2, 4, 8, 16] {
        let suffix = if n == 1 { String::new() } else { format!("_{}", n) };
        let name = format!("sbuffer_load_dword{}", suffix);
        out += &format!("%{name} = OpFunction %void None %fn_{name}\n", name = name);
        out += &format!("%{name}_buf = OpFunctionParameter %_ptr_StorageBuffer_sb_block\n", name = name);
        out += &format!("%{name}_idx = OpFunctionParameter %uint\n", name = name);
        out += &format!("%{name}_entry = OpLabel\n", name = name);
        for offset in 0..n {
            out += &access_uint_elem(&name, offset);
        }
        out += "OpReturn\n";
        out += "OpFunctionEnd\n";
    }
    out
}

/// Appends the helper function bodies selected by `flags` after `%main`'s
/// `OpFunctionEnd`.
pub fn emit_functions(flags: &SupportFlags) -> String {
    let mut out = String::new();
    if flags.vertex_fetch {
        for n in 1..=4u32 {
            out += &emit_fetch_function(n);
        }
    }
    if flags.mul_extended {
        out += &emit_mul_extended_functions();
    }
    if flags.abs_diff {
        out += &emit_abs_diff_function();
    }
    if flags.buffer_load {
        out += &emit_buffer_load_functions();
    }
    if flags.buffer_store {
        out += &emit_buffer_store_function();
    }
    if flags.tbuffer_load {
        out += &emit_tbuffer_functions();
    }
    if flags.sbuffer_load {
        out += &emit_sbuffer_load_functions();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstrFormat, ShaderInstruction, ShaderOperand, ShaderType};

    fn code_with(ty: InstrType) -> ShaderCode {
        ShaderCode::new(
            ShaderType::Vertex,
            vec![ShaderInstruction {
                pc: 0,
                ty,
                format: InstrFormat::None,
                dst: ShaderOperand::unused(),
                dst2: ShaderOperand::unused(),
                src: [ShaderOperand::unused(); 4],
                src_num: 0,
            }],
            vec![],
        )
    }

    #[test]
    fn flags_are_independent_per_instruction_kind() {
        let flags = SupportFlags::compute(&code_with(InstrType::VSadU32));
        assert!(flags.abs_diff);
        assert!(!flags.vertex_fetch);
        assert!(!flags.sbuffer_load);
    }

    #[test]
    fn empty_shader_appends_nothing() {
        let flags = SupportFlags::compute(&code_with(InstrType::SEndpgm));
        assert_eq!(emit_type_decls(&flags), "");
        assert_eq!(emit_functions(&flags), "");
    }

    #[test]
    fn vertex_fetch_functions_match_declared_types() {
        let flags = SupportFlags::compute(&code_with(InstrType::SSwappcB64));
        assert!(emit_type_decls(&flags).contains("%fn_fetch_vf1 = OpTypeFunction"));
        assert!(emit_functions(&flags).contains("%fetch_f1_f1_vf1_ = OpFunction"));
    }

    #[test]
    fn buffer_load_float4_reads_four_distinct_offsets_from_idx() {
        let flags = SupportFlags::compute(&code_with(InstrType::BufferLoadDword));
        let text = emit_functions(&flags);
        assert_eq!(text.matches("OpAccessChain %_ptr_StorageBuffer_float").count(), 5);
        assert!(text.contains("OpIAdd %uint %buffer_load_float4_idx %uint_1"));
        assert!(text.contains("OpIAdd %uint %buffer_load_float4_idx %uint_3"));
        assert!(text.contains(
            "OpCompositeConstruct %v4float %buffer_load_float4_v0 %buffer_load_float4_v1 %buffer_load_float4_v2 %buffer_load_float4_v3"
        ));
    }

    #[test]
    fn buffer_store_float1_writes_through_an_access_chain_at_idx() {
        let flags = SupportFlags::compute(&code_with(InstrType::BufferStoreDword));
        let text = emit_functions(&flags);
        assert!(text.contains("%buffer_store_float1_gep = OpAccessChain %_ptr_StorageBuffer_float %buffer_store_float1_buf %uint_1 %buffer_store_float1_idx"));
        assert!(text.contains("OpStore %buffer_store_float1_gep %buffer_store_float1_val"));
    }

    #[test]
    fn sbuffer_load_dword8_reads_eight_consecutive_uints() {
        let flags = SupportFlags::compute(&code_with(InstrType::SBufferLoadDwordx8));
        let text = emit_functions(&flags);
        let dword8_start = text.find("%sbuffer_load_dword_8 = OpFunction").unwrap();
        let dword8_end = text[dword8_start..].find("OpFunctionEnd").unwrap() + dword8_start;
        let body = &text[dword8_start..dword8_end];
        assert_eq!(body.matches("= OpAccessChain %_ptr_StorageBuffer_uint").count(), 8);
        assert!(body.contains("OpIAdd %uint %sbuffer_load_dword_8_idx %uint_7"));
    }

    #[test]
    fn support_function_signatures_take_the_whole_resource_not_a_bare_element_pointer() {
        let flags = SupportFlags::compute(&code_with(InstrType::TBufferLoadFormatXyzw));
        let decls = emit_type_decls(&flags);
        assert!(decls.contains("%fn_tbuffer_load_format_xyzw = OpTypeFunction %v4float %_ptr_StorageBuffer_sb_block %uint"));
    }
}
