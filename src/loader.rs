//! Operand loader (component D): materializes an operand into a temporary
//! SPIR-V id of a requested view (`int`, `uint` or `float`), bitcasting
//! across the operand's native type when necessary.
use crate::error::{Error, Result};
use crate::model::ShaderOperand;
use crate::operand::{is_constant, is_variable, variable_name, SpirvScalarType};
use crate::pool::{ConstTy, ConstantPool};

/// Emits a snippet loading `op` as a `uint`, writing its final value to
/// `%<result_id>`. `shift` selects which register of a multi-register
/// operand to read (default 0). `index_str` is substituted for every
/// SSA-uniqueness placeholder this snippet needs internally.
pub fn load_uint(
    op: &ShaderOperand,
    result_id: &str,
    index_str: &str,
    shift: Option<u32>,
    pool: &mut ConstantPool,
) -> Result<String> {
    let shift = shift.unwrap_or(0);
    if is_constant(op) {
        let cid = pool.get_or_insert_operand(ConstTy::Uint, op);
        return Ok(format!("%{res} = OpBitcast %uint %{c}\n", res = result_id, c = cid));
    }
    if is_variable(op) {
        let (name, native) = variable_name(op, shift);
        return Ok(match native {
            SpirvScalarType::Uint => format!("%{res} = OpLoad %uint %{name}\n", res = result_id, name = name),
            _ => format!(
                "%t{idx} = OpLoad %{nty} %{name}\n%{res} = OpBitcast %uint %t{idx}\n",
                idx = index_str,
                nty = native.spirv_name(),
                name = name,
                res = result_id
            ),
        });
    }
    Err(Error::Bug { reason: format!("load_uint: operand is neither constant nor variable: {:?}", op) })
}

/// Emits a snippet loading `op` as an `int`. Negation on an integer operand
/// is rejected — the original source leaves it unimplemented and this
/// reimplementation reproduces that rather than inventing semantics.
pub fn load_int(op: &ShaderOperand, result_id: &str, index_str: &str, pool: &mut ConstantPool) -> Result<String> {
    if op.negate {
        return Err(Error::UnsupportedOperandShape {
            pc: 0,
            disassembly: format!("{:?}", op),
            reason: "integer operand negation is not implemented".to_owned(),
        });
    }
    if is_constant(op) {
        let cid = pool.get_or_insert_operand(ConstTy::Int, op);
        return Ok(format!("%{res} = OpBitcast %int %{c}\n", res = result_id, c = cid));
    }
    if is_variable(op) {
        let (name, native) = variable_name(op, 0);
        return Ok(match native {
            SpirvScalarType::Int => format!("%{res} = OpLoad %int %{name}\n", res = result_id, name = name),
            _ => format!(
                "%t{idx} = OpLoad %{nty} %{name}\n%{res} = OpBitcast %int %t{idx}\n",
                idx = index_str,
                nty = native.spirv_name(),
                name = name,
                res = result_id
            ),
        });
    }
    Err(Error::Bug { reason: format!("load_int: operand is neither constant nor variable: {:?}", op) })
}

/// Emits a snippet loading `op` as a `float`. If `op.negate` is set, the
/// non-negated value is loaded into `%n<result_id>` and then
/// `%<result_id> = OpFNegate %float %n<result_id>` is appended.
pub fn load_float(op: &ShaderOperand, result_id: &str, index_str: &str, pool: &mut ConstantPool) -> Result<String> {
    let target = if op.negate { format!("n{}", result_id) } else { result_id.to_owned() };
    let mut text = String::new();
    if is_constant(op) {
        let cid = pool.get_or_insert_operand(ConstTy::Float, op);
        text.push_str(&format!("%{t} = OpBitcast %float %{c}\n", t = target, c = cid));
    } else if is_variable(op) {
        let (name, native) = variable_name(op, 0);
        match native {
            SpirvScalarType::Float => text.push_str(&format!("%{t} = OpLoad %float %{n}\n", t = target, n = name)),
            _ => text.push_str(&format!(
                "%t{idx} = OpLoad %{nty} %{n}\n%{t} = OpBitcast %float %t{idx}\n",
                idx = index_str,
                nty = native.spirv_name(),
                n = name,
                t = target
            )),
        }
    } else {
        return Err(Error::Bug { reason: format!("load_float: operand is neither constant nor variable: {:?}", op) });
    }
    if op.negate {
        text.push_str(&format!("%{res} = OpFNegate %float %{t}\n", res = result_id, t = target));
    }
    Ok(text)
}
