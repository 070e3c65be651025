//! Python marshaling renderer.
//!
//! Each catalogued function becomes a wrapper with three blocks: pack
//! the arguments into a little-endian payload, invoke the native
//! function through the runner, unpack the response into the return
//! value. The type-to-strategy mapping is an exhaustive match, so a
//! type without a strategy is a hard `UnsupportedType` error rather
//! than a silently broken calling convention, and no function is ever
//! partially emitted.

use crate::domain::catalog::{FunctionCatalog, FunctionSignature};
use crate::domain::diagnostics::GenError;
use crate::domain::types::{Primitive, TypeDescriptor, TypeKind};

/// How one native type crosses the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshalStrategy {
    /// Fixed-size scalar with a `struct` format character.
    Scalar(char),
    /// Length-prefixed byte buffer (u16 length, then raw bytes).
    Buffer,
}

/// Map a resolved type to its marshaling strategy. Exhaustive over
/// `TypeKind`: adding a primitive without deciding its strategy fails
/// to compile here instead of falling through at a call site.
pub fn strategy_for(ty: &TypeDescriptor) -> Option<MarshalStrategy> {
    match &ty.kind {
        TypeKind::Primitive(p) => scalar_format(*p).map(MarshalStrategy::Scalar),
        TypeKind::Pointer(inner) | TypeKind::Array(inner, _) => match &inner.kind {
            TypeKind::Primitive(Primitive::Char | Primitive::SChar | Primitive::UChar) => {
                Some(MarshalStrategy::Buffer)
            }
            _ => None,
        },
        TypeKind::Record(_) => None,
    }
}

fn scalar_format(p: Primitive) -> Option<char> {
    match p {
        Primitive::Bool => Some('?'),
        Primitive::Char | Primitive::SChar => Some('b'),
        Primitive::UChar => Some('B'),
        Primitive::Short => Some('h'),
        Primitive::UShort => Some('H'),
        Primitive::Int => Some('i'),
        Primitive::UInt => Some('I'),
        Primitive::Long => Some('l'),
        Primitive::ULong => Some('L'),
        Primitive::LongLong => Some('q'),
        Primitive::ULongLong => Some('Q'),
        Primitive::Float => Some('f'),
        Primitive::Double => Some('d'),
        // void carries no value; long double has no portable format.
        Primitive::Void | Primitive::LongDouble => None,
    }
}

pub struct BindingRenderer;

impl BindingRenderer {
    /// Render the Python module for a function catalog. On error no
    /// output is produced at all.
    pub fn render(functions: &FunctionCatalog) -> Result<String, GenError> {
        let mut lines: Vec<String> = Vec::new();
        lines.push("# Generated by cpp_envoy. Do not edit.".to_string());
        lines.push("#".to_string());
        lines.push("# One wrapper per native function: arguments are packed into a".to_string());
        lines.push("# little-endian payload, handed to runner.invoke(key, payload),".to_string());
        lines.push("# and the response buffer is unpacked into the return value.".to_string());
        lines.push("import struct".to_string());
        for (key, sig) in functions.iter() {
            lines.push(String::new());
            lines.push(String::new());
            Self::push_function(&mut lines, key, sig)?;
        }
        lines.push(String::new());
        Ok(lines.join("\n"))
    }

    fn push_function(
        lines: &mut Vec<String>,
        key: &str,
        sig: &FunctionSignature,
    ) -> Result<(), GenError> {
        // Resolve every strategy up front so a function is never
        // partially rendered.
        let mut param_plans: Vec<(&str, MarshalStrategy)> = Vec::new();
        for p in &sig.params {
            let strategy = strategy_for(&p.ty).ok_or_else(|| GenError::UnsupportedType {
                symbol: key.to_string(),
                type_name: p.ty.to_string(),
            })?;
            param_plans.push((p.name.as_str(), strategy));
        }
        let ret_plan = if sig.ret.is_void() {
            None
        } else {
            Some(
                strategy_for(&sig.ret).ok_or_else(|| GenError::UnsupportedType {
                    symbol: key.to_string(),
                    type_name: sig.ret.to_string(),
                })?,
            )
        };

        let args: Vec<&str> = param_plans.iter().map(|(name, _)| *name).collect();
        let arglist = if args.is_empty() {
            String::new()
        } else {
            format!(", {}", args.join(", "))
        };
        lines.push(format!("def {key}(runner{arglist}):"));
        lines.push(format!("    \"\"\"{}\"\"\"", c_signature(sig)));

        let mut scalar_fmt = String::new();
        for (_, strategy) in &param_plans {
            if let MarshalStrategy::Scalar(c) = strategy {
                scalar_fmt.push(*c);
            }
        }
        if param_plans.is_empty() {
            lines.push("    payload = b''".to_string());
        } else if scalar_fmt.len() == param_plans.len() {
            lines.push(format!(
                "    payload = struct.pack('<{}', {})",
                scalar_fmt,
                args.join(", ")
            ));
        } else {
            lines.push("    payload = b''".to_string());
            for (name, strategy) in &param_plans {
                match strategy {
                    MarshalStrategy::Scalar(c) => {
                        lines.push(format!("    payload += struct.pack('<{c}', {name})"));
                    }
                    MarshalStrategy::Buffer => {
                        lines.push(format!(
                            "    {name} = {name}.encode() if isinstance({name}, str) else bytes({name})"
                        ));
                        lines.push(format!(
                            "    payload += struct.pack('<H', len({name})) + {name}"
                        ));
                    }
                }
            }
        }

        match ret_plan {
            None => {
                lines.push(format!("    runner.invoke('{key}', payload)"));
                lines.push("    return None".to_string());
            }
            Some(MarshalStrategy::Scalar(c)) => {
                lines.push(format!("    response = runner.invoke('{key}', payload)"));
                lines.push(format!("    (result,) = struct.unpack('<{c}', response)"));
                lines.push("    return result".to_string());
            }
            Some(MarshalStrategy::Buffer) => {
                lines.push(format!("    response = runner.invoke('{key}', payload)"));
                lines.push("    (length,) = struct.unpack_from('<H', response)".to_string());
                lines.push("    return response[2:2 + length]".to_string());
            }
        }
        Ok(())
    }
}

fn c_signature(sig: &FunctionSignature) -> String {
    let params: Vec<String> = sig
        .params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect();
    format!("{} {}({})", sig.ret, sig.name, params.join(", "))
}
