//! Address-accessor header renderer.
//!
//! The filtered member catalog becomes a C++ header with one accessor
//! per member, grouped by owning record in catalog order. Member
//! pointers are captured through an explicit template instantiation,
//! which is exempt from access checking, so the accessors also reach
//! private members. Pure text transform: no I/O, and rendering the
//! same catalog twice yields identical bytes.

use crate::domain::catalog::{MemberAttribute, MemberCatalog};
use crate::domain::types::TypeKind;

const GUARD: &str = "_CPP_ENVOY_ADDRESS_OF_H_";

pub struct HeaderRenderer;

impl HeaderRenderer {
    /// Render the header for a filtered member catalog.
    pub fn render(members: &MemberCatalog) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push(format!("#ifndef {GUARD}"));
        lines.push(format!("#define {GUARD}"));
        lines.push(String::new());
        lines.push("// Generated by cpp_envoy. Do not edit.".to_string());
        lines.push(String::new());
        Self::push_preamble(&mut lines);

        let mut current_record: Option<&str> = None;
        for (_, attr) in members.iter() {
            if current_record != Some(attr.record.as_str()) {
                current_record = Some(attr.record.as_str());
                lines.push(String::new());
                lines.push(format!("// ---- {} ----", attr.record));
            }
            Self::push_member(&mut lines, attr);
        }

        lines.push(String::new());
        lines.push(format!("#endif  // {GUARD}"));
        lines.push(String::new());
        lines.join("\n")
    }

    fn push_preamble(lines: &mut Vec<String>) {
        for line in [
            "// A member pointer assigned from an explicit template instantiation",
            "// bypasses access control, so private members resolve here as well.",
            "template <typename Tag>",
            "struct MemberPointerHolder {",
            "  static typename Tag::type value;",
            "};",
            "",
            "template <typename Tag>",
            "typename Tag::type MemberPointerHolder<Tag>::value;",
            "",
            "template <typename Tag, typename Tag::type Ptr>",
            "struct MemberPointerCapture {",
            "  MemberPointerCapture() { MemberPointerHolder<Tag>::value = Ptr; }",
            "  static MemberPointerCapture instance;",
            "};",
            "",
            "template <typename Tag, typename Tag::type Ptr>",
            "MemberPointerCapture<Tag, Ptr> MemberPointerCapture<Tag, Ptr>::instance;",
        ] {
            lines.push(line.to_string());
        }
    }

    fn push_member(lines: &mut Vec<String>, attr: &MemberAttribute) {
        let tag = format!("{}__{}_tag", attr.record, attr.field);
        lines.push(String::new());
        lines.push(format!(
            "struct {tag} {{ {} }};",
            Self::member_pointer_typedef(attr)
        ));
        lines.push(format!(
            "template struct MemberPointerCapture<{tag}, &{}::{}>;",
            attr.record, attr.field
        ));
        lines.push(format!(
            "inline void *address_of_{}__{}({} &obj) {{",
            attr.record, attr.field, attr.record
        ));
        let expr = format!("&(obj.*MemberPointerHolder<{tag}>::value)");
        if attr.ty.is_const {
            lines.push(format!(
                "  return const_cast<void *>(static_cast<const void *>({expr}));"
            ));
        } else {
            lines.push(format!("  return static_cast<void *>({expr});"));
        }
        lines.push("}".to_string());
    }

    /// `typedef` for the member-pointer type. Array members need the
    /// extent after the declarator.
    fn member_pointer_typedef(attr: &MemberAttribute) -> String {
        match &attr.ty.kind {
            TypeKind::Array(elem, extent) => {
                let ext = extent.map(|n| n.to_string()).unwrap_or_default();
                let qual = if attr.ty.is_const { "const " } else { "" };
                format!("typedef {qual}{elem} ({}::*type)[{ext}];", attr.record)
            }
            _ => format!("typedef {} {}::*type;", attr.ty, attr.record),
        }
    }
}
