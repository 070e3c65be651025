//! Resolved type descriptors.
//!
//! clang reports types as `qualType` spellings. The resolver maps the
//! supported subset (primitives, pointers, arrays, named aggregates,
//! const qualification) onto `TypeDescriptor`. Anything outside that
//! subset is opaque: template instantiations, anonymous aggregates,
//! references, function types. Opaque spellings are recoverable at the
//! catalog level, where the owning declaration is dropped with a
//! diagnostic instead of aborting the run.

use serde::{Deserialize, Serialize};

/// Builtin scalar types the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    Void,
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
}

impl Primitive {
    /// Map a whitespace-normalized spelling onto a primitive.
    pub fn from_spelling(s: &str) -> Option<Primitive> {
        let p = match s {
            "void" => Primitive::Void,
            "bool" | "_Bool" => Primitive::Bool,
            "char" => Primitive::Char,
            "signed char" => Primitive::SChar,
            "unsigned char" => Primitive::UChar,
            "short" | "short int" | "signed short" | "signed short int" => Primitive::Short,
            "unsigned short" | "unsigned short int" => Primitive::UShort,
            "int" | "signed" | "signed int" => Primitive::Int,
            "unsigned" | "unsigned int" => Primitive::UInt,
            "long" | "long int" | "signed long" | "signed long int" => Primitive::Long,
            "unsigned long" | "unsigned long int" => Primitive::ULong,
            "long long" | "long long int" | "signed long long" | "signed long long int" => {
                Primitive::LongLong
            }
            "unsigned long long" | "unsigned long long int" => Primitive::ULongLong,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "long double" => Primitive::LongDouble,
            _ => return None,
        };
        Some(p)
    }

    /// Canonical C spelling.
    pub fn spelling(&self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::SChar => "signed char",
            Primitive::UChar => "unsigned char",
            Primitive::Short => "short",
            Primitive::UShort => "unsigned short",
            Primitive::Int => "int",
            Primitive::UInt => "unsigned int",
            Primitive::Long => "long",
            Primitive::ULong => "unsigned long",
            Primitive::LongLong => "long long",
            Primitive::ULongLong => "unsigned long long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::LongDouble => "long double",
        }
    }
}

/// A resolved type: base shape plus const qualification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    Primitive(Primitive),
    Pointer(Box<TypeDescriptor>),
    Array(Box<TypeDescriptor>, Option<u64>),
    /// A named aggregate (struct, class or union).
    Record(String),
}

impl TypeDescriptor {
    pub fn primitive(p: Primitive) -> Self {
        Self {
            kind: TypeKind::Primitive(p),
            is_const: false,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(Primitive::Void))
    }

    /// Fragment used in overload-disambiguation keys. Deterministic
    /// for a given descriptor.
    pub fn key_fragment(&self) -> String {
        let frag = match &self.kind {
            TypeKind::Primitive(p) => p.spelling().replace(' ', "_"),
            TypeKind::Pointer(inner) => format!("{}_ptr", inner.key_fragment()),
            TypeKind::Array(elem, Some(n)) => format!("{}_arr{}", elem.key_fragment(), n),
            TypeKind::Array(elem, None) => format!("{}_arr", elem.key_fragment()),
            TypeKind::Record(name) => name.clone(),
        };
        if self.is_const {
            format!("const_{frag}")
        } else {
            frag
        }
    }
}

impl std::fmt::Display for TypeDescriptor {
    /// C spelling of the descriptor.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        match &self.kind {
            TypeKind::Primitive(p) => write!(f, "{}", p.spelling()),
            TypeKind::Pointer(inner) => write!(f, "{} *", inner),
            TypeKind::Array(elem, Some(n)) => write!(f, "{} [{}]", elem, n),
            TypeKind::Array(elem, None) => write!(f, "{} []", elem),
            TypeKind::Record(name) => write!(f, "{}", name),
        }
    }
}

/// A spelling outside the supported subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueType {
    pub spelling: String,
}

/// Resolve a clang `qualType` spelling.
pub fn parse(spelling: &str) -> Result<TypeDescriptor, OpaqueType> {
    let s = spelling.trim();
    // Template arguments, anonymous aggregates, function types and
    // references all carry one of these characters.
    if s.is_empty() || s.contains(['<', '(', '&']) {
        return Err(OpaqueType {
            spelling: s.to_string(),
        });
    }
    parse_spelling(s).ok_or_else(|| OpaqueType {
        spelling: s.to_string(),
    })
}

fn parse_spelling(s: &str) -> Option<TypeDescriptor> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Trailing array extent: "int [4]", "char []".
    if let Some(open) = s.rfind('[') {
        let extent = s[open..].strip_prefix('[')?.strip_suffix(']')?;
        let elem = parse_spelling(&s[..open])?;
        let len = if extent.trim().is_empty() {
            None
        } else {
            Some(extent.trim().parse::<u64>().ok()?)
        };
        return Some(TypeDescriptor {
            kind: TypeKind::Array(Box::new(elem), len),
            is_const: false,
        });
    }

    // "char *const": const after the star qualifies the pointer.
    if let Some(rest) = s.strip_suffix("const") {
        if rest.ends_with([' ', '*']) {
            let mut ty = parse_spelling(rest)?;
            ty.is_const = true;
            return Some(ty);
        }
    }

    if let Some(rest) = s.strip_suffix('*') {
        let pointee = parse_spelling(rest)?;
        return Some(TypeDescriptor {
            kind: TypeKind::Pointer(Box::new(pointee)),
            is_const: false,
        });
    }

    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.iter().any(|t| *t == "volatile") {
        return None;
    }
    let mut is_const = false;
    tokens.retain(|t| {
        if *t == "const" {
            is_const = true;
            false
        } else {
            true
        }
    });
    if tokens.is_empty() {
        return None;
    }

    let joined = tokens.join(" ");
    if let Some(p) = Primitive::from_spelling(&joined) {
        return Some(TypeDescriptor {
            kind: TypeKind::Primitive(p),
            is_const,
        });
    }

    // Tagged or bare aggregate name.
    let name = match tokens.as_slice() {
        ["struct" | "class" | "union", name] => *name,
        [name] => *name,
        _ => return None,
    };
    if !is_identifier(name) {
        return None;
    }
    Some(TypeDescriptor {
        kind: TypeKind::Record(name.to_string()),
        is_const,
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        assert_eq!(
            parse("int").unwrap(),
            TypeDescriptor::primitive(Primitive::Int)
        );
        assert_eq!(
            parse("unsigned long int").unwrap().kind,
            TypeKind::Primitive(Primitive::ULong)
        );
        assert_eq!(
            parse("long long").unwrap().kind,
            TypeKind::Primitive(Primitive::LongLong)
        );
        assert_eq!(
            parse("_Bool").unwrap().kind,
            TypeKind::Primitive(Primitive::Bool)
        );
    }

    #[test]
    fn test_parse_const() {
        let ty = parse("const int").unwrap();
        assert!(ty.is_const);
        assert_eq!(ty.kind, TypeKind::Primitive(Primitive::Int));

        // Trailing placement is equivalent.
        assert_eq!(parse("int const").unwrap(), ty);
    }

    #[test]
    fn test_parse_pointer() {
        let ty = parse("const char *").unwrap();
        let TypeKind::Pointer(pointee) = &ty.kind else {
            panic!("not a pointer");
        };
        assert!(pointee.is_const);
        assert_eq!(pointee.kind, TypeKind::Primitive(Primitive::Char));
    }

    #[test]
    fn test_parse_const_pointer() {
        // Pointer itself is const, pointee is not.
        let ty = parse("char *const").unwrap();
        assert!(ty.is_const);
        let TypeKind::Pointer(pointee) = &ty.kind else {
            panic!("not a pointer");
        };
        assert!(!pointee.is_const);
    }

    #[test]
    fn test_parse_array() {
        let ty = parse("int [4]").unwrap();
        let TypeKind::Array(elem, len) = &ty.kind else {
            panic!("not an array");
        };
        assert_eq!(elem.kind, TypeKind::Primitive(Primitive::Int));
        assert_eq!(*len, Some(4));

        let ty = parse("char []").unwrap();
        assert!(matches!(ty.kind, TypeKind::Array(_, None)));
    }

    #[test]
    fn test_parse_record() {
        assert_eq!(
            parse("struct Point").unwrap().kind,
            TypeKind::Record("Point".to_string())
        );
        assert_eq!(
            parse("Point").unwrap().kind,
            TypeKind::Record("Point".to_string())
        );
    }

    #[test]
    fn test_opaque_spellings() {
        assert!(parse("std::vector<int>").is_err());
        assert!(parse("(anonymous union at main.cpp:5:3)").is_err());
        assert!(parse("int &").is_err());
        assert!(parse("void (*)(int)").is_err());
        assert!(parse("volatile int").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_display_round() {
        for spelling in ["int", "const char *", "unsigned long", "int [4]", "Point"] {
            let ty = parse(spelling).unwrap();
            assert_eq!(parse(&ty.to_string()).unwrap(), ty, "{spelling}");
        }
    }

    #[test]
    fn test_key_fragments_distinguish_overload_types() {
        let int_frag = parse("int").unwrap().key_fragment();
        let float_frag = parse("float").unwrap().key_fragment();
        let ptr_frag = parse("char *").unwrap().key_fragment();
        assert_eq!(int_frag, "int");
        assert_eq!(float_frag, "float");
        assert_eq!(ptr_frag, "char_ptr");
        assert_ne!(int_frag, float_frag);
    }
}
