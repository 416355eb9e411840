//! Type representation for interpreted programs
//!
//! Types mirror the C subset: named scalar types, pointers, fixed-size
//! arrays, and function types. Every value carries its type, and typed
//! memory access ([`crate::memory`]) derives its encoding from the type.
//!
//! # Type Sizes
//!
//! Unlike real C, sizes are fixed and platform-independent:
//! - `char`: 1 byte, `short`: 2, `int`: 4, `long`: 8 (plus unsigned forms)
//! - `float`: 4 bytes, `double`: 8
//! - pointers: 8 bytes regardless of pointee
//! - arrays: element size times element count (no padding)

/// Named scalar types, the leaves of the type grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Void,
    Char,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    Float,
    Double,
}

impl ScalarKind {
    /// The C spelling of this type
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Void => "void",
            ScalarKind::Char => "char",
            ScalarKind::UnsignedChar => "unsigned char",
            ScalarKind::Short => "short",
            ScalarKind::UnsignedShort => "unsigned short",
            ScalarKind::Int => "int",
            ScalarKind::UnsignedInt => "unsigned int",
            ScalarKind::Long => "long",
            ScalarKind::UnsignedLong => "unsigned long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        }
    }

    /// Storage size in bytes
    pub fn size(self) -> usize {
        match self {
            ScalarKind::Void => 0,
            ScalarKind::Char | ScalarKind::UnsignedChar => 1,
            ScalarKind::Short | ScalarKind::UnsignedShort => 2,
            ScalarKind::Int | ScalarKind::UnsignedInt | ScalarKind::Float => 4,
            ScalarKind::Long | ScalarKind::UnsignedLong | ScalarKind::Double => 8,
        }
    }

    pub fn is_integral(self) -> bool {
        !matches!(
            self,
            ScalarKind::Void | ScalarKind::Float | ScalarKind::Double
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, ScalarKind::Float | ScalarKind::Double)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ScalarKind::Char | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long
        )
    }

    /// Conversion rank used by the usual arithmetic conversions.
    /// Higher rank wins; unsigned outranks signed at equal width.
    pub fn rank(self) -> u8 {
        match self {
            ScalarKind::Void => 0,
            ScalarKind::Char | ScalarKind::UnsignedChar => 1,
            ScalarKind::Short | ScalarKind::UnsignedShort => 2,
            ScalarKind::Int => 3,
            ScalarKind::UnsignedInt => 4,
            ScalarKind::Long => 5,
            ScalarKind::UnsignedLong => 6,
            ScalarKind::Float => 7,
            ScalarKind::Double => 8,
        }
    }
}

/// Look up a scalar type by its C spelling.
///
/// This is the process-wide table of named scalar types; type expressions
/// in the AST (`BuiltinType` nodes) resolve through it.
pub fn scalar_type(name: &str) -> Option<Type> {
    let kind = match name {
        "void" => ScalarKind::Void,
        "char" => ScalarKind::Char,
        "unsigned char" => ScalarKind::UnsignedChar,
        "short" => ScalarKind::Short,
        "unsigned short" => ScalarKind::UnsignedShort,
        "int" => ScalarKind::Int,
        "unsigned int" => ScalarKind::UnsignedInt,
        "long" => ScalarKind::Long,
        "unsigned long" => ScalarKind::UnsignedLong,
        "float" => ScalarKind::Float,
        "double" => ScalarKind::Double,
        _ => return None,
    };
    Some(Type::Scalar(kind))
}

/// A function's result and formal parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub result: Type,
    pub params: Vec<ParamDecl>,
}

/// A named formal parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: Type,
}

/// Types of the interpreted C subset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Scalar(ScalarKind),
    Pointer(Box<Type>),
    ConstantArray { elem: Box<Type>, count: usize },
    Function(Box<FunctionType>),
}

impl Type {
    pub fn pointer(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    pub fn constant_array(elem: Type, count: usize) -> Type {
        Type::ConstantArray {
            elem: Box::new(elem),
            count,
        }
    }

    pub fn function(result: Type, params: Vec<ParamDecl>) -> Type {
        Type::Function(Box::new(FunctionType { result, params }))
    }

    /// Storage size in bytes. Defined for every type; function types
    /// occupy no storage and report 0.
    pub fn size(&self) -> usize {
        match self {
            Type::Scalar(kind) => kind.size(),
            Type::Pointer(_) => 8,
            Type::ConstantArray { elem, count } => elem.size() * count,
            Type::Function(_) => 0,
        }
    }

    /// The pointed-to type, if this is a pointer
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(pointee) => Some(pointee),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self {
            Type::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_constant_array(&self) -> bool {
        matches!(self, Type::ConstantArray { .. })
    }

    pub fn is_integral(&self) -> bool {
        self.as_scalar().is_some_and(ScalarKind::is_integral)
    }

    pub fn is_floating(&self) -> bool {
        self.as_scalar().is_some_and(ScalarKind::is_floating)
    }
}
