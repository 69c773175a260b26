//! Type representation for the inference engine.
//!
//! Types are interned: every distinct `TypeData` value is stored once and
//! handed out as a `TypeId`. Two structurally equal types always share an id,
//! so type identity is a `u32` compare.
//!
//! Declarations (classes, type parameters, methods) live in side tables and
//! are referenced by their own ids. Fresh capture variables and inference
//! variables are nominal: each allocation yields a new id.

use gti_common::Atom;
use serde::Serialize;

/// Interned handle to a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const ERROR: TypeId = TypeId(0);
    /// The type of `null`.
    pub const NULL: TypeId = TypeId(1);
    pub const VOID: TypeId = TypeId(2);
    pub const BOOLEAN: TypeId = TypeId(3);
    pub const BYTE: TypeId = TypeId(4);
    pub const SHORT: TypeId = TypeId(5);
    pub const CHAR: TypeId = TypeId(6);
    pub const INT: TypeId = TypeId(7);
    pub const LONG: TypeId = TypeId(8);
    pub const FLOAT: TypeId = TypeId(9);
    pub const DOUBLE: TypeId = TypeId(10);

    // Ground types of the well-known classes, registered in `ClassId` order.
    pub const OBJECT: TypeId = TypeId(11);
    pub const THROWABLE: TypeId = TypeId(12);
    pub const EXCEPTION: TypeId = TypeId(13);
    pub const RUNTIME_EXCEPTION: TypeId = TypeId(14);
    pub const ERROR_CLASS: TypeId = TypeId(15);
    pub const NUMBER: TypeId = TypeId(16);
    pub const STRING: TypeId = TypeId(17);
    pub const BOOLEAN_BOX: TypeId = TypeId(18);
    pub const BYTE_BOX: TypeId = TypeId(19);
    pub const SHORT_BOX: TypeId = TypeId(20);
    pub const CHARACTER: TypeId = TypeId(21);
    pub const INTEGER: TypeId = TypeId(22);
    pub const LONG_BOX: TypeId = TypeId(23);
    pub const FLOAT_BOX: TypeId = TypeId(24);
    pub const DOUBLE_BOX: TypeId = TypeId(25);

    /// First id handed out for types built after the well-known set.
    pub const FIRST_USER: u32 = 26;

    #[inline]
    pub fn is_primitive(self) -> bool {
        (Self::BOOLEAN.0..=Self::DOUBLE.0).contains(&self.0)
    }

    /// Error and void are neither reference nor primitive values.
    #[inline]
    pub fn is_error(self) -> bool {
        self == Self::ERROR
    }
}

/// Primitive and `void` type kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IntrinsicKind {
    Void,
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl IntrinsicKind {
    pub const PRIMITIVES: [IntrinsicKind; 8] = [
        IntrinsicKind::Boolean,
        IntrinsicKind::Byte,
        IntrinsicKind::Short,
        IntrinsicKind::Char,
        IntrinsicKind::Int,
        IntrinsicKind::Long,
        IntrinsicKind::Float,
        IntrinsicKind::Double,
    ];

    pub fn to_type_id(self) -> TypeId {
        match self {
            IntrinsicKind::Void => TypeId::VOID,
            IntrinsicKind::Boolean => TypeId::BOOLEAN,
            IntrinsicKind::Byte => TypeId::BYTE,
            IntrinsicKind::Short => TypeId::SHORT,
            IntrinsicKind::Char => TypeId::CHAR,
            IntrinsicKind::Int => TypeId::INT,
            IntrinsicKind::Long => TypeId::LONG,
            IntrinsicKind::Float => TypeId::FLOAT,
            IntrinsicKind::Double => TypeId::DOUBLE,
        }
    }

    pub fn from_type_id(id: TypeId) -> Option<IntrinsicKind> {
        Some(match id {
            TypeId::VOID => IntrinsicKind::Void,
            TypeId::BOOLEAN => IntrinsicKind::Boolean,
            TypeId::BYTE => IntrinsicKind::Byte,
            TypeId::SHORT => IntrinsicKind::Short,
            TypeId::CHAR => IntrinsicKind::Char,
            TypeId::INT => IntrinsicKind::Int,
            TypeId::LONG => IntrinsicKind::Long,
            TypeId::FLOAT => IntrinsicKind::Float,
            TypeId::DOUBLE => IntrinsicKind::Double,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            IntrinsicKind::Void => "void",
            IntrinsicKind::Boolean => "boolean",
            IntrinsicKind::Byte => "byte",
            IntrinsicKind::Short => "short",
            IntrinsicKind::Char => "char",
            IntrinsicKind::Int => "int",
            IntrinsicKind::Long => "long",
            IntrinsicKind::Float => "float",
            IntrinsicKind::Double => "double",
        }
    }

    pub fn from_keyword(s: &str) -> Option<IntrinsicKind> {
        Some(match s {
            "void" => IntrinsicKind::Void,
            "boolean" => IntrinsicKind::Boolean,
            "byte" => IntrinsicKind::Byte,
            "short" => IntrinsicKind::Short,
            "char" => IntrinsicKind::Char,
            "int" => IntrinsicKind::Int,
            "long" => IntrinsicKind::Long,
            "float" => IntrinsicKind::Float,
            "double" => IntrinsicKind::Double,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(pub u32);

impl ClassId {
    pub const OBJECT: ClassId = ClassId(0);
    pub const THROWABLE: ClassId = ClassId(1);
    pub const EXCEPTION: ClassId = ClassId(2);
    pub const RUNTIME_EXCEPTION: ClassId = ClassId(3);
    pub const ERROR: ClassId = ClassId(4);
    pub const NUMBER: ClassId = ClassId(5);
    pub const STRING: ClassId = ClassId(6);
    pub const BOOLEAN: ClassId = ClassId(7);
    pub const BYTE: ClassId = ClassId(8);
    pub const SHORT: ClassId = ClassId(9);
    pub const CHARACTER: ClassId = ClassId(10);
    pub const INTEGER: ClassId = ClassId(11);
    pub const LONG: ClassId = ClassId(12);
    pub const FLOAT: ClassId = ClassId(13);
    pub const DOUBLE: ClassId = ClassId(14);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeParamId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InferenceVarId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CaptureId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodId(pub u32);

/// Interned list of types (type arguments, intersection members).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeListId(pub u32);

impl TypeListId {
    pub const EMPTY: TypeListId = TypeListId(0);
}

/// A reference to a class or interface, possibly parameterized.
///
/// `args` is empty for non-generic declarations. A generic declaration used
/// without arguments is `TypeData::Raw`, never a `ClassRef` with empty args.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ClassRef {
    pub decl: ClassId,
    pub args: TypeListId,
}

/// A wildcard type argument. Only valid in type-argument position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Wildcard {
    Unbounded,
    Extends(TypeId),
    Super(TypeId),
}

/// The structural content of a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeData {
    /// Error recovery type; related to everything.
    Error,
    Null,
    Intrinsic(IntrinsicKind),
    Class(ClassRef),
    Raw(ClassId),
    TypeParameter(TypeParamId),
    Infer(InferenceVarId),
    Capture(CaptureId),
    Wildcard(Wildcard),
    Array(TypeId),
    Intersection(TypeListId),
    /// A type the host could not resolve. Constraints over it are satisfied
    /// trivially and the owning session records incomplete information.
    Missing(Atom),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ClassKind {
    Class,
    Interface,
}

/// The single abstract method of a functional interface, expressed in terms
/// of the interface's own type parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionalMethod {
    pub name: Atom,
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    pub thrown: Vec<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassDecl {
    pub name: Atom,
    pub kind: ClassKind,
    pub type_params: Vec<TypeParamId>,
    /// Direct supertypes, in terms of `type_params`. Empty means `Object`.
    pub supertypes: Vec<TypeId>,
    pub functional: Option<FunctionalMethod>,
}

impl ClassDecl {
    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeParamDecl {
    pub name: Atom,
    /// Declared bounds. Empty means `Object`. May mention the parameter
    /// itself (F-bounds), which is why bounds are set after creation.
    pub bounds: Vec<TypeId>,
}

/// Bounds of a fresh capture variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CaptureInfo {
    /// The inference variable or wildcard this capture stands for.
    pub origin: TypeId,
    pub upper: TypeId,
    pub lower: Option<TypeId>,
}

/// A (possibly generic) method or constructor signature.
///
/// Constructors and diamond allocations are modelled as generic methods whose
/// type parameters include the class's own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MethodSig {
    pub name: Atom,
    pub type_params: Vec<TypeParamId>,
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    pub thrown: Vec<TypeId>,
    pub varargs: bool,
}

impl MethodSig {
    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Formal parameter type for argument `index`.
    ///
    /// With `variable_arity`, arguments at or past the last formal take the
    /// component type of the trailing array parameter.
    pub fn param_for_arg(
        &self,
        db: &dyn crate::db::TypeDatabase,
        index: usize,
        variable_arity: bool,
    ) -> Option<TypeId> {
        let n = self.params.len();
        if variable_arity && n > 0 && index + 1 >= n {
            let last = self.params[n - 1];
            return match db.lookup(last) {
                Some(TypeData::Array(elem)) => Some(elem),
                _ => Some(last),
            };
        }
        self.params.get(index).copied()
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
