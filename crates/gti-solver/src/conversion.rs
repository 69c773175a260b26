//! Elementary conversions between primitive and box types.
//!
//! A constant table indexed by primitive kind. Inference only needs to know
//! whether a conversion exists; it never performs value conversion.

use crate::types::{ClassId, IntrinsicKind, TypeId};

const fn slot(kind: IntrinsicKind) -> usize {
    match kind {
        IntrinsicKind::Void => usize::MAX,
        IntrinsicKind::Boolean => 0,
        IntrinsicKind::Byte => 1,
        IntrinsicKind::Short => 2,
        IntrinsicKind::Char => 3,
        IntrinsicKind::Int => 4,
        IntrinsicKind::Long => 5,
        IntrinsicKind::Float => 6,
        IntrinsicKind::Double => 7,
    }
}

/// `WIDENING[from][to]`: identity or widening primitive conversion exists.
/// Rows and columns: boolean, byte, short, char, int, long, float, double.
const WIDENING: [[bool; 8]; 8] = [
    [true, false, false, false, false, false, false, false],
    [false, true, true, false, true, true, true, true],
    [false, false, true, false, true, true, true, true],
    [false, false, false, true, true, true, true, true],
    [false, false, false, false, true, true, true, true],
    [false, false, false, false, false, true, true, true],
    [false, false, false, false, false, false, true, true],
    [false, false, false, false, false, false, false, true],
];

const BOXES: [(IntrinsicKind, ClassId, TypeId); 8] = [
    (IntrinsicKind::Boolean, ClassId::BOOLEAN, TypeId::BOOLEAN_BOX),
    (IntrinsicKind::Byte, ClassId::BYTE, TypeId::BYTE_BOX),
    (IntrinsicKind::Short, ClassId::SHORT, TypeId::SHORT_BOX),
    (IntrinsicKind::Char, ClassId::CHARACTER, TypeId::CHARACTER),
    (IntrinsicKind::Int, ClassId::INTEGER, TypeId::INTEGER),
    (IntrinsicKind::Long, ClassId::LONG, TypeId::LONG_BOX),
    (IntrinsicKind::Float, ClassId::FLOAT, TypeId::FLOAT_BOX),
    (IntrinsicKind::Double, ClassId::DOUBLE, TypeId::DOUBLE_BOX),
];

/// Identity or widening primitive conversion from `from` to `to`.
pub fn is_primitive_widening(from: TypeId, to: TypeId) -> bool {
    let (Some(f), Some(t)) = (
        IntrinsicKind::from_type_id(from),
        IntrinsicKind::from_type_id(to),
    ) else {
        return false;
    };
    let (f, t) = (slot(f), slot(t));
    f < 8 && t < 8 && WIDENING[f][t]
}

/// The box type of a primitive, e.g. `int` to `Integer`.
pub fn boxed(primitive: TypeId) -> Option<TypeId> {
    let kind = IntrinsicKind::from_type_id(primitive)?;
    BOXES
        .iter()
        .find(|(k, _, _)| *k == kind)
        .map(|&(_, _, ty)| ty)
}

/// The primitive a box type unboxes to, e.g. `Integer` to `int`.
pub fn unboxed(reference: TypeId) -> Option<TypeId> {
    BOXES
        .iter()
        .find(|(_, _, ty)| *ty == reference)
        .map(|&(kind, _, _)| kind.to_type_id())
}

pub fn is_box_class(decl: ClassId) -> bool {
    BOXES.iter().any(|&(_, c, _)| c == decl)
}

pub fn is_box_type(ty: TypeId) -> bool {
    BOXES.iter().any(|&(_, _, t)| t == ty)
}

#[cfg(test)]
#[path = "../tests/conversion_tests.rs"]
mod tests;
