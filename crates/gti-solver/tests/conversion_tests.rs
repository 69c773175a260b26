use super::*;

#[test]
fn test_widening_follows_primitive_order() {
    assert!(is_primitive_widening(TypeId::INT, TypeId::INT));
    assert!(is_primitive_widening(TypeId::INT, TypeId::LONG));
    assert!(is_primitive_widening(TypeId::BYTE, TypeId::DOUBLE));
    assert!(is_primitive_widening(TypeId::CHAR, TypeId::INT));
    assert!(!is_primitive_widening(TypeId::LONG, TypeId::INT));
    assert!(!is_primitive_widening(TypeId::CHAR, TypeId::SHORT));
    assert!(!is_primitive_widening(TypeId::BYTE, TypeId::CHAR));
}

#[test]
fn test_boolean_only_widens_to_itself() {
    assert!(is_primitive_widening(TypeId::BOOLEAN, TypeId::BOOLEAN));
    for &to in &[TypeId::BYTE, TypeId::INT, TypeId::DOUBLE] {
        assert!(!is_primitive_widening(TypeId::BOOLEAN, to));
    }
}

#[test]
fn test_void_and_references_never_widen() {
    assert!(!is_primitive_widening(TypeId::VOID, TypeId::VOID));
    assert!(!is_primitive_widening(TypeId::INTEGER, TypeId::LONG));
    assert!(!is_primitive_widening(TypeId::INT, TypeId::OBJECT));
}

#[test]
fn test_boxing_pairs() {
    assert_eq!(boxed(TypeId::INT), Some(TypeId::INTEGER));
    assert_eq!(boxed(TypeId::CHAR), Some(TypeId::CHARACTER));
    assert_eq!(boxed(TypeId::VOID), None);
    assert_eq!(boxed(TypeId::STRING), None);
    assert_eq!(unboxed(TypeId::DOUBLE_BOX), Some(TypeId::DOUBLE));
    assert_eq!(unboxed(TypeId::NUMBER), None);
    for kind in IntrinsicKind::PRIMITIVES {
        let prim = kind.to_type_id();
        let b = boxed(prim).expect("every primitive has a box");
        assert_eq!(unboxed(b), Some(prim));
        assert!(is_box_type(b));
    }
}

#[test]
fn test_box_classes() {
    assert!(is_box_class(ClassId::INTEGER));
    assert!(is_box_class(ClassId::BOOLEAN));
    assert!(!is_box_class(ClassId::NUMBER));
    assert!(!is_box_class(ClassId::STRING));
}
