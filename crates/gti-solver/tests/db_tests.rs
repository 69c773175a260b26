use super::*;
use crate::intern::TypeInterner;
use crate::types::ClassKind;

#[test]
fn test_generic_class_without_args_is_raw() {
    let db = TypeInterner::new();
    let list = db.declare_class("List", ClassKind::Interface, &["E"]);
    let raw = db.class_type(list, Vec::new());
    assert_eq!(db.lookup(raw), Some(TypeData::Raw(list)));
    assert_eq!(raw, db.raw(list));
    let (decl, args) = db.class_parts(raw).expect("raw is a class type");
    assert_eq!(decl, list);
    assert!(args.is_empty());

    let strings = db.class_type(list, vec![TypeId::STRING]);
    let (decl, args) = db.class_parts(strings).expect("class type");
    assert_eq!(decl, list);
    assert_eq!(&args[..], &[TypeId::STRING]);
}

#[test]
fn test_well_known_class_types_are_fixed() {
    let db = TypeInterner::new();
    assert_eq!(db.class_type(ClassId::OBJECT, Vec::new()), TypeId::OBJECT);
    assert_eq!(db.class_type(ClassId::INTEGER, Vec::new()), TypeId::INTEGER);
    assert_eq!(db.class_type(ClassId::STRING, Vec::new()), TypeId::STRING);
    assert_eq!(
        db.names().resolve(db.class_name(ClassId::RUNTIME_EXCEPTION)).as_ref(),
        "RuntimeException"
    );
}

#[test]
fn test_intersection_normalization() {
    let db = TypeInterner::new();
    let runnable = db.class_type(db.declare_class("Runnable", ClassKind::Interface, &[]), vec![]);
    let cloneable = db.class_type(db.declare_class("Cloneable", ClassKind::Interface, &[]), vec![]);

    assert_eq!(db.intersection(vec![]), TypeId::OBJECT);
    assert_eq!(db.intersection(vec![runnable]), runnable);
    assert_eq!(db.intersection(vec![TypeId::OBJECT, runnable]), runnable);
    assert_eq!(db.intersection(vec![runnable, runnable]), runnable);

    let both = db.intersection(vec![runnable, cloneable]);
    assert_eq!(
        db.intersection_members(both).as_deref(),
        Some(&[runnable, cloneable][..])
    );
    // Nested intersections flatten.
    let nested = db.intersection(vec![both, TypeId::STRING, cloneable]);
    assert_eq!(
        db.intersection_members(nested).as_deref(),
        Some(&[runnable, cloneable, TypeId::STRING][..])
    );
}

#[test]
fn test_structural_queries() {
    let db = TypeInterner::new();
    let list = db.declare_class("List", ClassKind::Interface, &["E"]);
    let extends_number = db.wildcard(Wildcard::Extends(TypeId::NUMBER));
    let numbers = db.class_type(list, vec![extends_number]);
    assert!(db.is_wildcard_parameterized(numbers));
    assert!(!db.is_wildcard_parameterized(db.class_type(list, vec![TypeId::INTEGER])));
    assert_eq!(db.as_wildcard(extends_number), Some(Wildcard::Extends(TypeId::NUMBER)));

    let ints = db.array(TypeId::INT);
    assert_eq!(db.array_element(ints), Some(TypeId::INT));
    assert_eq!(db.array_element(TypeId::INT), None);

    let var = db.fresh_inference_var(None);
    assert!(db.is_inference_var(var));
    assert!(!db.is_inference_var(TypeId::OBJECT));

    let missing = db.missing("com.example.Gone");
    assert!(db.is_missing(missing));
    assert!(db.is_reference(missing));
    assert!(db.is_reference(TypeId::NULL));
    assert!(!db.is_reference(TypeId::INT));
    assert!(!db.is_reference(TypeId::VOID));
}

#[test]
fn test_type_param_bounds_default_to_object() {
    let db = TypeInterner::new();
    let t = db.declare_type_param("T");
    assert_eq!(db.type_param_bounds(t), vec![TypeId::OBJECT]);
    db.set_type_param_bounds(t, vec![TypeId::NUMBER]);
    assert_eq!(db.type_param_bounds(t), vec![TypeId::NUMBER]);
}
