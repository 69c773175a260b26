use super::*;
use crate::fixtures::World;
use crate::types::Wildcard;

fn var(w: &World) -> TypeId {
    w.db.fresh_inference_var(None)
}

fn bound(w: &World, left: TypeId, relation: Relation, right: TypeId) -> TypeBound {
    TypeBound::new(&w.db, left, relation, right).expect("one side is a variable")
}

#[test]
fn test_bounds_are_canonical() {
    let w = World::new();
    let (a, b) = (var(&w), var(&w));

    let flipped = bound(&w, TypeId::STRING, Relation::Subtype, a);
    assert_eq!(flipped.var, a);
    assert_eq!(flipped.relation, Relation::Supertype);
    assert_eq!(flipped.other, TypeId::STRING);

    let between = bound(&w, a, Relation::Supertype, b);
    assert_eq!((between.var, between.relation, between.other), (b, Relation::Subtype, a));

    let same = bound(&w, b, Relation::Same, a);
    assert_eq!((same.var, same.other), (a, b));
    assert_eq!(same, bound(&w, a, Relation::Same, b));

    assert!(TypeBound::new(&w.db, TypeId::STRING, Relation::Subtype, TypeId::OBJECT).is_none());
}

#[test]
fn test_variable_bounds_show_in_both_views() {
    let w = World::new();
    let (a, b) = (var(&w), var(&w));
    let mut set = BoundSet::new();
    assert!(set.is_empty());
    assert!(set.add_bound(&w.db, bound(&w, a, Relation::Subtype, b), false));
    assert!(!set.add_bound(&w.db, bound(&w, b, Relation::Supertype, a), false));
    assert_eq!(set.len(), 1);
    assert_eq!(set.upper_bounds(&w.db, a, false), vec![b]);
    assert_eq!(set.lower_bounds(&w.db, b, false), vec![a]);
    assert!(set.upper_bounds(&w.db, a, true).is_empty());
    assert!(set.contains_var(a) && set.contains_var(b));
}

#[test]
fn test_instantiation_is_first_proper_equal_bound() {
    let w = World::new();
    let (a, b) = (var(&w), var(&w));
    let mut set = BoundSet::new();
    set.register(a);
    assert!(!set.is_instantiated(a));
    set.add_bound(&w.db, bound(&w, a, Relation::Same, w.list_of_ty(b)), false);
    assert!(!set.is_instantiated(a));
    set.add_bound(&w.db, bound(&w, a, Relation::Same, TypeId::STRING), false);
    set.add_bound(&w.db, bound(&w, a, Relation::Same, TypeId::INTEGER), false);
    assert_eq!(set.instantiation(a), Some(TypeId::STRING));
    let subst = set.instantiations();
    assert_eq!(subst.len(), 1);
    assert_eq!(subst.get(a), Some(TypeId::STRING));
    assert_eq!(set.num_uninstantiated(&[a, b]), 1);

    // `α = α` carries no information.
    assert!(!set.add_bound(
        &w.db,
        TypeBound {
            var: b,
            relation: Relation::Same,
            other: b,
        },
        false
    ));
}

#[test]
fn test_hard_bound_clears_soft_flag() {
    let w = World::new();
    let a = var(&w);
    let mut set = BoundSet::new();
    let b = bound(&w, a, Relation::Subtype, TypeId::NUMBER);
    set.add_bound(&w.db, b, true);
    assert!(set.is_soft(&b));
    set.add_bound(&w.db, b, true);
    assert!(set.is_soft(&b));
    set.add_bound(&w.db, b, false);
    assert!(!set.is_soft(&b));
}

#[test]
fn test_merge_keeps_everything() {
    let w = World::new();
    let (a, b, c) = (var(&w), var(&w), var(&w));
    let mut left = BoundSet::new();
    left.add_bound(&w.db, bound(&w, a, Relation::Supertype, TypeId::STRING), false);
    let mut right = BoundSet::new();
    right.register(c);
    right.add_bound(&w.db, bound(&w, b, Relation::Subtype, TypeId::NUMBER), true);
    right.add_throws(b);

    assert!(left.merge(&w.db, &right));
    assert!(!left.merge(&w.db, &right));
    assert!(left.contains_var(c));
    assert_eq!(left.upper_bounds(&w.db, b, true), vec![TypeId::NUMBER]);
    assert!(left.is_soft(&bound(&w, b, Relation::Subtype, TypeId::NUMBER)));
    assert!(left.is_throws(b));
    assert_eq!(left.variables().count(), 3);
}

#[test]
fn test_capture_bounds() {
    let w = World::new();
    let (a, b) = (var(&w), var(&w));
    let captured = w.list_of_ty(w.db.wildcard(Wildcard::Extends(b)));
    let mut set = BoundSet::new();
    let capture = CaptureBound {
        vars: vec![a],
        captured,
    };
    assert!(set.add(&w.db, Bound::Capture(capture.clone()), false));
    assert!(!set.add_capture(capture));
    assert!(set.is_captured(a));
    assert!(!set.is_captured(b));
    assert_eq!(set.captures().len(), 1);
    assert!(set.has_unincorporated());
    assert_eq!(set.take_unexpanded_captures().len(), 1);
    assert!(set.take_unexpanded_captures().is_empty());

    let resolved: IndexSet<TypeId> = [a].into_iter().collect();
    set.remove_captures_of(&resolved);
    assert!(set.captures().is_empty());
    assert!(set.contains_var(a));
}

#[test]
fn test_resolution_dependencies() {
    let w = World::new();
    let (a, b, c, d) = (var(&w), var(&w), var(&w), var(&w));
    let mut set = BoundSet::new();
    set.add_bound(&w.db, bound(&w, a, Relation::Subtype, w.list_of_ty(b)), false);
    set.register(b);
    assert!(set.depends_on_resolution_of(&w.db, a, b));
    assert!(!set.depends_on_resolution_of(&w.db, b, a));
    assert!(set.depends_on_resolution_of(&w.db, b, b));

    // A captured variable depends on what its capture mentions and nothing
    // else, and everything its bounds mention depends on it.
    set.add_capture(CaptureBound {
        vars: vec![c],
        captured: w.list_of_ty(w.db.wildcard(Wildcard::Extends(a))),
    });
    set.add_bound(&w.db, bound(&w, c, Relation::Subtype, w.list_of_ty(d)), false);
    assert!(set.depends_on_resolution_of(&w.db, c, a));
    assert!(!set.depends_on_resolution_of(&w.db, c, d));
    assert!(set.depends_on_resolution_of(&w.db, d, c));
}
