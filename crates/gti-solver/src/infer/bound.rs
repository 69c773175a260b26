//! Elementary bounds.

use crate::db::TypeDatabase;
use crate::types::TypeId;
use smallvec::SmallVec;
use std::fmt;

/// Relation of a type bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Same,
    Subtype,
    Supertype,
}

impl Relation {
    pub fn flip(self) -> Relation {
        match self {
            Relation::Same => Relation::Same,
            Relation::Subtype => Relation::Supertype,
            Relation::Supertype => Relation::Subtype,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Same => "=",
            Relation::Subtype => "<:",
            Relation::Supertype => ":>",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `var relation other`, where `var` is an inference variable.
///
/// Bounds are canonical so the same fact has one representation:
/// - the inference variable is on the left whenever one side is not a variable
/// - between two variables, `Supertype` is flipped to `Subtype` and `Same`
///   puts the lower type id on the left
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeBound {
    pub var: TypeId,
    pub relation: Relation,
    pub other: TypeId,
}

impl TypeBound {
    /// Canonical bound for `left relation right`, or `None` when neither side
    /// is an inference variable (that is a constraint, not a bound).
    pub fn new(
        db: &dyn TypeDatabase,
        left: TypeId,
        relation: Relation,
        right: TypeId,
    ) -> Option<TypeBound> {
        let (l_var, r_var) = (db.is_inference_var(left), db.is_inference_var(right));
        let (var, relation, other) = match (l_var, r_var) {
            (false, false) => return None,
            (true, false) => (left, relation, right),
            (false, true) => (right, relation.flip(), left),
            (true, true) => match relation {
                Relation::Supertype => (right, Relation::Subtype, left),
                Relation::Same if right < left => (right, Relation::Same, left),
                _ => (left, relation, right),
            },
        };
        Some(TypeBound {
            var,
            relation,
            other,
        })
    }

    /// The bound seen from each inference variable it relates:
    /// `(variable, relation, other side)`.
    pub fn views(&self, db: &dyn TypeDatabase) -> SmallVec<[(TypeId, Relation, TypeId); 2]> {
        let mut views = SmallVec::new();
        views.push((self.var, self.relation, self.other));
        if self.other != self.var && db.is_inference_var(self.other) {
            views.push((self.other, self.relation.flip(), self.var));
        }
        views
    }
}

/// `G<α1..αn> = capture(G<A1..An>)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CaptureBound {
    pub vars: Vec<TypeId>,
    /// The wildcard-parameterized type being captured.
    pub captured: TypeId,
}

/// Any element of a bound set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bound {
    Type(TypeBound),
    /// `throws α`: the variable appears in a throws clause.
    Throws(TypeId),
    Capture(CaptureBound),
}
