//! Reduction of type constraint formulas into bounds.
//!
//! `‹S → T›`, `‹S <: T›`, `‹S <= T›` and `‹S = T›` are decomposed with a
//! worklist until only proper leaves (checked directly) and bounds on
//! inference variables remain. Expression formulas are reduced by the
//! engine, which feeds the type formulas they produce back through here.

use super::bound::{Relation, TypeBound};
use super::constraint::ConstraintRelation;
use crate::conversion::boxed;
use crate::db::TypeDatabase;
use crate::error::{InferenceError, SessionFlags};
use crate::subtype::{Compatibility, SubtypeChecker};
use crate::types::{TypeData, TypeId, Wildcard};
use crate::visitor::is_proper;
use gti_common::InferenceOptions;
use tracing::trace;

pub struct TypeReducer<'a> {
    db: &'a dyn TypeDatabase,
    options: &'a InferenceOptions,
    checker: SubtypeChecker<'a>,
    pub flags: SessionFlags,
    /// Names of unavailable types encountered while reducing.
    pub missing: Vec<String>,
}

type Formula = (TypeId, ConstraintRelation, TypeId);

impl<'a> TypeReducer<'a> {
    pub fn new(db: &'a dyn TypeDatabase, options: &'a InferenceOptions) -> Self {
        TypeReducer {
            db,
            options,
            checker: SubtypeChecker::new(db),
            flags: SessionFlags::empty(),
            missing: Vec::new(),
        }
    }

    /// Reduce `left relation right`, appending the resulting bounds to `out`.
    /// On failure `out` may hold bounds from the part reduced so far.
    pub fn reduce(
        &mut self,
        left: TypeId,
        relation: ConstraintRelation,
        right: TypeId,
        out: &mut Vec<TypeBound>,
    ) -> Result<(), InferenceError> {
        let mut work: Vec<Formula> = vec![(left, relation, right)];
        while let Some((l, rel, r)) = work.pop() {
            trace!(left = l.0, relation = %rel, right = r.0, "reduce");
            match rel {
                ConstraintRelation::Compatible => self.compatible(l, r, &mut work)?,
                ConstraintRelation::Subtype => self.subtype(l, r, &mut work, out)?,
                ConstraintRelation::Supertype => self.subtype(r, l, &mut work, out)?,
                ConstraintRelation::Same => self.same(l, r, &mut work, out)?,
                ConstraintRelation::Contained => self.contained(l, r, &mut work)?,
            }
        }
        Ok(())
    }

    fn proper(&self, ty: TypeId) -> bool {
        is_proper(self.db, ty)
    }

    fn bound(&self, left: TypeId, relation: Relation, right: TypeId, out: &mut Vec<TypeBound>) {
        if let Some(b) = TypeBound::new(self.db, left, relation, right) {
            out.push(b);
        }
    }

    /// Record an unavailable type. Returns whether either side is one.
    fn note_missing(&mut self, left: TypeId, right: TypeId) -> bool {
        let mut any = false;
        for ty in [left, right] {
            if let Some(TypeData::Missing(name)) = self.db.lookup(ty) {
                let name = self.db.names().resolve(name).to_string();
                if !self.missing.contains(&name) {
                    self.missing.push(name);
                }
                any = true;
            }
        }
        if any {
            self.flags |= SessionFlags::MISSING_TYPE;
        }
        any
    }

    fn compatible(&mut self, s: TypeId, t: TypeId, work: &mut Vec<Formula>) -> Result<(), InferenceError> {
        if self.note_missing(s, t) {
            return Ok(());
        }
        if self.proper(s) && self.proper(t) {
            return match self
                .checker
                .compatibility(s, t, self.options.allow_unchecked_conversion)
            {
                Compatibility::Compatible => Ok(()),
                Compatibility::Unchecked => {
                    self.flags |= SessionFlags::UNCHECKED_CONVERSION;
                    Ok(())
                }
                Compatibility::Incompatible => Err(no_solution(s, ConstraintRelation::Compatible, t)),
            };
        }
        if s.is_primitive() {
            let boxed_s = boxed(s).unwrap_or(s);
            work.push((boxed_s, ConstraintRelation::Compatible, t));
            return Ok(());
        }
        if t.is_primitive() {
            let boxed_t = boxed(t).unwrap_or(t);
            work.push((s, ConstraintRelation::Same, boxed_t));
            return Ok(());
        }
        if !self.db.is_inference_var(s) && self.checker.is_unchecked_conversion(s, t) {
            if !self.options.allow_unchecked_conversion {
                return Err(no_solution(s, ConstraintRelation::Compatible, t));
            }
            self.flags |= SessionFlags::UNCHECKED_CONVERSION;
            return Ok(());
        }
        work.push((s, ConstraintRelation::Subtype, t));
        Ok(())
    }

    fn subtype(
        &mut self,
        s: TypeId,
        t: TypeId,
        work: &mut Vec<Formula>,
        out: &mut Vec<TypeBound>,
    ) -> Result<(), InferenceError> {
        let db = self.db;
        if s == t || s.is_error() || t.is_error() {
            return Ok(());
        }
        if self.note_missing(s, t) {
            return Ok(());
        }
        if self.proper(s) && self.proper(t) {
            return if self.checker.is_subtype(s, t) {
                Ok(())
            } else {
                Err(no_solution(s, ConstraintRelation::Subtype, t))
            };
        }
        if s == TypeId::NULL {
            return Ok(());
        }
        if t == TypeId::NULL {
            return Err(no_solution(s, ConstraintRelation::Subtype, t));
        }
        if db.is_inference_var(s) || db.is_inference_var(t) {
            self.bound(s, Relation::Subtype, t, out);
            return Ok(());
        }
        if s.is_primitive() || t.is_primitive() {
            return Err(no_solution(s, ConstraintRelation::Subtype, t));
        }

        if let Some(members) = db.intersection_members(t) {
            work.extend(members.iter().map(|&m| (s, ConstraintRelation::Subtype, m)));
            return Ok(());
        }
        if let Some(members) = db.intersection_members(s) {
            // Some member must be a subtype of `t`; commit to the first member
            // that can reach `t`'s class, or the first one otherwise.
            let target_decl = db.class_parts(t).map(|(d, _)| d);
            let pick = members
                .iter()
                .copied()
                .find(|&m| target_decl.is_some_and(|d| self.checker.as_super(m, d).is_some()))
                .unwrap_or(members[0]);
            work.push((pick, ConstraintRelation::Subtype, t));
            return Ok(());
        }

        match db.lookup(t) {
            Some(TypeData::Class(target)) => {
                let targs = db.type_list(target.args);
                let Some(sup) = self.checker.as_super(s, target.decl) else {
                    return Err(no_solution(s, ConstraintRelation::Subtype, t));
                };
                if targs.is_empty() {
                    return Ok(());
                }
                match db.lookup(sup) {
                    Some(TypeData::Class(sr)) => {
                        let sargs = db.type_list(sr.args);
                        if sargs.len() != targs.len() {
                            return Err(InferenceError::StructuralMismatch { left: s, right: t });
                        }
                        for (&a, &b) in sargs.iter().zip(targs.iter()) {
                            work.push((a, ConstraintRelation::Contained, b));
                        }
                        Ok(())
                    }
                    Some(TypeData::Raw(_)) if self.options.raw_type_leniency => {
                        self.flags |= SessionFlags::RAW_LENIENCY;
                        Ok(())
                    }
                    _ => Err(no_solution(s, ConstraintRelation::Subtype, t)),
                }
            }
            Some(TypeData::Raw(decl)) => {
                if self.checker.as_super(s, decl).is_some() {
                    Ok(())
                } else {
                    Err(no_solution(s, ConstraintRelation::Subtype, t))
                }
            }
            Some(TypeData::Array(t_elem)) => match db.lookup(s) {
                Some(TypeData::Array(s_elem)) => {
                    if s_elem.is_primitive() || t_elem.is_primitive() {
                        if s_elem == t_elem {
                            Ok(())
                        } else {
                            Err(no_solution(s, ConstraintRelation::Subtype, t))
                        }
                    } else {
                        work.push((s_elem, ConstraintRelation::Subtype, t_elem));
                        Ok(())
                    }
                }
                Some(TypeData::TypeParameter(_) | TypeData::Capture(_)) => {
                    let uppers = self.checker.direct_supertypes(s);
                    match uppers.into_iter().find(|&u| db.array_element(u).is_some()) {
                        Some(u) => {
                            work.push((u, ConstraintRelation::Subtype, t));
                            Ok(())
                        }
                        None => Err(no_solution(s, ConstraintRelation::Subtype, t)),
                    }
                }
                _ => Err(no_solution(s, ConstraintRelation::Subtype, t)),
            },
            Some(TypeData::TypeParameter(_)) => Err(no_solution(s, ConstraintRelation::Subtype, t)),
            Some(TypeData::Capture(c)) => match db.capture_info(c).and_then(|i| i.lower) {
                Some(lower) => {
                    work.push((s, ConstraintRelation::Subtype, lower));
                    Ok(())
                }
                None => Err(no_solution(s, ConstraintRelation::Subtype, t)),
            },
            _ => Err(no_solution(s, ConstraintRelation::Subtype, t)),
        }
    }

    fn contained(&mut self, s: TypeId, t: TypeId, work: &mut Vec<Formula>) -> Result<(), InferenceError> {
        let db = self.db;
        let fail = || Err(no_solution(s, ConstraintRelation::Contained, t));
        match db.as_wildcard(t) {
            None => {
                if db.as_wildcard(s).is_some() {
                    return fail();
                }
                work.push((s, ConstraintRelation::Same, t));
                Ok(())
            }
            Some(Wildcard::Unbounded) => Ok(()),
            Some(Wildcard::Extends(upper)) => match db.as_wildcard(s) {
                None => {
                    work.push((s, ConstraintRelation::Subtype, upper));
                    Ok(())
                }
                Some(Wildcard::Unbounded) => {
                    work.push((TypeId::OBJECT, ConstraintRelation::Subtype, upper));
                    Ok(())
                }
                Some(Wildcard::Extends(inner)) => {
                    work.push((inner, ConstraintRelation::Subtype, upper));
                    Ok(())
                }
                Some(Wildcard::Super(_)) => {
                    work.push((TypeId::OBJECT, ConstraintRelation::Same, upper));
                    Ok(())
                }
            },
            Some(Wildcard::Super(lower)) => match db.as_wildcard(s) {
                None => {
                    work.push((lower, ConstraintRelation::Subtype, s));
                    Ok(())
                }
                Some(Wildcard::Super(inner)) => {
                    work.push((lower, ConstraintRelation::Subtype, inner));
                    Ok(())
                }
                Some(_) => fail(),
            },
        }
    }

    fn same(
        &mut self,
        s: TypeId,
        t: TypeId,
        work: &mut Vec<Formula>,
        out: &mut Vec<TypeBound>,
    ) -> Result<(), InferenceError> {
        let db = self.db;
        if s == t || s.is_error() || t.is_error() {
            return Ok(());
        }
        if self.note_missing(s, t) {
            return Ok(());
        }
        let (s_var, t_var) = (db.is_inference_var(s), db.is_inference_var(t));
        if s_var || t_var {
            let other = if s_var { t } else { s };
            if other.is_primitive() || other == TypeId::VOID {
                return Err(no_solution(s, ConstraintRelation::Same, t));
            }
            self.bound(s, Relation::Same, t, out);
            return Ok(());
        }

        match (db.lookup(s), db.lookup(t)) {
            (Some(TypeData::Wildcard(ws)), Some(TypeData::Wildcard(wt))) => match (ws, wt) {
                (Wildcard::Unbounded, Wildcard::Unbounded) => Ok(()),
                (Wildcard::Extends(a), Wildcard::Extends(b))
                | (Wildcard::Super(a), Wildcard::Super(b)) => {
                    work.push((a, ConstraintRelation::Same, b));
                    Ok(())
                }
                (Wildcard::Unbounded, Wildcard::Extends(b))
                | (Wildcard::Extends(b), Wildcard::Unbounded) => {
                    work.push((TypeId::OBJECT, ConstraintRelation::Same, b));
                    Ok(())
                }
                _ => Err(no_solution(s, ConstraintRelation::Same, t)),
            },
            (Some(TypeData::Class(sr)), Some(TypeData::Class(tr))) => {
                if sr.decl != tr.decl {
                    return Err(InferenceError::StructuralMismatch { left: s, right: t });
                }
                let (sargs, targs) = (db.type_list(sr.args), db.type_list(tr.args));
                if sargs.len() != targs.len() {
                    return Err(InferenceError::StructuralMismatch { left: s, right: t });
                }
                for (&a, &b) in sargs.iter().zip(targs.iter()) {
                    work.push((a, ConstraintRelation::Same, b));
                }
                Ok(())
            }
            (
                Some(TypeData::Class(_) | TypeData::Raw(_)),
                Some(TypeData::Class(_) | TypeData::Raw(_)),
            ) => {
                let same_decl = db.class_parts(s).map(|p| p.0) == db.class_parts(t).map(|p| p.0);
                if same_decl {
                    Err(no_solution(s, ConstraintRelation::Same, t))
                } else {
                    Err(InferenceError::StructuralMismatch { left: s, right: t })
                }
            }
            (Some(TypeData::Array(a)), Some(TypeData::Array(b))) => {
                work.push((a, ConstraintRelation::Same, b));
                Ok(())
            }
            (Some(TypeData::Intersection(a)), Some(TypeData::Intersection(b))) => {
                let (a, b) = (db.type_list(a), db.type_list(b));
                if a.len() != b.len() {
                    return Err(no_solution(s, ConstraintRelation::Same, t));
                }
                for (&x, &y) in a.iter().zip(b.iter()) {
                    work.push((x, ConstraintRelation::Same, y));
                }
                Ok(())
            }
            _ => Err(no_solution(s, ConstraintRelation::Same, t)),
        }
    }
}

fn no_solution(left: TypeId, relation: ConstraintRelation, right: TypeId) -> InferenceError {
    InferenceError::NoSolution {
        left,
        relation,
        right,
    }
}

#[cfg(test)]
#[path = "../../tests/reduce_tests.rs"]
mod tests;
