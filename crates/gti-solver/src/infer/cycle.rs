//! Ordering of deferred expression constraints.
//!
//! A deferred constraint can be reduced once the variables it reads (its
//! input variables) are resolved. Constraint `c` depends on `d` when some
//! input variable of `c` can be influenced by an output variable of `d`.
//! Influence is the symmetric, transitive closure of "depends on the
//! resolution of", so it is computed as connected components with a
//! union-find table.
//!
//! The constraints with no dependencies form the bottom set. When there is
//! none, the constraints form dependency cycles and one constraint is chosen
//! from a cycle that depends on nothing outside itself: the expression
//! constraint over the largest expression tree, first one on ties. This is a
//! heuristic; it picks the outermost expression in practice.

use super::bound_set::BoundSet;
use super::constraint::Constraint;
use crate::db::TypeDatabase;
use crate::expr::ExprArena;
use crate::types::TypeId;
use ena::unify::{InPlaceUnificationTable, UnifyKey};
use fixedbitset::FixedBitSet;
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct VarKey(u32);

impl UnifyKey for VarKey {
    type Value = ();

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        VarKey(u)
    }

    fn tag() -> &'static str {
        "VarKey"
    }
}

/// Influence classes of inference variables.
struct Influence {
    table: InPlaceUnificationTable<VarKey>,
    keys: FxHashMap<TypeId, VarKey>,
}

impl Influence {
    fn build(db: &dyn TypeDatabase, bounds: &BoundSet) -> Self {
        let mut influence = Influence {
            table: InPlaceUnificationTable::new(),
            keys: FxHashMap::default(),
        };
        let vars: Vec<TypeId> = bounds.variables().collect();
        for (i, &a) in vars.iter().enumerate() {
            for &b in &vars[i + 1..] {
                if bounds.depends_on_resolution_of(db, a, b)
                    || bounds.depends_on_resolution_of(db, b, a)
                {
                    let (ka, kb) = (influence.key(a), influence.key(b));
                    influence.table.union(ka, kb);
                }
            }
        }
        influence
    }

    fn key(&mut self, var: TypeId) -> VarKey {
        if let Some(&k) = self.keys.get(&var) {
            return k;
        }
        let k = self.table.new_key(());
        self.keys.insert(var, k);
        k
    }

    fn influences(&mut self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        let (ka, kb) = (self.key(a), self.key(b));
        self.table.unioned(ka, kb)
    }
}

/// Dependency edges between constraints: `edges[i]` holds every `j` that
/// constraint `i` depends on.
pub struct ConstraintGraph {
    edges: Vec<FixedBitSet>,
}

impl ConstraintGraph {
    pub fn build(
        db: &dyn TypeDatabase,
        exprs: &ExprArena,
        bounds: &BoundSet,
        constraints: &[Constraint],
    ) -> Self {
        let mut influence = Influence::build(db, bounds);
        let inputs: Vec<IndexSet<TypeId>> = constraints
            .iter()
            .map(|c| c.input_variables(db, exprs))
            .collect();
        let outputs: Vec<IndexSet<TypeId>> = constraints
            .iter()
            .map(|c| c.output_variables(db, exprs))
            .collect();
        let n = constraints.len();
        let mut edges = vec![FixedBitSet::with_capacity(n); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let depends = inputs[i]
                    .iter()
                    .any(|&a| outputs[j].iter().any(|&b| influence.influences(a, b)));
                if depends {
                    edges[i].insert(j);
                }
            }
        }
        ConstraintGraph { edges }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn depends_on(&self, i: usize, j: usize) -> bool {
        self.edges.get(i).is_some_and(|e| e.contains(j))
    }

    /// Constraints that depend on no other constraint.
    pub fn bottom_set(&self) -> Vec<usize> {
        (0..self.edges.len())
            .filter(|&i| self.edges[i].count_ones(..) == 0)
            .collect()
    }

    /// A strongly connected component with no edges leaving it.
    pub fn sink_component(&self) -> Vec<usize> {
        let mut tarjan = Tarjan::new(self.edges.len());
        for v in 0..self.edges.len() {
            if tarjan.index[v].is_none() {
                tarjan.visit(&self.edges, v);
            }
            if let Some(first) = tarjan.components.first() {
                let mut component = first.clone();
                component.sort_unstable();
                return component;
            }
        }
        Vec::new()
    }
}

struct Tarjan {
    counter: usize,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: FixedBitSet,
    stack: Vec<usize>,
    components: Vec<Vec<usize>>,
}

impl Tarjan {
    fn new(n: usize) -> Self {
        Tarjan {
            counter: 0,
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: FixedBitSet::with_capacity(n),
            stack: Vec::new(),
            components: Vec::new(),
        }
    }

    fn visit(&mut self, edges: &[FixedBitSet], v: usize) {
        self.index[v] = Some(self.counter);
        self.lowlink[v] = self.counter;
        self.counter += 1;
        self.stack.push(v);
        self.on_stack.insert(v);

        for w in edges[v].ones() {
            match self.index[w] {
                None => {
                    self.visit(edges, w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(w_index) if self.on_stack.contains(w) => {
                    self.lowlink[v] = self.lowlink[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[v]) == self.index[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack.set(w, false);
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

/// Choose one constraint from the cycle `members`.
pub fn pick_from_cycle(exprs: &ExprArena, constraints: &[Constraint], members: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for &i in members {
        let Some(Constraint::Expression { expr, .. }) = constraints.get(i) else {
            continue;
        };
        let size = exprs.subtree_size(*expr);
        if best.is_none_or(|(_, s)| size > s) {
            best = Some((i, size));
        }
    }
    best.map(|(i, _)| i).or_else(|| members.first().copied())
}

/// Indices of the constraints to process next: the bottom set, or a single
/// constraint picked from a dependency cycle.
pub fn select_constraints(
    db: &dyn TypeDatabase,
    exprs: &ExprArena,
    bounds: &BoundSet,
    constraints: &[Constraint],
) -> Vec<usize> {
    if constraints.is_empty() {
        return Vec::new();
    }
    let graph = ConstraintGraph::build(db, exprs, bounds, constraints);
    let bottom = graph.bottom_set();
    if !bottom.is_empty() {
        return bottom;
    }
    let cycle = graph.sink_component();
    let picked = pick_from_cycle(exprs, constraints, &cycle);
    debug!(cycle = cycle.len(), picked = ?picked, "breaking constraint cycle");
    picked.into_iter().collect()
}

#[cfg(test)]
#[path = "../../tests/cycle_tests.rs"]
mod tests;
