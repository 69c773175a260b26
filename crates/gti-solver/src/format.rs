//! Human-readable type rendering for logs, errors and CLI output.

use crate::db::TypeDatabase;
use crate::types::{IntrinsicKind, TypeData, TypeId, Wildcard};

/// Renders types in source-like syntax.
///
/// Inference variables print as `T#n` (parameter name and variable id),
/// capture variables as `CAP#n`.
pub struct TypeFormatter<'a> {
    db: &'a dyn TypeDatabase,
    max_depth: u32,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        TypeFormatter { db, max_depth: 16 }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write(&mut out, ty, 0);
        out
    }

    pub fn format_list(&self, types: &[TypeId]) -> String {
        types
            .iter()
            .map(|&t| self.format(t))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn write(&self, out: &mut String, ty: TypeId, depth: u32) {
        if depth > self.max_depth {
            out.push_str("...");
            return;
        }
        let db = self.db;
        let Some(data) = db.lookup(ty) else {
            out.push_str(&format!("<unknown {}>", ty.0));
            return;
        };
        match data {
            TypeData::Error => out.push_str("<error>"),
            TypeData::Null => out.push_str("null"),
            TypeData::Intrinsic(kind) => out.push_str(IntrinsicKind::keyword(kind)),
            TypeData::Class(r) => {
                out.push_str(&db.names().resolve(db.class_name(r.decl)));
                let args = db.type_list(r.args);
                if !args.is_empty() {
                    out.push('<');
                    for (i, &arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write(out, arg, depth + 1);
                    }
                    out.push('>');
                }
            }
            TypeData::Raw(decl) => out.push_str(&db.names().resolve(db.class_name(decl))),
            TypeData::TypeParameter(p) => {
                let name = db.type_param_decl(p).map(|d| d.name).unwrap_or_default();
                out.push_str(&db.names().resolve(name));
            }
            TypeData::Infer(v) => {
                let name = db
                    .inference_var_param(v)
                    .and_then(|p| db.type_param_decl(p))
                    .map(|d| db.names().resolve(d.name).to_string())
                    .unwrap_or_else(|| "α".to_string());
                out.push_str(&format!("{name}#{}", v.0));
            }
            TypeData::Capture(c) => out.push_str(&format!("CAP#{}", c.0)),
            TypeData::Wildcard(w) => match w {
                Wildcard::Unbounded => out.push('?'),
                Wildcard::Extends(b) => {
                    out.push_str("? extends ");
                    self.write(out, b, depth + 1);
                }
                Wildcard::Super(b) => {
                    out.push_str("? super ");
                    self.write(out, b, depth + 1);
                }
            },
            TypeData::Array(elem) => {
                self.write(out, elem, depth + 1);
                out.push_str("[]");
            }
            TypeData::Intersection(list) => {
                for (i, &m) in db.type_list(list).iter().enumerate() {
                    if i > 0 {
                        out.push_str(" & ");
                    }
                    self.write(out, m, depth + 1);
                }
            }
            TypeData::Missing(name) => {
                out.push_str(&format!("<missing {}>", db.names().resolve(name)));
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
