//! Parser for the type expressions used in scenario files.
//!
//! ```text
//! type    := member ('&' member)*
//! member  := '?' (('extends' | 'super') member)? | name args? ('[' ']')*
//! args    := '<' type (',' type)* '>'
//! ```
//!
//! Names resolve against the type parameters in scope first, then the
//! primitives, then declared classes. A generic class named without
//! arguments is the raw type. Unknown names become missing types so the
//! engine can report incomplete information instead of the parser failing.

use anyhow::{Result, bail};
use gti_solver::{ClassId, TypeDatabase, TypeId, TypeInterner, Wildcard};
use rustc_hash::FxHashMap;
use tracing::warn;

/// Type-parameter names visible while parsing.
pub type Scope = FxHashMap<String, TypeId>;

pub struct TypeParser<'a> {
    db: &'a TypeInterner,
    scope: &'a Scope,
    src: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    pub fn new(db: &'a TypeInterner, scope: &'a Scope, src: &'a str) -> Self {
        TypeParser {
            db,
            scope,
            src,
            pos: 0,
        }
    }

    /// Parse the whole input as one type.
    pub fn parse(mut self) -> Result<TypeId> {
        let ty = self.parse_type()?;
        self.skip_ws();
        if self.pos < self.src.len() {
            bail!(
                "unexpected `{}` at offset {} in type `{}`",
                &self.src[self.pos..],
                self.pos,
                self.src
            );
        }
        Ok(ty)
    }

    fn parse_type(&mut self) -> Result<TypeId> {
        let first = self.parse_member()?;
        let mut members = vec![first];
        while self.eat('&') {
            members.push(self.parse_member()?);
        }
        if members.len() == 1 {
            return Ok(first);
        }
        Ok(self.db.intersection(members))
    }

    fn parse_member(&mut self) -> Result<TypeId> {
        if self.eat('?') {
            let wildcard = match self.peek_ident() {
                Some("extends") => {
                    self.ident()?;
                    Wildcard::Extends(self.parse_member()?)
                }
                Some("super") => {
                    self.ident()?;
                    Wildcard::Super(self.parse_member()?)
                }
                _ => Wildcard::Unbounded,
            };
            return Ok(self.db.wildcard(wildcard));
        }

        let name = self.ident()?;
        let args = if self.eat('<') {
            let mut args = vec![self.parse_type()?];
            while self.eat(',') {
                args.push(self.parse_type()?);
            }
            self.expect('>')?;
            Some(args)
        } else {
            None
        };
        let mut ty = self.resolve_name(&name, args)?;
        while self.eat('[') {
            self.expect(']')?;
            ty = self.db.array(ty);
        }
        Ok(ty)
    }

    fn resolve_name(&self, name: &str, args: Option<Vec<TypeId>>) -> Result<TypeId> {
        if let Some(&param) = self.scope.get(name) {
            if args.is_some() {
                bail!("type parameter `{name}` cannot take type arguments");
            }
            return Ok(param);
        }
        if let Some(primitive) = primitive(name) {
            if args.is_some() {
                bail!("`{name}` cannot take type arguments");
            }
            return Ok(primitive);
        }
        let Some(class) = self.db.class_by_name(name) else {
            warn!(name, "unknown type name, treated as missing");
            return Ok(self.db.missing(name));
        };
        let arity = self.arity(class);
        match args {
            Some(args) if args.len() != arity => {
                bail!("`{name}` takes {arity} type arguments, found {}", args.len())
            }
            Some(args) => Ok(self.db.class_type(class, args)),
            None if arity > 0 => Ok(self.db.raw(class)),
            None => Ok(self.db.class_type(class, Vec::new())),
        }
    }

    fn arity(&self, class: ClassId) -> usize {
        self.db
            .class_decl(class)
            .map_or(0, |decl| decl.type_params.len())
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if !self.eat(c) {
            bail!("expected `{c}` at offset {} in type `{}`", self.pos, self.src);
        }
        Ok(())
    }

    fn ident_len(&self) -> usize {
        self.src[self.pos..]
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '.'))
            .unwrap_or(self.src.len() - self.pos)
    }

    fn peek_ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let len = self.ident_len();
        let src: &'a str = self.src;
        (len > 0).then(|| &src[self.pos..self.pos + len])
    }

    fn ident(&mut self) -> Result<String> {
        self.skip_ws();
        let len = self.ident_len();
        if len == 0 {
            bail!("expected a type name at offset {} in type `{}`", self.pos, self.src);
        }
        let name = self.src[self.pos..self.pos + len].to_string();
        self.pos += len;
        Ok(name)
    }
}

fn primitive(name: &str) -> Option<TypeId> {
    Some(match name {
        "boolean" => TypeId::BOOLEAN,
        "byte" => TypeId::BYTE,
        "short" => TypeId::SHORT,
        "char" => TypeId::CHAR,
        "int" => TypeId::INT,
        "long" => TypeId::LONG,
        "float" => TypeId::FLOAT,
        "double" => TypeId::DOUBLE,
        "void" => TypeId::VOID,
        "null" => TypeId::NULL,
        _ => return None,
    })
}

/// Parse `src` with the given type parameters in scope.
pub fn parse_type(db: &TypeInterner, scope: &Scope, src: &str) -> Result<TypeId> {
    TypeParser::new(db, scope, src).parse()
}

#[cfg(test)]
#[path = "../tests/type_parser_tests.rs"]
mod tests;
