//! Type-name parser for the CLI and tests.
//!
//! Grammar:
//!
//! ```text
//! type  := name generic? ("[" "]")*
//! name  := ident ("." ident)*
//! generic := "<" ">" | "<" ","+ ">" | "<" type ("," type)* ">"
//! ```
//!
//! `Name<>` and `Name<,>` denote generic definitions. The keywords `string`,
//! `object`, `void` and the primitive aliases (`int`, `long`, ...) resolve to
//! builtins. Closed generics go through `make_generic_type`, so constraint
//! violations are reported at parse time.

use crate::db::TypeDatabase;
use crate::def::DefId;
use crate::error::{ReflectError, Result};
use crate::instantiate::make_generic_type;
use crate::types::{PrimitiveKind, TypeId};
use rfx_common::limits::{MAX_TYPE_NAME_LENGTH, MAX_TYPE_NAME_NESTING};

/// Parse a complete type expression.
pub fn parse_type(db: &dyn TypeDatabase, input: &str) -> Result<TypeId> {
    if input.len() > MAX_TYPE_NAME_LENGTH {
        return Err(ReflectError::InvalidArgument(format!(
            "type name longer than {MAX_TYPE_NAME_LENGTH} bytes"
        )));
    }
    let mut parser = TypeNameParser {
        db,
        src: input,
        pos: 0,
        depth: 0,
    };
    let ty = parser.parse_type()?;
    parser.skip_ws();
    if parser.pos != input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(ty)
}

fn alias(name: &str) -> Option<TypeId> {
    match name {
        "void" => Some(TypeId::VOID),
        "object" => Some(TypeId::OBJECT),
        "string" => Some(TypeId::STRING),
        _ => PrimitiveKind::ALL
            .into_iter()
            .find(|kind| kind.keyword() == name)
            .map(PrimitiveKind::type_id),
    }
}

enum GenericPart {
    None,
    Open(usize),
    Args(Vec<TypeId>),
}

struct TypeNameParser<'a> {
    db: &'a dyn TypeDatabase,
    src: &'a str,
    pos: usize,
    depth: u32,
}

impl<'a> TypeNameParser<'a> {
    fn error(&self, message: &str) -> ReflectError {
        ReflectError::InvalidArgument(format!(
            "{message} at offset {} in type name \"{}\"",
            self.pos, self.src
        ))
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn parse_name(&mut self) -> Result<&'a str> {
        self.skip_ws();
        let start = self.pos;
        let src = self.src;
        for (offset, c) in src[start..].char_indices() {
            if !(c.is_alphanumeric() || c == '_' || c == '.') {
                self.pos = start + offset;
                break;
            }
            self.pos = start + offset + c.len_utf8();
        }
        let name = &src[start..self.pos];
        if name.is_empty() || name.starts_with('.') || name.ends_with('.') {
            return Err(self.error("expected a type name"));
        }
        Ok(name)
    }

    fn parse_generic_part(&mut self) -> Result<GenericPart> {
        if !self.eat('<') {
            return Ok(GenericPart::None);
        }
        if self.eat('>') {
            return Ok(GenericPart::Open(1));
        }
        self.skip_ws();
        if self.peek() == Some(',') {
            let mut arity = 1;
            while self.eat(',') {
                arity += 1;
            }
            if !self.eat('>') {
                return Err(self.error("expected '>'"));
            }
            return Ok(GenericPart::Open(arity));
        }
        let mut args = vec![self.parse_type()?];
        while self.eat(',') {
            args.push(self.parse_type()?);
        }
        if !self.eat('>') {
            return Err(self.error("expected ',' or '>'"));
        }
        Ok(GenericPart::Args(args))
    }

    fn parse_type(&mut self) -> Result<TypeId> {
        self.depth += 1;
        if self.depth > MAX_TYPE_NAME_NESTING {
            return Err(self.error("type name nested too deeply"));
        }
        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeId> {
        let name = self.parse_name()?;
        let generic = self.parse_generic_part()?;
        let db = self.db;

        let mut ty = match generic {
            GenericPart::None => match alias(name) {
                Some(ty) => ty,
                None => db.nominal(self.resolve(name, 0)?),
            },
            GenericPart::Open(arity) => db.nominal(self.resolve(name, arity)?),
            GenericPart::Args(args) => {
                let def = self.resolve(name, args.len())?;
                make_generic_type(db, db.nominal(def), &args)?
            }
        };

        while self.eat('[') {
            if !self.eat(']') {
                return Err(self.error("expected ']'"));
            }
            ty = db.array(ty);
        }
        Ok(ty)
    }

    fn resolve(&self, name: &str, arity: usize) -> Result<DefId> {
        let db = self.db;
        db.names()
            .lookup(name)
            .and_then(|atom| db.definitions().find(atom, arity as u32))
            .ok_or_else(|| {
                ReflectError::InvalidArgument(format!(
                    "unknown type {name} with {arity} generic parameters"
                ))
            })
    }
}

#[cfg(test)]
#[path = "../tests/parse_tests.rs"]
mod tests;
