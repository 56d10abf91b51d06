//! Type formatting for errors, logs and the CLI.

use crate::db::TypeDatabase;
use crate::def::DefId;
use crate::graph::param_info;
use crate::types::{TypeData, TypeId};

/// Renders `TypeId`s as `Dictionary<String, Int32>`-style names.
pub struct TypeFormatter<'a> {
    db: &'a dyn TypeDatabase,
    qualified: bool,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self {
            db,
            qualified: false,
        }
    }

    /// Prefix definitions with their namespace.
    pub fn qualified(mut self) -> Self {
        self.qualified = true;
        self
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write(&mut out, ty);
        out
    }

    /// Comma-separated list.
    pub fn format_list(&self, types: &[TypeId]) -> String {
        let mut out = String::new();
        self.write_list(&mut out, types);
        out
    }

    fn write_list(&self, out: &mut String, types: &[TypeId]) {
        for (i, &ty) in types.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write(out, ty);
        }
    }

    fn write_def_name(&self, out: &mut String, def: DefId) {
        let defs = self.db.definitions();
        if self.qualified {
            if let Some(ns) = defs.get_namespace(def).filter(|ns| !ns.is_none()) {
                out.push_str(&self.db.resolve_atom(ns));
                out.push('.');
            }
        }
        match defs.get_name(def) {
            Some(name) => out.push_str(&self.db.resolve_atom(name)),
            None => out.push_str(&format!("<def #{}>", def.0)),
        }
    }

    fn write(&self, out: &mut String, ty: TypeId) {
        match self.db.lookup(ty) {
            Some(TypeData::Void) => out.push_str("Void"),
            Some(TypeData::Nominal(def)) => {
                self.write_def_name(out, def);
                let params = self.db.definitions().get_type_params(def).unwrap_or_default();
                if !params.is_empty() {
                    out.push('<');
                    for (i, param) in params.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&self.db.resolve_atom(param.name));
                    }
                    out.push('>');
                }
            }
            Some(TypeData::Application { def, args }) => {
                self.write_def_name(out, def);
                out.push('<');
                self.write_list(out, &args);
                out.push('>');
            }
            Some(TypeData::Param(param)) => match param_info(self.db, param) {
                Some(info) => out.push_str(&self.db.resolve_atom(info.name)),
                None => out.push_str(&format!("<param #{}>", param.index)),
            },
            Some(TypeData::Array(element)) => {
                self.write(out, element);
                out.push_str("[]");
            }
            None => out.push_str(&format!("<type #{}>", ty.0)),
        }
    }
}

/// Shorthand for `TypeFormatter::new(db).format(ty)`.
pub fn format_type(db: &dyn TypeDatabase, ty: TypeId) -> String {
    TypeFormatter::new(db).format(ty)
}
