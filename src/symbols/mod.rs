//! Scope-aware symbol table for one compilation unit.
//!
//! Two nested scopes: the class scope (statics and fields) lives for the
//! whole unit, the subroutine scope (parameters and locals) is cleared on
//! every subroutine boundary. Each identifier gets a running slot index
//! per kind, restarting whenever its scope reopens.

use std::collections::HashMap;

use crate::error::SymbolError;

/// The kind of a declared identifier, which determines the VM segment its
/// slot index addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    Static,
    Field,
    Parameter,
    Local,
}

/// The kind of the subroutine currently being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Method,
    Function,
    Constructor,
}

#[derive(Debug, Clone)]
struct VarEntry {
    ty: String,
    index: u16,
}

/// Per-unit identifier scopes and the identity of the active subroutine.
pub struct SymbolTable {
    class_name: String,
    subroutine_name: Option<String>,
    subroutine_kind: Option<SubroutineKind>,
    return_type: Option<String>,
    statics: HashMap<String, VarEntry>,
    fields: HashMap<String, VarEntry>,
    parameters: HashMap<String, VarEntry>,
    locals: HashMap<String, VarEntry>,
    statics_next: u16,
    fields_next: u16,
    // Starts at 1 in method scope; slot 0 is the implicit receiver.
    parameters_next: u16,
    locals_next: u16,
}

impl SymbolTable {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            subroutine_name: None,
            subroutine_kind: None,
            return_type: None,
            statics: HashMap::new(),
            fields: HashMap::new(),
            parameters: HashMap::new(),
            locals: HashMap::new(),
            statics_next: 0,
            fields_next: 0,
            parameters_next: 1,
            locals_next: 0,
        }
    }

    /// Open a method scope. Parameter numbering starts at 1.
    pub fn start_method(&mut self, name: Option<String>, return_type: String) {
        self.start_subroutine(name, SubroutineKind::Method, return_type, 1);
    }

    /// Open a function scope. Parameter numbering starts at 0.
    pub fn start_function(&mut self, name: Option<String>, return_type: String) {
        self.start_subroutine(name, SubroutineKind::Function, return_type, 0);
    }

    /// Open a constructor scope. The return type is the class itself.
    pub fn start_constructor(&mut self, name: Option<String>) {
        let return_type = self.class_name.clone();
        self.start_subroutine(name, SubroutineKind::Constructor, return_type, 0);
    }

    /// Close the subroutine scope, clearing parameters, locals and the
    /// subroutine identity.
    pub fn end_subroutine(&mut self) {
        self.parameters.clear();
        self.locals.clear();
        self.parameters_next = 1;
        self.locals_next = 0;
        self.subroutine_name = None;
        self.subroutine_kind = None;
        self.return_type = None;
    }

    fn start_subroutine(
        &mut self,
        name: Option<String>,
        kind: SubroutineKind,
        return_type: String,
        parameters_start: u16,
    ) {
        self.end_subroutine();
        self.subroutine_name = name;
        self.subroutine_kind = Some(kind);
        self.return_type = Some(return_type);
        self.parameters_next = parameters_start;
    }

    /// Declare an identifier in the scope bucket for `kind`, assigning it
    /// the next slot index of that kind. A duplicate name within one
    /// bucket is rejected and the first entry kept.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        ty: impl Into<String>,
        kind: IdentKind,
    ) -> Result<(), SymbolError> {
        let name = name.into();
        let (bucket, next) = match kind {
            IdentKind::Static => (&mut self.statics, &mut self.statics_next),
            IdentKind::Field => (&mut self.fields, &mut self.fields_next),
            IdentKind::Parameter => (&mut self.parameters, &mut self.parameters_next),
            IdentKind::Local => (&mut self.locals, &mut self.locals_next),
        };
        if bucket.contains_key(&name) {
            return Err(SymbolError::Redefined(name));
        }
        bucket.insert(
            name,
            VarEntry {
                ty: ty.into(),
                index: *next,
            },
        );
        *next += 1;
        Ok(())
    }

    /// Resolve the kind of `name`. Precedence: parameters, locals, fields,
    /// statics. Fields are instance state and do not resolve while the
    /// active subroutine is a function.
    pub fn kind_of(&self, name: &str) -> Result<IdentKind, SymbolError> {
        if self.parameters.contains_key(name) {
            Ok(IdentKind::Parameter)
        } else if self.locals.contains_key(name) {
            Ok(IdentKind::Local)
        } else if self.subroutine_kind != Some(SubroutineKind::Function)
            && self.fields.contains_key(name)
        {
            Ok(IdentKind::Field)
        } else if self.statics.contains_key(name) {
            Ok(IdentKind::Static)
        } else {
            Err(SymbolError::Undefined(name.to_string()))
        }
    }

    pub fn type_of(&self, name: &str) -> Result<&str, SymbolError> {
        Ok(&self.resolve(name)?.ty)
    }

    pub fn index_of(&self, name: &str) -> Result<u16, SymbolError> {
        Ok(self.resolve(name)?.index)
    }

    /// Number of identifiers of `kind` defined so far in its scope. The
    /// parameter count excludes the reserved receiver slot.
    pub fn count(&self, kind: IdentKind) -> u16 {
        match kind {
            IdentKind::Static => self.statics_next,
            IdentKind::Field => self.fields_next,
            IdentKind::Parameter => self.parameters.len() as u16,
            IdentKind::Local => self.locals_next,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn subroutine_name(&self) -> Option<&str> {
        self.subroutine_name.as_deref()
    }

    pub fn subroutine_kind(&self) -> Option<SubroutineKind> {
        self.subroutine_kind
    }

    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    fn resolve(&self, name: &str) -> Result<&VarEntry, SymbolError> {
        let bucket = match self.kind_of(name)? {
            IdentKind::Parameter => &self.parameters,
            IdentKind::Local => &self.locals,
            IdentKind::Field => &self.fields,
            IdentKind::Static => &self.statics,
        };
        bucket
            .get(name)
            .ok_or_else(|| SymbolError::Undefined(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_numbering_per_kind() {
        let mut table = SymbolTable::new("Point");
        table.define("x", "int", IdentKind::Field).unwrap();
        table.define("y", "int", IdentKind::Field).unwrap();
        table.define("count", "int", IdentKind::Static).unwrap();
        assert_eq!(table.index_of("x").unwrap(), 0);
        assert_eq!(table.index_of("y").unwrap(), 1);
        assert_eq!(table.index_of("count").unwrap(), 0);
        assert_eq!(table.count(IdentKind::Field), 2);
        assert_eq!(table.count(IdentKind::Static), 1);
    }

    #[test]
    fn test_method_parameters_start_at_one() {
        let mut table = SymbolTable::new("Point");
        table.start_method(Some("dist".to_string()), "int".to_string());
        table.define("other", "Point", IdentKind::Parameter).unwrap();
        assert_eq!(table.index_of("other").unwrap(), 1);
        // The reserved receiver slot is not counted.
        assert_eq!(table.count(IdentKind::Parameter), 1);
    }

    #[test]
    fn test_function_parameters_start_at_zero() {
        let mut table = SymbolTable::new("Math");
        table.start_function(Some("min".to_string()), "int".to_string());
        table.define("a", "int", IdentKind::Parameter).unwrap();
        table.define("b", "int", IdentKind::Parameter).unwrap();
        assert_eq!(table.index_of("a").unwrap(), 0);
        assert_eq!(table.index_of("b").unwrap(), 1);
        assert_eq!(table.count(IdentKind::Parameter), 2);
    }

    #[test]
    fn test_fields_do_not_resolve_in_functions() {
        let mut table = SymbolTable::new("Point");
        table.define("x", "int", IdentKind::Field).unwrap();
        table.start_function(Some("origin".to_string()), "Point".to_string());
        assert_eq!(
            table.kind_of("x"),
            Err(SymbolError::Undefined("x".to_string()))
        );
        table.end_subroutine();
        table.start_method(Some("getX".to_string()), "int".to_string());
        assert_eq!(table.kind_of("x"), Ok(IdentKind::Field));
    }

    #[test]
    fn test_subroutine_scope_is_cleared() {
        let mut table = SymbolTable::new("Point");
        table.start_method(Some("a".to_string()), "void".to_string());
        table.define("tmp", "int", IdentKind::Local).unwrap();
        table.end_subroutine();
        assert!(table.kind_of("tmp").is_err());
        assert_eq!(table.count(IdentKind::Local), 0);
        assert_eq!(table.subroutine_name(), None);
        assert_eq!(table.subroutine_kind(), None);

        // Numbering restarts in the next scope.
        table.start_function(Some("b".to_string()), "void".to_string());
        table.define("first", "int", IdentKind::Local).unwrap();
        assert_eq!(table.index_of("first").unwrap(), 0);
    }

    #[test]
    fn test_duplicate_definition_is_rejected() {
        let mut table = SymbolTable::new("Point");
        table.define("x", "int", IdentKind::Field).unwrap();
        assert_eq!(
            table.define("x", "boolean", IdentKind::Field),
            Err(SymbolError::Redefined("x".to_string()))
        );
        // The first entry survives.
        assert_eq!(table.type_of("x").unwrap(), "int");
        assert_eq!(table.count(IdentKind::Field), 1);
    }

    #[test]
    fn test_shadowing_across_scopes() {
        let mut table = SymbolTable::new("Point");
        table.define("x", "int", IdentKind::Field).unwrap();
        table.start_method(Some("m".to_string()), "void".to_string());
        table.define("x", "boolean", IdentKind::Local).unwrap();
        assert_eq!(table.kind_of("x"), Ok(IdentKind::Local));
        table.end_subroutine();
        assert_eq!(table.kind_of("x"), Ok(IdentKind::Field));
    }

    #[test]
    fn test_constructor_returns_class_type() {
        let mut table = SymbolTable::new("Point");
        table.start_constructor(Some("new".to_string()));
        assert_eq!(table.return_type(), Some("Point"));
        assert_eq!(table.subroutine_kind(), Some(SubroutineKind::Constructor));
    }
}
