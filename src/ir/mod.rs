//! Program representation consumed by the exception analysis.
//!
//! The representation is arena-owned: types, functions and statements live in
//! flat vectors inside [`Program`] and are referred to by index handles. The
//! analysis layer never owns or mutates nodes; it only queries them through
//! this module (statement kind, callee resolution, the subtype relation).

pub mod json;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a node in the original source.
///
/// Opaque to the analysis: locations are attached to throw provenance and
/// rendered by the CLI, never interpreted by the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLoc {
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Handle of a type node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

/// Handle of a function node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(u32);

/// Handle of a statement node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(u32);

/// An exception type known to the program, with its direct base types
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Fully qualified name, e.g. `std::bad_alloc`
    pub name: String,
    /// Direct base types; the subtype relation is their transitive closure
    pub bases: Vec<TypeId>,
}

/// A function declaration. `body == None` models an external declaration
/// whose definition is not visible to the analysis.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub body: Option<StmtId>,
    pub loc: SourceLoc,
}

impl Function {
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// Resolution of a call expression's target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    /// Statically resolved to exactly one function
    Direct(FuncId),
    /// Indirect or virtual call that cannot be resolved to one definition
    Indirect,
}

/// One catch handler of a try statement, in source order.
/// `catch_type == None` is the catch-all handler.
#[derive(Debug, Clone)]
pub struct Handler {
    pub catch_type: Option<TypeId>,
    pub body: StmtId,
}

/// The finite statement union the analysis dispatches over.
///
/// Providers encode branches, loops and initializer lists as [`Block`]: the
/// analysis is flow-insensitive and only needs the child list. Constructs a
/// provider cannot describe are encoded as [`Opaque`].
///
/// [`Block`]: StmtKind::Block
/// [`Opaque`]: StmtKind::Opaque
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `throw expr` with a typed operand, or a bare re-throw when `exception`
    /// is `None`
    Throw { exception: Option<TypeId> },
    /// A call; argument expressions are ordinary child statements
    Call {
        target: CallTarget,
        args: Vec<StmtId>,
    },
    /// A try statement with its handlers in source order
    Try {
        body: StmtId,
        handlers: Vec<Handler>,
    },
    /// Any compound node: blocks, conditionals, loops, initializers
    Block { stmts: Vec<StmtId> },
    /// A statement with no throwing-relevant substructure
    Leaf,
    /// A construct the provider could not describe
    Opaque,
}

/// A statement node with its source location
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: SourceLoc,
}

/// An immutable program snapshot: the arena of all type, function and
/// statement nodes plus name-based lookup tables.
#[derive(Debug, Default)]
pub struct Program {
    types: Vec<TypeDef>,
    functions: Vec<Function>,
    stmts: Vec<Stmt>,
    type_index: HashMap<String, TypeId>,
    function_index: HashMap<String, FuncId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. Later registrations shadow earlier ones in the name
    /// index; the JSON loader rejects duplicates before getting here.
    pub fn add_type(&mut self, name: impl Into<String>, bases: Vec<TypeId>) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        let name = name.into();
        self.type_index.insert(name.clone(), id);
        self.types.push(TypeDef { name, bases });
        id
    }

    /// Replace the base list of a type; used by loaders that need a
    /// declare-then-link pass for forward references.
    pub fn set_bases(&mut self, ty: TypeId, bases: Vec<TypeId>) {
        self.types[ty.0 as usize].bases = bases;
    }

    /// Register a function declaration without a body
    pub fn add_function(&mut self, name: impl Into<String>, loc: SourceLoc) -> FuncId {
        let id = FuncId(self.functions.len() as u32);
        let name = name.into();
        self.function_index.insert(name.clone(), id);
        self.functions.push(Function {
            name,
            body: None,
            loc,
        });
        id
    }

    /// Attach a body statement to a previously declared function
    pub fn set_body(&mut self, func: FuncId, body: StmtId) {
        self.functions[func.0 as usize].body = Some(body);
    }

    /// Register a statement node
    pub fn add_stmt(&mut self, kind: StmtKind, loc: SourceLoc) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt { kind, loc });
        id
    }

    pub fn type_def(&self, ty: TypeId) -> &TypeDef {
        &self.types[ty.0 as usize]
    }

    pub fn type_name(&self, ty: TypeId) -> &str {
        &self.types[ty.0 as usize].name
    }

    pub fn function(&self, func: FuncId) -> &Function {
        &self.functions[func.0 as usize]
    }

    pub fn stmt(&self, stmt: StmtId) -> &Stmt {
        &self.stmts[stmt.0 as usize]
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.type_index.get(name).copied()
    }

    pub fn lookup_function(&self, name: &str) -> Option<FuncId> {
        self.function_index.get(name).copied()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Iterate all functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FuncId(i as u32), f))
    }

    /// Whether `candidate` is `ancestor` or inherits from it, directly or
    /// transitively. Walks the base lists breadth-first with a visited set,
    /// so malformed cyclic hierarchies terminate instead of looping.
    pub fn is_subtype_or_equal(&self, candidate: TypeId, ancestor: TypeId) -> bool {
        if candidate == ancestor {
            return true;
        }
        let mut visited: HashSet<TypeId> = HashSet::new();
        let mut worklist = vec![candidate];
        while let Some(current) = worklist.pop() {
            if !visited.insert(current) {
                continue;
            }
            for &base in &self.types[current.0 as usize].bases {
                if base == ancestor {
                    return true;
                }
                worklist.push(base);
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtype_is_reflexive() {
        let mut program = Program::new();
        let base = program.add_type("base", vec![]);
        assert!(program.is_subtype_or_equal(base, base));
    }

    #[test]
    fn subtype_walks_transitive_bases() {
        let mut program = Program::new();
        let root = program.add_type("root", vec![]);
        let mid = program.add_type("mid", vec![root]);
        let leaf = program.add_type("leaf", vec![mid]);
        assert!(program.is_subtype_or_equal(leaf, root));
        assert!(program.is_subtype_or_equal(leaf, mid));
        assert!(!program.is_subtype_or_equal(root, leaf));
    }

    #[test]
    fn subtype_covers_multiple_bases() {
        let mut program = Program::new();
        let a = program.add_type("a", vec![]);
        let b = program.add_type("b", vec![]);
        let joined = program.add_type("joined", vec![a, b]);
        assert!(program.is_subtype_or_equal(joined, a));
        assert!(program.is_subtype_or_equal(joined, b));
        assert!(!program.is_subtype_or_equal(a, b));
    }

    #[test]
    fn subtype_terminates_on_cyclic_hierarchy() {
        let mut program = Program::new();
        let a = program.add_type("a", vec![]);
        let b = program.add_type("b", vec![a]);
        program.set_bases(a, vec![b]);
        let other = program.add_type("other", vec![]);
        assert!(!program.is_subtype_or_equal(a, other));
        assert!(program.is_subtype_or_equal(a, b));
    }

    #[test]
    fn function_lookup_by_name() {
        let mut program = Program::new();
        let f = program.add_function("f", SourceLoc::new(1, 1));
        assert_eq!(program.lookup_function("f"), Some(f));
        assert!(!program.function(f).has_body());
        let body = program.add_stmt(StmtKind::Leaf, SourceLoc::new(1, 5));
        program.set_body(f, body);
        assert!(program.function(f).has_body());
    }
}
