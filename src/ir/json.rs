//! JSON snapshot loader.
//!
//! A snapshot is the serialized form a host frontend hands to this tool: a
//! flat list of exception types with their bases and a list of functions with
//! nested statement trees. Names are resolved to arena handles here; the
//! analysis itself never sees strings.
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "std::exception" },
//!     { "name": "std::runtime_error", "bases": ["std::exception"] }
//!   ],
//!   "functions": [
//!     { "name": "boom", "loc": { "line": 3, "column": 1 },
//!       "body": { "kind": "throw", "exception": "std::runtime_error",
//!                 "loc": { "line": 4, "column": 5 } } },
//!     { "name": "ext::opaque" }
//!   ]
//! }
//! ```

use std::path::Path;

use log::debug;
use serde::Deserialize;

use super::{CallTarget, Handler, Program, SourceLoc, StmtId, StmtKind, TypeId};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct ProgramDoc {
    #[serde(default)]
    types: Vec<TypeDoc>,
    #[serde(default)]
    functions: Vec<FunctionDoc>,
}

#[derive(Debug, Deserialize)]
struct TypeDoc {
    name: String,
    #[serde(default)]
    bases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FunctionDoc {
    name: String,
    #[serde(default)]
    loc: LocDoc,
    #[serde(default)]
    body: Option<StmtDoc>,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
struct LocDoc {
    #[serde(default)]
    line: u32,
    #[serde(default)]
    column: u32,
}

impl From<LocDoc> for SourceLoc {
    fn from(loc: LocDoc) -> Self {
        SourceLoc::new(loc.line, loc.column)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum StmtDoc {
    /// `exception` omitted or null is a bare re-throw
    Throw {
        #[serde(default)]
        exception: Option<String>,
        #[serde(default)]
        loc: LocDoc,
    },
    /// `callee` omitted or null is an unresolvable indirect call
    Call {
        #[serde(default)]
        callee: Option<String>,
        #[serde(default)]
        args: Vec<StmtDoc>,
        #[serde(default)]
        loc: LocDoc,
    },
    Try {
        body: Box<StmtDoc>,
        #[serde(default)]
        handlers: Vec<HandlerDoc>,
        #[serde(default)]
        loc: LocDoc,
    },
    Block {
        #[serde(default)]
        stmts: Vec<StmtDoc>,
        #[serde(default)]
        loc: LocDoc,
    },
    Leaf {
        #[serde(default)]
        loc: LocDoc,
    },
    Opaque {
        #[serde(default)]
        loc: LocDoc,
    },
}

#[derive(Debug, Deserialize)]
struct HandlerDoc {
    /// Caught type name; omitted or null is the catch-all handler
    #[serde(default)]
    catch: Option<String>,
    body: StmtDoc,
}

/// Load a program snapshot from a JSON file
pub fn load_file(path: &Path) -> Result<Program> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    load_str(&data)
}

/// Load a program snapshot from a JSON string
pub fn load_str(data: &str) -> Result<Program> {
    let doc: ProgramDoc = serde_json::from_str(data).map_err(|e| Error::Json {
        message: e.to_string(),
    })?;
    build(doc)
}

fn build(doc: ProgramDoc) -> Result<Program> {
    let mut program = Program::new();

    // Declare all types first so base lists may reference forward.
    let mut type_ids = Vec::with_capacity(doc.types.len());
    for ty in &doc.types {
        if program.lookup_type(&ty.name).is_some() {
            return Err(Error::DuplicateType {
                name: ty.name.clone(),
            });
        }
        type_ids.push(program.add_type(&ty.name, vec![]));
    }
    for (ty, &id) in doc.types.iter().zip(&type_ids) {
        let bases = ty
            .bases
            .iter()
            .map(|base| resolve_type(&program, base))
            .collect::<Result<Vec<_>>>()?;
        program.set_bases(id, bases);
    }

    // Same two-pass scheme for functions: call statements may reference
    // functions declared later in the snapshot.
    let mut func_ids = Vec::with_capacity(doc.functions.len());
    for func in &doc.functions {
        if program.lookup_function(&func.name).is_some() {
            return Err(Error::DuplicateFunction {
                name: func.name.clone(),
            });
        }
        func_ids.push(program.add_function(&func.name, func.loc.into()));
    }
    for (func, &id) in doc.functions.iter().zip(&func_ids) {
        if let Some(body) = &func.body {
            let stmt = lower_stmt(&mut program, body)?;
            program.set_body(id, stmt);
        }
    }

    debug!(
        "loaded snapshot: {} types, {} functions",
        doc.types.len(),
        doc.functions.len()
    );
    Ok(program)
}

fn resolve_type(program: &Program, name: &str) -> Result<TypeId> {
    program
        .lookup_type(name)
        .ok_or_else(|| Error::UnknownType {
            name: name.to_string(),
        })
}

fn lower_stmt(program: &mut Program, doc: &StmtDoc) -> Result<StmtId> {
    let stmt = match doc {
        StmtDoc::Throw { exception, loc } => {
            let exception = exception
                .as_deref()
                .map(|name| resolve_type(program, name))
                .transpose()?;
            program.add_stmt(StmtKind::Throw { exception }, (*loc).into())
        }
        StmtDoc::Call { callee, args, loc } => {
            let target = match callee.as_deref() {
                Some(name) => {
                    CallTarget::Direct(program.lookup_function(name).ok_or_else(|| {
                        Error::UnknownFunction {
                            name: name.to_string(),
                        }
                    })?)
                }
                None => CallTarget::Indirect,
            };
            let args = args
                .iter()
                .map(|arg| lower_stmt(program, arg))
                .collect::<Result<Vec<_>>>()?;
            program.add_stmt(StmtKind::Call { target, args }, (*loc).into())
        }
        StmtDoc::Try {
            body,
            handlers,
            loc,
        } => {
            let body = lower_stmt(program, body)?;
            let handlers = handlers
                .iter()
                .map(|handler| {
                    let catch_type = handler
                        .catch
                        .as_deref()
                        .map(|name| resolve_type(program, name))
                        .transpose()?;
                    let body = lower_stmt(program, &handler.body)?;
                    Ok(Handler { catch_type, body })
                })
                .collect::<Result<Vec<_>>>()?;
            program.add_stmt(StmtKind::Try { body, handlers }, (*loc).into())
        }
        StmtDoc::Block { stmts, loc } => {
            let stmts = stmts
                .iter()
                .map(|child| lower_stmt(program, child))
                .collect::<Result<Vec<_>>>()?;
            program.add_stmt(StmtKind::Block { stmts }, (*loc).into())
        }
        StmtDoc::Leaf { loc } => program.add_stmt(StmtKind::Leaf, (*loc).into()),
        StmtDoc::Opaque { loc } => program.add_stmt(StmtKind::Opaque, (*loc).into()),
    };
    Ok(stmt)
}
