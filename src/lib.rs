//! throw-trace-rs: exception-propagation analysis for parsed program snapshots.
//!
//! Given a function or a single statement from a program snapshot, the
//! analyzer decides whether control can leave that construct by propagating
//! an exception, which exception types can escape, and whether that
//! determination is complete or only a lower bound. Lint and diagnostic
//! layers consume the result, e.g. to flag functions declared not-to-throw
//! that actually can.

pub mod analysis;
pub mod cli;
pub mod error;
pub mod ir;

pub use analysis::{
    CallFrame, CallTrace, ExceptionAnalyzer, ExceptionInfo, ThrowSite, ThrowState, Throwables,
};
pub use error::{Error as ThrowTraceError, Result as ThrowTraceResult};

// Re-export commonly used program-representation types
pub use ir::{CallTarget, FuncId, Function, Program, SourceLoc, StmtId, StmtKind, TypeId};
