//! Exception-propagation analysis.
//!
//! The core decides, for a function or a single statement, whether control
//! can leave the construct by propagating an exception, which exception
//! types can be observed escaping, and whether that determination is
//! complete or only a lower bound. The analysis never fails: unresolved
//! calls and invisible function bodies are absorbed into the result as the
//! unknown state.

pub mod analyzer;
pub mod call_graph;
pub mod call_trace;
pub mod exception_info;

pub use analyzer::ExceptionAnalyzer;
pub use call_trace::{CallFrame, CallTrace};
pub use exception_info::{ExceptionInfo, ThrowSite, ThrowState, Throwables, ALLOC_FAILURE_TYPES};
