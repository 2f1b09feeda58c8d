//! The exception-propagation engine.
//!
//! Analysis is a single-threaded recursive descent over the statement tree,
//! dispatching exhaustively on [`StmtKind`]. It is flow-insensitive: every
//! contained possibility is merged in, whether or not the branch holding it
//! is actually reachable. Callee bodies are entered through the call-trace
//! guard so cyclic call graphs terminate, and whole-function results are
//! memoized per analyzer instance.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use super::call_trace::CallTrace;
use super::exception_info::{ExceptionInfo, ThrowSite, Throwables};
use crate::ir::{CallTarget, FuncId, Program, SourceLoc, StmtId, StmtKind};

/// Analyzes whether a function or statement can in principle propagate an
/// exception, which exception types can escape, and whether that set is
/// complete.
///
/// One instance owns a function cache and a configuration; create one
/// instance per logical analysis run over an immutable program snapshot.
/// Instances are not safe for concurrent use from multiple threads.
pub struct ExceptionAnalyzer<'p> {
    program: &'p Program,
    ignore_alloc_failure: bool,
    ignored_exceptions: HashSet<String>,
    function_cache: HashMap<FuncId, ExceptionInfo>,
}

impl<'p> ExceptionAnalyzer<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            ignore_alloc_failure: true,
            ignored_exceptions: HashSet::new(),
            function_cache: HashMap::with_capacity(32),
        }
    }

    /// Whether allocation-failure exceptions are dropped from public results
    /// (on by default)
    pub fn ignore_alloc_failure(&mut self, ignore: bool) {
        self.ignore_alloc_failure = ignore;
    }

    /// Replace the set of qualified exception type names dropped from public
    /// results
    pub fn ignore_exceptions(&mut self, names: HashSet<String>) {
        self.ignored_exceptions = names;
    }

    /// Set both configuration knobs at once. Configuration may change
    /// between top-level calls; cached results are unaffected because
    /// filtering happens at the public boundary only.
    pub fn configure(&mut self, ignore_alloc_failure: bool, ignored_names: HashSet<String>) {
        self.ignore_alloc_failure = ignore_alloc_failure;
        self.ignored_exceptions = ignored_names;
    }

    /// Analyze a whole function.
    ///
    /// Returns the unknown value for a function without a visible body.
    /// Results are cached by function identity; the configured ignore
    /// filters are applied to a copy at this boundary only, so the cache
    /// stays valid when the configuration changes between calls.
    pub fn analyze_function(&mut self, func: FuncId) -> ExceptionInfo {
        let raw = match self.function_cache.get(&func) {
            Some(hit) => {
                trace!(
                    "cache hit for function {}",
                    self.program.function(func).name
                );
                hit.clone()
            }
            None => {
                let computed = self.compute_function(func);
                self.function_cache.insert(func, computed.clone());
                computed
            }
        };
        self.apply_configuration(raw)
    }

    /// Analyze a single statement.
    ///
    /// Not memoized: a statement's result depends on the caught context of
    /// its call site, which is not part of any cache key.
    pub fn analyze_stmt(&mut self, stmt: StmtId) -> ExceptionInfo {
        let mut stack = CallTrace::new();
        let raw = self.stmt_throws(stmt, &Throwables::new(), &mut stack);
        debug_assert!(stack.is_empty());
        self.apply_configuration(raw)
    }

    /// The raw cached result for a function, if one has been computed.
    /// Unfiltered by configuration; intended for diagnostic layers that need
    /// the complete picture.
    pub fn cached(&self, func: FuncId) -> Option<&ExceptionInfo> {
        self.function_cache.get(&func)
    }

    fn compute_function(&mut self, func: FuncId) -> ExceptionInfo {
        let program = self.program;
        let decl = program.function(func);
        let Some(body) = decl.body else {
            debug!("function {} has no visible body", decl.name);
            return ExceptionInfo::unknown();
        };
        let mut stack = CallTrace::new();
        stack.push(func, decl.loc);
        let info = self.stmt_throws(body, &Throwables::new(), &mut stack);
        debug!(
            "function {} analyzed as {}",
            decl.name,
            info.state()
        );
        info
    }

    /// Result contributed by a direct call to `callee`.
    ///
    /// A completed result is served from the cache. A callee already on the
    /// trace is a recursive edge and contributes the neutral element: the
    /// enclosing merge combines it with whatever the rest of the recursive
    /// body shows. Otherwise the callee body is entered with its frame
    /// pushed for the duration of the descent. Callees are analyzed with an
    /// empty caught context so the result is call-site independent; the
    /// caller subtracts its own caught set afterwards.
    fn call_throws(
        &mut self,
        callee: FuncId,
        call_site: SourceLoc,
        stack: &mut CallTrace,
    ) -> ExceptionInfo {
        if let Some(hit) = self.function_cache.get(&callee) {
            return hit.clone();
        }
        if stack.contains(callee) {
            trace!(
                "recursive call into {} contributes the neutral element",
                self.program.function(callee).name
            );
            return ExceptionInfo::new();
        }
        let program = self.program;
        let decl = program.function(callee);
        let Some(body) = decl.body else {
            return ExceptionInfo::unknown();
        };
        stack.push(callee, call_site);
        let info = self.stmt_throws(body, &Throwables::new(), stack);
        stack.pop();
        info
    }

    fn stmt_throws(
        &mut self,
        stmt: StmtId,
        caught: &Throwables,
        stack: &mut CallTrace,
    ) -> ExceptionInfo {
        let program = self.program;
        let node = program.stmt(stmt);
        let mut results = ExceptionInfo::new();
        match &node.kind {
            StmtKind::Throw {
                exception: Some(exception),
            } => {
                results.register_exception(
                    *exception,
                    ThrowSite {
                        loc: node.loc,
                        trace: stack.clone(),
                    },
                );
            }
            StmtKind::Throw { exception: None } => {
                // A bare re-throw raises exactly what the nearest enclosing
                // handler caught. With nothing being handled it raises
                // nothing.
                results.register_exceptions(caught);
            }
            StmtKind::Call { target, args } => {
                match *target {
                    CallTarget::Direct(callee) => {
                        let mut contribution = self.call_throws(callee, node.loc, stack);
                        contribution.subtract(caught);
                        results.merge(&contribution);
                    }
                    CallTarget::Indirect => {
                        results.merge(&ExceptionInfo::unknown());
                    }
                }
                for &arg in args {
                    let contribution = self.stmt_throws(arg, caught, stack);
                    results.merge(&contribution);
                }
            }
            StmtKind::Try { body, handlers } => {
                let mut uncaught = self.stmt_throws(*body, caught, stack);
                for handler in handlers {
                    match handler.catch_type {
                        None => {
                            // Catch-all: discharges everything that is left,
                            // including the unknown part. Handlers after it
                            // are unreachable.
                            let handled = uncaught.exceptions().clone();
                            let rethrown = self.stmt_throws(handler.body, &handled, stack);
                            results.merge(&rethrown);
                            uncaught.clear();
                            break;
                        }
                        Some(handler_type) => {
                            let handled = uncaught.filter_by_catch(handler_type, program);
                            let rethrown = self.stmt_throws(handler.body, &handled, stack);
                            results.merge(&rethrown);
                        }
                    }
                }
                results.merge(&uncaught);
            }
            StmtKind::Block { stmts } => {
                for &child in stmts {
                    let contribution = self.stmt_throws(child, caught, stack);
                    results.merge(&contribution);
                }
            }
            StmtKind::Leaf => {}
            StmtKind::Opaque => {
                results.merge(&ExceptionInfo::unknown());
            }
        }
        results
    }

    /// Boundary filtering for public results. The cache keeps raw values.
    fn apply_configuration(&self, mut info: ExceptionInfo) -> ExceptionInfo {
        info.filter_ignored(
            &self.ignored_exceptions,
            self.ignore_alloc_failure,
            self.program,
        );
        info
    }
}
