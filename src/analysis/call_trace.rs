//! Call-stack record for in-progress function analyses.
//!
//! The trace serves two purposes: it is the provenance attached to every
//! throw record (which call chain made the exception reach the analyzed
//! entity) and it is the termination guard for cyclic call graphs (a callee
//! already on the trace is not descended into again).

use crate::ir::{FuncId, SourceLoc};

/// One in-progress analysis: a function and the call site that entered it.
/// For the outermost frame the call site is the function's own location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    pub function: FuncId,
    pub call_site: SourceLoc,
}

/// Order-preserving stack of [`CallFrame`]s, outermost first.
///
/// Frames are pushed immediately before descending into a callee body and
/// popped on the way back out; the trace always mirrors exactly the active
/// recursion chain. Membership is a linear scan, which is fine at
/// call-chain depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallTrace {
    frames: Vec<CallFrame>,
}

impl CallTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, function: FuncId, call_site: SourceLoc) {
        self.frames.push(CallFrame {
            function,
            call_site,
        });
    }

    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    /// Whether an analysis of `function` is already in progress
    pub fn contains(&self, function: FuncId) -> bool {
        self.frames.iter().any(|frame| frame.function == function)
    }

    /// The active frames, outermost first
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Program, SourceLoc};

    #[test]
    fn trace_preserves_push_order() {
        let mut program = Program::new();
        let f = program.add_function("f", SourceLoc::new(1, 1));
        let g = program.add_function("g", SourceLoc::new(5, 1));

        let mut trace = CallTrace::new();
        trace.push(f, SourceLoc::new(1, 1));
        trace.push(g, SourceLoc::new(2, 3));

        let functions: Vec<_> = trace.frames().iter().map(|fr| fr.function).collect();
        assert_eq!(functions, vec![f, g]);
    }

    #[test]
    fn membership_tracks_push_and_pop() {
        let mut program = Program::new();
        let f = program.add_function("f", SourceLoc::new(1, 1));
        let g = program.add_function("g", SourceLoc::new(5, 1));

        let mut trace = CallTrace::new();
        trace.push(f, SourceLoc::new(1, 1));
        assert!(trace.contains(f));
        assert!(!trace.contains(g));

        trace.push(g, SourceLoc::new(2, 3));
        assert!(trace.contains(g));

        let popped = trace.pop().unwrap();
        assert_eq!(popped.function, g);
        assert!(!trace.contains(g));
        assert!(trace.contains(f));
    }
}
