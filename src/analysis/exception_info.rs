//! The exception-information lattice.
//!
//! Every analysis step produces an [`ExceptionInfo`] and results are combined
//! with [`ExceptionInfo::merge`], a commutative, associative join whose
//! identity element is the not-throwing value. Uncertainty is part of the
//! value: a `Throwing` result whose `contains_unknown` flag is set lists a
//! lower bound of the escaping types, not a complete set.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::Serialize;

use super::call_trace::CallTrace;
use crate::ir::{Program, SourceLoc, TypeId};

/// Qualified names of the exception types that model allocation failure.
/// These are filtered out by default, configurable per analyzer instance.
pub static ALLOC_FAILURE_TYPES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["std::bad_alloc", "std::bad_array_new_length"].into());

/// Three-valued throw behaviour of an analyzed entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThrowState {
    /// The entity can throw on some path
    Throwing,
    /// The entity is proven not to throw
    NotThrowing,
    /// No determination possible, e.g. an external function without a
    /// visible definition
    Unknown,
}

impl std::fmt::Display for ThrowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ThrowState::Throwing => "throwing",
            ThrowState::NotThrowing => "not-throwing",
            ThrowState::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// Where an exception type is thrown and the call chain that makes it reach
/// the analyzed entity (outermost frame is the analyzed function).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowSite {
    pub loc: SourceLoc,
    pub trace: CallTrace,
}

/// Escaping exception types, one record per distinct type.
/// The first registration of a type wins; the earliest observed provenance
/// is the one kept.
pub type Throwables = HashMap<TypeId, ThrowSite>;

/// Gathered exception behaviour of one entity (a statement or a function).
///
/// Invariants: `thrown` is non-empty only in the `Throwing` state, and the
/// state is always re-derivable from `(thrown, contains_unknown)`: empty and
/// certain is `NotThrowing`, empty and uncertain is `Unknown`, non-empty is
/// `Throwing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    state: ThrowState,
    contains_unknown: bool,
    thrown: Throwables,
}

impl Default for ExceptionInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionInfo {
    /// The neutral element: proven not to throw, nothing observed
    pub fn new() -> Self {
        Self {
            state: ThrowState::NotThrowing,
            contains_unknown: false,
            thrown: Throwables::new(),
        }
    }

    /// The fully uncertain value
    pub fn unknown() -> Self {
        Self {
            state: ThrowState::Unknown,
            contains_unknown: true,
            thrown: Throwables::new(),
        }
    }

    pub fn state(&self) -> ThrowState {
        self.state
    }

    /// The known escaping exception types. A complete set only when
    /// [`contains_unknown_elements`](Self::contains_unknown_elements) is false.
    pub fn exceptions(&self) -> &Throwables {
        &self.thrown
    }

    /// Whether anything in the merged scope was `Unknown`. When true, the
    /// recorded types are a lower bound of what can actually escape.
    pub fn contains_unknown_elements(&self) -> bool {
        self.contains_unknown
    }

    /// Record one exception type as able to escape
    pub fn register_exception(&mut self, exception: TypeId, site: ThrowSite) {
        self.thrown.entry(exception).or_insert(site);
        self.state = ThrowState::Throwing;
    }

    /// Record a batch of exception types as able to escape
    pub fn register_exceptions(&mut self, batch: &Throwables) {
        if batch.is_empty() {
            return;
        }
        for (&exception, site) in batch {
            self.thrown.entry(exception).or_insert_with(|| site.clone());
        }
        self.state = ThrowState::Throwing;
    }

    /// Join with the result of a sibling part of the same entity.
    ///
    /// Once any merged part throws the whole entity throws; once any part is
    /// unknown, completeness of the recorded type set is lost, even though
    /// the recorded types stay valid as a lower bound.
    pub fn merge(&mut self, other: &ExceptionInfo) -> &mut Self {
        self.contains_unknown |= other.contains_unknown;
        match other.state {
            ThrowState::Throwing => self.state = ThrowState::Throwing,
            ThrowState::Unknown => {
                if self.state == ThrowState::NotThrowing {
                    self.state = ThrowState::Unknown;
                }
            }
            ThrowState::NotThrowing => {}
        }
        for (&exception, site) in &other.thrown {
            self.thrown.entry(exception).or_insert_with(|| site.clone());
        }
        self
    }

    /// Remove and return every recorded type the given handler type catches,
    /// i.e. the type itself and all its subtypes. The state is re-derived
    /// afterwards. A catch-all handler is not expressed through this
    /// operation; the engine models it with [`clear`](Self::clear) because it
    /// also discharges the unknown part.
    pub fn filter_by_catch(&mut self, handler_type: TypeId, program: &Program) -> Throwables {
        let caught: Vec<TypeId> = self
            .thrown
            .keys()
            .copied()
            .filter(|&thrown| program.is_subtype_or_equal(thrown, handler_type))
            .collect();
        let mut removed = Throwables::new();
        for exception in caught {
            if let Some(site) = self.thrown.remove(&exception) {
                removed.insert(exception, site);
            }
        }
        self.reevaluate_state();
        removed
    }

    /// Drop recorded types whose qualified name is configured as ignored,
    /// plus the allocation-failure types when that flag is set
    pub fn filter_ignored(
        &mut self,
        ignored: &HashSet<String>,
        ignore_alloc_failure: bool,
        program: &Program,
    ) -> &mut Self {
        self.thrown.retain(|&exception, _| {
            let name = program.type_name(exception);
            if ignored.contains(name) {
                return false;
            }
            !(ignore_alloc_failure && ALLOC_FAILURE_TYPES.contains(name))
        });
        self.reevaluate_state();
        self
    }

    /// Reset to the neutral element
    pub fn clear(&mut self) {
        *self = ExceptionInfo::new();
    }

    /// Remove recorded types by exact identity. Used for the call-site
    /// contribution of a callee inside a handled region: types the enclosing
    /// handlers already discharge are not re-reported.
    pub(crate) fn subtract(&mut self, handled: &Throwables) {
        if handled.is_empty() || self.thrown.is_empty() {
            return;
        }
        self.thrown
            .retain(|exception, _| !handled.contains_key(exception));
        self.reevaluate_state();
    }

    fn reevaluate_state(&mut self) {
        self.state = if !self.thrown.is_empty() {
            ThrowState::Throwing
        } else if self.contains_unknown {
            ThrowState::Unknown
        } else {
            ThrowState::NotThrowing
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Program;

    fn site() -> ThrowSite {
        ThrowSite {
            loc: SourceLoc::new(1, 1),
            trace: CallTrace::new(),
        }
    }

    #[test]
    fn subtract_removes_exact_types_and_rederives_state() {
        let mut program = Program::new();
        let a = program.add_type("a", vec![]);
        let b = program.add_type("b", vec![]);

        let mut info = ExceptionInfo::new();
        info.register_exception(a, site());
        info.register_exception(b, site());

        let mut handled = Throwables::new();
        handled.insert(a, site());
        info.subtract(&handled);
        assert_eq!(info.state(), ThrowState::Throwing);
        assert!(info.exceptions().contains_key(&b));
        assert!(!info.exceptions().contains_key(&a));

        handled.insert(b, site());
        info.subtract(&handled);
        assert_eq!(info.state(), ThrowState::NotThrowing);
    }

    #[test]
    fn subtract_keeps_unknown_state_when_emptied() {
        let mut program = Program::new();
        let a = program.add_type("a", vec![]);

        let mut info = ExceptionInfo::new();
        info.register_exception(a, site());
        info.merge(&ExceptionInfo::unknown());

        let mut handled = Throwables::new();
        handled.insert(a, site());
        info.subtract(&handled);
        assert_eq!(info.state(), ThrowState::Unknown);
        assert!(info.contains_unknown_elements());
    }
}
