//! Crate-wide error types.
//!
//! Two distinct error surfaces exist, matching the propagation policy in
//! the control-plane design: [`ModifyFlowError`] is returned to a caller of
//! [`crate::control::ControlPlane::modify_flow`] so it can build an
//! `ofp_error_msg`; nothing in the packet path ever returns an error (a
//! malformed construct is a no-op or a `drop`, never a `Result::Err`).

use crate::table::TableId;
use thiserror::Error;

/// Error returned by a rejected flow-mod.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyFlowError {
    /// `add` was refused because `check_overlap` was set and an existing
    /// entry collides on the overlap predicate (priority equality, see
    /// DESIGN.md Open Question 1).
    #[error("overlapping flow entry at priority {priority}")]
    Overlap {
        /// The priority shared by the new entry and the entry it collided with.
        priority: u16,
    },
    /// The flow-mod, or a `goto-table` instruction reached during dispatch,
    /// referenced a table id outside `0..max_tables`.
    #[error("table {0:?} does not exist")]
    BadTableId(TableId),
    /// An instruction referenced a structurally invalid construct.
    #[error("instruction references an unsupported construct")]
    BadInstruction,
    /// An action referenced a structurally invalid construct.
    #[error("action references an unsupported construct")]
    BadAction,
    /// A match entry referenced an unknown OXM class/field.
    #[error("match references an unknown OXM class/field")]
    BadMatch,
}

/// Result alias for control-plane operations.
pub type ModifyFlowResult<T = ()> = Result<T, ModifyFlowError>;
