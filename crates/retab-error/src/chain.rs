//! Chain inspection.
//!
//! A chain is any error followed through `std::error::Error::source`, so
//! everything here works on foreign errors as well as on [`Error`] records.
//! Queries never fail: a kind that is not present is reported as `None`.

use std::error::Error as StdError;

use crate::error::{Error, RecoveryState};
use crate::ErrorKind;

/// Upper bound on links visited by a walk.
///
/// Records can only wrap values that already exist, so a chain cannot loop;
/// a hand-written `source()` could, and this keeps such a walk finite.
pub const MAX_CHAIN_DEPTH: usize = 1024;

/// Any error that can sit in a chain.
pub type DynError = dyn StdError + 'static;

/// Every link from `err` to its root cause, outermost first.
pub fn chain_of(err: &DynError) -> Vec<&DynError> {
    let mut chain = Vec::new();
    let mut current = Some(err);
    while let Some(link) = current {
        if chain.len() == MAX_CHAIN_DEPTH {
            break;
        }
        chain.push(link);
        current = link.source();
    }
    chain
}

/// The root cause: the last element of [`chain_of`].
pub fn deepest(err: &DynError) -> &DynError {
    let mut chain = chain_of(err);
    chain.pop().unwrap_or(err)
}

/// First link of type `T`, scanning from the outermost call site inwards.
pub fn first_of_kind<T: StdError + 'static>(err: &DynError) -> Option<&T> {
    chain_of(err).into_iter().find_map(|e| e.downcast_ref::<T>())
}

/// Link of type `T` closest to the root cause.
pub fn deepest_of_kind<T: StdError + 'static>(err: &DynError) -> Option<&T> {
    chain_of(err).into_iter().rev().find_map(|e| e.downcast_ref::<T>())
}

/// Checked extraction of a `T` anywhere in the chain.
///
/// Follows the standard `source()` contract, so it matches any error type and
/// not only [`Error`]. Equivalent to [`first_of_kind`].
pub fn extract<T: StdError + 'static>(err: &DynError) -> Option<&T> {
    first_of_kind::<T>(err)
}

/// Outermost record tagged with `kind`.
pub fn first_with_kind(err: &DynError, kind: ErrorKind) -> Option<&Error> {
    records(err).find(|e| e.kind() == Some(kind))
}

/// Record tagged with `kind` closest to the root cause.
pub fn deepest_with_kind(err: &DynError, kind: ErrorKind) -> Option<&Error> {
    records(err).rev().find(|e| e.kind() == Some(kind))
}

/// The contiguous run of records starting at `err`.
///
/// Stops at the first link that is not a record, even if records appear
/// further down. Empty when `err` itself is not a record.
pub fn list_records(err: &DynError) -> Vec<&Error> {
    chain_of(err)
        .into_iter()
        .map_while(|e| e.downcast_ref::<Error>())
        .collect()
}

/// Outermost record anywhere in the chain.
pub fn first_record(err: &DynError) -> Option<&Error> {
    first_of_kind::<Error>(err)
}

/// Record closest to the root cause.
pub fn deepest_record(err: &DynError) -> Option<&Error> {
    deepest_of_kind::<Error>(err)
}

fn records(err: &DynError) -> impl DoubleEndedIterator<Item = &Error> {
    chain_of(err)
        .into_iter()
        .filter_map(|e| e.downcast_ref::<Error>())
}

/// What a caller needs to decide whether to retry.
#[derive(Debug, Clone)]
pub struct RecoveryInfo {
    /// Message of the hinted link, joined with its direct cause's message.
    pub message: String,
    pub suggestion: String,
    pub state: Vec<RecoveryState>,
}

/// Separator between a hinted link's message and its cause's message.
pub const RECOVERY_SEPARATOR: &str = ": ";

/// Recovery hint of the deepest link that carries one.
///
/// Scans from the root cause outwards and returns the first hint found, so
/// when several links carry hints the one closest to the root wins.
pub fn recovery(err: &DynError) -> Option<RecoveryInfo> {
    let hinted = records(err).rev().find(|e| e.recovery().is_some())?;
    let hint = hinted.recovery()?;

    let mut message = hinted.message().to_string();
    if let Some(cause) = hinted.cause() {
        message.push_str(RECOVERY_SEPARATOR);
        match cause.downcast_ref::<Error>() {
            Some(record) => message.push_str(record.message()),
            None => message.push_str(&cause.to_string()),
        }
    }

    Some(RecoveryInfo {
        message,
        suggestion: hint.suggestion().to_string(),
        state: hint.state().to_vec(),
    })
}

/// Whether any link in the chain carries a recovery hint.
pub fn is_recoverable(err: &DynError) -> bool {
    recovery(err).is_some()
}
