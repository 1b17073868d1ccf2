//! Reporting of broken calling contracts.
//!
//! Some misuses can only be programming errors: popping a draw state that was never pushed,
//! naming a sibling that isn’t actually a child, linking a window twice. Those are never
//! tolerated silently. They are logged, and debug builds trap into the debugger (panic) at the
//! call site; release builds let the caller fail the operation instead.

use std::fmt;
use tracing::error;

/// Reports a contract violation.
///
/// # Panics
/// Always, if debug assertions are enabled.
#[track_caller]
pub fn debugger(message: fmt::Arguments<'_>) {
    let location = std::panic::Location::caller();
    error!(%location, "contract violation: {}", message);
    if cfg!(debug_assertions) {
        panic!("contract violation: {}", message);
    }
}
