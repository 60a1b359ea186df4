//! User interface module - terminal output for plans, outcomes and warnings.
//!
//! - `formatter` - Pure formatting functions and their printing wrappers

pub mod formatter;

pub use formatter::{
    display_error, display_outcome, display_plan, display_status, display_success,
    display_warning, format_commit, format_outcome, format_plan,
};
