//! Re-exports shared by every module that defines or propagates errors.

pub use snafu::{ensure, OptionExt, ResultExt, Snafu};
