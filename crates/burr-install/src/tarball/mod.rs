//! npm tarball handling.

pub mod extract;

pub use extract::{extract_tarball, NPM_WRAPPER_DEPTH};
