//! Request and response types used by the handlers

pub mod common;
pub mod files;
pub mod functions;
pub mod qa;

pub use common::*;
pub use files::*;
pub use functions::*;
pub use qa::*;
