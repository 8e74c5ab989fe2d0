//! HTTP request handlers, grouped by feature

pub mod custom_qa;
pub mod files;
pub mod functions;
pub mod health;
pub mod mobile;
pub mod types;

pub use custom_qa::*;
pub use files::*;
pub use functions::*;
pub use health::*;
pub use mobile::*;

pub use types::*;
