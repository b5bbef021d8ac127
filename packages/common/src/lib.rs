pub mod config;
pub mod email;

pub use email::{EmailJob, EmailKind};
