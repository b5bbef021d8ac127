pub mod batch;
pub mod farmer;
pub mod package;
pub mod scan;
pub mod shared;
pub mod user;
