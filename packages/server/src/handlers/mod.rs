pub mod batch;
pub mod farmer;
pub mod package;
pub mod scan;
pub mod user;
