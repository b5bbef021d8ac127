pub mod codes;
pub mod geocode;
pub mod hash;
pub mod jwt;
pub mod notify;
