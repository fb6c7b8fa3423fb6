pub mod aggregate;
pub mod claims;
pub mod credit;
pub mod logistics;
