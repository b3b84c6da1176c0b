pub mod accounts;
pub mod session;
