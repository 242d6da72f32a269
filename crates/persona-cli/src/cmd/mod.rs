pub mod account;
pub mod classify;
