//! Session and account endpoints: signup, login, logout, session probe.

pub mod login;
pub mod logout;
pub mod principal;
pub mod session;
pub mod signup;
pub(crate) mod storage;
pub mod types;
pub(crate) mod utils;
