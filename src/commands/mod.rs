pub mod completions;
pub mod config;
pub mod hook;
pub mod init;
pub mod observe;
pub mod policy;
pub mod session;
pub mod status;
