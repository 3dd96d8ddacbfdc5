//! Data models

pub mod deploy;
