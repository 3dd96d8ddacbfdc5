//! deployctl library
//!
//! Streams application sources to a deploy service and manages the
//! resulting deploy revisions.

pub mod app;
pub mod cli;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod storage;
pub mod utils;
pub mod ws;
