//! Deploy module

pub mod archive;
pub mod coordinator;
pub mod ignore_patterns;
pub mod receiver;
pub mod revisions;
pub mod sender;
pub mod source;
pub mod stream;
