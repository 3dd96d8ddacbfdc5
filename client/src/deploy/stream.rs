//! Bidirectional deploy stream abstraction
//!
//! A deploy stream is split into two halves that are driven
//! independently: the outbound [`DeploySink`] and the inbound
//! [`ProgressSource`].

use async_trait::async_trait;

use crate::errors::ClientError;
use crate::models::deploy::{DeployRequest, ServerMessage};

/// Outbound half of a deploy stream
#[async_trait]
pub trait DeploySink: Send {
    /// Send one frame
    async fn send(&mut self, request: DeployRequest) -> Result<(), ClientError>;

    /// Close the outbound half, telling the service no more frames follow
    async fn close(&mut self) -> Result<(), ClientError>;
}

/// Inbound half of a deploy stream
#[async_trait]
pub trait ProgressSource: Send {
    /// Receive the next message, or `None` once the service has closed its side
    async fn recv(&mut self) -> Result<Option<ServerMessage>, ClientError>;
}

/// Both halves of one open deploy stream
pub struct DeployStream {
    pub sink: Box<dyn DeploySink>,
    pub source: Box<dyn ProgressSource>,
}

impl DeployStream {
    pub fn new(sink: Box<dyn DeploySink>, source: Box<dyn ProgressSource>) -> Self {
        Self { sink, source }
    }
}

/// Opens deploy streams against an already selected service
#[async_trait]
pub trait DeployStreamOpener: Send + Sync {
    async fn open_deploy_stream(&self) -> Result<DeployStream, ClientError>;
}
