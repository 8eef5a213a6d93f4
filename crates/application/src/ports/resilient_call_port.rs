//! Resilient call port
//!
//! One logical call to a simulated endpoint, protected by a retry policy.

use async_trait::async_trait;
use domain::FaultConfig;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::{error::ApplicationError, request_context::RequestContext};

/// Answer of a resilient call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResponse {
    /// Body returned by the endpoint or by the fallback
    pub body: String,
    /// Invocations made, including the successful one
    pub attempts: u32,
    /// Whether `body` came from the fallback rather than the endpoint
    pub degraded: bool,
}

/// Port for calling a simulated endpoint through a retry policy
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResilientCallPort: Send + Sync {
    /// Perform one logical call
    async fn call(
        &self,
        ctx: &RequestContext,
        fault: &FaultConfig,
    ) -> Result<CallResponse, ApplicationError>;

    /// Name of the retry policy protecting the calls
    fn policy_name(&self) -> String;
}
