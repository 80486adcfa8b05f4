//! The decision client contract.

use async_trait::async_trait;

use crate::decision::Decision;
use crate::error::Result;
use crate::query::AuthorizationQuery;

/// Sends an assembled query to a policy decision engine.
///
/// Implementations make exactly one call to the engine per invocation and do
/// not retry. A failure to obtain a verdict is returned as `Err`, never as a
/// DENY (or ALLOW) decision, so that callers can tell the two apart.
///
/// ```ignore
/// let decision = client.decide(&query).await?;
/// if decision.is_allow() { /* run the protected handler */ }
/// ```
#[async_trait]
pub trait DecisionClient: Send + Sync {
    async fn decide(&self, query: &AuthorizationQuery) -> Result<Decision>;

    /// Short engine name for health reports and logs.
    fn name(&self) -> &'static str;
}
