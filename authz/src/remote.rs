//! Remote decision client speaking the `IsAuthorized` JSON protocol of a
//! hosted policy store.
//!
//! One POST per decision, no retries. Request signing is not performed here;
//! the endpoint is expected to be a signing egress proxy or a compatible
//! decision service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error};

use crate::client::DecisionClient;
use crate::decision::{Decision, Diagnostics};
use crate::error::{AuthzError, Result};
use crate::query::AuthorizationQuery;
use crate::types::{AttrValue, Entity, EntityUid};

/// Operation header understood by the policy store API.
pub const TARGET_HEADER: &str = "X-Amz-Target";
pub const IS_AUTHORIZED_TARGET: &str = "VerifiedPermissions.IsAuthorized";

/// Connection settings for the remote decision engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEngineConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl RemoteEngineConfig {
    /// Uses `endpoint` when given, otherwise the regional policy store endpoint.
    pub fn new(endpoint: Option<String>, region: &str, timeout: Duration) -> Self {
        let endpoint = endpoint
            .unwrap_or_else(|| format!("https://verifiedpermissions.{}.amazonaws.com", region));
        Self { endpoint, timeout }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityIdentifier {
    pub entity_type: String,
    pub entity_id: String,
}

impl From<&EntityUid> for EntityIdentifier {
    fn from(uid: &EntityUid) -> Self {
        Self {
            entity_type: uid.entity_type.clone(),
            entity_id: uid.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionIdentifier {
    pub action_type: String,
    pub action_id: String,
}

/// Tagged attribute value: exactly one key is present on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeValue {
    String(String),
    Long(i64),
    Boolean(bool),
    EntityIdentifier(EntityIdentifier),
    Set(Vec<AttributeValue>),
}

impl From<&AttrValue> for AttributeValue {
    fn from(value: &AttrValue) -> Self {
        match value {
            AttrValue::String(s) => AttributeValue::String(s.clone()),
            AttrValue::Long(n) => AttributeValue::Long(*n),
            AttrValue::Bool(b) => AttributeValue::Boolean(*b),
            AttrValue::Entity(uid) => AttributeValue::EntityIdentifier(uid.into()),
            AttrValue::Set(values) => AttributeValue::Set(values.iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityItem {
    pub identifier: EntityIdentifier,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub parents: Vec<EntityIdentifier>,
}

impl From<&Entity> for EntityItem {
    fn from(entity: &Entity) -> Self {
        Self {
            identifier: (&entity.uid).into(),
            attributes: entity
                .attrs
                .iter()
                .map(|(name, value)| (name.clone(), value.into()))
                .collect(),
            parents: entity.parents.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesDefinition {
    pub entity_list: Vec<EntityItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsAuthorizedRequest {
    pub policy_store_id: String,
    pub principal: EntityIdentifier,
    pub action: ActionIdentifier,
    pub resource: EntityIdentifier,
    pub entities: EntitiesDefinition,
}

impl From<&AuthorizationQuery> for IsAuthorizedRequest {
    fn from(query: &AuthorizationQuery) -> Self {
        Self {
            policy_store_id: query.policy_store_id().to_string(),
            principal: (&query.principal().uid()).into(),
            action: ActionIdentifier {
                action_type: query.action().action_type.clone(),
                action_id: query.action().id.clone(),
            },
            resource: (&query.resource().uid()).into(),
            entities: EntitiesDefinition {
                entity_list: query.entities().iter().map(Into::into).collect(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeterminingPolicy {
    pub policy_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationError {
    pub error_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsAuthorizedResponse {
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub determining_policies: Vec<DeterminingPolicy>,
    #[serde(default)]
    pub errors: Vec<EvaluationError>,
}

impl From<IsAuthorizedResponse> for Decision {
    fn from(response: IsAuthorizedResponse) -> Self {
        Decision::new(
            response.decision,
            Diagnostics {
                determining_policies: response
                    .determining_policies
                    .into_iter()
                    .map(|p| p.policy_id)
                    .collect(),
                errors: response
                    .errors
                    .into_iter()
                    .map(|e| e.error_description)
                    .collect(),
            },
        )
    }
}

/// A [`DecisionClient`] that posts each query to a remote decision engine.
pub struct HttpDecisionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpDecisionClient {
    pub fn new(config: RemoteEngineConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthzError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
        })
    }
}

#[async_trait]
impl DecisionClient for HttpDecisionClient {
    async fn decide(&self, query: &AuthorizationQuery) -> Result<Decision> {
        let body = IsAuthorizedRequest::from(query);
        debug!(
            "REMOTE PDP: {} entities for {} on {}",
            body.entities.entity_list.len(),
            query.action().id,
            query.resource().uid()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header(TARGET_HEADER, IS_AUTHORIZED_TARGET)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("REMOTE PDP: request to {} failed: {}", self.endpoint, e);
                AuthzError::Transport(e.to_string())
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuthzError::Transport(e.to_string()))?;

        if !status.is_success() {
            let detail = String::from_utf8_lossy(&bytes);
            return Err(AuthzError::Engine(format!("{}: {}", status, detail)));
        }

        let decoded: IsAuthorizedResponse = serde_json::from_slice(&bytes)
            .map_err(|e| AuthzError::MalformedResponse(e.to_string()))?;

        Ok(decoded.into())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
