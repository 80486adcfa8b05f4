//! In-process decision engine backed by the CEDAR policy language.
//!
//! This adapter lets the gateway run without the remote policy store: the
//! query is translated into CEDAR entities and a CEDAR request, and the
//! [`cedar_policy::Authorizer`] produces the verdict. Policy evaluation itself
//! is entirely CEDAR's; this module only maps our types onto it.

use async_trait::async_trait;
use cedar_policy::{
    Authorizer, Context, Decision as CedarDecision, Entities, EntityId, EntityTypeName, EntityUid,
    PolicySet, Request,
};
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::debug;

use crate::client::DecisionClient;
use crate::decision::{Decision, Diagnostics, PERMISSION_ALLOW, PERMISSION_DENY};
use crate::error::{AuthzError, Result};
use crate::query::AuthorizationQuery;
use crate::types::{self, AttrValue, EntityGraph};

/// A [`DecisionClient`] that evaluates queries against a local CEDAR policy set.
///
/// # Example
///
/// ```rust,ignore
/// let client = CedarDecisionClient::from_policies(r#"permit(principal, action, resource);"#)?;
/// let decision = client.decide(&query).await?;
/// ```
pub struct CedarDecisionClient {
    authorizer: Authorizer,
    policies: PolicySet,
}

impl CedarDecisionClient {
    /// Parses the given CEDAR policy source.
    pub fn from_policies(policy_src: &str) -> Result<Self> {
        let policies =
            PolicySet::from_str(policy_src).map_err(|e| AuthzError::PolicyParse(e.to_string()))?;

        Ok(Self {
            authorizer: Authorizer::new(),
            policies,
        })
    }

    /// Converts an entity graph into CEDAR's entity JSON format.
    fn entities_json(graph: &EntityGraph) -> Value {
        let entities: Vec<Value> = graph
            .iter()
            .map(|entity| {
                let attrs: serde_json::Map<String, Value> = entity
                    .attrs
                    .iter()
                    .map(|(name, value)| (name.clone(), attr_json(value)))
                    .collect();
                json!({
                    "uid": uid_json(&entity.uid),
                    "attrs": attrs,
                    "parents": entity.parents.iter().map(uid_json).collect::<Vec<_>>(),
                })
            })
            .collect();
        Value::Array(entities)
    }

    fn build_request(&self, query: &AuthorizationQuery) -> Result<Request> {
        let principal = cedar_uid(&query.principal().uid())?;
        let action = cedar_uid(&query.action().uid())?;
        let resource = cedar_uid(&query.resource().uid())?;

        // No request context and no schema: the entity graph carries all facts
        Request::new(
            Some(principal),
            Some(action),
            Some(resource),
            Context::empty(),
            None,
        )
        .map_err(|e| AuthzError::Engine(e.to_string()))
    }
}

#[async_trait]
impl DecisionClient for CedarDecisionClient {
    async fn decide(&self, query: &AuthorizationQuery) -> Result<Decision> {
        let entities = Entities::from_json_value(Self::entities_json(query.entities()), None)
            .map_err(|e| AuthzError::Engine(format!("invalid entity graph: {}", e)))?;
        let request = self.build_request(query)?;

        let response = self
            .authorizer
            .is_authorized(&request, &self.policies, &entities);

        let diagnostics = Diagnostics {
            determining_policies: response
                .diagnostics()
                .reason()
                .map(|id| id.to_string())
                .collect(),
            errors: response
                .diagnostics()
                .errors()
                .map(|e| e.to_string())
                .collect(),
        };

        let verdict = match response.decision() {
            CedarDecision::Allow => PERMISSION_ALLOW,
            CedarDecision::Deny => PERMISSION_DENY,
        };
        debug!(
            "CEDAR: {} on {} by {} -> {}",
            query.action().id,
            query.resource().uid(),
            query.principal().uid(),
            verdict
        );

        Ok(Decision::new(Some(verdict.to_string()), diagnostics))
    }

    fn name(&self) -> &'static str {
        "cedar-local"
    }
}

fn cedar_uid(uid: &types::EntityUid) -> Result<EntityUid> {
    let type_name = EntityTypeName::from_str(&uid.entity_type).map_err(|e| {
        AuthzError::Engine(format!("invalid entity type {}: {}", uid.entity_type, e))
    })?;
    Ok(EntityUid::from_type_name_and_id(
        type_name,
        EntityId::new(&uid.id),
    ))
}

fn uid_json(uid: &types::EntityUid) -> Value {
    json!({ "type": uid.entity_type, "id": uid.id })
}

fn attr_json(value: &AttrValue) -> Value {
    match value {
        AttrValue::String(s) => json!(s),
        AttrValue::Long(n) => json!(n),
        AttrValue::Bool(b) => json!(b),
        AttrValue::Entity(uid) => json!({ "__entity": uid_json(uid) }),
        AttrValue::Set(values) => Value::Array(values.iter().map(attr_json).collect()),
    }
}
