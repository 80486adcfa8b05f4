//! Assembly of a single authorization query.

use crate::error::{AuthzError, Result};
use crate::types::{Action, EntityGraph, Principal, Resource};

/// Everything the decision engine needs for one decision.
///
/// Built fresh for each request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationQuery {
    principal: Principal,
    action: Action,
    resource: Resource,
    entities: EntityGraph,
    policy_store_id: String,
}

impl AuthorizationQuery {
    /// Combines the query components into one query.
    ///
    /// Pure: no I/O and no side effects. An empty action id, action type,
    /// resource type or resource id means the action descriptor is broken and
    /// is rejected with [`AuthzError::ContractViolation`].
    pub fn assemble(
        principal: Principal,
        action: Action,
        resource: Resource,
        entities: EntityGraph,
        policy_store_id: impl Into<String>,
    ) -> Result<Self> {
        let required = [
            ("action id", &action.id),
            ("action type", &action.action_type),
            ("resource type", &resource.entity_type),
            ("resource id", &resource.id),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(AuthzError::ContractViolation(format!("empty {}", field)));
        }

        Ok(Self {
            principal,
            action,
            resource,
            entities,
            policy_store_id: policy_store_id.into(),
        })
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn entities(&self) -> &EntityGraph {
        &self.entities
    }

    pub fn policy_store_id(&self) -> &str {
        &self.policy_store_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entity, EntityUid};

    fn principal() -> Principal {
        Principal::new("test", "PhotoFlash::User")
    }

    fn view() -> Action {
        Action::new("ViewPhoto", "PhotoFlash::Action")
    }

    #[test]
    fn test_assemble_valid_query() {
        let graph = EntityGraph::new().with(Entity::new(EntityUid::new("PhotoFlash::User", "test")));
        let query = AuthorizationQuery::assemble(
            principal(),
            view(),
            Resource::new("1", "PhotoFlash::Photo"),
            graph.clone(),
            "store-1",
        )
        .unwrap();

        assert_eq!(query.action().id, "ViewPhoto");
        assert_eq!(query.resource().id, "1");
        assert_eq!(query.principal().id, "test");
        assert_eq!(query.entities(), &graph);
        assert_eq!(query.policy_store_id(), "store-1");
    }

    #[test]
    fn test_empty_graph_is_not_a_contract_violation() {
        let result = AuthorizationQuery::assemble(
            principal(),
            view(),
            Resource::new("99", "PhotoFlash::Photo"),
            EntityGraph::new(),
            "store-1",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejects_empty_components() {
        let cases = vec![
            (Action::new("", "PhotoFlash::Action"), Resource::new("1", "PhotoFlash::Photo"), "action id"),
            (Action::new("ViewPhoto", ""), Resource::new("1", "PhotoFlash::Photo"), "action type"),
            (view(), Resource::new("1", ""), "resource type"),
            (view(), Resource::new("", "PhotoFlash::Photo"), "resource id"),
        ];

        for (action, resource, field) in cases {
            let result =
                AuthorizationQuery::assemble(principal(), action, resource, EntityGraph::new(), "s");
            match result {
                Err(AuthzError::ContractViolation(msg)) => assert!(msg.contains(field), "{}", msg),
                other => panic!("expected contract violation for {}, got {:?}", field, other),
            }
        }
    }
}
