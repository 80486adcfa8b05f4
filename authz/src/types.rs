//! Core authorization types: principals, actions, resources and the entity
//! graph submitted alongside every authorization query.
//!
//! # Security Considerations
//!
//! ## 1. Principal Identity
//! - Principals are established upstream by authentication; nothing in this
//!   module derives or verifies identity
//! - The principal's own account is carried as an entity attribute, never as
//!   a parent edge of the resource
//!
//! ## 2. Resource Ownership
//! - A resource's parent edge must point at its true owner as read from the
//!   resource store, otherwise cross-account checks become vacuous
//! - An unresolvable resource is represented by its absence from the graph
//!
//! ## 3. Hierarchy
//! - Parent edges always point at coarser-grained containers (photo → account),
//!   which keeps the graph acyclic by construction

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A globally unique entity identifier within one request: a namespaced type
/// tag (e.g. `"PhotoFlash::Photo"`) plus an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityUid {
    /// The namespaced entity type (e.g. "PhotoFlash::Account")
    pub entity_type: String,

    /// The identifier within that type
    pub id: String,
}

impl EntityUid {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::\"{}\"", self.entity_type, self.id)
    }
}

/// The value of a named entity attribute: either a scalar or a reference to
/// another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    String(String),
    Long(i64),
    Bool(bool),
    Entity(EntityUid),
    Set(Vec<AttrValue>),
}

impl From<EntityUid> for AttrValue {
    fn from(uid: EntityUid) -> Self {
        AttrValue::Entity(uid)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Long(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// A node in the authorization graph.
///
/// Attributes are kept in a `BTreeMap` so that two builds of the same entity
/// are identical, including iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub uid: EntityUid,
    pub attrs: BTreeMap<String, AttrValue>,
    pub parents: Vec<EntityUid>,
}

impl Entity {
    /// Creates an entity with no attributes and no parents.
    pub fn new(uid: EntityUid) -> Self {
        Self {
            uid,
            attrs: BTreeMap::new(),
            parents: Vec::new(),
        }
    }

    /// Adds (or replaces) a named attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Adds a parent (containment) edge.
    pub fn with_parent(mut self, parent: EntityUid) -> Self {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}

/// The full set of entities submitted with one authorization query.
///
/// Insertion order is preserved. Pushing an entity whose uid is already
/// present replaces the earlier entry, keeping uids unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityGraph {
    entities: Vec<Entity>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: Entity) {
        match self.entities.iter_mut().find(|e| e.uid == entity.uid) {
            Some(existing) => *existing = entity,
            None => self.entities.push(entity),
        }
    }

    /// Builder form of [`EntityGraph::push`].
    pub fn with(mut self, entity: Entity) -> Self {
        self.push(entity);
        self
    }

    pub fn get(&self, uid: &EntityUid) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.uid == uid)
    }

    pub fn contains(&self, uid: &EntityUid) -> bool {
        self.get(uid).is_some()
    }

    /// Parent edges of the given entity, or an empty slice if it is absent.
    pub fn parents_of(&self, uid: &EntityUid) -> &[EntityUid] {
        self.get(uid).map(|e| e.parents.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}

impl FromIterator<Entity> for EntityGraph {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut graph = EntityGraph::new();
        for entity in iter {
            graph.push(entity);
        }
        graph
    }
}

/// Represents the principal (the actor) making an authorization request.
///
/// # Security Note
/// Principals must be derived from an authenticated identity only. Never
/// trust principal data taken from the request body or path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// The unique identifier for this principal
    pub id: String,

    /// The type of principal (e.g., "PhotoFlash::User")
    pub entity_type: String,
}

impl Principal {
    /// Creates a new Principal with the given ID and type.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }

    pub fn uid(&self) -> EntityUid {
        EntityUid::new(&self.entity_type, &self.id)
    }
}

/// Represents the action being authorized, e.g. `PhotoFlash::Action::"ViewPhoto"`.
///
/// The action type tag is constant per deployment; the id names the operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// The operation name (e.g., "UploadPhoto", "ViewPhoto")
    pub id: String,

    /// The action type tag (e.g., "PhotoFlash::Action")
    pub action_type: String,
}

impl Action {
    /// Creates a new Action with the given id and type tag.
    pub fn new(id: impl Into<String>, action_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action_type: action_type.into(),
        }
    }

    pub fn uid(&self) -> EntityUid {
        EntityUid::new(&self.action_type, &self.id)
    }
}

/// Represents the resource an action is performed against.
///
/// The resource may not exist (e.g. an unknown id in a view request, or a
/// not-yet-created upload); that is a valid state, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// The unique identifier for this resource
    pub id: String,

    /// The type of resource (e.g., "PhotoFlash::Photo")
    pub entity_type: String,
}

impl Resource {
    /// Creates a new Resource with the given ID and type.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }

    pub fn uid(&self) -> EntityUid {
        EntityUid::new(&self.entity_type, &self.id)
    }
}
