//! Object metadata shared by sessions and the objects synthesized from them

use crate::{ObjectKey, ObjectUid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label set. Ordered so that serialized objects are byte-stable.
pub type Labels = BTreeMap<String, String>;

/// Identity and bookkeeping fields carried by every stored object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    pub namespace: String,

    /// Assigned by the store on creation
    #[serde(default, skip_serializing_if = "ObjectUid::is_empty")]
    pub uid: ObjectUid,

    /// Incremented by the store on every spec change
    #[serde(default)]
    pub generation: i64,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl ObjectMeta {
    pub fn new(key: &ObjectKey) -> Self {
        Self {
            name: key.name.clone(),
            namespace: key.namespace.clone(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }

    /// The owner reference flagged as controller, if any
    pub fn controller_ref(&self) -> Option<&OwnerReference> {
        self.owner_references.iter().find(|r| r.controller)
    }

    /// Whether the controlling owner is the object with `uid`
    pub fn is_controlled_by(&self, uid: &ObjectUid) -> bool {
        self.controller_ref().is_some_and(|r| &r.uid == uid)
    }

    /// Whether any owner reference points at `uid`
    pub fn is_owned_by(&self, uid: &ObjectUid) -> bool {
        self.owner_references.iter().any(|r| &r.uid == uid)
    }
}

/// Back-reference from a child object to its owner.
///
/// This is plain data: the store uses it to cascade deletion and to hold off
/// owner removal while dependents exist. Nothing dereferences it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: ObjectUid,
    pub block_owner_deletion: bool,
    pub controller: bool,
}
