//! Presence payloads and the worker status extension.
//!
//! A presence payload is a bag of namespaced extensions. Workers put their
//! status in a single extension identified by [`STATUS_NAMESPACE`] and
//! [`STATUS_ELEMENT`], carrying the value in the [`STATUS_ATTRIBUTE`]
//! attribute. Everything else in presence is unrelated to detection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::WorkerStatus;

/// Namespace of the worker status extension.
pub const STATUS_NAMESPACE: &str = "http://jitsi.org/protocol/jibri";
/// Element name of the worker status extension.
pub const STATUS_ELEMENT: &str = "jibri-status";
/// Attribute holding the status value.
pub const STATUS_ATTRIBUTE: &str = "status";

/// One namespaced element inside a presence payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceExtension {
    pub namespace: String,
    pub element: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl PresenceExtension {
    pub fn new(namespace: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            element: element.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// A worker status extension carrying `status`.
    pub fn worker_status(status: &WorkerStatus) -> Self {
        Self::new(STATUS_NAMESPACE, STATUS_ELEMENT).with_attribute(STATUS_ATTRIBUTE, status.as_str())
    }

    fn is(&self, element: &str, namespace: &str) -> bool {
        self.element == element && self.namespace == namespace
    }
}

/// The presence a room member currently advertises.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    #[serde(default)]
    pub extensions: Vec<PresenceExtension>,
}

impl PresencePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presence carrying only a worker status extension.
    pub fn with_status(status: &WorkerStatus) -> Self {
        Self {
            extensions: vec![PresenceExtension::worker_status(status)],
        }
    }

    #[must_use]
    pub fn with_extension(mut self, extension: PresenceExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// First extension matching element name and namespace.
    pub fn extension(&self, element: &str, namespace: &str) -> Option<&PresenceExtension> {
        self.extensions.iter().find(|e| e.is(element, namespace))
    }

    /// Status announced in this presence, if it carries the status extension.
    ///
    /// An extension without a status attribute reads as `Undefined`.
    pub fn worker_status(&self) -> Option<WorkerStatus> {
        let ext = self.extension(STATUS_ELEMENT, STATUS_NAMESPACE)?;
        Some(
            ext.attribute(STATUS_ATTRIBUTE)
                .map_or(WorkerStatus::Undefined, WorkerStatus::parse),
        )
    }
}
