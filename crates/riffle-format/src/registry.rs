//! Declaration registry deciding what the parser does with each chunk.
//!
//! Rules are keyed by `(container_type, id)`, where `container_type` is the
//! sub-type of the group directly enclosing the chunk. The registry is filled
//! once and then borrowed immutably by [`RiffParser`](crate::RiffParser), so it
//! cannot change while a parse is running and may be shared between parses.
//!
//! # Classification order
//!
//! 1. `RIFF` and `LIST` ids are always [`Role::Group`].
//! 2. A declared stop type, or [`Registry::declare_stop_all`], gives [`Role::Stop`].
//! 3. An exact property or collection rule gives [`Role::Property`] or
//!    [`Role::Collection`].
//! 4. If data rules exist, an exact data rule gives [`Role::Data`]; anything
//!    else is skipped as [`Role::Stop`].
//! 5. With no data rules, everything is [`Role::Data`] unless property or
//!    collection rules exist, in which case the undeclared chunk is skipped.
//!
//! An empty registry therefore visits every local chunk as data.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::fourcc::FourCC;

/// What the parser does with a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Recurse into the children.
    Group,
    /// Read the payload and hand it to the visitor.
    Data,
    /// Read the payload and attach it to the parent by id.
    Property,
    /// Read the payload and append it to the parent's collection.
    Collection,
    /// Skip the payload unread.
    Stop,
}

/// Caller-populated classification rules.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    groups: HashSet<(FourCC, FourCC)>,
    data: HashSet<(FourCC, FourCC)>,
    properties: HashSet<(FourCC, FourCC)>,
    collections: HashSet<(FourCC, FourCC)>,
    stop_types: HashSet<FourCC>,
    stop_all: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report groups of this sub-type and group id to the visitor.
    ///
    /// Group-ness itself is structural. Once any group is declared, only
    /// declared groups reach `entering_group`/`enter_group`/`leave_group`;
    /// the others are walked transparently.
    pub fn declare_group(&mut self, sub_type: FourCC, id: FourCC) -> &mut Self {
        self.groups.insert((sub_type, id));
        self
    }

    pub fn declare_data(&mut self, container_type: FourCC, id: FourCC) -> &mut Self {
        self.data.insert((container_type, id));
        self
    }

    pub fn declare_property(&mut self, container_type: FourCC, id: FourCC) -> &mut Self {
        self.properties.insert((container_type, id));
        self
    }

    pub fn declare_collection(&mut self, container_type: FourCC, id: FourCC) -> &mut Self {
        self.collections.insert((container_type, id));
        self
    }

    /// Skip every local chunk directly inside groups of `container_type`.
    pub fn declare_stop_type(&mut self, container_type: FourCC) -> &mut Self {
        self.stop_types.insert(container_type);
        self
    }

    /// Skip every local chunk everywhere; only structure is reported.
    pub fn declare_stop_all(&mut self) -> &mut Self {
        self.stop_all = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
            && self.data.is_empty()
            && self.properties.is_empty()
            && self.collections.is_empty()
            && self.stop_types.is_empty()
            && !self.stop_all
    }

    /// Role of chunk `id` found directly inside a group of `container_type`.
    pub fn classify(&self, container_type: FourCC, id: FourCC) -> Role {
        if id.is_group() {
            return Role::Group;
        }
        if self.stop_all || self.stop_types.contains(&container_type) {
            return Role::Stop;
        }
        let key = (container_type, id);
        if self.properties.contains(&key) {
            return Role::Property;
        }
        if self.collections.contains(&key) {
            return Role::Collection;
        }
        if !self.data.is_empty() {
            return if self.data.contains(&key) {
                Role::Data
            } else {
                Role::Stop
            };
        }
        if self.properties.is_empty() && self.collections.is_empty() {
            Role::Data
        } else {
            Role::Stop
        }
    }

    /// Whether the visitor hears about a group of this sub-type and id.
    pub fn reports_group(&self, sub_type: FourCC, id: FourCC) -> bool {
        self.groups.is_empty() || self.groups.contains(&(sub_type, id))
    }
}
