// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The top-level IPP message: version, operation-id/status-code, request-id,
// and an ordered sequence of groups.

use crate::attribute::{Attribute, Group};
use crate::tag::GroupTag;
use crate::value::Value;

/// Whether a message is a request (operation-id) or a response
/// (status-code) — the 2-byte field right after the version in the header
/// means one or the other depending on direction, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request(u16),
    Response(u16),
}

impl MessageKind {
    pub fn code(self) -> u16 {
        match self {
            MessageKind::Request(op) => op,
            MessageKind::Response(status) => status,
        }
    }
}

/// A complete IPP message — the unit [`crate::codec::encode`] and
/// [`crate::codec::decode`] operate on.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub version_major: u8,
    pub version_minor: u8,
    pub kind: MessageKind,
    pub request_id: u32,
    pub groups: Vec<Group>,
}

impl Message {
    pub fn request(version_major: u8, version_minor: u8, operation_id: u16, request_id: u32) -> Self {
        Self {
            version_major,
            version_minor,
            kind: MessageKind::Request(operation_id),
            request_id,
            groups: Vec::new(),
        }
    }

    pub fn response(version_major: u8, version_minor: u8, status_code: u16, request_id: u32) -> Self {
        Self {
            version_major,
            version_minor,
            kind: MessageKind::Response(status_code),
            request_id,
            groups: Vec::new(),
        }
    }

    /// Find (or lazily create) the group with the given tag, preserving the
    /// order groups were first touched in — callers build messages one
    /// group at a time, which is also the order §3 requires on the wire.
    pub fn group_mut(&mut self, tag: GroupTag) -> &mut Group {
        if let Some(idx) = self.groups.iter().position(|g| g.tag == tag) {
            return &mut self.groups[idx];
        }
        self.groups.push(Group::new(tag));
        self.groups.last_mut().expect("just pushed")
    }

    pub fn group(&self, tag: GroupTag) -> Option<&Group> {
        self.groups.iter().find(|g| g.tag == tag)
    }

    /// Find the first attribute with `name`, optionally restricted to one
    /// group.
    pub fn find(&self, name: &str, group: Option<GroupTag>) -> Option<&Attribute> {
        self.groups
            .iter()
            .filter(|g| group.is_none_or(|t| g.tag == t))
            .find_map(|g| g.find(name))
    }

    pub fn add(&mut self, group: GroupTag, name: impl Into<String>, value: Value) -> &mut Attribute {
        let attr = Attribute::new(name, group, value);
        let g = self.group_mut(group);
        g.push(attr);
        g.attributes.last_mut().expect("just pushed")
    }

    pub fn add_multi(
        &mut self,
        group: GroupTag,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Attribute {
        let attr = Attribute::new_multi(name, group, values);
        let g = self.group_mut(group);
        g.push(attr);
        g.attributes.last_mut().expect("just pushed")
    }
}

/// Copy an attribute from `src` to `dst`, optionally aliasing its values
/// instead of deep-cloning them.
///
/// `dst_group` overrides the destination group tag (a response often copies
/// a job's attributes, recorded under the job group, into the operation
/// group of a `Get-Job-Attributes` reply, etc). When `shared` is true, string
/// and collection values are cloned via `Arc::clone` — an O(1) pointer copy —
/// instead of duplicating the underlying bytes; scalar values (integers,
/// booleans) are always copied by value regardless, since there is nothing
/// to share. The "copy" marker design note 9 describes never appears on the
/// wire because `Value` itself carries no such flag — sharing here is purely
/// a cheap-clone optimization, invisible to [`crate::codec::encode`].
pub fn copy_attribute(dst: &mut Message, attr: &Attribute, dst_group: GroupTag, shared: bool) {
    let values = if shared {
        attr.values.clone()
    } else {
        attr.values
            .iter()
            .map(|v| match v {
                Value::Collection(attrs) => {
                    Value::Collection(std::sync::Arc::new((**attrs).clone()))
                }
                other => other.clone(),
            })
            .collect()
    };
    dst.add_multi(dst_group, attr.name.clone(), values);
}
