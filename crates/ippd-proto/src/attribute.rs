// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attributes and groups — the structural layer above individual values.

use crate::tag::{GroupTag, ValueTag};
use crate::value::Value;

/// A named, multi-valued IPP attribute.
///
/// On the wire a multi-valued attribute is a named entry followed by
/// zero-length-name "additional value" continuations (RFC 8010 §3.1.3);
/// this type always models that as one attribute with `N` values, never as
/// `N` attributes sharing a name.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub group: GroupTag,
    pub values: Vec<Value>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, group: GroupTag, value: Value) -> Self {
        Self {
            name: name.into(),
            group,
            values: vec![value],
        }
    }

    pub fn new_multi(name: impl Into<String>, group: GroupTag, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            group,
            values,
        }
    }

    /// The value tag every value in this attribute shares.
    pub fn value_tag(&self) -> Option<ValueTag> {
        self.values.first().map(Value::tag)
    }

    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }
}

/// One (group-tag, attributes) section of a message, preserving wire order
/// both across groups and within a group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub tag: GroupTag,
    pub attributes: Vec<Attribute>,
}

impl Group {
    pub fn new(tag: GroupTag) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn push(&mut self, attr: Attribute) {
        self.attributes.push(attr);
    }
}
