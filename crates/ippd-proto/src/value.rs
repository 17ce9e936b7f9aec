// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The IPP attribute value — a tagged union over every value kind RFC 8010
// defines, expressed as one sum type rather than the source's tag-byte-plus-
// union pair.

use std::sync::Arc;

use crate::attribute::Attribute;
use crate::tag::ValueTag;

/// An immutable, cheaply-cloneable string used for the many IPP value kinds
/// backed by text. Cloning a `Value` that holds one of these shares the
/// underlying allocation rather than copying it — the "shared-storage" fast
/// path design note 9 describes, made structural instead of a manual
/// refcount-and-clear-before-encode dance. `Arc`, not `Rc`: a `Message` rides
/// across an `.await` point in a spawned connection task, so every value it
/// carries must be `Send + Sync`.
pub type IStr = Arc<str>;

/// Resolution units (RFC 8010 §3.5.2, "resolution" syntax).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionUnit {
    PerInch,
    PerCm,
}

impl ResolutionUnit {
    pub const fn to_byte(self) -> u8 {
        match self {
            ResolutionUnit::PerInch => 3,
            ResolutionUnit::PerCm => 4,
        }
    }

    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            3 => Some(ResolutionUnit::PerInch),
            4 => Some(ResolutionUnit::PerCm),
            _ => None,
        }
    }
}

/// A date-time value per RFC 2579 (the same encoding SNMP's `DateAndTime`
/// textual convention uses — 11 octets, no timezone-database dependency).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IppDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub deci_seconds: u8,
    pub utc_sign: u8,
    pub utc_hours: u8,
    pub utc_minutes: u8,
}

/// A single IPP attribute value.
///
/// One `Attribute` holds a `Vec<Value>` all sharing the same [`ValueTag`];
/// the variant here always matches the attribute's declared tag — an
/// accessor that doesn't match the current variant is a logic bug, not a
/// wire-format concern.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Out-of-band `unsupported`/`unknown`/`no-value` marker. Carries no
    /// data; which of the three it is is recorded by the attribute's
    /// [`ValueTag`].
    OutOfBand,
    Integer(i32),
    Boolean(bool),
    Enum(i32),
    OctetString(Vec<u8>),
    DateTime(IppDateTime),
    Resolution {
        xres: i32,
        yres: i32,
        units: ResolutionUnit,
    },
    Range {
        lo: i32,
        hi: i32,
    },
    TextWithLanguage {
        language: IStr,
        text: IStr,
    },
    NameWithLanguage {
        language: IStr,
        name: IStr,
    },
    TextWithoutLanguage(IStr),
    NameWithoutLanguage(IStr),
    Keyword(IStr),
    Uri(IStr),
    UriScheme(IStr),
    Charset(IStr),
    NaturalLanguage(IStr),
    MimeMediaType(IStr),
    /// A nested IPP message — the attributes of one `begin-collection` /
    /// `end-collection` bracket. Reference-counted: copying a collection
    /// attribute via [`crate::message::copy_attribute`]'s shared mode
    /// increments this instead of deep-cloning the nested attribute list.
    Collection(Arc<Vec<Attribute>>),
}

impl Value {
    /// The [`ValueTag`] this value must be encoded with.
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::OutOfBand => ValueTag::Unsupported,
            Value::Integer(_) => ValueTag::Integer,
            Value::Boolean(_) => ValueTag::Boolean,
            Value::Enum(_) => ValueTag::Enum,
            Value::OctetString(_) => ValueTag::OctetString,
            Value::DateTime(_) => ValueTag::DateTime,
            Value::Resolution { .. } => ValueTag::Resolution,
            Value::Range { .. } => ValueTag::RangeOfInteger,
            Value::TextWithLanguage { .. } => ValueTag::TextWithLanguage,
            Value::NameWithLanguage { .. } => ValueTag::NameWithLanguage,
            Value::TextWithoutLanguage(_) => ValueTag::TextWithoutLanguage,
            Value::NameWithoutLanguage(_) => ValueTag::NameWithoutLanguage,
            Value::Keyword(_) => ValueTag::Keyword,
            Value::Uri(_) => ValueTag::Uri,
            Value::UriScheme(_) => ValueTag::UriScheme,
            Value::Charset(_) => ValueTag::Charset,
            Value::NaturalLanguage(_) => ValueTag::NaturalLanguage,
            Value::MimeMediaType(_) => ValueTag::MimeMediaType,
            Value::Collection(_) => ValueTag::BeginCollection,
        }
    }

    /// Borrow the value as a string, for the many value kinds backed by one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::TextWithoutLanguage(s)
            | Value::NameWithoutLanguage(s)
            | Value::Keyword(s)
            | Value::Uri(s)
            | Value::UriScheme(s)
            | Value::Charset(s)
            | Value::NaturalLanguage(s)
            | Value::MimeMediaType(s) => Some(s),
            Value::TextWithLanguage { text, .. } => Some(text),
            Value::NameWithLanguage { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(v) | Value::Enum(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Attribute]> {
        match self {
            Value::Collection(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn keyword(s: impl Into<IStr>) -> Self {
        Value::Keyword(s.into())
    }

    pub fn text(s: impl Into<IStr>) -> Self {
        Value::TextWithoutLanguage(s.into())
    }

    pub fn name(s: impl Into<IStr>) -> Self {
        Value::NameWithoutLanguage(s.into())
    }

    pub fn uri(s: impl Into<IStr>) -> Self {
        Value::Uri(s.into())
    }

    pub fn charset(s: impl Into<IStr>) -> Self {
        Value::Charset(s.into())
    }

    pub fn natural_language(s: impl Into<IStr>) -> Self {
        Value::NaturalLanguage(s.into())
    }

    pub fn mime_media_type(s: impl Into<IStr>) -> Self {
        Value::MimeMediaType(s.into())
    }

    pub fn collection(attrs: Vec<Attribute>) -> Self {
        Value::Collection(Arc::new(attrs))
    }
}
