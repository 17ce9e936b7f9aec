// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bit-exact IPP wire codec (RFC 8010 §3). `encode` never fails — a `Message`
// built through the `Attribute`/`Value` constructors is always encodable —
// `decode` is the half that has to reject the outside world.

use std::sync::Arc;

use crate::attribute::{Attribute, Group};
use crate::error::DecodeError;
use crate::message::{Message, MessageKind};
use crate::tag::{GroupTag, ValueTag, COPY_FLAG_MASK};
use crate::value::{IppDateTime, ResolutionUnit, Value};

// ---------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------

pub fn encode(msg: &Message) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    out.push(msg.version_major);
    out.push(msg.version_minor);
    out.extend_from_slice(&msg.kind.code().to_be_bytes());
    out.extend_from_slice(&msg.request_id.to_be_bytes());

    for group in &msg.groups {
        out.push(group.tag.to_byte());
        for attr in &group.attributes {
            encode_attribute(&mut out, attr);
        }
    }

    out.push(GroupTag::EndOfAttributes.to_byte());
    out
}

fn encode_attribute(out: &mut Vec<u8>, attr: &Attribute) {
    for (i, value) in attr.values.iter().enumerate() {
        out.push(value.tag().to_byte());
        if i == 0 {
            write_len_prefixed(out, attr.name.as_bytes());
        } else {
            out.extend_from_slice(&0u16.to_be_bytes());
        }

        if let Value::Collection(members) = value {
            out.extend_from_slice(&0u16.to_be_bytes());
            for member in members.iter() {
                encode_member(out, member);
            }
            out.push(ValueTag::EndCollection.to_byte());
            out.extend_from_slice(&0u16.to_be_bytes()); // name length
            out.extend_from_slice(&0u16.to_be_bytes()); // value length
        } else {
            let bytes = encode_scalar(value);
            write_len_prefixed(out, &bytes);
        }
    }
}

fn encode_member(out: &mut Vec<u8>, member: &Attribute) {
    for (i, value) in member.values.iter().enumerate() {
        if i == 0 {
            out.push(ValueTag::MemberAttrName.to_byte());
            out.extend_from_slice(&0u16.to_be_bytes());
            write_len_prefixed(out, member.name.as_bytes());
        }

        out.push(value.tag().to_byte());
        out.extend_from_slice(&0u16.to_be_bytes());

        if let Value::Collection(nested) = value {
            out.extend_from_slice(&0u16.to_be_bytes());
            for nested_member in nested.iter() {
                encode_member(out, nested_member);
            }
            out.push(ValueTag::EndCollection.to_byte());
            out.extend_from_slice(&0u16.to_be_bytes());
            out.extend_from_slice(&0u16.to_be_bytes());
        } else {
            let bytes = encode_scalar(value);
            write_len_prefixed(out, &bytes);
        }
    }
}

fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(bytes);
}

fn encode_scalar(value: &Value) -> Vec<u8> {
    match value {
        Value::OutOfBand => Vec::new(),
        Value::Integer(v) | Value::Enum(v) => v.to_be_bytes().to_vec(),
        Value::Boolean(b) => vec![u8::from(*b)],
        Value::OctetString(bytes) => bytes.clone(),
        Value::DateTime(dt) => encode_date_time(dt),
        Value::Resolution { xres, yres, units } => {
            let mut v = Vec::with_capacity(9);
            v.extend_from_slice(&xres.to_be_bytes());
            v.extend_from_slice(&yres.to_be_bytes());
            v.push(units.to_byte());
            v
        }
        Value::Range { lo, hi } => {
            let mut v = Vec::with_capacity(8);
            v.extend_from_slice(&lo.to_be_bytes());
            v.extend_from_slice(&hi.to_be_bytes());
            v
        }
        Value::TextWithLanguage { language, text } => {
            encode_with_language(language.as_bytes(), text.as_bytes())
        }
        Value::NameWithLanguage { language, name } => {
            encode_with_language(language.as_bytes(), name.as_bytes())
        }
        Value::TextWithoutLanguage(s)
        | Value::NameWithoutLanguage(s)
        | Value::Keyword(s)
        | Value::Uri(s)
        | Value::UriScheme(s)
        | Value::Charset(s)
        | Value::NaturalLanguage(s)
        | Value::MimeMediaType(s) => s.as_bytes().to_vec(),
        Value::Collection(_) => Vec::new(),
    }
}

fn encode_with_language(language: &[u8], text: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(4 + language.len() + text.len());
    v.extend_from_slice(&(language.len() as u16).to_be_bytes());
    v.extend_from_slice(language);
    v.extend_from_slice(&(text.len() as u16).to_be_bytes());
    v.extend_from_slice(text);
    v
}

fn encode_date_time(dt: &IppDateTime) -> Vec<u8> {
    let year = dt.year.to_be_bytes();
    vec![
        year[0],
        year[1],
        dt.month,
        dt.day,
        dt.hour,
        dt.minutes,
        dt.seconds,
        dt.deci_seconds,
        dt.utc_sign,
        dt.utc_hours,
        dt.utc_minutes,
    ]
}

// ---------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn peek_u8(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn take_u8(&mut self) -> Result<u8, DecodeError> {
        let b = self.peek_u8().ok_or(DecodeError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn take_u16(&mut self) -> Result<u16, DecodeError> {
        if self.remaining() < 2 {
            return Err(DecodeError::Truncated);
        }
        let v = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    fn take_u32(&mut self) -> Result<u32, DecodeError> {
        if self.remaining() < 4 {
            return Err(DecodeError::Truncated);
        }
        let v = u32::from_be_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(v)
    }

    fn take_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::LengthOverflow {
                declared: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_name(&mut self) -> Result<String, DecodeError> {
        let len = self.take_u16()? as usize;
        let bytes = self.take_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }

    fn take_value_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.take_u16()? as usize;
        self.take_bytes(len)
    }
}

pub fn decode(buf: &[u8], is_request: bool) -> Result<Message, DecodeError> {
    decode_prefix(buf, is_request).map(|(msg, _consumed)| msg)
}

/// Decode a message from the start of `buf`, returning it alongside how many
/// bytes of `buf` it occupied. Print-Job's document data rides in the same
/// HTTP body right after the end-of-attributes tag, so the caller needs to
/// know where the IPP message ends and the document begins (spec.md §4.2).
pub fn decode_prefix(buf: &[u8], is_request: bool) -> Result<(Message, usize), DecodeError> {
    if buf.len() < 8 {
        return Err(DecodeError::Truncated);
    }
    let mut cur = Cursor::new(buf);
    let version_major = cur.take_u8()?;
    let version_minor = cur.take_u8()?;
    let code = cur.take_u16()?;
    let request_id = cur.take_u32()?;

    let kind = if is_request {
        MessageKind::Request(code)
    } else {
        MessageKind::Response(code)
    };
    let mut msg = Message {
        version_major,
        version_minor,
        kind,
        request_id,
        groups: Vec::new(),
    };

    loop {
        let tag = cur.take_u8()?;
        if tag == GroupTag::EndOfAttributes.to_byte() {
            return Ok((msg, cur.pos));
        }
        if !GroupTag::is_delimiter_byte(tag) {
            return Err(DecodeError::UnknownGroupTag(tag));
        }
        let group_tag = GroupTag::from_byte(tag).ok_or(DecodeError::UnknownGroupTag(tag))?;
        let mut group = Group::new(group_tag);
        decode_attributes(&mut cur, group_tag, &mut group)?;
        msg.groups.push(group);

        if cur.remaining() == 0 {
            return Err(DecodeError::MissingEndOfAttributes);
        }
    }
}

/// Decode attributes belonging to one group until the next delimiter byte
/// (a new group, or end-of-attributes) is encountered; that byte is left
/// unconsumed for the caller.
fn decode_attributes(
    cur: &mut Cursor<'_>,
    group_tag: GroupTag,
    group: &mut Group,
) -> Result<(), DecodeError> {
    let mut current: Option<Attribute> = None;

    loop {
        let Some(tag) = cur.peek_u8() else {
            break;
        };
        if GroupTag::is_delimiter_byte(tag) {
            break;
        }
        cur.pos += 1;
        let value_tag = ValueTag::from_byte(tag & COPY_FLAG_MASK).ok_or(DecodeError::UnknownValueTag(tag))?;
        let name = cur.take_name()?;

        if name.is_empty() {
            let attr = current.as_mut().ok_or(DecodeError::DanglingAdditionalValue)?;
            let value = decode_value(cur, value_tag)?;
            attr.values.push(value);
        } else {
            if let Some(attr) = current.take() {
                group.push(attr);
            }
            let value = decode_value(cur, value_tag)?;
            current = Some(Attribute::new(name, group_tag, value));
        }
    }

    if let Some(attr) = current.take() {
        group.push(attr);
    }
    Ok(())
}

fn decode_value(cur: &mut Cursor<'_>, tag: ValueTag) -> Result<Value, DecodeError> {
    if tag == ValueTag::BeginCollection {
        let len = cur.take_u16()? as usize;
        let _ = cur.take_bytes(len)?; // conventionally zero-length
        let members = decode_collection_members(cur)?;
        return Ok(Value::Collection(Arc::new(members)));
    }

    if tag.is_out_of_band() {
        let bytes = cur.take_value_bytes()?;
        if !bytes.is_empty() {
            return Err(DecodeError::OutOfBandValueNotEmpty(bytes.len()));
        }
        return Ok(Value::OutOfBand);
    }

    let bytes = cur.take_value_bytes()?;
    scalar_from_bytes(tag, bytes)
}

fn scalar_from_bytes(tag: ValueTag, bytes: &[u8]) -> Result<Value, DecodeError> {
    match tag {
        ValueTag::Integer => Ok(Value::Integer(read_i32(bytes)?)),
        ValueTag::Enum => Ok(Value::Enum(read_i32(bytes)?)),
        ValueTag::Boolean => Ok(Value::Boolean(bytes.first().copied().unwrap_or(0) != 0)),
        ValueTag::OctetString => Ok(Value::OctetString(bytes.to_vec())),
        ValueTag::DateTime => {
            if bytes.len() != 11 {
                return Err(DecodeError::BadDateTimeLength(bytes.len()));
            }
            Ok(Value::DateTime(IppDateTime {
                year: u16::from_be_bytes([bytes[0], bytes[1]]),
                month: bytes[2],
                day: bytes[3],
                hour: bytes[4],
                minutes: bytes[5],
                seconds: bytes[6],
                deci_seconds: bytes[7],
                utc_sign: bytes[8],
                utc_hours: bytes[9],
                utc_minutes: bytes[10],
            }))
        }
        ValueTag::Resolution => {
            if bytes.len() != 9 {
                return Err(DecodeError::BadResolutionLength(bytes.len()));
            }
            let xres = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let yres = i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
            let units = ResolutionUnit::from_byte(bytes[8])
                .ok_or(DecodeError::UnknownValueTag(bytes[8]))?;
            Ok(Value::Resolution { xres, yres, units })
        }
        ValueTag::RangeOfInteger => {
            if bytes.len() != 8 {
                return Err(DecodeError::BadRangeLength(bytes.len()));
            }
            let lo = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let hi = i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
            Ok(Value::Range { lo, hi })
        }
        ValueTag::TextWithLanguage => {
            let (language, text) = split_with_language(bytes)?;
            Ok(Value::TextWithLanguage { language, text })
        }
        ValueTag::NameWithLanguage => {
            let (language, name) = split_with_language(bytes)?;
            Ok(Value::NameWithLanguage { language, name })
        }
        ValueTag::TextWithoutLanguage => Ok(Value::TextWithoutLanguage(to_istr(bytes)?)),
        ValueTag::NameWithoutLanguage => Ok(Value::NameWithoutLanguage(to_istr(bytes)?)),
        ValueTag::Keyword => Ok(Value::Keyword(to_istr(bytes)?)),
        ValueTag::Uri => Ok(Value::Uri(to_istr(bytes)?)),
        ValueTag::UriScheme => Ok(Value::UriScheme(to_istr(bytes)?)),
        ValueTag::Charset => Ok(Value::Charset(to_istr(bytes)?)),
        ValueTag::NaturalLanguage => Ok(Value::NaturalLanguage(to_istr(bytes)?)),
        ValueTag::MimeMediaType => Ok(Value::MimeMediaType(to_istr(bytes)?)),
        ValueTag::BeginCollection
        | ValueTag::EndCollection
        | ValueTag::MemberAttrName
        | ValueTag::Unsupported
        | ValueTag::Unknown
        | ValueTag::NoValue => Err(DecodeError::UnknownValueTag(tag.to_byte())),
    }
}

fn to_istr(bytes: &[u8]) -> Result<Arc<str>, DecodeError> {
    std::str::from_utf8(bytes)
        .map(Arc::from)
        .map_err(|_| DecodeError::InvalidUtf8)
}

fn read_i32(bytes: &[u8]) -> Result<i32, DecodeError> {
    if bytes.len() != 4 {
        return Err(DecodeError::LengthOverflow {
            declared: 4,
            remaining: bytes.len(),
        });
    }
    Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn split_with_language(bytes: &[u8]) -> Result<(Arc<str>, Arc<str>), DecodeError> {
    if bytes.len() < 2 {
        return Err(DecodeError::Truncated);
    }
    let lang_len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    if bytes.len() < 2 + lang_len + 2 {
        return Err(DecodeError::Truncated);
    }
    let language = to_istr(&bytes[2..2 + lang_len])?;
    let rest = &bytes[2 + lang_len..];
    let text_len = u16::from_be_bytes([rest[0], rest[1]]) as usize;
    if rest.len() < 2 + text_len {
        return Err(DecodeError::Truncated);
    }
    let text = to_istr(&rest[2..2 + text_len])?;
    Ok((language, text))
}

/// Decode the member attributes of a collection, starting right after its
/// `begin-collection` header, stopping at (and consuming) the matching
/// `end-collection` tag.
fn decode_collection_members(cur: &mut Cursor<'_>) -> Result<Vec<Attribute>, DecodeError> {
    let mut members = Vec::new();

    loop {
        let tag = cur.take_u8()?;
        if tag == ValueTag::EndCollection.to_byte() {
            let name_len = cur.take_u16()? as usize;
            if name_len != 0 {
                return Err(DecodeError::UnmatchedEndCollection);
            }
            let value_len = cur.take_u16()? as usize;
            if value_len != 0 {
                return Err(DecodeError::UnmatchedEndCollection);
            }
            return Ok(members);
        }
        if tag != ValueTag::MemberAttrName.to_byte() {
            return Err(DecodeError::MemberAttrNameOutsideCollection);
        }
        let name_len = cur.take_u16()? as usize;
        if name_len != 0 {
            return Err(DecodeError::MemberAttrNameOutsideCollection);
        }
        let member_name_bytes = cur.take_value_bytes()?;
        let member_name = String::from_utf8(member_name_bytes.to_vec())
            .map_err(|_| DecodeError::InvalidUtf8)?;

        let value_tag_byte = cur.take_u8()?;
        let value_name_len = cur.take_u16()? as usize;
        if value_name_len != 0 {
            return Err(DecodeError::MemberWithoutValue(member_name));
        }
        let value_tag = ValueTag::from_byte(value_tag_byte & COPY_FLAG_MASK)
            .ok_or(DecodeError::UnknownValueTag(value_tag_byte))?;
        let first_value = decode_value(cur, value_tag)?;
        let mut values = vec![first_value];

        loop {
            let Some(next_tag) = cur.peek_u8() else {
                return Err(DecodeError::UnterminatedCollection(member_name));
            };
            if next_tag == ValueTag::MemberAttrName.to_byte()
                || next_tag == ValueTag::EndCollection.to_byte()
            {
                break;
            }
            cur.pos += 1;
            let name_len = cur.take_u16()? as usize;
            if name_len != 0 {
                return Err(DecodeError::MemberWithoutValue(member_name));
            }
            let value_tag = ValueTag::from_byte(next_tag & COPY_FLAG_MASK)
                .ok_or(DecodeError::UnknownValueTag(next_tag))?;
            values.push(decode_value(cur, value_tag)?);
        }

        members.push(Attribute::new_multi(member_name, GroupTag::Operation, values));
    }
}
