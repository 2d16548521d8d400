//! Serde deserializer over a borrowed document value.
//!
//! Each node knows its [`KeyPath`], so errors raised anywhere below the root
//! name the offending field. Before handing a value to the visitor the
//! deserializer compares the value's kind with the kind the target requests
//! and consults the decoder's hooks on a mismatch.

use std::collections::BTreeSet;
use std::iter::Enumerate;
use std::slice;

use serde::de::value::{StrDeserializer, StringDeserializer};
use serde::de::{
    self, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, VariantAccess,
    Visitor,
};
use serde_json::Value;
use tracing::warn;
use uncased::UncasedStr;

use super::Decoder;
use super::error::DecodeError;
use super::kind::{TargetKind, ValueKind};
use super::path::KeyPath;
use crate::document::Mapping;

pub(super) struct ValueDeserializer<'a> {
    value: &'a Value,
    path: KeyPath,
    decoder: &'a Decoder,
}

impl<'a> ValueDeserializer<'a> {
    pub(super) const fn new(value: &'a Value, path: KeyPath, decoder: &'a Decoder) -> Self {
        Self {
            value,
            path,
            decoder,
        }
    }

    /// Run the matching hooks when the value's kind does not satisfy
    /// `target`.
    fn hooked(&self, target: TargetKind) -> Result<Option<Value>, DecodeError> {
        let kind = ValueKind::of(self.value);
        if target.accepts(kind) {
            return Ok(None);
        }
        for hook in self.decoder.hooks() {
            if hook.source() != kind || hook.target() != target {
                continue;
            }
            match hook.convert(&self.path, self.value) {
                Ok(Some(converted)) => return Ok(Some(converted)),
                Ok(None) => {}
                Err(source) => return Err(DecodeError::hook(self.path.clone(), source)),
            }
        }
        Ok(None)
    }

    fn dispatch<'de, V: Visitor<'de>>(
        self,
        target: TargetKind,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        match self.hooked(target)? {
            Some(converted) => ValueDeserializer::new(&converted, self.path, self.decoder).visit(visitor),
            None => self.visit(visitor),
        }
    }

    /// Hand the value to `visitor` according to its own shape.
    fn visit<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(flag) => visitor.visit_bool(*flag),
            Value::Number(number) => {
                if let Some(unsigned) = number.as_u64() {
                    visitor.visit_u64(unsigned)
                } else if let Some(signed) = number.as_i64() {
                    visitor.visit_i64(signed)
                } else {
                    visitor.visit_f64(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(text) => visitor.visit_str(text),
            Value::Array(items) => {
                let mut access = SeqAccessor {
                    items: items.iter().enumerate(),
                    path: &self.path,
                    decoder: self.decoder,
                };
                let value = visitor.visit_seq(&mut access)?;
                access.finish(value)
            }
            Value::Object(map) => {
                let entries = map.iter().map(|(key, value)| (key.clone(), key, value)).collect();
                visitor.visit_map(MapAccessor::new(entries, &self.path, self.decoder))
            }
        }
    }

    fn visit_struct<'de, V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let Value::Object(map) = self.value else {
            return self.visit(visitor);
        };
        let entries: Vec<Entry<'_>> = if self.decoder.is_case_sensitive() {
            map.iter().map(|(key, value)| (key.clone(), key, value)).collect()
        } else {
            fold_keys(map, fields, &self.path)
        };
        visitor.visit_map(MapAccessor::new(entries, &self.path, self.decoder))
    }
}

/// Pair each mapping entry with the struct field it should populate.
///
/// Exact matches always win. A key matching a field only when case is
/// ignored is renamed to that field unless another key already claims it.
fn fold_keys<'v>(
    map: &'v Mapping,
    fields: &'static [&'static str],
    path: &KeyPath,
) -> Vec<Entry<'v>> {
    let mut claimed: BTreeSet<&str> = fields
        .iter()
        .copied()
        .filter(|field| map.contains_key(*field))
        .collect();
    map.iter()
        .map(|(key, value)| {
            if fields.contains(&key.as_str()) {
                return (key.clone(), key, value);
            }
            let folded = fields
                .iter()
                .copied()
                .find(|field| UncasedStr::new(field) == UncasedStr::new(key));
            match folded {
                Some(field) => {
                    if claimed.insert(field) {
                        return (field.to_owned(), key, value);
                    }
                    warn!(
                        key = %path.key(key.as_str()),
                        field,
                        "ignoring key that differs only in case from another key for the same field"
                    );
                    (key.clone(), key, value)
                }
                None => (key.clone(), key, value),
            }
        })
        .collect()
}

macro_rules! deserialize_hooked {
    ($($method:ident => $target:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
                self.dispatch(TargetKind::$target, visitor)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'_> {
    type Error = DecodeError;

    deserialize_hooked! {
        deserialize_bool => Boolean,
        deserialize_i8 => Integer,
        deserialize_i16 => Integer,
        deserialize_i32 => Integer,
        deserialize_i64 => Integer,
        deserialize_i128 => Integer,
        deserialize_u8 => Integer,
        deserialize_u16 => Integer,
        deserialize_u32 => Integer,
        deserialize_u64 => Integer,
        deserialize_u128 => Integer,
        deserialize_f32 => Float,
        deserialize_f64 => Float,
        deserialize_char => String,
        deserialize_str => String,
        deserialize_string => String,
        deserialize_seq => Sequence,
        deserialize_map => Mapping,
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.visit(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.visit(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.visit(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.visit(visitor)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.visit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.dispatch(TargetKind::Sequence, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.dispatch(TargetKind::Sequence, visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        match self.hooked(TargetKind::Mapping)? {
            Some(converted) => {
                ValueDeserializer::new(&converted, self.path, self.decoder).visit_struct(fields, visitor)
            }
            None => self.visit_struct(fields, visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::String(variant) => {
                let access: StrDeserializer<'_, DecodeError> = variant.as_str().into_deserializer();
                visitor.visit_enum(access)
            }
            Value::Object(map) if map.len() == 1 => {
                let Some((variant, value)) = map.iter().next() else {
                    return Err(de::Error::custom("expected a single-key mapping for an enum"));
                };
                visitor.visit_enum(EnumAccessor {
                    variant,
                    value: ValueDeserializer::new(value, self.path.key(variant.as_str()), self.decoder),
                })
            }
            other => Err(de::Error::custom(format!(
                "invalid type: {}, expected a string or a single-key mapping for an enum",
                ValueKind::of(other)
            ))),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.visit(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }
}

struct SeqAccessor<'p, 'v> {
    items: Enumerate<slice::Iter<'v, Value>>,
    path: &'p KeyPath,
    decoder: &'p Decoder,
}

impl SeqAccessor<'_, '_> {
    fn finish<T>(self, value: T) -> Result<T, DecodeError> {
        let remaining = self.items.len();
        if remaining == 0 {
            Ok(value)
        } else {
            Err(de::Error::custom(format!(
                "invalid length: {remaining} trailing element(s) left unread"
            )))
        }
    }
}

impl<'de> SeqAccess<'de> for SeqAccessor<'_, '_> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DecodeError> {
        let Some((index, item)) = self.items.next() else {
            return Ok(None);
        };
        let path = self.path.index(index);
        seed.deserialize(ValueDeserializer::new(item, path.clone(), self.decoder))
            .map(Some)
            .map_err(|err| err.or_at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Mapping entries as `(field name, key in the document, value)`.
type Entry<'v> = (String, &'v String, &'v Value);

struct MapAccessor<'a, 'v> {
    entries: std::vec::IntoIter<Entry<'v>>,
    pending: Option<(&'v String, &'v Value)>,
    path: &'a KeyPath,
    decoder: &'a Decoder,
}

impl<'a, 'v> MapAccessor<'a, 'v> {
    fn new(entries: Vec<Entry<'v>>, path: &'a KeyPath, decoder: &'a Decoder) -> Self {
        Self {
            entries: entries.into_iter(),
            pending: None,
            path,
            decoder,
        }
    }
}

impl<'de> MapAccess<'de> for MapAccessor<'_, '_> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        let Some((field, key, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.pending = Some((key, value));
        let name: StringDeserializer<DecodeError> = field.into_deserializer();
        seed.deserialize(name)
            .map(Some)
            .map_err(|err| err.or_at(&self.path.key(key.as_str())))
    }

    fn next_value_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<T::Value, DecodeError> {
        let Some((key, value)) = self.pending.take() else {
            return Err(de::Error::custom("value requested before its key"));
        };
        let path = self.path.key(key.as_str());
        seed.deserialize(ValueDeserializer::new(value, path.clone(), self.decoder))
            .map_err(|err| err.or_at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

struct EnumAccessor<'a> {
    variant: &'a String,
    value: ValueDeserializer<'a>,
}

impl<'de, 'a> EnumAccess<'de> for EnumAccessor<'a> {
    type Error = DecodeError;
    type Variant = ValueDeserializer<'a>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), DecodeError> {
        let name: StrDeserializer<'_, DecodeError> = self.variant.as_str().into_deserializer();
        let variant = seed.deserialize(name)?;
        Ok((variant, self.value))
    }
}

impl<'de> VariantAccess<'de> for ValueDeserializer<'_> {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), DecodeError> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(<DecodeError as de::Error>::custom(format!(
                "invalid type: {}, expected a unit variant",
                ValueKind::of(other)
            ))
            .or_at(&self.path)),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, DecodeError> {
        let path = self.path.clone();
        seed.deserialize(self).map_err(|err| err.or_at(&path))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, DecodeError> {
        let path = self.path.clone();
        self.visit(visitor).map_err(|err| err.or_at(&path))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let path = self.path.clone();
        self.visit_struct(fields, visitor).map_err(|err| err.or_at(&path))
    }
}
