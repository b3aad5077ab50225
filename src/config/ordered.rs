//! Serde adapter storing a name → entry table as an ordered list
//!
//! Bindings and combos are evaluated in the order they are written in the
//! config file, so the table order has to survive the round trip. Use with
//! `#[serde(with = "ordered")]` on a `Vec<(String, T)>` field.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

pub fn serialize<S, T>(entries: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.collect_map(entries.iter().map(|(name, entry)| (name, entry)))
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    deserializer.deserialize_map(OrderedVisitor(PhantomData))
}

struct OrderedVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for OrderedVisitor<T>
where
    T: Deserialize<'de>,
{
    type Value = Vec<(String, T)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a table of named entries")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, entry)) = access.next_entry::<String, T>()? {
            entries.push((name, entry));
        }
        Ok(entries)
    }
}
