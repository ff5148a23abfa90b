use std::{
    borrow::Borrow,
    fmt::{self, Display},
    hash::Hash,
    sync::Arc,
};

use tracing::{debug, trace};

use crate::{
    conversion::ConversionTable,
    error::{FromValueError, KeyAlreadySet},
    utils::{self, InsertionOrderHashMap},
    value::{Atom, Repr, Value},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WritePolicy {
    // falsy values are placeholders
    #[default]
    Truthiness,
    Presence,
}

impl WritePolicy {
    pub fn is_final(self, stored: &Value) -> bool {
        match self {
            WritePolicy::Truthiness => stored.is_truthy(),
            WritePolicy::Presence => true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WriteOnceMap<K>
where
    K: Hash + Eq,
{
    entries: InsertionOrderHashMap<K, Value>,
    table: Arc<ConversionTable>,
    policy: WritePolicy,
}

impl<K> WriteOnceMap<K>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        Self {
            entries: InsertionOrderHashMap::new(),
            table: ConversionTable::shared(),
            policy: WritePolicy::default(),
        }
    }

    pub fn with_table(mut self, table: Arc<ConversionTable>) -> Self {
        self.table = table;
        self
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn table(&self) -> &Arc<ConversionTable> {
        &self.table
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&Value>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a Value) -> &'a Value
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).unwrap_or(default)
    }

    pub fn value<Q>(&self, key: &Q) -> Value
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.values()
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.entries.iter(),
        }
    }
}

impl<K> WriteOnceMap<K>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    pub fn set(&mut self, key: K, value: impl Into<Value>) -> Result<(), KeyAlreadySet<K>> {
        let placeholder = match self.entries.get(&key) {
            Some(stored) if self.policy.is_final(stored) => {
                debug!(?key, stored = %stored, "rejected write to a key that is already set");
                return Err(KeyAlreadySet::new(key));
            }
            Some(_) => true,
            None => false,
        };

        let value = value.into();
        let (value, converted) = match self.table.resolve(&value) {
            Some(converter) => (converter(value), true),
            None => (value, false),
        };

        trace!(?key, kind = %value.kind(), converted, placeholder, "stored entry");
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn try_extend<I, V>(&mut self, pairs: I) -> Result<(), KeyAlreadySet<K>>
    where
        I: IntoIterator<Item = (K, V)>,
        V: Into<Value>,
    {
        for (key, value) in pairs {
            self.set(key, value)?;
        }
        Ok(())
    }

    pub fn from_pairs<I, V>(pairs: I) -> Result<Self, KeyAlreadySet<K>>
    where
        I: IntoIterator<Item = (K, V)>,
        V: Into<Value>,
    {
        let mut map = Self::new();
        map.try_extend(pairs)?;
        Ok(map)
    }
}

impl<K> Default for WriteOnceMap<K>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TryFrom<Vec<(K, Value)>> for WriteOnceMap<K>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    type Error = KeyAlreadySet<K>;

    fn try_from(pairs: Vec<(K, Value)>) -> Result<Self, Self::Error> {
        Self::from_pairs(pairs)
    }
}

impl TryFrom<&Value> for WriteOnceMap<Atom> {
    type Error = FromValueError;

    fn try_from(mapping: &Value) -> Result<Self, Self::Error> {
        let pairs = mapping.items()?;
        Ok(Self::from_pairs(pairs)?)
    }
}

pub struct Iter<'a, K> {
    inner: utils::Iter<'a, K, Value>,
}

impl<'a, K> Iterator for Iter<'a, K>
where
    K: Hash + Eq,
{
    type Item = (&'a K, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> where K: Hash + Eq {}

impl<'a, K> IntoIterator for &'a WriteOnceMap<K>
where
    K: Hash + Eq,
{
    type Item = (&'a K, &'a Value);
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K> Display for WriteOnceMap<K>
where
    K: Hash + Eq + Repr,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            k.fmt_repr(f)?;
            write!(f, ": ")?;
            v.fmt_repr(f)?;
        }
        write!(f, "}}")
    }
}
