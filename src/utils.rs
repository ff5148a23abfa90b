use std::{borrow::Borrow, collections::HashMap, hash::Hash, mem, slice};

#[derive(Debug, Clone)]
pub struct InsertionOrderHashMap<K, V>
where
    K: Hash + Eq,
{
    map: HashMap<K, V>,
    keys: Vec<K>,
}

impl<K, V> InsertionOrderHashMap<K, V>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            keys: Vec::new(),
        }
    }

    pub fn insert(&mut self, k: K, v: V) -> Option<V>
    where
        K: Clone,
    {
        if let Some(slot) = self.map.get_mut(&k) {
            return Some(mem::replace(slot, v));
        }

        self.keys.push(k.clone());
        self.map.insert(k, v);
        None
    }

    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(k)
    }

    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(k)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.keys.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.keys.iter().map(|k| &self.map[k])
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            keys: self.keys.iter(),
            map: &self.map,
        }
    }
}

pub struct Iter<'a, K, V> {
    keys: slice::Iter<'a, K>,
    map: &'a HashMap<K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Hash + Eq,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        let k = self.keys.next()?;
        Some((k, &map[k]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> where K: Hash + Eq {}

impl<K, V> Default for InsertionOrderHashMap<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

// Order is not part of equality, same as for plain dictionaries.
impl<K, V> PartialEq for InsertionOrderHashMap<K, V>
where
    K: Hash + Eq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K, V> FromIterator<(K, V)> for InsertionOrderHashMap<K, V>
where
    K: Hash + Eq + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut result = Self::new();
        for (k, v) in iter {
            result.insert(k, v);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::InsertionOrderHashMap;

    #[test]
    fn test_keys_follow_first_insertion() {
        let mut map = InsertionOrderHashMap::new();
        map.insert("b", 1);
        map.insert("a", 2);
        map.insert("c", 3);

        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut map = InsertionOrderHashMap::new();
        map.insert("a", 1);
        map.insert("b", 2);

        assert_eq!(map.insert("a", 10), Some(1));
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            vec![("a", 10), ("b", 2)]
        );
    }

    #[test]
    fn test_lookup_by_borrowed_key() {
        let map: InsertionOrderHashMap<String, i32> =
            [("one".to_string(), 1)].into_iter().collect();

        assert_eq!(map.get("one"), Some(&1));
        assert!(map.contains_key("one"));
        assert!(!map.contains_key("two"));
    }

    #[test]
    fn test_equality_ignores_order() {
        let left: InsertionOrderHashMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
        let right: InsertionOrderHashMap<&str, i32> = [("b", 2), ("a", 1)].into_iter().collect();

        assert_eq!(left, right);
    }
}
