use thiserror::Error;

use crate::value::{Atom, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Immutable Key Dictionary. Cannot modify the key '{key}'.")]
pub struct KeyAlreadySet<K> {
    pub key: K,
}

impl<K> KeyAlreadySet<K> {
    pub fn new(key: K) -> Self {
        Self { key }
    }

    pub fn into_key(self) -> K {
        self.key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("'{kind}' object does not support {operation}")]
    Unsupported {
        kind: ValueKind,
        operation: &'static str,
    },
}

impl ValueError {
    pub(crate) fn unsupported(kind: ValueKind, operation: &'static str) -> Self {
        Self::Unsupported { kind, operation }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FromValueError {
    #[error(transparent)]
    NotAMapping(#[from] ValueError),
    #[error(transparent)]
    KeyAlreadySet(#[from] KeyAlreadySet<Atom>),
}

#[cfg(test)]
mod tests {
    use super::{KeyAlreadySet, ValueError};
    use crate::value::ValueKind;

    #[test]
    fn test_key_already_set_message() {
        let err = KeyAlreadySet::new("a");
        assert_eq!(
            err.to_string(),
            "Immutable Key Dictionary. Cannot modify the key 'a'."
        );
        assert_eq!(err.into_key(), "a");
    }

    #[test]
    fn test_unsupported_message() {
        let err = ValueError::unsupported(ValueKind::Tuple, "append");
        assert_eq!(err.to_string(), "'tuple' object does not support append");
    }
}
