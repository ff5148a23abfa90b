use std::{
    fmt,
    rc::Rc,
    sync::{Arc, OnceLock},
};

use tracing::debug;

use crate::value::{MappingView, Value};

pub type Predicate = fn(&Value) -> bool;
pub type Converter = fn(Value) -> Value;

#[derive(Clone, Copy)]
pub struct ConversionRule {
    name: &'static str,
    predicate: Predicate,
    converter: Converter,
}

impl ConversionRule {
    pub const fn new(name: &'static str, predicate: Predicate, converter: Converter) -> Self {
        Self {
            name,
            predicate,
            converter,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }

    pub fn converter(&self) -> Converter {
        self.converter
    }
}

impl fmt::Debug for ConversionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn is_mapping(value: &Value) -> bool {
    matches!(value, Value::Dict(_))
}

// The view keeps the dict's storage alive and readable.
fn freeze_mapping(value: Value) -> Value {
    match value {
        Value::Dict(storage) => Value::MappingView(MappingView::new(storage)),
        other => other,
    }
}

fn is_mutable_sequence(value: &Value) -> bool {
    matches!(value, Value::List(_))
}

fn freeze_sequence(value: Value) -> Value {
    match value {
        Value::List(storage) => {
            let items = match Rc::try_unwrap(storage) {
                Ok(cell) => cell.into_inner(),
                Err(shared) => shared.borrow().clone(),
            };
            Value::Tuple(Rc::from(items))
        }
        other => other,
    }
}

fn is_mutable_set(value: &Value) -> bool {
    matches!(value, Value::Set(_))
}

fn freeze_set(value: Value) -> Value {
    match value {
        Value::Set(storage) => {
            let items = match Rc::try_unwrap(storage) {
                Ok(cell) => cell.into_inner(),
                Err(shared) => shared.borrow().clone(),
            };
            Value::FrozenSet(Rc::new(items))
        }
        other => other,
    }
}

pub const MAPPING_RULE: ConversionRule =
    ConversionRule::new("mapping", is_mapping, freeze_mapping);
pub const SEQUENCE_RULE: ConversionRule =
    ConversionRule::new("sequence", is_mutable_sequence, freeze_sequence);
pub const SET_RULE: ConversionRule = ConversionRule::new("set", is_mutable_set, freeze_set);

static SHARED: OnceLock<Arc<ConversionTable>> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct ConversionTable {
    rules: Vec<ConversionRule>,
}

impl ConversionTable {
    pub fn shared() -> Arc<Self> {
        Arc::clone(SHARED.get_or_init(|| {
            let table = Self::builtin();
            debug!(rules = table.len(), "built shared conversion table");
            Arc::new(table)
        }))
    }

    pub fn builtin() -> Self {
        Self::builder()
            .rule(MAPPING_RULE)
            .rule(SEQUENCE_RULE)
            .rule(SET_RULE)
            .build()
    }

    pub fn builder() -> ConversionTableBuilder {
        ConversionTableBuilder::default()
    }

    pub fn resolve(&self, value: &Value) -> Option<Converter> {
        self.rules
            .iter()
            .find(|rule| rule.matches(value))
            .map(ConversionRule::converter)
    }

    pub fn convert(&self, value: Value) -> Value {
        match self.resolve(&value) {
            Some(converter) => converter(value),
            None => value,
        }
    }

    pub fn rules(&self) -> &[ConversionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ConversionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Default)]
pub struct ConversionTableBuilder {
    rules: Vec<ConversionRule>,
}

impl ConversionTableBuilder {
    pub fn rule(mut self, rule: ConversionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> ConversionTable {
        ConversionTable { rules: self.rules }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::{ConversionRule, ConversionTable, SEQUENCE_RULE};
    use crate::value::{Atom, Value, ValueKind};

    fn rule_names(table: &ConversionTable) -> Vec<&'static str> {
        table.rules().iter().map(ConversionRule::name).collect()
    }

    #[test]
    fn test_shared_is_singleton() {
        let first = ConversionTable::shared();
        let second = ConversionTable::shared();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(rule_names(&first), rule_names(&second));
        assert_eq!(rule_names(&first), vec!["mapping", "sequence", "set"]);
    }

    #[test]
    fn test_shared_from_many_threads() {
        let handles = (0..8)
            .map(|_| thread::spawn(|| Arc::as_ptr(&ConversionTable::shared()) as usize))
            .collect::<Vec<_>>();
        let addresses = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>();

        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_builtin_is_not_shared() {
        let fresh = Arc::new(ConversionTable::builtin());
        assert!(!Arc::ptr_eq(&fresh, &ConversionTable::shared()));
        assert_eq!(rule_names(&fresh), rule_names(&ConversionTable::shared()));
    }

    #[test]
    fn test_list_becomes_tuple() {
        let table = ConversionTable::builtin();
        let list = Value::list([Value::Int(1), Value::Int(2), Value::Int(3)]);
        let alias = list.clone();

        let converted = table.convert(list);
        alias.push(Value::Int(4)).unwrap();

        assert_eq!(
            converted,
            Value::tuple([Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_set_becomes_frozen_set() {
        let table = ConversionTable::builtin();
        let converted = table.convert(Value::set([Atom::Int(1), Atom::Int(2)]));

        assert_eq!(converted.kind(), ValueKind::FrozenSet);
        assert!(converted.add(Atom::Int(3)).is_err());
        assert_eq!(converted.len().unwrap(), 2);
    }

    #[test]
    fn test_dict_becomes_view_over_same_storage() {
        let table = ConversionTable::builtin();
        let dict = Value::dict([(Atom::from("c"), Value::str("c"))]);

        let converted = table.convert(dict.clone());
        match &converted {
            Value::MappingView(view) => assert!(view.shares_storage_with(&dict)),
            other => panic!("expected a mapping view, got {other:?}"),
        }

        dict.set_item(Atom::from("a"), Value::str("a")).unwrap();
        assert_eq!(
            converted.get_item(&Atom::from("a")).unwrap(),
            Some(Value::str("a"))
        );
        assert!(converted.set_item(Atom::from("c"), Value::None).is_err());
    }

    #[test]
    fn test_immutable_and_scalar_values_pass_through() {
        let table = ConversionTable::builtin();

        assert!(table.resolve(&Value::tuple([Value::Int(1)])).is_none());
        assert!(table.resolve(&Value::frozen_set([Atom::Int(1)])).is_none());
        assert!(table.resolve(&Value::str("c")).is_none());
        assert!(table.resolve(&Value::None).is_none());
        assert_eq!(table.convert(Value::Int(7)), Value::Int(7));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        fn is_any_list(value: &Value) -> bool {
            matches!(value, Value::List(_))
        }
        fn empty_tuple(_: Value) -> Value {
            Value::tuple([])
        }

        let table = ConversionTable::builder()
            .rule(ConversionRule::new("discard", is_any_list, empty_tuple))
            .rule(SEQUENCE_RULE)
            .build();

        assert_eq!(table.convert(Value::list([Value::Int(1)])), Value::tuple([]));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_empty_table_converts_nothing() {
        let table = ConversionTable::builder().build();
        let list = Value::list([Value::Int(1)]);

        assert!(table.is_empty());
        assert_eq!(table.convert(list.clone()).kind(), ValueKind::List);
    }
}
