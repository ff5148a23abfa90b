use std::{
    cell::RefCell,
    collections::HashSet,
    fmt::{self, Display},
    rc::Rc,
};

use crate::{error::ValueError, utils::InsertionOrderHashMap};

pub type ListStorage = Rc<RefCell<Vec<Value>>>;
pub type SetStorage = Rc<RefCell<HashSet<Atom>>>;
pub type DictStorage = Rc<RefCell<InsertionOrderHashMap<Atom, Value>>>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Atom {
    None,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
}

impl Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::None => write!(f, "None"),
            Atom::Bool(true) => write!(f, "True"),
            Atom::Bool(false) => write!(f, "False"),
            Atom::Int(n) => write!(f, "{n}"),
            Atom::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Atom {
    fn from(b: bool) -> Self {
        Atom::Bool(b)
    }
}

impl From<i64> for Atom {
    fn from(n: i64) -> Self {
        Atom::Int(n)
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Atom::Str(Rc::from(s))
    }
}

impl From<String> for Atom {
    fn from(s: String) -> Self {
        Atom::Str(Rc::from(s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Set,
    FrozenSet,
    Dict,
    MappingView,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::None => "NoneType",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
            ValueKind::List => "list",
            ValueKind::Tuple => "tuple",
            ValueKind::Set => "set",
            ValueKind::FrozenSet => "frozenset",
            ValueKind::Dict => "dict",
            ValueKind::MappingView => "mappingproxy",
        }
    }

    pub fn is_mutable(self) -> bool {
        matches!(self, ValueKind::List | ValueKind::Set | ValueKind::Dict)
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Clones share the storage of mutable containers.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(ListStorage),
    Tuple(Rc<[Value]>),
    Set(SetStorage),
    FrozenSet(Rc<HashSet<Atom>>),
    Dict(DictStorage),
    MappingView(MappingView),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    pub fn set(items: impl IntoIterator<Item = Atom>) -> Self {
        Value::Set(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn frozen_set(items: impl IntoIterator<Item = Atom>) -> Self {
        Value::FrozenSet(Rc::new(items.into_iter().collect()))
    }

    pub fn dict(items: impl IntoIterator<Item = (Atom, Value)>) -> Self {
        Value::Dict(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::Set(_) => ValueKind::Set,
            Value::FrozenSet(_) => ValueKind::FrozenSet,
            Value::Dict(_) => ValueKind::Dict,
            Value::MappingView(_) => ValueKind::MappingView,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Set(items) => !items.borrow().is_empty(),
            Value::FrozenSet(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.borrow().is_empty(),
            Value::MappingView(view) => !view.is_empty(),
        }
    }

    pub fn len(&self) -> Result<usize, ValueError> {
        match self {
            Value::Str(s) => Ok(s.chars().count()),
            Value::List(items) => Ok(items.borrow().len()),
            Value::Tuple(items) => Ok(items.len()),
            Value::Set(items) => Ok(items.borrow().len()),
            Value::FrozenSet(items) => Ok(items.len()),
            Value::Dict(entries) => Ok(entries.borrow().len()),
            Value::MappingView(view) => Ok(view.len()),
            _ => Err(ValueError::unsupported(self.kind(), "len()")),
        }
    }

    pub fn push(&self, item: Value) -> Result<(), ValueError> {
        match self {
            Value::List(items) => {
                items.borrow_mut().push(item);
                Ok(())
            }
            _ => Err(ValueError::unsupported(self.kind(), "append")),
        }
    }

    pub fn add(&self, item: Atom) -> Result<(), ValueError> {
        match self {
            Value::Set(items) => {
                items.borrow_mut().insert(item);
                Ok(())
            }
            _ => Err(ValueError::unsupported(self.kind(), "add")),
        }
    }

    pub fn update(&self, items: impl IntoIterator<Item = Atom>) -> Result<(), ValueError> {
        match self {
            Value::Set(existing) => {
                existing.borrow_mut().extend(items);
                Ok(())
            }
            _ => Err(ValueError::unsupported(self.kind(), "update")),
        }
    }

    pub fn set_item(&self, key: Atom, value: Value) -> Result<(), ValueError> {
        match self {
            Value::Dict(entries) => {
                entries.borrow_mut().insert(key, value);
                Ok(())
            }
            _ => Err(ValueError::unsupported(self.kind(), "item assignment")),
        }
    }

    pub fn get_item(&self, key: &Atom) -> Result<Option<Value>, ValueError> {
        match self {
            Value::Dict(entries) => Ok(entries.borrow().get(key).cloned()),
            Value::MappingView(view) => Ok(view.get(key)),
            _ => Err(ValueError::unsupported(self.kind(), "subscript")),
        }
    }

    pub fn contains(&self, item: &Atom) -> Result<bool, ValueError> {
        match self {
            Value::Set(items) => Ok(items.borrow().contains(item)),
            Value::FrozenSet(items) => Ok(items.contains(item)),
            Value::Dict(entries) => Ok(entries.borrow().contains_key(item)),
            Value::MappingView(view) => Ok(view.contains_key(item)),
            Value::List(items) => {
                let needle = Value::from(item.clone());
                Ok(items.borrow().iter().any(|v| *v == needle))
            }
            Value::Tuple(items) => {
                let needle = Value::from(item.clone());
                Ok(items.iter().any(|v| *v == needle))
            }
            _ => Err(ValueError::unsupported(self.kind(), "membership test")),
        }
    }

    pub fn items(&self) -> Result<Vec<(Atom, Value)>, ValueError> {
        match self {
            Value::Dict(entries) => Ok(entries
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()),
            Value::MappingView(view) => Ok(view.items()),
            _ => Err(ValueError::unsupported(self.kind(), "items()")),
        }
    }
}

impl From<Atom> for Value {
    fn from(atom: Atom) -> Self {
        match atom {
            Atom::None => Value::None,
            Atom::Bool(b) => Value::Bool(b),
            Atom::Int(n) => Value::Int(n),
            Atom::Str(s) => Value::Str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

pub trait Repr {
    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl Repr for Atom {
    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Str(s) => Repr::fmt_repr(&**s, f),
            other => write!(f, "{other}"),
        }
    }
}

impl Repr for str {
    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{self}'")
    }
}

impl Repr for String {
    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt_repr(f)
    }
}

impl Repr for i64 {
    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Repr for bool {
    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Atom::Bool(*self).fmt_repr(f)
    }
}

impl Repr for Value {
    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(self, f, &mut Vec::new())
    }
}

impl<T: Repr + ?Sized> Repr for &T {
    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt_repr(f)
    }
}

fn write_joined<T: Repr>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        item.fmt_repr(f)?;
    }
    Ok(())
}

fn write_values<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = &'a Value>,
    seen: &mut Vec<*const ()>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_value(item, f, seen)?;
    }
    Ok(())
}

// `seen` holds the lists and dicts currently being written; meeting one again means
// the value contains itself.
fn write_entries(
    f: &mut fmt::Formatter<'_>,
    storage: &DictStorage,
    seen: &mut Vec<*const ()>,
) -> fmt::Result {
    let ptr = Rc::as_ptr(storage) as *const ();
    if seen.contains(&ptr) {
        return write!(f, "{{...}}");
    }

    seen.push(ptr);
    write!(f, "{{")?;
    for (i, (k, v)) in storage.borrow().iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        k.fmt_repr(f)?;
        write!(f, ": ")?;
        write_value(v, f, seen)?;
    }
    seen.pop();
    write!(f, "}}")
}

fn write_value(
    value: &Value,
    f: &mut fmt::Formatter<'_>,
    seen: &mut Vec<*const ()>,
) -> fmt::Result {
    match value {
        Value::None => write!(f, "None"),
        Value::Bool(b) => b.fmt_repr(f),
        Value::Int(n) => write!(f, "{n}"),
        Value::Float(x) => write!(f, "{x:?}"),
        Value::Str(s) => Repr::fmt_repr(&**s, f),
        Value::List(items) => {
            let ptr = Rc::as_ptr(items) as *const ();
            if seen.contains(&ptr) {
                return write!(f, "[...]");
            }
            seen.push(ptr);
            write!(f, "[")?;
            write_values(f, items.borrow().iter(), seen)?;
            seen.pop();
            write!(f, "]")
        }
        Value::Tuple(items) if items.len() == 1 => {
            write!(f, "(")?;
            write_value(&items[0], f, seen)?;
            write!(f, ",)")
        }
        Value::Tuple(items) => {
            write!(f, "(")?;
            write_values(f, items.iter(), seen)?;
            write!(f, ")")
        }
        Value::Set(items) if items.borrow().is_empty() => write!(f, "set()"),
        Value::Set(items) => {
            write!(f, "{{")?;
            write_joined(f, items.borrow().iter())?;
            write!(f, "}}")
        }
        Value::FrozenSet(items) if items.is_empty() => write!(f, "frozenset()"),
        Value::FrozenSet(items) => {
            write!(f, "frozenset({{")?;
            write_joined(f, items.iter())?;
            write!(f, "}})")
        }
        Value::Dict(storage) => write_entries(f, storage, seen),
        Value::MappingView(view) => {
            write!(f, "mappingproxy(")?;
            write_entries(f, &view.storage, seen)?;
            write!(f, ")")
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_repr(f)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_repr(f)
    }
}

// Containers that are the same storage compare equal without looking inside, so a dict
// holding itself still equals itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::FrozenSet(a), Value::FrozenSet(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::MappingView(a), Value::MappingView(b)) => a == b,
            _ => false,
        }
    }
}

// Reads through to the dict it was made from; offers no mutators.
#[derive(Clone)]
pub struct MappingView {
    storage: DictStorage,
}

impl fmt::Debug for MappingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mappingproxy(")?;
        write_entries(f, &self.storage, &mut Vec::new())?;
        write!(f, ")")
    }
}

impl PartialEq for MappingView {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
            || *self.storage.borrow() == *other.storage.borrow()
    }
}

impl MappingView {
    pub(crate) fn new(storage: DictStorage) -> Self {
        Self { storage }
    }

    pub fn get(&self, key: &Atom) -> Option<Value> {
        self.storage.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &Atom) -> bool {
        self.storage.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.storage.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.borrow().is_empty()
    }

    pub fn keys(&self) -> Vec<Atom> {
        self.storage.borrow().keys().cloned().collect()
    }

    pub fn items(&self) -> Vec<(Atom, Value)> {
        self.storage
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn shares_storage_with(&self, value: &Value) -> bool {
        match value {
            Value::Dict(storage) => Rc::ptr_eq(&self.storage, storage),
            Value::MappingView(other) => Rc::ptr_eq(&self.storage, &other.storage),
            _ => false,
        }
    }
}
