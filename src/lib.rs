pub mod conversion;
pub mod error;
pub mod utils;
pub mod value;
pub mod write_once;

pub use conversion::{ConversionRule, ConversionTable, ConversionTableBuilder, Converter};
pub use error::{FromValueError, KeyAlreadySet, ValueError};
pub use value::{Atom, MappingView, Repr, Value, ValueKind};
pub use write_once::{Iter, WriteOnceMap, WritePolicy};
