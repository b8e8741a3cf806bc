pub mod entity_type;
pub mod internal_transaction;
pub mod raw_trace;

pub use entity_type::EntityType;
pub use internal_transaction::InternalTransaction;
pub use raw_trace::{RawTrace, TraceValue};
