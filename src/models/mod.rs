pub mod domain;
pub mod export;

pub use domain::{InternalTransaction, RawTrace};
pub use export::InternalTransactionItem;
