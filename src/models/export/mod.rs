pub mod internal_transaction_item;

pub use internal_transaction_item::InternalTransactionItem;
