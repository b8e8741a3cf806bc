pub mod executor;
pub mod parser;
pub mod protocol;
pub mod provider;
