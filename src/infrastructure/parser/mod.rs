mod parser;

pub use parser::TraceParser;
