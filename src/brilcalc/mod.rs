//! brilcalc integration: running the tool and reading its reports.

pub mod invoker;
pub mod parser;

pub use invoker::{BrilcalcOptions, BrilcalcTool, LumiRequest, LumiTool};
pub use parser::parse_total;
