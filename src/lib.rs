#![allow(rustdoc::bare_urls)]
#![doc = include_str!("../README.md")]

mod error;
mod node;
mod parser;
mod records;
mod spintax;
mod visitor;

pub use error::{Error, ErrorKind};
pub use parser::parse;
pub use records::{records, Records};
pub use spintax::Spintax;
pub use visitor::Visitor;
