mod lexer;
pub mod token;
mod xml;

pub use lexer::Lexer;
pub use token::{Keyword, Token};
pub use xml::write_tokens_xml;
