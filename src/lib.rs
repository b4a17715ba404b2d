pub mod compiler;
pub mod driver;
pub mod error;
pub mod lexer;
