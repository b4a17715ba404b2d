use crate::error::{JackError, Result};

use std::fmt;

/// The single-character delimiters of the language.
pub const SYMBOLS: [char; 19] = [
    '{', '}', '(', ')', '[', ']', '.', ',', ';', '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
];

pub fn is_symbol(ch: char) -> bool {
    SYMBOLS.contains(&ch)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        #[rustfmt::skip]
        let keyword = match word {
            "class"       => Keyword::Class,
            "constructor" => Keyword::Constructor,
            "function"    => Keyword::Function,
            "method"      => Keyword::Method,
            "field"       => Keyword::Field,
            "static"      => Keyword::Static,
            "var"         => Keyword::Var,
            "int"         => Keyword::Int,
            "char"        => Keyword::Char,
            "boolean"     => Keyword::Boolean,
            "void"        => Keyword::Void,
            "true"        => Keyword::True,
            "false"       => Keyword::False,
            "null"        => Keyword::Null,
            "this"        => Keyword::This,
            "let"         => Keyword::Let,
            "do"          => Keyword::Do,
            "if"          => Keyword::If,
            "else"        => Keyword::Else,
            "while"       => Keyword::While,
            "return"      => Keyword::Return,
            _             => return None,
        };

        Some(keyword)
    }

    pub fn mnemonic(&self) -> &'static str {
        #[rustfmt::skip]
        let mnemonic = match self {
            Keyword::Class       => "class",
            Keyword::Constructor => "constructor",
            Keyword::Function    => "function",
            Keyword::Method      => "method",
            Keyword::Field       => "field",
            Keyword::Static      => "static",
            Keyword::Var         => "var",
            Keyword::Int         => "int",
            Keyword::Char        => "char",
            Keyword::Boolean     => "boolean",
            Keyword::Void        => "void",
            Keyword::True        => "true",
            Keyword::False       => "false",
            Keyword::Null        => "null",
            Keyword::This        => "this",
            Keyword::Let         => "let",
            Keyword::Do          => "do",
            Keyword::If          => "if",
            Keyword::Else        => "else",
            Keyword::While       => "while",
            Keyword::Return      => "return",
        };

        mnemonic
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Keyword(Keyword),
    Symbol(char),
    Identifier(String),
    IntConst(u16),
    StringConst(String),
}

impl Token {
    /// Largest integer constant the target machine can represent.
    pub const MAX_INT: u16 = 32767;

    /// Name of the token kind as used by the token dump.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Keyword(_) => "keyword",
            Token::Symbol(_) => "symbol",
            Token::Identifier(_) => "identifier",
            Token::IntConst(_) => "integerConstant",
            Token::StringConst(_) => "stringConstant",
        }
    }

    pub fn keyword(&self) -> Result<Keyword> {
        match self {
            Token::Keyword(keyword) => Ok(*keyword),
            _ => Err(JackError::wrong_token_kind("a keyword", self.to_string())),
        }
    }

    pub fn symbol(&self) -> Result<char> {
        match self {
            Token::Symbol(ch) => Ok(*ch),
            _ => Err(JackError::wrong_token_kind("a symbol", self.to_string())),
        }
    }

    pub fn identifier(&self) -> Result<&str> {
        match self {
            Token::Identifier(name) => Ok(name),
            _ => Err(JackError::wrong_token_kind(
                "an identifier",
                self.to_string(),
            )),
        }
    }

    pub fn int_val(&self) -> Result<u16> {
        match self {
            Token::IntConst(value) => Ok(*value),
            _ => Err(JackError::wrong_token_kind(
                "an integer constant",
                self.to_string(),
            )),
        }
    }

    pub fn string_val(&self) -> Result<&str> {
        match self {
            Token::StringConst(string) => Ok(string),
            _ => Err(JackError::wrong_token_kind(
                "a string constant",
                self.to_string(),
            )),
        }
    }

    pub fn is_symbol(&self, ch: char) -> bool {
        self == &Token::Symbol(ch)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(keyword) => write!(f, "{}", keyword),
            Token::Symbol(ch) => write!(f, "{}", ch),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::IntConst(value) => write!(f, "{}", value),
            Token::StringConst(string) => write!(f, "\"{}\"", string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_case::test_case;

    #[test_case("class", Some(Keyword::Class) ; "class")]
    #[test_case("constructor", Some(Keyword::Constructor) ; "constructor")]
    #[test_case("boolean", Some(Keyword::Boolean) ; "boolean")]
    #[test_case("return", Some(Keyword::Return) ; "return keyword")]
    #[test_case("Class", None ; "case sensitive")]
    #[test_case("classy", None ; "prefix is not a keyword")]
    fn keyword_lookup(word: &str, expected: Option<Keyword>) {
        assert_eq!(Keyword::lookup(word), expected);
        if let Some(keyword) = expected {
            assert_eq!(keyword.mnemonic(), word);
        }
    }

    #[test]
    fn symbols() {
        for ch in "{}()[].,;+-*/&|<>=~".chars() {
            assert!(is_symbol(ch), "{}", ch);
        }
        for ch in "_\"!#:?a0 ".chars() {
            assert!(!is_symbol(ch), "{}", ch);
        }
    }

    #[test]
    fn typed_accessors() {
        let int = Token::IntConst(42);
        assert_eq!(int.int_val(), Ok(42));
        assert!(int.keyword().is_err());
        assert!(int.string_val().is_err());

        let name = Token::Identifier("x".to_string());
        assert_eq!(name.identifier(), Ok("x"));
        assert!(name.symbol().is_err());
        assert!(name.int_val().is_err());

        let keyword = Token::Keyword(Keyword::While);
        assert_eq!(keyword.keyword(), Ok(Keyword::While));
        assert!(keyword.identifier().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Token::Keyword(Keyword::Let).to_string(), "let");
        assert_eq!(Token::Symbol('{').to_string(), "{");
        assert_eq!(Token::StringConst("a b".to_string()).to_string(), "\"a b\"");
        assert_eq!(Token::IntConst(7).to_string(), "7");
    }
}
