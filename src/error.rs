use std::error::Error;
use std::{fmt, io};

pub type Result<T> = std::result::Result<T, JackError>;

#[derive(Debug, PartialEq, Eq)]
pub enum JackError {
    LexerError(String),
    SyntaxError(String),
    TokenError(String),
    IoError(String),
}

impl JackError {
    pub fn syntax_error<S, T>(line: usize, expected: S, got: T) -> JackError
    where
        S: Into<String>,
        T: Into<String>,
    {
        JackError::SyntaxError(format!(
            "line {}: Expected `{}`, got `{}` instead.",
            line,
            expected.into(),
            got.into()
        ))
    }

    pub fn invalid_character(line: usize, ch: char) -> JackError {
        JackError::LexerError(format!("line {}: invalid character `{}`", line, ch))
    }

    pub fn invalid_token<S>(line: usize, token: S) -> JackError
    where
        S: Into<String>,
    {
        JackError::LexerError(format!("line {}: invalid token `{}`", line, token.into()))
    }

    pub fn integer_out_of_range<S>(line: usize, literal: S) -> JackError
    where
        S: Into<String>,
    {
        JackError::LexerError(format!(
            "line {}: integer constant `{}` out of range",
            line,
            literal.into()
        ))
    }

    pub fn too_many_arguments<S>(line: usize, callee: S) -> JackError
    where
        S: Into<String>,
    {
        JackError::SyntaxError(format!(
            "line {}: too many arguments in call to `{}`",
            line,
            callee.into()
        ))
    }

    pub fn unterminated_string(line: usize) -> JackError {
        JackError::LexerError(format!("line {}: unterminated string constant", line))
    }

    pub fn duplicate_name<S>(name: S) -> JackError
    where
        S: Into<String>,
    {
        JackError::SyntaxError(format!("duplicate declaration: `{}`", name.into()))
    }

    pub fn undeclared_name<S>(line: usize, name: S) -> JackError
    where
        S: Into<String>,
    {
        JackError::SyntaxError(format!(
            "line {}: undeclared variable `{}`",
            line,
            name.into()
        ))
    }

    pub fn wrong_token_kind<S, T>(expected: S, got: T) -> JackError
    where
        S: Into<String>,
        T: Into<String>,
    {
        JackError::TokenError(format!(
            "current token is not {}: `{}`",
            expected.into(),
            got.into()
        ))
    }
}

impl fmt::Display for JackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JackError::LexerError(msg) => write!(f, "lexer error: {}", msg),
            JackError::SyntaxError(msg) => write!(f, "syntax error: {}", msg),
            JackError::TokenError(msg) => write!(f, "token error: {}", msg),
            JackError::IoError(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl Error for JackError {}

impl From<io::Error> for JackError {
    fn from(error: io::Error) -> Self {
        JackError::IoError(error.to_string())
    }
}
