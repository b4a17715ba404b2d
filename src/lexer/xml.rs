use crate::error::Result;
use crate::lexer::{Lexer, Token};

use std::io::{BufRead, Write};

/// Writes every remaining token of `lexer` as one XML element per line,
/// wrapped in a `<tokens>` element.
pub fn write_tokens_xml<R, W>(lexer: &mut Lexer<R>, out: &mut W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(out, "<tokens>")?;

    for token in lexer {
        let token = token?;
        writeln!(
            out,
            "<{kind}> {text} </{kind}>",
            kind = token.kind(),
            text = escape(&text(&token))
        )?;
    }

    writeln!(out, "</tokens>")?;

    Ok(())
}

fn text(token: &Token) -> String {
    match token {
        Token::StringConst(string) => string.clone(),
        _ => token.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }

    escaped
}
