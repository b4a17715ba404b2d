use crate::error::{JackError, Result};
use crate::lexer::token::{is_symbol, Keyword, Token};

use std::collections::VecDeque;
use std::io::BufRead;
use std::iter::Iterator;

/*
   The lexer reads its input one line at a time. Raw token texts of a line are
   queued and only classified when they are dequeued by `advance`, so a new
   line is read only after every token of the previous one was consumed.

   Block comments are the only state that survives a line break.
*/
#[derive(Debug)]
pub struct Lexer<R> {
    reader: R,
    queue: VecDeque<(usize, String)>,
    in_block_comment: bool,
    lines_read: usize,
    line: usize,
    current: Option<Token>,
}

impl<R: BufRead> Lexer<R> {
    pub fn new(reader: R) -> Lexer<R> {
        Lexer {
            reader,
            queue: VecDeque::new(),
            in_block_comment: false,
            lines_read: 0,
            line: 0,
            current: None,
        }
    }

    pub fn has_next(&mut self) -> Result<bool> {
        while self.queue.is_empty() {
            if !self.tokenize_line()? {
                break;
            }
        }

        Ok(!self.queue.is_empty())
    }

    pub fn advance(&mut self) -> Result<Token> {
        self.has_next()?;

        let (line, raw) = match self.queue.pop_front() {
            Some(entry) => entry,
            None => {
                return Err(JackError::syntax_error(
                    self.lines_read,
                    "additional tokens",
                    "end of input",
                ))
            }
        };

        let token = classify(&raw, line)?;

        self.line = line;
        self.current = Some(token.clone());

        Ok(token)
    }

    /// The token returned by the last successful `advance`.
    pub fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Line of the current token, or of the last line read if there is none.
    pub fn line(&self) -> usize {
        if self.current.is_some() {
            self.line
        } else {
            self.lines_read
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buffer = String::new();

        if self.reader.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }

        self.lines_read += 1;

        let len = buffer.trim_end_matches(|ch| ch == '\n' || ch == '\r').len();
        buffer.truncate(len);

        Ok(Some(buffer))
    }

    // returns `false` once the input is exhausted
    fn tokenize_line(&mut self) -> Result<bool> {
        let line = match self.read_line()? {
            Some(line) => line,
            None => return Ok(false),
        };

        let chars: Vec<char> = line.chars().collect();
        let mut tokens = vec![];
        let mut current = String::new();
        let mut in_string = false;
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            let next = chars.get(i + 1).copied();
            i += 1;

            if self.in_block_comment {
                if ch == '*' && next == Some('/') {
                    self.in_block_comment = false;
                    i += 1;
                }
                continue;
            }

            if in_string {
                current.push(ch);
                if ch == '"' {
                    // drop the closing quote, the opening one marks the kind
                    current.pop();
                    tokens.push(std::mem::take(&mut current));
                    in_string = false;
                }
                continue;
            }

            if ch == '/' && next == Some('/') {
                break;
            }

            if ch == '/' && next == Some('*') {
                flush(&mut current, &mut tokens);
                self.in_block_comment = true;
                i += 1;
                continue;
            }

            if ch == '"' {
                flush(&mut current, &mut tokens);
                current.push(ch);
                in_string = true;
                continue;
            }

            if ch.is_whitespace() {
                flush(&mut current, &mut tokens);
                continue;
            }

            if is_symbol(ch) {
                flush(&mut current, &mut tokens);
                tokens.push(ch.to_string());
                continue;
            }

            if !ch.is_alphanumeric() && ch != '_' {
                return Err(JackError::invalid_character(self.lines_read, ch));
            }

            current.push(ch);
        }

        if in_string {
            return Err(JackError::unterminated_string(self.lines_read));
        }

        flush(&mut current, &mut tokens);

        let line = self.lines_read;
        self.queue
            .extend(tokens.into_iter().map(|token| (line, token)));

        Ok(true)
    }
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

fn classify(raw: &str, line: usize) -> Result<Token> {
    let first = match raw.chars().next() {
        Some(ch) => ch,
        None => return Err(JackError::invalid_token(line, raw)),
    };

    if first == '"' {
        return Ok(Token::StringConst(raw[1..].to_string()));
    }

    if raw.len() == 1 && is_symbol(first) {
        return Ok(Token::Symbol(first));
    }

    if let Some(keyword) = Keyword::lookup(raw) {
        return Ok(Token::Keyword(keyword));
    }

    if raw.chars().all(|ch| ch.is_ascii_digit()) {
        return match raw.parse::<u16>() {
            Ok(value) if value <= Token::MAX_INT => Ok(Token::IntConst(value)),
            _ => Err(JackError::integer_out_of_range(line, raw)),
        };
    }

    if first.is_alphabetic() || first == '_' {
        return Ok(Token::Identifier(raw.to_string()));
    }

    Err(JackError::invalid_token(line, raw))
}

impl<R: BufRead> Iterator for Lexer<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.advance()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
