use crate::compiler::{Arithmetic, Command, Index, Kind, Segment, SymbolTable, VmWriter, N};
use crate::error::{JackError, Result};
use crate::lexer::{Keyword, Lexer, Token};

use std::convert::TryFrom;
use std::io::{BufRead, Write};

use log::debug;

/*
   Invariant:
   (1) A compile function is only called if `current` contains a valid
     first token according to the associated grammar rule.

   (2) If a compile function returns Ok(...), `current` contains the first
     token after the associated grammar rule, and every instruction of the
     rule has been emitted.

   There is no syntax tree: each rule emits its instructions while it is
   recognized. The one exception is the index of an array assignment, whose
   instructions are held back until the assigned value has been computed
   (see `compile_let`).
*/
pub struct Compiler<R, W: Write> {
    lexer: Lexer<R>,
    writer: VmWriter<W>,
    symbols: SymbolTable,
    current: Option<Token>,
    class_name: String,
    subroutine_name: String,
    label_index: usize,
    deferred: Vec<Vec<Command>>,
}

impl<R: BufRead, W: Write> Compiler<R, W> {
    pub fn new(lexer: Lexer<R>, out: W) -> Compiler<R, W> {
        Compiler {
            lexer,
            writer: VmWriter::new(out),
            symbols: SymbolTable::new(),
            current: None,
            class_name: String::new(),
            subroutine_name: String::new(),
            label_index: 0,
            deferred: vec![],
        }
    }

    /// Translates the single class of the input and flushes the output.
    ///
    /// Any error aborts the translation. The output written so far is then
    /// incomplete and must not be used.
    pub fn compile(&mut self) -> Result<()> {
        self.advance()?; // load the first token

        self.compile_class()?;

        if self.current.is_some() {
            return Err(self.error("end of input"));
        }

        self.writer.close()
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    // <class><name><{><class_var_dec>*<subroutine_dec>*<}>
    fn compile_class(&mut self) -> Result<()> {
        self.advance_if(&Token::Keyword(Keyword::Class))?;

        self.class_name = self.compile_name()?;

        debug!("compiling class `{}`", self.class_name);

        self.advance_if(&Token::Symbol('{'))?;

        while let Some(Keyword::Static) | Some(Keyword::Field) = self.current_keyword() {
            self.compile_class_var_dec()?;
        }

        while let Some(Keyword::Constructor) | Some(Keyword::Function) | Some(Keyword::Method) =
            self.current_keyword()
        {
            self.compile_subroutine()?;
        }

        self.advance_if(&Token::Symbol('}'))
    }

    // <static|field><type><name>(<,><name>)*<;>
    fn compile_class_var_dec(&mut self) -> Result<()> {
        let kind = match self.current_keyword() {
            Some(Keyword::Static) => Kind::Static,
            Some(Keyword::Field) => Kind::Field,
            _ => return Err(self.error("static or field")),
        };
        self.advance()?; // advance over `static` or `field`

        self.compile_declaration(kind)
    }

    // <var><type><name>(<,><name>)*<;>
    fn compile_var_dec(&mut self) -> Result<()> {
        self.advance_if(&Token::Keyword(Keyword::Var))?;

        self.compile_declaration(Kind::Local)
    }

    // <type><name>(<,><name>)*<;>
    fn compile_declaration(&mut self, kind: Kind) -> Result<()> {
        let ty = self.compile_type()?;

        let names = self.sep_by(|compiler| compiler.compile_name(), ',')?;

        for name in names.iter() {
            self.define(name, &ty, kind)?;
        }

        self.advance_if(&Token::Symbol(';'))
    }

    // <constructor|function|method><void|type><name><(><parameter_list><)><subroutine_body>
    fn compile_subroutine(&mut self) -> Result<()> {
        let keyword = match self.current_keyword() {
            Some(keyword @ Keyword::Constructor)
            | Some(keyword @ Keyword::Function)
            | Some(keyword @ Keyword::Method) => keyword,
            _ => return Err(self.error("constructor, function or method")),
        };
        self.advance()?; // advance over the subroutine keyword

        self.symbols.start_subroutine();

        if self.current == Some(Token::Keyword(Keyword::Void)) {
            self.advance()?; // advance over `void`
        } else {
            self.compile_type()?;
        }

        self.subroutine_name = self.compile_name()?;

        if keyword == Keyword::Method {
            let class_name = self.class_name.clone();
            self.define("this", &class_name, Kind::Argument)?;
        }

        self.between('(', |compiler| compiler.compile_parameter_list(), ')')?;

        self.compile_subroutine_body(keyword)
    }

    // (<type><name>(<,><type><name>)*)?
    fn compile_parameter_list(&mut self) -> Result<()> {
        if self.peek_symbol(')') {
            return Ok(());
        }

        let params = self.sep_by(
            |compiler| {
                let ty = compiler.compile_type()?;
                let name = compiler.compile_name()?;
                Ok((ty, name))
            },
            ',',
        )?;

        for (ty, name) in params.iter() {
            self.define(name, ty, Kind::Argument)?;
        }

        Ok(())
    }

    // <{><var_dec>*<statements><}>
    fn compile_subroutine_body(&mut self, keyword: Keyword) -> Result<()> {
        self.advance_if(&Token::Symbol('{'))?;

        while self.current_keyword() == Some(Keyword::Var) {
            self.compile_var_dec()?;
        }

        // the local count is only known once every `var` has been seen
        let name = format!("{}.{}", self.class_name, self.subroutine_name);
        let locals = self.symbols.var_count(Kind::Local);

        debug!("compiling {} `{}` with {} locals", keyword, name, locals);
        debug!("symbols of `{}`: {}", name, self.symbols);

        self.emit(Command::Function(name, locals))?;

        match keyword {
            Keyword::Constructor => {
                let fields = self.symbols.var_count(Kind::Field);
                self.push(Segment::Constant, Index::from(fields))?;
                self.call("Memory.alloc", 1)?;
                self.pop(Segment::Pointer, 0)?;
            }
            Keyword::Method => {
                self.push(Segment::Argument, 0)?;
                self.pop(Segment::Pointer, 0)?;
            }
            _ => {}
        }

        self.compile_statements()?;

        self.advance_if(&Token::Symbol('}'))
    }

    // (<let_stmt>|<if_stmt>|<while_stmt>|<do_stmt>|<return_stmt>)*
    fn compile_statements(&mut self) -> Result<()> {
        loop {
            match self.current_keyword() {
                Some(Keyword::Let) => self.compile_let()?,
                Some(Keyword::If) => self.compile_if()?,
                Some(Keyword::While) => self.compile_while()?,
                Some(Keyword::Do) => self.compile_do()?,
                Some(Keyword::Return) => self.compile_return()?,
                _ => return Ok(()),
            }
        }
    }

    // <let><name>(<[><expr><]>)?<=><expr><;>
    fn compile_let(&mut self) -> Result<()> {
        self.advance()?; // advance over `let`

        let name = self.compile_name()?;
        let (segment, index) = self.variable(&name)?;

        let element = if self.peek_symbol('[') {
            let ((), commands) =
                self.defer(|compiler| compiler.between('[', |c| c.compile_expression(), ']'))?;
            Some(commands)
        } else {
            None
        };

        self.advance_if(&Token::Symbol('='))?;

        self.compile_expression()?;

        self.advance_if(&Token::Symbol(';'))?;

        match element {
            // the value stays in temp 0 until `pointer 1` holds the address
            Some(offset) => {
                self.pop(Segment::Temp, 0)?;
                self.push(segment, index)?;
                self.replay(offset)?;
                self.arithmetic(Arithmetic::Add)?;
                self.pop(Segment::Pointer, 1)?;
                self.push(Segment::Temp, 0)?;
                self.pop(Segment::That, 0)
            }
            None => self.pop(segment, index),
        }
    }

    // <while><(><expr><)><{><statements><}>
    fn compile_while(&mut self) -> Result<()> {
        let start = format!("WHILE_START_{}", self.label_index);
        let end = format!("WHILE_END_{}", self.label_index);
        self.label_index += 1;

        self.advance()?; // advance over `while`

        self.emit(Command::Label(start.clone()))?;

        self.between('(', |compiler| compiler.compile_expression(), ')')?;

        self.arithmetic(Arithmetic::Not)?;
        self.emit(Command::IfGoto(end.clone()))?;

        self.between('{', |compiler| compiler.compile_statements(), '}')?;

        self.emit(Command::Goto(start))?;
        self.emit(Command::Label(end))
    }

    // <if><(><expr><)><{><statements><}>(<else><{><statements><}>)?
    fn compile_if(&mut self) -> Result<()> {
        let start = format!("IF_START_{}", self.label_index);
        let end = format!("IF_END_{}", self.label_index);
        let otherwise = format!("ELSE_{}", self.label_index);
        self.label_index += 1;

        self.advance()?; // advance over `if`

        // never jumped to, mirrors the layout of `while`
        self.emit(Command::Label(start))?;

        self.between('(', |compiler| compiler.compile_expression(), ')')?;

        self.arithmetic(Arithmetic::Not)?;
        self.emit(Command::IfGoto(otherwise.clone()))?;

        self.between('{', |compiler| compiler.compile_statements(), '}')?;

        self.emit(Command::Goto(end.clone()))?;
        self.emit(Command::Label(otherwise))?;

        if self.current_keyword() == Some(Keyword::Else) {
            self.advance()?; // advance over `else`

            self.between('{', |compiler| compiler.compile_statements(), '}')?;
        }

        self.emit(Command::Label(end))
    }

    // <do><subroutine_call><;>
    fn compile_do(&mut self) -> Result<()> {
        self.advance()?; // advance over `do`

        let name = self.compile_name()?;
        self.compile_subroutine_call(name)?;

        self.advance_if(&Token::Symbol(';'))?;

        self.pop(Segment::Temp, 0)
    }

    // <return><expr>?<;>
    fn compile_return(&mut self) -> Result<()> {
        self.advance()?; // advance over `return`

        if self.peek_symbol(';') {
            // every call leaves exactly one value on the stack
            self.push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }

        self.emit(Command::Return)?;

        self.advance_if(&Token::Symbol(';'))
    }

    // <term>(<op><term>)*
    fn compile_expression(&mut self) -> Result<()> {
        self.compile_term()?;

        while let Some(op) = self.current_operator() {
            self.advance()?; // advance over `op`

            self.compile_term()?;

            self.emit(op)?;
        }

        Ok(())
    }

    // <int>|<string>|<keyword_const>|<name>|<name><[><expr><]>|<subroutine_call>|<(><expr><)>|<un_op><term>
    fn compile_term(&mut self) -> Result<()> {
        let token = match self.current.clone() {
            Some(token) => token,
            None => return Err(self.error("term")),
        };

        match token {
            Token::IntConst(value) => {
                self.advance()?; // advance over `Token::IntConst(...)`
                self.push(Segment::Constant, Index::from(value))
            }
            Token::StringConst(string) => {
                self.advance()?; // advance over `Token::StringConst(...)`
                self.compile_string(&string)
            }
            Token::Keyword(Keyword::True) => {
                self.advance()?; // advance over `true`
                self.push(Segment::Constant, -1)
            }
            Token::Keyword(Keyword::False) | Token::Keyword(Keyword::Null) => {
                self.advance()?; // advance over `false` or `null`
                self.push(Segment::Constant, 0)
            }
            Token::Keyword(Keyword::This) => {
                self.advance()?; // advance over `this`
                self.push(Segment::Pointer, 0)
            }
            Token::Symbol('(') => self.between('(', |compiler| compiler.compile_expression(), ')'),
            Token::Symbol('-') => {
                self.advance()?; // advance over `-`
                self.compile_term()?;
                self.arithmetic(Arithmetic::Neg)
            }
            Token::Symbol('~') => {
                self.advance()?; // advance over `~`
                self.compile_term()?;
                self.arithmetic(Arithmetic::Not)
            }
            Token::Identifier(name) => {
                self.advance()?; // advance over `Token::Identifier(...)`

                if self.peek_symbol('(') || self.peek_symbol('.') {
                    self.compile_subroutine_call(name)
                } else if self.peek_symbol('[') {
                    let (segment, index) = self.variable(&name)?;
                    self.push(segment, index)?;
                    self.between('[', |compiler| compiler.compile_expression(), ']')?;
                    self.arithmetic(Arithmetic::Add)?;
                    self.pop(Segment::Pointer, 1)?;
                    self.push(Segment::That, 0)
                } else {
                    let (segment, index) = self.variable(&name)?;
                    self.push(segment, index)
                }
            }
            _ => Err(self.error("term")),
        }
    }

    fn compile_string(&mut self, string: &str) -> Result<()> {
        self.push(Segment::Constant, string.chars().count() as Index)?;
        self.call("String.new", 1)?;

        for ch in string.chars() {
            self.push(Segment::Constant, ch as Index)?;
            self.call("String.appendChar", 2)?;
        }

        Ok(())
    }

    // <name><(><expr_list><)> | <name><.><name><(><expr_list><)>
    // The leading name has already been consumed.
    fn compile_subroutine_call(&mut self, name: String) -> Result<()> {
        let (class, routine, receivers) = if self.peek_symbol('.') {
            self.advance()?; // advance over `.`

            let routine = self.compile_name()?;

            match self.symbols.resolve(&name).cloned() {
                // a variable: call a method on the object it refers to
                Some(symbol) => {
                    self.push(Segment::from(symbol.kind), Index::from(symbol.index))?;
                    (symbol.ty, routine, 1)
                }
                // otherwise a class name: function or constructor call
                None => (name, routine, 0),
            }
        } else {
            self.push(Segment::Pointer, 0)?;
            (self.class_name.clone(), name, 1)
        };

        let callee = format!("{}.{}", class, routine);
        let args = self.between('(', |compiler| compiler.compile_expression_list(), ')')?;

        let args = N::try_from(args)
            .ok()
            .and_then(|args| args.checked_add(receivers))
            .ok_or_else(|| JackError::too_many_arguments(self.lexer.line(), callee.as_str()))?;

        self.call(&callee, args)
    }

    // (<expr>(<,><expr>)*)?
    fn compile_expression_list(&mut self) -> Result<usize> {
        if self.peek_symbol(')') {
            return Ok(0);
        }

        self.sep_by(|compiler| compiler.compile_expression(), ',')
            .map(|exprs| exprs.len())
    }

    // <name>
    fn compile_name(&mut self) -> Result<String> {
        match self.current.clone() {
            Some(Token::Identifier(name)) => {
                self.advance()?; // advance over `Token::Identifier(...)`
                Ok(name)
            }
            _ => Err(self.error("identifier")),
        }
    }

    // <int>|<char>|<boolean>|<name>
    fn compile_type(&mut self) -> Result<String> {
        let ty = match &self.current {
            Some(Token::Keyword(keyword))
                if matches!(keyword, Keyword::Int | Keyword::Char | Keyword::Boolean) =>
            {
                keyword.to_string()
            }
            Some(Token::Identifier(name)) => name.clone(),
            _ => return Err(self.error("type")),
        };

        self.advance()?; // advance over the type

        Ok(ty)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = if self.lexer.has_next()? {
            Some(self.lexer.advance()?)
        } else {
            None
        };

        Ok(())
    }

    fn advance_if(&mut self, token: &Token) -> Result<()> {
        if self.current.as_ref() == Some(token) {
            self.advance()
        } else {
            Err(self.error(token.to_string()))
        }
    }

    // <start><f><end>
    fn between<A, F>(&mut self, start: char, f: F, end: char) -> Result<A>
    where
        F: FnOnce(&mut Self) -> Result<A>,
    {
        self.advance_if(&Token::Symbol(start))?; // advance over `start`

        let value = f(self)?;

        self.advance_if(&Token::Symbol(end))?; // advance over `end`

        Ok(value)
    }

    // <f>(<sep><f>)*
    fn sep_by<A, F>(&mut self, f: F, sep: char) -> Result<Vec<A>>
    where
        F: Fn(&mut Self) -> Result<A>,
    {
        let mut xs = vec![f(self)?];

        while self.peek_symbol(sep) {
            self.advance()?; // advance over `sep`
            xs.push(f(self)?);
        }

        Ok(xs)
    }

    fn current_keyword(&self) -> Option<Keyword> {
        match &self.current {
            Some(Token::Keyword(keyword)) => Some(*keyword),
            _ => None,
        }
    }

    fn current_operator(&self) -> Option<Command> {
        let op = match &self.current {
            Some(Token::Symbol(ch)) => *ch,
            _ => return None,
        };

        #[rustfmt::skip]
        let command = match op {
            '+' => Command::Arithmetic(Arithmetic::Add),
            '-' => Command::Arithmetic(Arithmetic::Sub),
            '&' => Command::Arithmetic(Arithmetic::And),
            '|' => Command::Arithmetic(Arithmetic::Or),
            '<' => Command::Arithmetic(Arithmetic::Lt),
            '>' => Command::Arithmetic(Arithmetic::Gt),
            '=' => Command::Arithmetic(Arithmetic::Eq),
            '*' => Command::Call("Math.multiply".to_string(), 2),
            '/' => Command::Call("Math.divide".to_string(), 2),
            _   => return None,
        };

        Some(command)
    }

    fn peek_symbol(&self, ch: char) -> bool {
        matches!(&self.current, Some(token) if token.is_symbol(ch))
    }

    fn define(&mut self, name: &str, ty: &str, kind: Kind) -> Result<()> {
        let line = self.lexer.line();

        match self.symbols.define(name, ty, kind) {
            Ok(_) => Ok(()),
            Err(JackError::SyntaxError(msg)) => Err(JackError::SyntaxError(format!(
                "line {}: {}",
                line, msg
            ))),
            Err(err) => Err(err),
        }
    }

    fn variable(&self, name: &str) -> Result<(Segment, Index)> {
        match self.symbols.resolve(name) {
            Some(symbol) => Ok((Segment::from(symbol.kind), Index::from(symbol.index))),
            None => Err(JackError::undeclared_name(self.lexer.line(), name)),
        }
    }

    fn error<S: Into<String>>(&self, expected: S) -> JackError {
        let got = match &self.current {
            Some(token) => token.to_string(),
            None => "end of input".to_string(),
        };

        JackError::syntax_error(self.lexer.line(), expected, got)
    }

    // Runs `f` with its instructions captured instead of written.
    fn defer<A, F>(&mut self, f: F) -> Result<(A, Vec<Command>)>
    where
        F: FnOnce(&mut Self) -> Result<A>,
    {
        self.deferred.push(vec![]);

        let result = f(self);
        let commands = self.deferred.pop().unwrap_or_default();

        result.map(|value| (value, commands))
    }

    fn replay(&mut self, commands: Vec<Command>) -> Result<()> {
        commands
            .into_iter()
            .try_for_each(|command| self.emit(command))
    }

    fn emit(&mut self, command: Command) -> Result<()> {
        match self.deferred.last_mut() {
            Some(commands) => {
                commands.push(command);
                Ok(())
            }
            None => self.writer.write(&command),
        }
    }

    fn push(&mut self, segment: Segment, index: Index) -> Result<()> {
        self.emit(Command::Push(segment, index))
    }

    fn pop(&mut self, segment: Segment, index: Index) -> Result<()> {
        self.emit(Command::Pop(segment, index))
    }

    fn arithmetic(&mut self, op: Arithmetic) -> Result<()> {
        self.emit(Command::Arithmetic(op))
    }

    fn call(&mut self, name: &str, args: N) -> Result<()> {
        self.emit(Command::Call(name.to_string(), args))
    }
}
