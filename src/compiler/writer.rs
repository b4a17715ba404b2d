use crate::compiler::{Arithmetic, Command, Index, Segment, N};
use crate::error::{JackError, Result};

use std::io::Write;

use log::trace;

/// Formats VM commands, one per line, into the wrapped output.
///
/// The writer holds no semantic state. `close` flushes the output exactly once;
/// any later write is an error.
#[derive(Debug)]
pub struct VmWriter<W: Write> {
    out: W,
    closed: bool,
}

impl<W: Write> VmWriter<W> {
    pub fn new(out: W) -> VmWriter<W> {
        VmWriter { out, closed: false }
    }

    pub fn write(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Push(segment, index) => self.write_push(*segment, *index),
            Command::Pop(segment, index) => self.write_pop(*segment, *index),
            Command::Arithmetic(op) => self.write_arithmetic(*op),
            Command::Label(label) => self.write_label(label),
            Command::Goto(label) => self.write_goto(label),
            Command::IfGoto(label) => self.write_if(label),
            Command::Call(name, args) => self.write_call(name, *args),
            Command::Function(name, locals) => self.write_function(name, *locals),
            Command::Return => self.write_return(),
        }
    }

    pub fn write_push(&mut self, segment: Segment, index: Index) -> Result<()> {
        self.write_line(format_args!("push {} {}", segment, index))
    }

    pub fn write_pop(&mut self, segment: Segment, index: Index) -> Result<()> {
        self.write_line(format_args!("pop {} {}", segment, index))
    }

    pub fn write_arithmetic(&mut self, op: Arithmetic) -> Result<()> {
        self.write_line(format_args!("{}", op))
    }

    pub fn write_label(&mut self, label: &str) -> Result<()> {
        self.write_line(format_args!("label {}", label))
    }

    pub fn write_goto(&mut self, label: &str) -> Result<()> {
        self.write_line(format_args!("goto {}", label))
    }

    pub fn write_if(&mut self, label: &str) -> Result<()> {
        self.write_line(format_args!("if-goto {}", label))
    }

    pub fn write_call(&mut self, name: &str, args: N) -> Result<()> {
        self.write_line(format_args!("call {} {}", name, args))
    }

    pub fn write_function(&mut self, name: &str, locals: N) -> Result<()> {
        self.write_line(format_args!("function {} {}", name, locals))
    }

    pub fn write_return(&mut self) -> Result<()> {
        self.write_line(format_args!("return"))
    }

    pub fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.out.flush()?;
        }

        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: std::fmt::Arguments) -> Result<()> {
        if self.closed {
            return Err(JackError::IoError(
                "write to a closed VM writer".to_string(),
            ));
        }

        trace!("{}", line);

        writeln!(self.out, "{}", line)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(writer: VmWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn one_line_per_command() {
        let mut writer = VmWriter::new(vec![]);

        writer.write_function("Main.main", 1).unwrap();
        writer.write_push(Segment::Constant, 2).unwrap();
        writer.write_pop(Segment::Local, 0).unwrap();
        writer.write_label("WHILE_START_0").unwrap();
        writer.write_push(Segment::Local, 0).unwrap();
        writer.write_arithmetic(Arithmetic::Not).unwrap();
        writer.write_if("WHILE_END_0").unwrap();
        writer.write_goto("WHILE_START_0").unwrap();
        writer.write_label("WHILE_END_0").unwrap();
        writer.write_call("Math.multiply", 2).unwrap();
        writer.write_return().unwrap();
        writer.close().unwrap();

        let expected = "function Main.main 1\n\
            push constant 2\n\
            pop local 0\n\
            label WHILE_START_0\n\
            push local 0\n\
            not\n\
            if-goto WHILE_END_0\n\
            goto WHILE_START_0\n\
            label WHILE_END_0\n\
            call Math.multiply 2\n\
            return\n";

        assert_eq!(output(writer), expected);
    }

    #[test]
    fn dispatch_matches_command_display() {
        let commands = vec![
            Command::Push(Segment::Pointer, 0),
            Command::Pop(Segment::That, 0),
            Command::Arithmetic(Arithmetic::Neg),
            Command::IfGoto("ELSE_3".to_string()),
            Command::Call("String.new".to_string(), 1),
            Command::Return,
        ];

        let mut writer = VmWriter::new(vec![]);
        for command in commands.iter() {
            writer.write(command).unwrap();
        }

        let expected: String = commands
            .iter()
            .map(|command| format!("{}\n", command))
            .collect();

        assert_eq!(output(writer), expected);
    }

    #[test]
    fn close_is_idempotent() {
        let mut writer = VmWriter::new(vec![]);

        writer.write_return().unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        assert!(writer.is_closed());
        assert!(writer.write_return().is_err());
        assert_eq!(output(writer), "return\n");
    }
}
