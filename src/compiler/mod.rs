mod compiler;
mod op;
mod symbol;
mod writer;

pub use compiler::Compiler;
pub use op::{Arithmetic, Command, Index, Segment, N};
pub use symbol::{Kind, Symbol, SymbolTable};
pub use writer::VmWriter;
