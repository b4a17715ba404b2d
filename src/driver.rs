use crate::compiler::Compiler;
use crate::error::{JackError, Result};
use crate::lexer::{write_tokens_xml, Lexer};

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{info, warn};

const SOURCE_EXTENSION: &str = "jack";
const VM_EXTENSION: &str = "vm";

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Directory for generated files, next to each source if `None`.
    pub out_dir: Option<PathBuf>,
    /// Also write a `<Name>T.xml` token dump per source.
    pub tokens: bool,
}

/// Translates one class held in memory.
pub fn compile_source(source: &str) -> Result<String> {
    let lexer = Lexer::new(source.as_bytes());
    let mut compiler = Compiler::new(lexer, vec![]);
    compiler.compile()?;

    String::from_utf8(compiler.into_inner())
        .map_err(|err| JackError::IoError(err.to_string()))
}

/// Compiles a single `.jack` file or every `.jack` file directly inside a
/// directory. Stops at the first unit that fails.
pub fn compile_path(path: &Path, options: &Options) -> Result<Vec<PathBuf>> {
    let sources = if path.is_dir() {
        jack_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    sources
        .iter()
        .map(|source| compile_file(source, options))
        .collect()
}

/// Sorted, non-recursive listing of the `.jack` files in `dir`.
pub fn jack_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_jack_extension(&path) {
            files.push(path);
        }
    }

    files.sort();

    Ok(files)
}

/// Compiles `source` into `<stem>.vm`. On failure the incomplete output is
/// removed.
pub fn compile_file(source: &Path, options: &Options) -> Result<PathBuf> {
    if !has_jack_extension(source) {
        return Err(JackError::IoError(format!(
            "`{}` is not a .{} file",
            source.display(),
            SOURCE_EXTENSION
        )));
    }

    if options.tokens {
        dump_tokens(source, options)?;
    }

    let target = output_path(source, options, "", VM_EXTENSION)?;

    info!("compiling {} -> {}", source.display(), target.display());

    let lexer = Lexer::new(BufReader::new(File::open(source)?));
    let out = BufWriter::new(File::create(&target)?);
    let mut compiler = Compiler::new(lexer, out);

    if let Err(err) = compiler.compile() {
        drop(compiler);
        let _ = fs::remove_file(&target);
        return Err(err);
    }

    if Some(compiler.class_name()) != stem(source) {
        warn!(
            "class `{}` is declared in `{}`",
            compiler.class_name(),
            source.display()
        );
    }

    Ok(target)
}

/// Writes the token stream of `source` into `<stem>T.xml`.
pub fn dump_tokens(source: &Path, options: &Options) -> Result<PathBuf> {
    let target = output_path(source, options, "T", "xml")?;

    info!("dumping tokens {} -> {}", source.display(), target.display());

    let mut lexer = Lexer::new(BufReader::new(File::open(source)?));
    let mut out = BufWriter::new(File::create(&target)?);

    if let Err(err) = write_tokens_xml(&mut lexer, &mut out) {
        drop(out);
        let _ = fs::remove_file(&target);
        return Err(err);
    }

    out.into_inner()
        .map_err(|err| JackError::IoError(err.to_string()))?;

    Ok(target)
}

fn has_jack_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

fn stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}

fn output_path(source: &Path, options: &Options, suffix: &str, extension: &str) -> Result<PathBuf> {
    let stem = stem(source).ok_or_else(|| {
        JackError::IoError(format!("invalid file name `{}`", source.display()))
    })?;

    let dir = match &options.out_dir {
        Some(dir) => dir.clone(),
        None => source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    Ok(dir.join(format!("{}{}.{}", stem, suffix, extension)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::process;

    const MAIN: &str = "class Main {\n\
        function void main() {\n\
            do Output.printInt(1 + 2);\n\
            return;\n\
        }\n\
    }\n";

    // A fresh directory below the system temp dir.
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("jack_lang-{}-{}", name, process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn compile_source_in_memory() {
        let expected = "function Main.main 0\n\
            push constant 1\n\
            push constant 2\n\
            add\n\
            call Output.printInt 1\n\
            pop temp 0\n\
            push constant 0\n\
            return\n";

        assert_eq!(compile_source(MAIN), Ok(expected.to_string()));
    }

    #[test]
    fn compile_single_file() {
        let dir = scratch_dir("single");
        let source = dir.join("Main.jack");
        fs::write(&source, MAIN).unwrap();

        let target = compile_file(&source, &Options::default()).unwrap();

        assert_eq!(target, dir.join("Main.vm"));
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            compile_source(MAIN).unwrap()
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn compile_directory() {
        let dir = scratch_dir("directory");
        fs::write(dir.join("Main.jack"), MAIN).unwrap();
        fs::write(dir.join("Point.JACK"), "class Point { field int x; }").unwrap();
        fs::write(dir.join("notes.txt"), "not a source").unwrap();
        fs::create_dir(dir.join("nested.jack")).unwrap();

        let targets = compile_path(&dir, &Options::default()).unwrap();

        assert_eq!(targets, vec![dir.join("Main.vm"), dir.join("Point.vm")]);
        assert_eq!(fs::read_to_string(dir.join("Point.vm")).unwrap(), "");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_unit_leaves_no_output() {
        let dir = scratch_dir("failure");
        let source = dir.join("Broken.jack");
        fs::write(&source, "class Broken { function void f() { return } }").unwrap();

        let result = compile_file(&source, &Options::default());

        assert!(matches!(result, Err(JackError::SyntaxError(_))));
        assert!(!dir.join("Broken.vm").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn out_dir_and_token_dump() {
        let dir = scratch_dir("out-dir");
        let out = dir.join("build");
        fs::create_dir(&out).unwrap();
        let source = dir.join("Main.jack");
        fs::write(&source, MAIN).unwrap();

        let options = Options {
            out_dir: Some(out.clone()),
            tokens: true,
        };

        let targets = compile_path(&source, &options).unwrap();

        assert_eq!(targets, vec![out.join("Main.vm")]);

        let tokens = fs::read_to_string(out.join("MainT.xml")).unwrap();
        assert!(tokens.starts_with("<tokens>\n<keyword> class </keyword>\n"));
        assert!(tokens.ends_with("<symbol> } </symbol>\n</tokens>\n"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_other_extensions() {
        let result = compile_file(Path::new("Main.txt"), &Options::default());

        assert!(matches!(result, Err(JackError::IoError(_))));
    }
}
