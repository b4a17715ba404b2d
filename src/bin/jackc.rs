use jack_lang::driver::{compile_path, Options};

use std::path::PathBuf;
use std::process;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// A .jack file or a directory of .jack files
    #[arg(help = "The .jack file or directory to compile")]
    path: PathBuf,

    /// Directory for the generated files
    #[arg(long, help = "Write output files here instead of next to the sources")]
    out_dir: Option<PathBuf>,

    /// Dump the token stream of every source as XML
    #[arg(long, help = "Also write a <Name>T.xml token dump per source")]
    tokens: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let options = Options {
        out_dir: cli.out_dir,
        tokens: cli.tokens,
    };

    match compile_path(&cli.path, &options) {
        Ok(targets) => {
            for target in targets {
                println!("{}", target.display());
            }
        }
        Err(err) => {
            eprintln!("Error compiling {}: {}", cli.path.display(), err);
            process::exit(1);
        }
    }
}
