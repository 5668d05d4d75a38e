//! `rrcc` CLI: `rrcc [--sysroot DIR] [--nostdinc] [-I DIR]* (--compile | --assemble |
//! --archive | link by default) [-o OUT] INFILES...`.

use clap::{CommandFactory, Parser as ClapParser};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use std::process;

use rrcc::config::{CompilerConfig, Define};
use rrcc::driver::{self, Action};

#[derive(ClapParser)]
#[command(name = "rrcc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiler for a restricted subset of C, targeting a 32-bit RISC-style ISA", long_about = None)]
struct Cli {
    /// Cross-toolchain root: `<sysroot>/include`, `<sysroot>/bin/{as,ld}`,
    /// `<sysroot>/lib/{crt.o,libc.a}`
    #[arg(long)]
    sysroot: Option<PathBuf>,

    /// Suppress the sysroot's standard include directory
    #[arg(long)]
    nostdinc: bool,

    /// Additional header search directory (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Preprocessor define, `NAME` or `NAME=VALUE` (repeatable)
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    define: Vec<String>,

    /// Stop after generating an object file per `.c`/`.s` input
    #[arg(long, conflicts_with_all = ["assemble", "archive"])]
    compile: bool,

    /// Stop after generating assembly text per `.c` input
    #[arg(long, conflicts_with_all = ["compile", "archive"])]
    assemble: bool,

    /// Pack the resulting object files into a tar-format archive instead of linking
    #[arg(long, conflicts_with_all = ["compile", "assemble"])]
    archive: bool,

    /// Output path; default depends on the action and input file name
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit a shell completion script for SHELL and exit, ignoring every other flag
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Input files: `.c` source, `.s` assembly, `.o` object, or `.a` archive
    inputs: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "rrcc", &mut std::io::stdout());
        return;
    }

    if cli.inputs.is_empty() {
        eprintln!("error: no input files");
        process::exit(1);
    }

    let action = if cli.compile {
        Action::Compile
    } else if cli.assemble {
        Action::Assemble
    } else if cli.archive {
        Action::Archive
    } else {
        Action::Link
    };

    let mut config = CompilerConfig::new().with_include_dirs(cli.include).with_nostdinc(cli.nostdinc);
    if let Some(root) = cli.sysroot {
        config = config.with_sysroot(root);
    }
    for raw in &cli.define {
        config = config.with_define(match raw.split_once('=') {
            Some((name, value)) => Define::with_value(name, value),
            None => Define::new(raw.clone()),
        });
    }

    if let Err(diagnostic) = driver::run_pipeline(&cli.inputs, action, cli.output.as_deref(), &config) {
        eprint!("{diagnostic}");
        process::exit(1);
    }
}
