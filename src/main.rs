//! sectview: display the section layout of an ELF file

use std::env;
use std::io::{self, Write};
use std::process;

use sectview::SectionDescriptor;
use sectview::options::{ParseMode, ParseOptions};

const USAGE: &str = "[-v]... [-q] [--permissive] <obj | exec | lib>
  <obj | exec | lib>: path to the ELF binary to examine
  -v:           print more diagnostics on stderr (repeatable)
  -q:           print no diagnostics besides errors
  --permissive: warn about, instead of rejecting, recoverable inconsistencies";

#[derive(Debug, PartialEq, Eq)]
struct Args {
    path: String,
    verbosity: usize,
    quiet: bool,
    opts: ParseOptions,
}

#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Run(Args),
    Usage,
}

fn parse_args<I: IntoIterator<Item = String>>(argv: I) -> Invocation {
    let mut paths = Vec::new();
    let mut verbosity = 1;
    let mut quiet = false;
    let mut opts = ParseOptions::default();
    let mut flags = true;
    for arg in argv {
        match arg.as_str() {
            "--" if flags => flags = false,
            "-v" if flags => verbosity += 1,
            "-q" if flags => quiet = true,
            "--permissive" if flags => opts = opts.with_parse_mode(ParseMode::Permissive),
            flag if flags && flag.starts_with('-') && flag.len() > 1 => return Invocation::Usage,
            _ => paths.push(arg),
        }
    }
    match (paths.pop(), paths.is_empty()) {
        (Some(path), true) => Invocation::Run(Args {
            path,
            verbosity,
            quiet,
            opts,
        }),
        _ => Invocation::Usage,
    }
}

/// Print one row per section, skipping the null section at index 0.
fn draw<'a, W, I>(out: &mut W, sections: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = SectionDescriptor<'a>>,
{
    writeln!(out, "+ Offset          Bytes +")?;
    writeln!(out, "+-----------------------+")?;
    for section in sections.into_iter().filter(|section| section.index != 0) {
        writeln!(
            out,
            "| {:<#8x} {:>11}B | <-- {}",
            section.offset, section.size, section.name
        )?;
    }
    writeln!(out, "+-----------------------+")
}

fn run(args: &Args) -> sectview::error::Result<()> {
    let sections = sectview::from_path(&args.path, &args.opts)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    draw(&mut out, sections.iter())?;
    out.flush()?;
    Ok(())
}

pub fn main() {
    let mut argv = env::args();
    let execname = argv.next().unwrap_or_else(|| "sectview".to_string());
    let args = match parse_args(argv) {
        Invocation::Run(args) => args,
        Invocation::Usage => {
            println!("Usage: {} {}", execname, USAGE);
            process::exit(0);
        }
    };

    if let Err(err) = stderrlog::new()
        .module(module_path!())
        .quiet(args.quiet)
        .verbosity(args.verbosity)
        .init()
    {
        eprintln!("{}: cannot set up logging: {}", execname, err);
    }

    if let Err(err) = run(&args) {
        eprintln!("{}: {}: {}", execname, args.path, err);
        process::exit(1);
    }
}
