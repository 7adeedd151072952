use clap::Parser;
use eif_parse::{
    read_header, ByteSource, HeaderBlock, MetadataBlock, ParseOptions, SectionBlock,
    SectionWalker, SECTIONS_BEGIN, SECTIONS_END,
};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Print the header, section headers and metadata of an EIF file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the eif file
    #[arg(value_name = "FILE")]
    eif_path: PathBuf,

    /// Decode files whose magic is not ".eif"
    #[arg(long)]
    allow_bad_magic: bool,

    /// Do not read the metadata section payload
    #[arg(long)]
    no_metadata: bool,
}

/// Print each block as soon as it is decoded.
///
/// A failure part way through leaves the header and the sections already
/// visited on `out`. Size mismatch warnings go to `warn` right after the
/// section they belong to.
fn dump<S, O, W>(
    mut source: S,
    opts: &ParseOptions,
    out: &mut O,
    warn: &mut W,
) -> eif_parse::Result<()>
where
    S: ByteSource,
    O: Write,
    W: Write,
{
    let header = read_header(&mut source)?;
    write!(out, "{}", HeaderBlock(&header))?;
    opts.check_header(&header)?;

    writeln!(out, "{SECTIONS_BEGIN}\n")?;
    let mut walker =
        SectionWalker::with_metadata_capture(&header, &mut source, opts.capture_metadata)?;
    for section in walker.by_ref() {
        let section = section?;
        write!(out, "{}", SectionBlock(&section))?;
        if let Some(mismatch) = section.mismatch() {
            out.flush()?;
            writeln!(warn, "Warning: {}\n", mismatch)?;
        }
    }
    writeln!(out, "{SECTIONS_END}\n")?;

    if let Some(metadata) = walker.into_metadata() {
        write!(out, "{}", MetadataBlock(&metadata))?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let file = match File::open(&cli.eif_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open file {}: {}", cli.eif_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let opts = ParseOptions {
        require_magic: !cli.allow_bad_magic,
        capture_metadata: !cli.no_metadata,
    };

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    match dump(BufReader::new(file), &opts, &mut stdout, &mut stderr) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = stdout.flush();
            eprintln!("Failed to parse {}: {}", cli.eif_path.display(), e);
            ExitCode::FAILURE
        }
    }
}
