//! CLI front-end: reads newline-separated strings from a file or
//! stdin, optionally gzip-compressed, transforms each line into a
//! prefix-free bit vector, builds a trie over them, and writes the
//! serialized trie to a file. The core library has no idea this exists.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

use clap::{Parser, ValueEnum};
use flate2::read::GzDecoder;

use zfast_trie::{iso_8859_1, io as trie_io, utf16, BitVector, ZFastTrie};

#[derive(Copy, Clone, Eq, PartialEq, ValueEnum)]
enum Encoding {
    /// One byte per character (lossy above code point 0xFF).
    Latin1,
    /// Big-endian UTF-16 code units.
    Utf16,
    /// The input lines are already `0`/`1` strings; no transform is applied.
    Raw,
}

#[derive(Parser)]
#[command(name = "zfast-trie", about = "Build a z-fast trie over newline-separated keys")]
struct Args {
    /// Input file; reads stdin if omitted.
    #[arg(long)]
    input: Option<String>,

    /// Input is gzip-compressed.
    #[arg(long)]
    gzip: bool,

    /// How to turn each line into a prefix-free bit vector.
    #[arg(long, value_enum, default_value_t = Encoding::Latin1)]
    encoding: Encoding,

    /// Where to write the serialized trie.
    #[arg(long)]
    output: String,
}

fn open_input(args: &Args) -> io::Result<Box<dyn BufRead>> {
    let raw: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    if args.gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(raw))))
    } else {
        Ok(Box::new(BufReader::new(raw)))
    }
}

fn raw_bits(line: &str) -> BitVector {
    line.chars().map(|c| c == '1').collect()
}

fn main() -> io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let input = open_input(&args)?;
    let mut trie = ZFastTrie::new();
    let mut inserted = 0usize;
    let mut rejected = 0usize;

    for line in input.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let key = match args.encoding {
            Encoding::Latin1 => iso_8859_1(&line),
            Encoding::Utf16 => utf16(&line),
            Encoding::Raw => raw_bits(&line),
        };
        match trie.add(key) {
            Ok(true) => inserted += 1,
            Ok(false) => log::warn!("duplicate key skipped: {line:?}"),
            Err(e) => {
                rejected += 1;
                log::warn!("rejected {line:?}: {e}");
            }
        }
    }

    log::info!("built trie: {inserted} keys inserted, {rejected} rejected, {} total", trie.len());

    let mut out = BufWriter::new(File::create(&args.output)?);
    trie_io::write(&trie, &mut out).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    out.flush()?;
    Ok(())
}
