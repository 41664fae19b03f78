use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};

use nesdec::emit::asm::emit_asm;
use nesdec::emit::c::emit_c;
use nesdec::report::analyze;
use nesdec::rom::RomImage;

/// Static analyzer for iNES cartridge images: reconstructs a labeled
/// 6502 assembly listing and a best-effort C translation.
#[derive(Debug, Parser)]
#[command(name = "nesdec", version)]
struct Args {
    /// Input iNES ROM (.nes)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for generated files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Write a labeled assembly listing (<stem>.asm)
    #[arg(short, long)]
    disassemble: bool,

    /// Write the C translation (<stem>.c and <stem>.h); on by default
    #[arg(
        short = 'c',
        long,
        action = ArgAction::Set,
        default_value_t = true,
        default_missing_value = "true",
        num_args = 0..=1
    )]
    decompile: bool,

    /// Report progress on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let bytes = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let rom = RomImage::from_ines_bytes(&bytes)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;

    if args.verbose {
        eprintln!(
            "loaded {}: mapper {}, PRG {} bytes, CHR {} bytes, reset ${:04X}",
            args.input.display(),
            rom.mapper_id(),
            rom.prg_size(),
            rom.chr_size(),
            rom.reset_vector()
        );
    }

    let report = analyze(rom);

    if args.verbose {
        eprintln!(
            "decoded {} instructions, {} functions, {} variables",
            report.disassembly.instructions.len(),
            report.functions.len(),
            report.variables.len()
        );
        if report.disassembly.saturated {
            eprintln!("warning: re-sweep cap reached; listing may be incomplete");
        }
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out")
        .to_string();

    if args.disassemble {
        let path = args.output.join(format!("{stem}.asm"));
        fs::write(&path, emit_asm(&report.disassembly))
            .with_context(|| format!("failed to write {}", path.display()))?;
        if args.verbose {
            eprintln!("wrote {}", path.display());
        }
    }

    if args.decompile {
        let out = emit_c(&report);
        let c_path = args.output.join(format!("{stem}.c"));
        let h_path = args.output.join(format!("{stem}.h"));
        fs::write(&c_path, out.c_source)
            .with_context(|| format!("failed to write {}", c_path.display()))?;
        fs::write(&h_path, out.header)
            .with_context(|| format!("failed to write {}", h_path.display()))?;
        if args.verbose {
            eprintln!("wrote {} and {}", c_path.display(), h_path.display());
        }
    }

    Ok(())
}
