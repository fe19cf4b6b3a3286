// Command-line interface for romtool.
//
// Explicit subcommands with long-form options. The short names of the
// classic tool (`del-header`, `ips`, `sha1`) are kept as aliases.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::hash::HashAlgorithm;
use crate::io::{self as rio, IoError};
use crate::ips::IPS_MAX_OFFSET;
use crate::rom::header::HEADER_LEN;
use crate::rom::{self, COPIER_HEADER_LEN, MapLayout};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const PATCHED_SUFFIX: &str = "-patched";
const NO_HEADER_SUFFIX: &str = "-no-header";
const FIXED_SUFFIX: &str = "-fixed";

/// Bank granularity used for the size report in `info`.
const BANK_SIZE: usize = 32 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// SNES ROM utility: IPS patching, header info, checksum repair.
#[derive(Parser, Debug)]
#[command(
    name = "romtool",
    version,
    about = "SNES ROM utility",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Remove the 512-byte copier header.
    #[command(alias = "del-header")]
    StripHeader(StripArgs),
    /// Print the decoded internal header.
    Info(InfoArgs),
    /// Apply IPS patches to a ROM, in the order given.
    #[command(alias = "ips")]
    Patch(PatchArgs),
    /// Recompute the checksum / complement pair.
    FixChecksum(FixArgs),
    /// Print the digest of a file.
    #[command(alias = "sha1")]
    Hash(HashArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Lorom,
    Hirom,
    Exhirom,
}

impl From<LayoutArg> for MapLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Lorom => MapLayout::LoRom,
            LayoutArg::Hirom => MapLayout::HiRom,
            LayoutArg::Exhirom => MapLayout::ExHiRom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AlgorithmArg {
    Sha1,
    Sha256,
}

impl From<AlgorithmArg> for HashAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Sha1 => HashAlgorithm::Sha1,
            AlgorithmArg::Sha256 => HashAlgorithm::Sha256,
        }
    }
}

#[derive(Args, Debug)]
struct StripArgs {
    /// ROM file with a copier header.
    #[arg(value_hint = ValueHint::FilePath)]
    rom: PathBuf,

    /// Output file (default: <rom>-no-header).
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// ROM file.
    #[arg(value_hint = ValueHint::FilePath)]
    rom: PathBuf,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// ROM file to patch.
    #[arg(value_hint = ValueHint::FilePath)]
    rom: PathBuf,

    /// IPS patch files, applied in order.
    #[arg(value_name = "PATCH", value_hint = ValueHint::FilePath, required = true)]
    patches: Vec<PathBuf>,

    /// Output file (default: <rom>-patched).
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FixArgs {
    /// ROM file.
    #[arg(value_hint = ValueHint::FilePath)]
    rom: PathBuf,

    /// Output file (default: <rom>-fixed).
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Rewrite the header at this layout's address instead of probing.
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,
}

#[derive(Args, Debug)]
struct HashArgs {
    /// File to hash.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// Digest algorithm.
    #[arg(long, short = 'a', value_enum, default_value_t = AlgorithmArg::Sha1)]
    algorithm: AlgorithmArg,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    StripHeader,
    Info,
    Patch,
    FixChecksum,
    Hash,
    Config,
}

struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: Option<PathBuf>,
    patch_files: Vec<PathBuf>,
    output_file: Option<PathBuf>,
    layout: Option<MapLayout>,
    algorithm: HashAlgorithm,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            input_file: None,
            patch_files: Vec::new(),
            output_file: None,
            layout: None,
            algorithm: HashAlgorithm::default(),
        }
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::StripHeader(args) => Options {
            input_file: Some(args.rom.clone()),
            output_file: Some(
                args.output
                    .clone()
                    .unwrap_or_else(|| rio::default_output_path(&args.rom, NO_HEADER_SUFFIX)),
            ),
            ..Options::new(Command::StripHeader, &cli)
        },
        Cmd::Info(args) => Options {
            input_file: Some(args.rom.clone()),
            ..Options::new(Command::Info, &cli)
        },
        Cmd::Patch(args) => Options {
            input_file: Some(args.rom.clone()),
            patch_files: args.patches.clone(),
            output_file: Some(
                args.output
                    .clone()
                    .unwrap_or_else(|| rio::default_output_path(&args.rom, PATCHED_SUFFIX)),
            ),
            ..Options::new(Command::Patch, &cli)
        },
        Cmd::FixChecksum(args) => Options {
            input_file: Some(args.rom.clone()),
            output_file: Some(
                args.output
                    .clone()
                    .unwrap_or_else(|| rio::default_output_path(&args.rom, FIXED_SUFFIX)),
            ),
            layout: args.layout.map(MapLayout::from),
            ..Options::new(Command::FixChecksum, &cli)
        },
        Cmd::Hash(args) => Options {
            input_file: Some(args.file.clone()),
            algorithm: args.algorithm.into(),
            ..Options::new(Command::Hash, &cli)
        },
        Cmd::Config => Options::new(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("romtool".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

fn log_filter(opts: &Options) -> &'static str {
    if opts.quiet {
        return "error";
    }
    match opts.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn report(context: &str, e: &IoError) -> i32 {
    eprintln!("romtool: {context}: {e}");
    1
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => eprintln!("romtool: json: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("romtool version {version} (Rust)");

    let hash = cfg!(feature = "hash") as u8;
    eprintln!("HASH={hash}");
    eprintln!("COPIER_HEADER_LEN={COPIER_HEADER_LEN}");
    eprintln!("HEADER_LEN={HEADER_LEN}");
    for layout in MapLayout::ALL {
        eprintln!("HEADER_OFFSET_{}={:#X}", layout.name().to_uppercase(), layout.header_offset());
    }
    eprintln!("IPS_MAX_OFFSET={IPS_MAX_OFFSET:#X}");

    0
}

// ---------------------------------------------------------------------------
// Strip-header command
// ---------------------------------------------------------------------------

fn cmd_strip_header(opts: &Options) -> i32 {
    let (Some(input), Some(output)) = (&opts.input_file, &opts.output_file) else {
        eprintln!("romtool: strip-header requires a ROM file");
        return 1;
    };

    match rio::strip_header_file(input, output, opts.force) {
        Ok(stats) => {
            if opts.json_output {
                print_json(&serde_json::json!({
                    "command": "strip-header",
                    "input_size": stats.input_size,
                    "output_size": stats.output_size,
                    "input_sha1": stats.input_sha1,
                    "output_sha1": stats.output_sha1,
                }));
            }
            0
        }
        Err(e) => report("strip-header", &e),
    }
}

// ---------------------------------------------------------------------------
// Info command
// ---------------------------------------------------------------------------

fn cmd_info(opts: &Options) -> i32 {
    let Some(input) = &opts.input_file else {
        eprintln!("romtool: info requires a ROM file");
        return 1;
    };

    let data = match rio::read_input(input) {
        Ok(d) => d,
        Err(e) => return report("info", &e),
    };

    let skip = rom::image_offset(&data);
    let copier = skip > 0;
    let image = &data[skip..];

    let header = match rom::locate_header(image) {
        Ok(h) => h,
        Err(e) => return report("info", &IoError::from(e)),
    };
    let computed = rom::compute_checksum(image, header.offset);

    if opts.json_output {
        let json = serde_json::json!({
            "size": data.len(),
            "copier_header": copier,
            "layout": header.layout.name(),
            "header_offset": header.offset,
            "name": header.title_str(),
            "map_mode": header.map_mode,
            "chipset": header.chipset,
            "rom_size": header.rom_size,
            "rom_size_kib": header.rom_size_kib(),
            "ram_size": header.ram_size,
            "ram_size_kib": header.ram_size_kib(),
            "country": header.country,
            "developer": header.developer,
            "version": header.version,
            "checksum_complement": header.complement,
            "checksum": header.checksum,
            "computed_checksum": computed,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("romtool: json: {e}");
                return 1;
            }
        }
        return 0;
    }

    println!(
        "Size: {} (size % 32KB: {})",
        data.len(),
        data.len() % BANK_SIZE
    );
    if copier {
        println!("Copier header: yes ({COPIER_HEADER_LEN} bytes)");
    }
    println!("Layout: {} (header at {:#x})", header.layout, header.offset);
    println!("Name: {}", header.title_str());
    println!("Mode: {:02x}", header.map_mode);
    println!("Chipset: {:02x}", header.chipset);
    println!(
        "ROM size: {:02x} ({} KB)",
        header.rom_size,
        header.rom_size_kib()
    );
    println!(
        "RAM size: {:02x} ({} KB)",
        header.ram_size,
        header.ram_size_kib()
    );
    println!("Country: {:02x}", header.country);
    println!("Developer: {:02x}", header.developer);
    println!("Version: {:02x}", header.version);
    println!("Checksum Complement: {:04x}", header.complement);
    println!("Checksum: {:04x}", header.checksum);
    let verdict = if computed == header.checksum {
        "ok"
    } else {
        "mismatch"
    };
    println!("Computed Checksum: {computed:04x} ({verdict})");

    0
}

// ---------------------------------------------------------------------------
// Patch command
// ---------------------------------------------------------------------------

fn cmd_patch(opts: &Options) -> i32 {
    let (Some(input), Some(output)) = (&opts.input_file, &opts.output_file) else {
        eprintln!("romtool: patch requires a ROM file");
        return 1;
    };
    if opts.patch_files.is_empty() {
        eprintln!("romtool: give patch files as arguments");
        return 1;
    }

    let stats = match rio::patch_file(input, &opts.patch_files, output, opts.force) {
        Ok(s) => s,
        Err(e) => return report("patch", &e),
    };

    if opts.json_output {
        let patches: Vec<_> = stats
            .patches
            .iter()
            .map(|p| {
                serde_json::json!({
                    "path": p.path.display().to_string(),
                    "size": p.size,
                    "sha1": p.sha1,
                    "literal_records": p.apply.literal_records,
                    "rle_records": p.apply.rle_records,
                    "bytes_written": p.apply.bytes_written,
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "command": "patch",
            "rom_size": stats.rom_size,
            "output_size": stats.output_size,
            "rom_sha1": stats.rom_sha1,
            "output_sha1": stats.output_sha1,
            "patches": patches,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Fix-checksum command
// ---------------------------------------------------------------------------

fn cmd_fix_checksum(opts: &Options) -> i32 {
    let (Some(input), Some(output)) = (&opts.input_file, &opts.output_file) else {
        eprintln!("romtool: fix-checksum requires a ROM file");
        return 1;
    };

    match rio::fix_checksum_file(input, output, opts.layout, opts.force) {
        Ok(stats) => {
            if opts.json_output {
                print_json(&serde_json::json!({
                    "command": "fix-checksum",
                    "layout": stats.layout.name(),
                    "copier_header": stats.copier_header,
                    "old_checksum": stats.old_checksum,
                    "new_checksum": stats.new_checksum,
                    "output_sha1": stats.output_sha1,
                }));
            }
            0
        }
        Err(e) => report("fix-checksum", &e),
    }
}

// ---------------------------------------------------------------------------
// Hash command
// ---------------------------------------------------------------------------

fn cmd_hash(opts: &Options) -> i32 {
    let Some(input) = &opts.input_file else {
        eprintln!("romtool: hash requires a file");
        return 1;
    };

    match rio::hash_file(input, opts.algorithm) {
        Ok(digest) => {
            println!("{digest}");
            0
        }
        Err(e) => report("hash", &e),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::StripHeader => cmd_strip_header(&opts),
        Command::Info => cmd_info(&opts),
        Command::Patch => cmd_patch(&opts),
        Command::FixChecksum => cmd_fix_checksum(&opts),
        Command::Hash => cmd_hash(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
