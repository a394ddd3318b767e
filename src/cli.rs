// Command-line front end for shapatch.
//
// Subcommands:
//   diff    <original> <modified> [nosha|nooffset|pretty]...  -> patch JSON on stdout
//   patch   <original> <patchfile> [output]                    -> patched file
//   inspect <patchfile>                                        -> per-record summary
//   config                                                     -> build configuration

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};

use crate::apply::{ApplyOptions, MatchPolicy};
use crate::error::PatchError;
use crate::hash::WINDOW_SIZE;
use crate::io;
use crate::patch::{self, PatchOptions};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Hash-anchored binary patches for fixed-layout files.
#[derive(Parser, Debug)]
#[command(
    name = "shapatch",
    version,
    about = "Create and apply hash-anchored binary patches",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (errors only, record comments suppressed).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Describe the differences between two equal-length files as a patch.
    Diff(DiffArgs),
    /// Apply a patch file to an original file.
    Patch(PatchArgs),
    /// Print and validate the records of a patch file.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

/// Output directives accepted after the two diff inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Directive {
    /// Omit the anchor digest.
    Nosha,
    /// Omit the literal anchor position.
    Nooffset,
    /// Indent the JSON output.
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MatchPolicyArg {
    All,
    First,
    Unique,
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Original file.
    #[arg(value_hint = ValueHint::FilePath)]
    original: PathBuf,

    /// Modified file (same length as the original).
    #[arg(value_hint = ValueHint::FilePath)]
    modified: PathBuf,

    /// Output directives.
    #[arg(value_enum)]
    directives: Vec<Directive>,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// Original file.
    #[arg(value_hint = ValueHint::FilePath)]
    original: PathBuf,

    /// Patch file (JSON).
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// Output file (default: <original>.patched.bin).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Which windows to patch when a digest matches more than once.
    #[arg(long = "match-policy", value_enum, default_value_t = MatchPolicyArg::All)]
    match_policy: MatchPolicyArg,

    /// Use the literal offset when a digest matches nowhere.
    #[arg(long = "offset-fallback")]
    offset_fallback: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Patch file (JSON).
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Diff,
    Patch,
    Inspect,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    patch: PatchOptions,
    apply: ApplyOptions,
    original_file: Option<PathBuf>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

fn patch_options(directives: &[Directive]) -> Result<PatchOptions, PatchError> {
    let mut opts = PatchOptions::default();
    for d in directives {
        match d {
            Directive::Nosha => opts.digest = false,
            Directive::Nooffset => opts.offsets = false,
            Directive::Pretty => opts.pretty = true,
        }
    }
    opts.validate()?;
    Ok(opts)
}

fn match_policy(arg: MatchPolicyArg) -> MatchPolicy {
    match arg {
        MatchPolicyArg::All => MatchPolicy::All,
        MatchPolicyArg::First => MatchPolicy::First,
        MatchPolicyArg::Unique => MatchPolicy::Unique,
    }
}

fn resolve_options(cli: Cli) -> Result<Options, PatchError> {
    let mut opts = Options {
        command: Command::Config,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        patch: PatchOptions::default(),
        apply: ApplyOptions::default(),
        original_file: None,
        input_file: None,
        output_file: None,
    };

    match cli.command {
        Cmd::Diff(args) => {
            opts.command = Command::Diff;
            opts.patch = patch_options(&args.directives)?;
            opts.original_file = Some(args.original);
            opts.input_file = Some(args.modified);
        }
        Cmd::Patch(args) => {
            opts.command = Command::Patch;
            opts.apply = ApplyOptions {
                policy: match_policy(args.match_policy),
                offset_fallback: args.offset_fallback,
            };
            opts.output_file = Some(
                args.output
                    .unwrap_or_else(|| io::default_output_path(&args.original)),
            );
            opts.original_file = Some(args.original);
            opts.input_file = Some(args.patch);
        }
        Cmd::Inspect(args) => {
            opts.command = Command::Inspect;
            opts.input_file = Some(args.patch);
        }
        Cmd::Config => {}
    }
    Ok(opts)
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("shapatch".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("shapatch version {version}");

    let parallel = cfg!(feature = "parallel") as u8;
    eprintln!("WINDOW_SIZE={WINDOW_SIZE}");
    eprintln!("DIGEST=sha256");
    eprintln!("PARALLEL_INDEX={parallel}");
    eprintln!("sizeof(usize)={}", std::mem::size_of::<usize>());

    0
}

// ---------------------------------------------------------------------------
// Diff command
// ---------------------------------------------------------------------------

fn cmd_diff(opts: &Options) -> i32 {
    let (Some(original), Some(modified)) = (&opts.original_file, &opts.input_file) else {
        return 1;
    };

    let (text, stats) = match io::diff_files(original, modified, &opts.patch) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("shapatch: diff: {e}");
            return 1;
        }
    };

    println!("{text}");

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "shapatch: diff: {} bytes, {} records, {} changed bytes",
            stats.original_size, stats.records, stats.changed_bytes
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "diff",
            "original_size": stats.original_size,
            "modified_size": stats.modified_size,
            "records": stats.records,
            "changed_bytes": stats.changed_bytes,
            "original_sha256": hex::encode(stats.original_sha256),
            "modified_sha256": hex::encode(stats.modified_sha256),
        });
        eprintln!("{json:#}");
    }

    0
}

// ---------------------------------------------------------------------------
// Patch command
// ---------------------------------------------------------------------------

fn cmd_patch(opts: &Options) -> i32 {
    let (Some(original), Some(patch_path), Some(output)) =
        (&opts.original_file, &opts.input_file, &opts.output_file)
    else {
        return 1;
    };

    if output.exists() && !opts.force {
        eprintln!(
            "shapatch: output file exists, use -f to overwrite: {}",
            output.display()
        );
        return 1;
    }

    let stats = match io::patch_file(original, patch_path, output, &opts.apply) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("shapatch: patch: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "shapatch: patch: {} records, {} bytes written, output {}",
            stats.report.records,
            stats.report.bytes_written,
            output.display()
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "patch",
            "original_size": stats.original_size,
            "patch_size": stats.patch_size,
            "output_size": stats.output_size,
            "records": stats.report.records,
            "bytes_written": stats.report.bytes_written,
            "fallbacks": stats.report.fallbacks,
            "output_sha256": hex::encode(stats.output_sha256),
        });
        eprintln!("{json:#}");
    }

    0
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

fn cmd_inspect(opts: &Options) -> i32 {
    let Some(path) = &opts.input_file else {
        return 1;
    };

    let set = match io::read_patch_text(path).and_then(|text| patch::deserialize(&text)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("shapatch: inspect: {e}");
            return 1;
        }
    };

    println!("{}: {} records", path.display(), set.len());
    for (i, r) in set.iter().enumerate() {
        let anchor = if r.has_digest() {
            let short: String = r.digest.chars().take(12).collect();
            format!("sha {short}…")
        } else {
            "literal".to_string()
        };
        println!(
            "  #{i:<4} start={:<10} offset={:<4} len={:<6} {anchor}{}",
            r.start,
            r.offset,
            r.replacement.len() / 2,
            if r.comment.is_empty() {
                String::new()
            } else {
                format!("  // {}", r.comment)
            }
        );
    }

    if let Err(e) = set.validate() {
        eprintln!("shapatch: inspect: {e}");
        return 1;
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn log_filter(quiet: bool, verbose: u8) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.quiet, cli.verbose)),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();

    let opts = match resolve_options(cli) {
        Ok(o) => o,
        Err(e) => Cli::command()
            .error(clap::error::ErrorKind::ArgumentConflict, e)
            .exit(),
    };

    let exit_code = match opts.command {
        Command::Diff => cmd_diff(&opts),
        Command::Patch => cmd_patch(&opts),
        Command::Inspect => cmd_inspect(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, PatchError> {
        let argv: Vec<String> = std::iter::once("shapatch".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        let cli = Cli::try_parse_from(argv).expect("cli parse failed");
        resolve_options(cli)
    }

    fn parse_opts(args: &[&str]) -> Options {
        parse(args).expect("resolve failed")
    }

    #[test]
    fn diff_defaults() {
        let opts = parse_opts(&["diff", "a.rom", "b.rom"]);
        assert_eq!(opts.command, Command::Diff);
        assert_eq!(opts.patch, PatchOptions::default());
        assert_eq!(opts.original_file, Some(PathBuf::from("a.rom")));
        assert_eq!(opts.input_file, Some(PathBuf::from("b.rom")));
    }

    #[test]
    fn diff_directives() {
        let opts = parse_opts(&["diff", "a", "b", "nosha", "pretty"]);
        assert!(!opts.patch.digest);
        assert!(opts.patch.offsets);
        assert!(opts.patch.pretty);

        let opts = parse_opts(&["diff", "a", "b", "nooffset"]);
        assert!(opts.patch.digest);
        assert!(!opts.patch.offsets);
    }

    #[test]
    fn conflicting_directives_rejected() {
        let err = parse(&["diff", "a", "b", "nosha", "nooffset"]).unwrap_err();
        assert!(matches!(err, PatchError::AmbiguousDirectives));
    }

    #[test]
    fn unknown_directive_is_a_usage_error() {
        let argv = ["shapatch", "diff", "a", "b", "shiny"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn patch_default_output() {
        let opts = parse_opts(&["patch", "game.sfc", "fix.json"]);
        assert_eq!(opts.command, Command::Patch);
        assert_eq!(opts.input_file, Some(PathBuf::from("fix.json")));
        assert_eq!(
            opts.output_file,
            Some(PathBuf::from("game.sfc.patched.bin"))
        );
        assert_eq!(opts.apply.policy, MatchPolicy::All);
        assert!(!opts.apply.offset_fallback);
    }

    #[test]
    fn patch_explicit_output_and_policy() {
        let opts = parse_opts(&[
            "--force",
            "patch",
            "--match-policy",
            "unique",
            "--offset-fallback",
            "game.sfc",
            "fix.json",
            "out.sfc",
        ]);
        assert!(opts.force);
        assert_eq!(opts.output_file, Some(PathBuf::from("out.sfc")));
        assert_eq!(opts.apply.policy, MatchPolicy::Unique);
        assert!(opts.apply.offset_fallback);
    }

    #[test]
    fn missing_arguments_are_usage_errors() {
        assert!(Cli::try_parse_from(["shapatch", "diff", "a"]).is_err());
        assert!(Cli::try_parse_from(["shapatch", "patch", "a"]).is_err());
        assert!(Cli::try_parse_from(["shapatch"]).is_err());
    }

    #[test]
    fn verbose_is_capped() {
        let opts = parse_opts(&["-vvv", "config"]);
        assert_eq!(opts.verbose, 2);
        assert_eq!(opts.command, Command::Config);
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_filter(true, 2), "error");
        assert_eq!(log_filter(false, 0), "info");
        assert_eq!(log_filter(false, 1), "debug");
        assert_eq!(log_filter(false, 2), "trace");
    }

    #[test]
    fn inspect_maps() {
        let opts = parse_opts(&["inspect", "p.json"]);
        assert_eq!(opts.command, Command::Inspect);
        assert_eq!(opts.input_file, Some(PathBuf::from("p.json")));
    }

    #[test]
    fn fuzz_entry_never_panics() {
        fuzz_try_parse_args(&["diff".into(), "a".into(), "b".into(), "nosha".into()]);
        fuzz_try_parse_args(&["bogus".into()]);
    }
}
