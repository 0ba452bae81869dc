use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use miette::{Context, IntoDiagnostic, Result};

use migrascope_core::{CommitScanResult, MigConfig, OutputFormat};
use migrascope_history::scan::ScanOptions;
use migrascope_history::series::SeriesBoundary;

#[derive(Parser)]
#[command(
    name = "migrascope",
    version,
    about = "Mine Odoo addon git history for database-schema-impacting commits",
    long_about = "Migrascope scans the commit range between two Odoo release series and keeps\n\
                   only the commits whose diffs touch model declarations (inheritance links,\n\
                   field declarations). Each retained commit is written out as a named .patch\n\
                   artifact so a migration reviewer can read a directory as a changelog.\n\n\
                   Examples:\n  \
                     migrascope scan ./odoo 17            Scan every addon for the 16.0 -> 17.0 gap\n  \
                     migrascope scan ./odoo 17 --addon sale   Scan a single addon\n  \
                     migrascope scan ./odoo 17 --keep-noise   Keep noise-classified commits too\n  \
                     migrascope init                      Create a .migrascope.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .migrascope.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable summaries (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a release-series commit range and emit patch artifacts
    #[command(long_about = "Scan a release-series commit range and emit patch artifacts.\n\n\
        The range runs from the merge base of <series>.0 and its predecessor to the\n\
        commit that closed the release (most recent commit when no release commit is\n\
        found). Commits are classified as structural change, big feature, or noise;\n\
        noise is dropped unless --keep-noise is set.\n\n\
        Examples:\n  migrascope scan ./odoo 17\n  migrascope scan ./odoo 17 --addon account --dump-dependencies\n  migrascope scan ./odoo 17 --commit 0123abcd")]
    Scan {
        /// Path to the repository to scan
        repo_path: PathBuf,

        /// Target release series (e.g. 17 or 17.0)
        #[arg(value_parser = parse_series)]
        series: u32,

        /// Scan a single addon instead of all of them
        #[arg(long)]
        addon: Option<String>,

        /// Base output directory (default from config: module_diff_analysis)
        #[arg(long)]
        output_dir: Option<String>,

        /// Do not nest artifacts under a <series>.0/ directory
        #[arg(long)]
        no_wrap_series_dir: bool,

        /// Dump each addon's dependency tree via manifestoo
        #[arg(long)]
        dump_dependencies: bool,

        /// Keep commits classified as noise (useful for tuning the policy)
        #[arg(long)]
        keep_noise: bool,

        /// Scan a single commit (range becomes its first parent..itself)
        #[arg(long)]
        commit: Option<String>,
    },
    /// Create a default .migrascope.toml configuration file
    #[command(long_about = "Create a default .migrascope.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .migrascope.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Accept both `17` and `17.0` as a series argument.
fn parse_series(raw: &str) -> std::result::Result<u32, String> {
    let trimmed = raw.strip_suffix(".0").unwrap_or(raw);
    match trimmed.parse::<u32>() {
        Ok(series) if series >= 1 => Ok(series),
        _ => Err(format!("invalid series '{raw}' (expected e.g. 17 or 17.0)")),
    }
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m\u{26A1}\x1b[0m \x1b[1mmigrascope\x1b[0m v{version} — how crazy is your next Odoo migration?\n");

        println!("Quick start:");
        println!("  \x1b[36mmigrascope init\x1b[0m               Create a .migrascope.toml config file");
        println!("  \x1b[36mmigrascope scan ./odoo 17\x1b[0m     Scan every addon for the 16.0 -> 17.0 gap\n");

        println!("All commands:");
        println!("  \x1b[32mscan\x1b[0m  Scan a release range and emit per-addon patch artifacts");
        println!("  \x1b[32minit\x1b[0m  Create default configuration\n");
    } else {
        println!("migrascope v{version} — how crazy is your next Odoo migration?\n");

        println!("Quick start:");
        println!("  migrascope init               Create a .migrascope.toml config file");
        println!("  migrascope scan ./odoo 17     Scan every addon for the 16.0 -> 17.0 gap\n");

        println!("All commands:");
        println!("  scan  Scan a release range and emit per-addon patch artifacts");
        println!("  init  Create default configuration\n");
    }

    println!("Run 'migrascope <command> --help' for details.");
}

const DEFAULT_CONFIG: &str = r#"# Migrascope Configuration
# See: https://github.com/akretion-labs/migrascope

[policy]
# Classification thresholds and weights. Defaults mirror years of manual
# tuning against the upstream history; override with care.
# line_change_threshold = 30
# feature_line_threshold = 200
# feature_message_threshold = 45
# attribute_removal_weight = 0.4
# attribute_modify_weight = 0.6
# relation_bonus = 1.0
# significant_attributes = ["company_dependent=", "store=", "compute=", "recursive="]

[repo]
# exclude_prefixes = ["l10n_", "website_", "test"]
# skip_globs = ["hw_*"]
# pr_marker = " odoo/odoo#"
# pr_url_base = "https://github.com/odoo/odoo/pull/"

[output]
# dir = "module_diff_analysis"
# wrap_series_dir = true
"#;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AddonReport {
    addon: String,
    results: Vec<CommitScanResult>,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MigConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(".migrascope.toml");
            if default_path.exists() {
                MigConfig::from_file(default_path).into_diagnostic()?
            } else {
                MigConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
        eprintln!(
            "policy: line threshold {}, feature threshold {}, {} significant attributes",
            config.policy.line_change_threshold,
            config.policy.feature_line_threshold,
            config.policy.significant_attributes.len(),
        );
    }

    match cli.command {
        None => {
            print_welcome(use_color);
            Ok(())
        }
        Some(Command::Init) => {
            let path = Path::new(".migrascope.toml");
            if path.exists() {
                miette::bail!(".migrascope.toml already exists, refusing to overwrite it");
            }
            std::fs::write(path, DEFAULT_CONFIG)
                .into_diagnostic()
                .wrap_err("writing .migrascope.toml")?;
            println!("Created .migrascope.toml");
            Ok(())
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "migrascope", &mut std::io::stdout());
            Ok(())
        }
        Some(Command::Scan {
            ref repo_path,
            series,
            ref addon,
            ref output_dir,
            no_wrap_series_dir,
            dump_dependencies,
            keep_noise,
            ref commit,
        }) => run_scan(
            repo_path,
            series,
            addon.as_deref(),
            output_dir.as_deref(),
            no_wrap_series_dir,
            dump_dependencies,
            keep_noise,
            commit.as_deref(),
            &config,
            cli.format,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_scan(
    repo_path: &Path,
    series: u32,
    addon: Option<&str>,
    output_dir: Option<&str>,
    no_wrap_series_dir: bool,
    dump_dependencies: bool,
    keep_noise: bool,
    commit: Option<&str>,
    config: &MigConfig,
    format: OutputFormat,
) -> Result<()> {
    if !repo_path.join(".git").exists() && git2::Repository::discover(repo_path).is_err() {
        miette::bail!(miette::miette!(
            help = "Point migrascope at a clone of the repository you want to scan",
            "Not a git repository: {}",
            repo_path.display()
        ));
    }

    let repo = git2::Repository::open(repo_path)
        .into_diagnostic()
        .wrap_err("opening repository")?;

    // Resolve the scan range: an explicit commit scans first-parent..itself,
    // otherwise merge-base(<s>.0, <s-1>.0)..release-closing-commit.
    let (start, boundary) = match commit {
        Some(spec) => {
            let end_commit = repo
                .revparse_single(spec)
                .and_then(|o| o.peel_to_commit())
                .into_diagnostic()
                .wrap_err_with(|| format!("resolving commit '{spec}'"))?;
            let parent = end_commit
                .parent(0)
                .into_diagnostic()
                .wrap_err("explicit commit has no parent")?;
            (
                parent.id(),
                SeriesBoundary {
                    oid: end_commit.id(),
                    summary: String::from_utf8_lossy(end_commit.message_bytes())
                        .lines()
                        .next()
                        .unwrap_or("")
                        .to_string(),
                    exact: true,
                },
            )
        }
        None => {
            eprintln!("Getting the merge base with previous series {}.0 ...", series - 1);
            let start = migrascope_history::find_series_start(&repo, series).into_diagnostic()?;
            let boundary = migrascope_history::find_series_end(&repo, series).into_diagnostic()?;
            if !boundary.exact {
                eprintln!(
                    "WARNING: release commit for series {series}.0 not found; using the most recent commit instead"
                );
            }
            (start, boundary)
        }
    };

    eprintln!("Start commit {start}");
    eprintln!("End commit {} - {}", boundary.oid, boundary.summary);

    if start == boundary.oid && commit.is_none() {
        miette::bail!(miette::miette!(
            help = "Check out the target series branch (or master) first",
            "start and end commits are both {start}; nothing to scan"
        ));
    }

    // the dependency tool wants a series label that actually exists
    let deps_series = if boundary.exact {
        format!("{series}.0")
    } else {
        format!("{}.0", series - 1)
    };

    let addons = match addon {
        Some(single) => vec![single.to_string()],
        None => {
            let all = migrascope_history::list_addons(&repo, boundary.oid, &config.repo)
                .into_diagnostic()?;
            eprintln!(
                "Will scan {} addons. (applied prefix filter {:?})",
                all.len(),
                config.repo.exclude_prefixes
            );
            all
        }
    };
    drop(repo);

    let mut base_dir = output_dir.unwrap_or(&config.output.dir).to_string();
    let wrap = !no_wrap_series_dir && config.output.wrap_series_dir;
    if wrap && !base_dir.contains(&series.to_string()) {
        base_dir = format!("{base_dir}/{series}.0");
    }
    let base_dir = PathBuf::from(base_dir);

    let options = ScanOptions { keep_noise };

    let bar = ProgressBar::new(addons.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").into_diagnostic()?,
    );

    let mut reports: Vec<AddonReport> = Vec::new();
    for addon in &addons {
        bar.set_message(addon.clone());

        let results = migrascope_history::scan_addon_commits(
            repo_path,
            addon,
            start,
            boundary.oid,
            config,
            &options,
        )
        .into_diagnostic()
        .wrap_err_with(|| format!("scanning addon '{addon}'"))?;

        let module_dir = base_dir.join(addon);

        if dump_dependencies {
            if let Err(err) = migrascope_report::dump_dependencies(
                "odoo/src/addons",
                &deps_series,
                addon,
                &module_dir,
            ) {
                bar.suspend(|| eprintln!("WARNING: dependency dump for {addon} failed: {err}"));
            }
        }

        for result in &results {
            let path = migrascope_report::write_artifact(
                &module_dir,
                result,
                &config.repo.pr_url_base,
            )
            .into_diagnostic()?;

            if format == OutputFormat::Text {
                bar.suspend(|| {
                    println!("\nTotal Changes: {}", result.total_changes);
                    println!(
                        "Non trivial structural Changes: {}",
                        result.removal_score + result.addition_score
                    );
                    println!("Date: {}", result.date);
                    println!("Summary: {}", result.summary);
                    println!(
                        "PR: {}{}",
                        config.repo.pr_url_base,
                        result.pr_number.as_deref().unwrap_or("")
                    );
                    println!("{}", path.display());
                });
            }
        }

        if format == OutputFormat::Json && !results.is_empty() {
            reports.push(AddonReport {
                addon: addon.clone(),
                results,
            });
        }

        bar.inc(1);
    }
    bar.finish_and_clear();

    // a full scan gets a series-level summary next to the artifacts
    if addon.is_none() && base_dir.exists() {
        migrascope_report::write_series_readme(series, &base_dir).into_diagnostic()?;
    }

    if format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).into_diagnostic()?
        );
    }

    Ok(())
}
