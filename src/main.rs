use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::Level;

use dotnet_archive_releases::archive::{
    ChangelogFetcher, ExtractedTreeInspector, HttpChangelogFetcher, NoInspection,
    VersionInspector,
};
use dotnet_archive_releases::config::{self, ChannelManifest};
use dotnet_archive_releases::generate::{PublishingHistory, generate};
use dotnet_archive_releases::release::{ReconcilerOptions, ReleaseReconciler};
use dotnet_archive_releases::telemetry;
use dotnet_archive_releases::version::{PackageVersionIdentity, RuntimeGrain, compare_versions};

#[derive(Parser)]
#[command(name = "dotnet-archive-releases")]
#[command(version, about = ".NET release metadata from the Ubuntu archive publishing history")]
struct Cli {
    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log to the data directory instead of stderr
    #[arg(long, global = true)]
    log_to_file: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate releases-index.json and per-channel releases.json
    Generate(GenerateArgs),
    /// Compare two Ubuntu package versions (prints lt, eq or gt)
    Compare { a: String, b: String },
    /// Show the product versions encoded in an Ubuntu package version
    Decompose { version: String },
}

#[derive(Args)]
struct GenerateArgs {
    /// Directory of Launchpad publishing history pages (*.json)
    #[arg(long)]
    history: PathBuf,

    /// Output directory
    #[arg(long, short)]
    output: PathBuf,

    /// Channel manifest; defaults to channels.json in the data directory, then
    /// to the built-in channel list
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Root of binary packages extracted per source package version
    #[arg(long)]
    extracted: Option<PathBuf>,

    /// Do not fetch changelogs; security comes from the archive pocket only
    #[arg(long)]
    offline: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let log_file = cli.log_to_file.then(config::log_path);
    let _guard = telemetry::init_tracing(cli.json_logs, level, log_file.as_deref())
        .context("Failed to initialise logging")?;

    match cli.command {
        Command::Generate(args) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run_generate(args)),
        Command::Compare { a, b } => {
            let symbol = match compare_versions(&a, &b) {
                std::cmp::Ordering::Less => "lt",
                std::cmp::Ordering::Equal => "eq",
                std::cmp::Ordering::Greater => "gt",
            };
            println!("{}", symbol);
            Ok(())
        }
        Command::Decompose { version } => {
            let identity = PackageVersionIdentity::decompose(&version)?;
            println!("sdk: {}", identity.sdk());
            if let Some(band) = identity.sdk().feature_band() {
                println!("feature-band: {}", band);
            }
            match identity.runtime_grain() {
                RuntimeGrain::Embedded(runtime) => println!("runtime: {}", runtime),
                RuntimeGrain::SdkOnly => println!("runtime: (not encoded)"),
            }
            println!("revision: {}", identity.revision());
            if let Some(revision_prerelease) = identity.revision_prerelease() {
                println!("revision-prerelease: {}", revision_prerelease);
            }
            println!(
                "sdk-package-version: {}",
                identity.reconstruct_sdk_package_version()
            );
            if let Some(runtime) = identity.reconstruct_runtime_package_version() {
                println!("runtime-package-version: {}", runtime);
            }
            println!("needs-inspection: {}", identity.needs_inspection());
            Ok(())
        }
    }
}

async fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let manifest = ChannelManifest::locate(args.manifest.as_deref(), &config::data_dir())?;
    let history = PublishingHistory::load_dir(&args.history)?;

    let changelogs: Arc<dyn ChangelogFetcher> = Arc::new(HttpChangelogFetcher::new()?);
    let inspector: Arc<dyn VersionInspector> = match args.extracted {
        Some(root) => Arc::new(ExtractedTreeInspector::new(root)),
        None => Arc::new(NoInspection),
    };
    let reconciler =
        ReleaseReconciler::new(changelogs, inspector).with_options(ReconcilerOptions {
            scan_changelogs: !args.offline,
        });

    let files = generate(&manifest, &history, &reconciler).await;
    files.write_to(&args.output)?;

    if !files.errors.is_empty() {
        anyhow::bail!(
            "{} of {} channels could not be generated",
            files.errors.len(),
            manifest.channels.len()
        );
    }

    Ok(())
}
