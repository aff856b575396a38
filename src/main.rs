use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use profile_restore::{
    BackupKind, RestoreEvent, RestoreOutcome, RestoreReport, RestoreRequest, RestoreWorker,
    UserProfile, logger, preview,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "profile-restore",
    about = "Restore a folder or ZIP backup into your user profile folders",
    version
)]
struct Args {
    #[arg(short, long, value_name = "PATH", help = "Path to the backup folder or ZIP file")]
    source: PathBuf,
    #[arg(short, long, help = "Treat the backup as a compressed ZIP file")]
    compressed: bool,
    #[arg(short = 'a', long, help = "Analyze only, do not restore")]
    analyze_only: bool,
    #[arg(short, long, help = "Do not ask for confirmation")]
    yes: bool,
    #[arg(
        long,
        value_name = "PATH",
        env = "RESTORE_USER_PROFILE",
        help = "Profile directory to restore into (defaults to your home directory)"
    )]
    user_profile: Option<PathBuf>,
    #[arg(
        long,
        value_name = "NAME",
        env = "RESTORE_ACCOUNT",
        help = "Account name used when remapping paths (defaults to the profile folder name)"
    )]
    account: Option<String>,
    #[arg(long, value_name = "LEVEL", default_value = "info", help = "Log level, overridden by RUST_LOG")]
    log_level: String,
}

fn confirm() -> bool {
    print!("\nProceed? (y/n): ");
    io::stdout().flush().ok();

    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }

    let answer = answer.trim().to_lowercase();
    answer.starts_with('y') || answer.starts_with('j')
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn run(request: RestoreRequest) -> io::Result<RestoreOutcome> {
    let handle = RestoreWorker::spawn(request)?;
    let bar = progress_bar();

    for event in handle.events() {
        match event {
            RestoreEvent::Message(message) => bar.suspend(|| info!("{message}")),
            RestoreEvent::Progress(percent) => bar.set_position(u64::from(percent)),
            RestoreEvent::Finished(_) => break,
        }
    }
    bar.finish_and_clear();

    Ok(handle.join())
}

fn print_summary(report: &RestoreReport) {
    println!("\n{}", "=".repeat(60));
    println!(" Restore completed!");
    println!(" Folders restored:  {}", report.folders_restored);
    println!(" Folders skipped:   {}", report.folders_skipped);
    println!(" Files restored:    {}", report.files_restored);
    println!(" Errors:            {}", report.files_failed);
    println!("{}", "=".repeat(60));
}

fn main() {
    let args = Args::parse();

    if let Err(e) = logger::init(&args.log_level) {
        eprintln!("ERROR: Could not set up logging: {}", e);
    }

    let source = args.source.as_path();
    if !source.exists() {
        eprintln!("ERROR: Backup not found: {}", source.display());
        process::exit(1);
    }

    let kind = if args.compressed {
        BackupKind::Compressed
    } else {
        BackupKind::detect(source)
    };

    match preview(source, kind) {
        Ok(preview) => println!("\n{}\n", preview),
        Err(e) => {
            eprintln!("ERROR: Could not read backup: {}", e);
            process::exit(1);
        }
    }

    if args.analyze_only {
        return;
    }

    let profile = match UserProfile::resolve(args.user_profile, args.account) {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!("  Source:  {}", source.display());
    println!("  Profile: {} ({})", profile.home.display(), profile.account);
    println!("\nWARNING: Restoring will overwrite existing files in your user folders!");

    if !args.yes && !confirm() {
        println!("Cancelled.");
        return;
    }

    let request = RestoreRequest {
        backup: source.to_path_buf(),
        kind,
        profile,
    };

    match run(request) {
        Ok(RestoreOutcome::Completed { report, .. }) => print_summary(&report),
        Ok(RestoreOutcome::Cancelled) => {
            println!("Restore cancelled. Already restored files were not removed.");
            process::exit(1);
        }
        Ok(RestoreOutcome::Failed(message)) => {
            eprintln!("ERROR: Restore failed: {}", message);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("ERROR: Could not start restore: {}", e);
            process::exit(1);
        }
    }
}
