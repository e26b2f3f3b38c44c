use clap::{Parser, Subcommand, ValueEnum};
use raid_threat_report::Result;
use raid_threat_report::config::{self, OutputFormat, ReportConfig, SegmentThresholds};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "raid-threat-report")]
#[command(about = "Raid threat report from TWThreat snapshot logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Split threat logs into fights and write a threat report.
    Report {
        /// Directory containing the threat log part files.
        #[arg(long, default_value = "ThreatLogs")]
        log_dir: PathBuf,

        /// File name prefix of the part files (`<prefix>ThreatLog*_part*.txt*`).
        #[arg(long, default_value = config::DEFAULT_PREFIX)]
        prefix: String,

        /// Combat log used for raid, roster and role detection.
        #[arg(long, default_value = "WoWCombatLog.txt")]
        combat_log: PathBuf,

        #[arg(short = 'o', long, default_value = "ThreatLogs/raid-threat-report.html")]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Html)]
        format: Format,

        /// Seconds without snapshots that end a fight.
        #[arg(long, default_value_t = config::DEFAULT_GAP_SECONDS, allow_negative_numbers = true)]
        gap: f64,

        /// Minimum fight duration in seconds.
        #[arg(long, default_value_t = config::DEFAULT_MIN_DURATION, allow_negative_numbers = true)]
        min_duration: f64,

        /// Minimum snapshots per fight.
        #[arg(long, default_value_t = config::DEFAULT_MIN_SNAPSHOTS)]
        min_snapshots: usize,

        /// Raid name shown in the report header.
        #[arg(long)]
        raid: Option<String>,

        /// Only report fights against bosses of the raid.
        #[arg(long)]
        bosses_only: bool,

        /// Only report members of this guild (repeatable).
        #[arg(long = "guild")]
        guilds: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Report {
            log_dir,
            prefix,
            combat_log,
            output,
            format,
            gap,
            min_duration,
            min_snapshots,
            raid,
            bosses_only,
            guilds,
        } => {
            let config = ReportConfig {
                log_dir,
                prefix,
                combat_log,
                output,
                format: match format {
                    Format::Html => OutputFormat::Html,
                    Format::Json => OutputFormat::Json,
                },
                thresholds: SegmentThresholds {
                    gap_seconds: gap,
                    min_duration,
                    min_snapshots,
                },
                raid_override: raid,
                bosses_only,
                guilds,
            };

            let outcome = raid_threat_report::run_report(&config)?;
            println!(
                "Wrote {} ({} fights from {} snapshots; raid={})",
                outcome.output.display(),
                outcome.report.totals.fights,
                outcome.snapshots,
                outcome.report.raid.name
            );
        }
    }

    Ok(())
}
