use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "jar-identifier")]
#[command(about = "Identify Maven coordinates (groupId, artifactId, version) of unknown jars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Analyze jars offline and against remote Maven repositories
    Analyze {
        /// Jar files or directories (flattened one level, *.jar only)
        #[arg(long, value_name = "PATH", num_args = 1.., required = true)]
        jars: Vec<PathBuf>,

        /// Report file path; '{datetime}' is replaced at write time
        #[arg(
            long,
            value_name = "TEMPLATE",
            default_value = "jar-report-{datetime}.json"
        )]
        report_file: String,

        /// Skip the online phase entirely
        #[arg(long)]
        offline: bool,

        /// Process at most N jars
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Never prompt; omit unresolved jars from the report
        #[arg(long)]
        skip_not_found: bool,

        /// Always print candidate sources, even for auto-selected jars
        #[arg(long)]
        force_detailed_output: bool,
    },
}
