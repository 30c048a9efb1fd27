pub mod auditor;
pub mod dump;
pub mod output;
pub mod report;

use colored::Colorize;

pub use auditor::{Auditor, ObjectPartition, PageOutcome, partition_objects};
pub use dump::{DumpOptions, DumpSession, dump_all, dump_object, pull_objects};
pub use output::OutputDir;
pub use report::{DumpSummary, render_summary};

const BANNER: &str = r#"
   __ _ _   _ _ __ __ _ _ __  _ __ ___ | |__   ___
  / _` | | | | '__/ _` | '_ \| '__/ _ \| '_ \ / _ \
 | (_| | |_| | | | (_| | |_) | | | (_) | |_) |  __/
  \__,_|\__,_|_|  \__,_| .__/|_|  \___/|_.__/ \___|
                       |_|
"#;

/// Written to stderr so JSON on stdout stays clean.
pub fn print_banner() {
    eprintln!("{}", BANNER.bright_cyan().bold());
    eprintln!(
        "  {} {}\n",
        "guest access auditor for Salesforce Aura".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
