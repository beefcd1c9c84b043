use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "bento")]
#[command(bin_name = "bento")]
#[command(version, about, long_about = None)]
pub struct BentoCliArgs {
    /// Print the parsed AST and exit instead of running the program. This is
    /// useful for debugging; the format is not guaranteed to stay stable.
    #[arg(long)]
    pub ast: bool,

    /// The bento source files to run, in order.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}
