pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use mirrorcat_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            root,
            out,
            config,
            parallelism,
            max_member_size,
            comment_style,
            line_ending,
            line_count,
            prefix,
            depth,
            sort,
            report_json,
        } => handlers::handle_build(
            root,
            out,
            report_json,
            handlers::BuildOverrides {
                config,
                parallelism,
                max_member_size,
                comment_style,
                line_ending,
                line_count,
                prefix,
                depth,
                sort,
            },
        ),
        Commands::Scan { root, depth, sort } => handlers::handle_scan(root, depth, sort),
        Commands::List { archive, config } => handlers::handle_list(archive, config),
    }
}
