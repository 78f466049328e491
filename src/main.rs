use clap::Parser;
use engage_report::cli::commands;
use engage_report::cli::{Cli, Commands};
use engage_report::config::CliOverrides;
use engage_report::logging::init_logging;
use engage_report::output::OutputContext;
use engage_report::{ReportError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let ctx = OutputContext::from_args(&cli);
    let overrides = build_cli_overrides(&cli);
    let config_path = cli.config.as_deref();

    let result = match &cli.command {
        Commands::Tickets(args) => commands::tickets::execute(args, config_path, &overrides, &ctx),
        Commands::Report(args) => commands::report::execute(args, config_path, &overrides, &ctx),
        Commands::Config(args) => commands::config::execute(args, config_path, &overrides, &ctx),
        Commands::Version => commands::version::execute(&ctx),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &ReportError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> CliOverrides {
    let mut overrides = CliOverrides {
        rules_file: cli.rules.clone(),
        ..CliOverrides::default()
    };
    match &cli.command {
        Commands::Tickets(args) => {
            overrides.query.clone_from(&args.query);
            overrides.tickets_output.clone_from(&args.output);
        }
        Commands::Report(args) => {
            overrides.prs.clone_from(&args.prs);
            overrides.comments.clone_from(&args.comments);
            overrides.start.clone_from(&args.start);
            overrides.end.clone_from(&args.end);
            overrides.top_n = args.top;
            overrides.output_dir.clone_from(&args.output_dir);
        }
        Commands::Config(_) | Commands::Version => {}
    }
    overrides
}
