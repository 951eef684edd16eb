// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use fabwatch_app::AppState;
use runtime::{DemoRuntime, HttpRuntime};
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // The offset lookup only succeeds while the process is single-threaded;
    // the HTTP client spawns its runtime thread as soon as it is built.
    let clock_offset = fabwatch_tui::local_clock_offset();

    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `fabwatch --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let mut state = AppState {
        active_filter: config.default_filter(),
        ..AppState::default()
    };

    if options.demo {
        if options.check_only {
            return Ok(());
        }
        let mut runtime = DemoRuntime::new();
        return fabwatch_tui::run_app(&mut state, &mut runtime, clock_offset);
    }

    let base_url = match &options.server_url {
        Some(url) => url.trim_end_matches('/').to_owned(),
        None => config.server_base_url(),
    };
    let client = fabwatch_api::Client::new(&base_url, config.server_timeout()?).with_context(
        || {
            format!(
                "invalid server settings in {}; fix base_url/timeout values or pass --server",
                options.config_path.display()
            )
        },
    )?;
    if options.check_only {
        return Ok(());
    }

    let mut runtime = HttpRuntime::new(client);
    fabwatch_tui::run_app(&mut state, &mut runtime, clock_offset)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    server_url: Option<String>,
    demo: bool,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        server_url: None,
        demo: false,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--server" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--server requires a base URL"))?;
                options.server_url = Some(value.as_ref().to_owned());
            }
            "--demo" => {
                options.demo = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("fabwatch (Rust)");
    println!("  --config <path>          Use a specific config path");
    println!("  --server <url>           Override the dashboard server base URL");
    println!("  --demo                   Launch against a built-in offline fleet");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and server settings, then exit");
    println!("  --help                   Show this help");
}
