// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Version | Options | Configs | PreReceive | CatBlob | Scan
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use pushgate::cli::global::GlobalOptions;
use pushgate::cli::{self, Command};
use pushgate::cmd::blob::run_cat_blob_command;
use pushgate::cmd::config::{run_configs_command, run_options_command};
use pushgate::cmd::hook::run_pre_receive_command;
use pushgate::cmd::scan::run_scan_command;
use pushgate::config::loader::ConfigLoader;
use pushgate::config::{CONFIG_FILE_NAME, CONFIG_LIST_VAR, Config, ENV_PREFIX};
use pushgate::error::PushBlocked;
use pushgate::logging::{LogConfig, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    if matches!(cli.command, Some(Command::Version)) {
        handle_version_command();
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli.global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_config = build_log_config(&config);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli, &config).await
}

fn build_log_config(config: &Config) -> LogConfig {
    LogConfig::builder()
        .with_console_level(config.global.log_level)
        .with_file_level(config.global.file_log_level)
        .maybe_with_log_file(
            config
                .global
                .log_file
                .as_ref()
                .map(|p| p.display().to_string()),
        )
        .with_json_file(config.global.log_json)
        .build()
}

async fn dispatch_command(cli: &cli::Cli, config: &Config) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(())
        }
        Some(Command::Options) => {
            run_options_command(config);
            Ok(())
        }
        Some(Command::Configs) => {
            let loader = build_config_loader(&cli.global);
            run_configs_command(&loader.format_loaded_files());
            Ok(())
        }
        Some(Command::PreReceive(args)) => run_pre_receive_command(args, config).await,
        Some(Command::CatBlob(args)) => run_cat_blob_command(args, config).await,
        Some(Command::Scan(args)) => run_scan_command(args, config).await,
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(blocked) = e.downcast_ref::<PushBlocked>() {
                eprintln!("{blocked}");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

/// Files read before `--config`: next to the executable, then `PUSHGATETOML`.
fn default_config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
    {
        files.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Some(list) = std::env::var_os(CONFIG_LIST_VAR) {
        files.extend(std::env::split_paths(&list));
    }
    files
}

fn build_config_loader(global: &GlobalOptions) -> ConfigLoader {
    let mut loader = ConfigLoader::new();
    if !global.no_default_configs {
        for path in default_config_files() {
            loader = loader.add_toml_file_optional(path);
        }
    }
    for path in &global.configs {
        loader = loader.add_toml_file(path);
    }
    loader.with_env_prefix(ENV_PREFIX)
}

fn load_config(global: &GlobalOptions) -> pushgate::error::Result<Config> {
    build_config_loader(global)
        .apply_overrides(global.to_config_overrides().as_slice())?
        .build()
}
