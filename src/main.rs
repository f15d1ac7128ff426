use std::process::ExitCode;

use clap::Parser;

use mysql_backup_lib::backup::rotation;
use mysql_backup_lib::cli::{Action, Cli};
use mysql_backup_lib::mysql::{BackupConfig, BackupExport, BackupImport};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // init logger
    let mut env_logger = env_logger::builder();
    if let Some(level) = cli.verbose {
        env_logger.filter_level(level);
    }
    env_logger.try_init().expect("env_logger should not fail");

    let config: BackupConfig = match std::fs::read_to_string(&cli.config) {
        Ok(config_str) => match toml::from_str(&config_str) {
            Err(e) => {
                log::error!("Reading the config file failed: {e}");
                return ExitCode::FAILURE;
            }
            Ok(cfg) => cfg,
        },
        Err(e) => {
            if std::fs::exists(&cli.config).is_ok_and(|b| !b) {
                log::debug!(
                    "Writing default config to {} because it doesn't exist yet",
                    cli.config.display()
                );
                let default_config = BackupConfig::default();
                let config_str = toml::to_string_pretty(&default_config)
                    .expect("default config should be serializable");
                if let Err(e) = std::fs::write(&cli.config, config_str) {
                    log::warn!(
                        "Writing default config to {} failed {e}",
                        cli.config.display(),
                    );
                }

                default_config
            } else {
                log::error!("Reading the config file failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    };

    match cli.action {
        Action::Export(args) => {
            let export = BackupExport::new(config);
            match export.export(args.filename.as_deref(), args.compression, args.rotate) {
                Ok(path) => {
                    log::info!(target: "mysql::export", "Backup written to {}", path.display());
                }
                Err(e) => {
                    log::error!(target: "mysql::export", "Export of the database failed: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }

        Action::Import(args) => {
            let import = BackupImport::new(config);
            if let Err(e) = import.import(&args.filename) {
                log::error!(target: "mysql::import", "Import of the database failed: {e}");
                return ExitCode::FAILURE;
            }
        }

        Action::Rotate(args) => match rotation::rotate(&config.target, args.keep) {
            Ok(deleted) => {
                log::info!(target: "backup::rotation", "Deleted {} old backup(s)", deleted.len());
            }
            Err(e) => {
                log::error!(target: "backup::rotation", "Rotating old backups failed: {e}");
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}
