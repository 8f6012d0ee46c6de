#[macro_use]
extern crate clap;
#[macro_use]
extern crate lazy_static;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Arg, Command};
use log::{error, info, LevelFilter};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    filter::threshold::ThresholdFilter,
};

mod artifact;
mod backup;
mod catalog;
mod command;
mod configuration;
mod error;
mod formatter;
mod resolver;
mod restore;
mod retention;
mod runner;

use backup::BackupHandler;
use error::Error;
use runner::SystemRunner;

struct Arguments {
    backup_file: Option<String>,
    backup_settings_file: String,
    env: Option<String>,
    mode: String,
}

fn start_main(arguments: Arguments) -> Result<(), Error> {
    let backup_configuration =
        configuration::Configuration::load(arguments.backup_settings_file.as_str())?;
    let handler = BackupHandler::new(
        backup_configuration,
        arguments.env.as_deref(),
        SystemRunner {},
    )?;

    match arguments.mode.as_str() {
        "backup" => {
            handler.backup()?;
        }
        "restore" => {
            handler.restore(arguments.backup_file.as_deref())?;
        }
        "prune" => {
            let deleted = handler.prune_old_backups()?;
            info!("{} old backup(s) deleted", deleted.len());
        }
        mode => {
            return Err(Error::InvalidArgument(format!(
                "invalid mode: {} (expected backup, restore or prune)",
                mode
            )));
        }
    }

    Ok(())
}

fn init_logging() -> Result<(), String> {
    let level = LevelFilter::Debug;
    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(Root::builder().appender("stderr").build(LevelFilter::Info))
        .map_err(|err| format!("{}", err))?;
    log4rs::init_config(config).map_err(|err| format!("{}", err))?;

    Ok(())
}

fn main() {
    if let Err(err) = init_logging() {
        eprintln!("unable to initialize logging: {}", err);
        process::exit(1);
    }

    let arguments = get_arguments();
    if let Err(err) = start_main(arguments) {
        error!("{}", err);
        process::exit(1);
    }
}

fn get_arguments() -> Arguments {
    let matches = Command::new("rusty-pg-backup")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Backup, restore and prune PostgreSQL dumps made with pg_dump/pg_restore.")
        .arg(
            Arg::new("backup-settings-file")
                .short('s')
                .long("backup-settings-file")
                .value_name("FILE")
                .help("The file, where to load the backup settings (default: backup_settings.xml)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Specify a config file from where to read settings"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("backup (default), restore or prune"),
        )
        .arg(
            Arg::new("env")
                .short('e')
                .long("env")
                .value_name("ENV")
                .help("The environment to use, dev and prod are shortcuts for development and production"),
        )
        .arg(
            Arg::new("backup-file")
                .short('f')
                .long("backup-file")
                .value_name("FILE")
                .help("The backup to restore (restore mode only)"),
        )
        .get_matches();

    let home_dir = dirs::home_dir()
        .unwrap_or(PathBuf::from("~"))
        .to_string_lossy()
        .into_owned();
    let config_file_name = match matches.get_one::<String>("config") {
        Some(file) => {
            let normalized_file = file.replace("~", &home_dir);
            if !Path::new(&normalized_file).exists() {
                error!("config file doesn't exists.");
                process::exit(1);
            };
            Some(normalized_file)
        }
        None => {
            let normalized = "~/rusty-pg-backup.conf".replace("~", &home_dir);
            if Path::new("rusty-pg-backup.conf").exists() {
                Some(String::from("rusty-pg-backup.conf"))
            } else if Path::new(normalized.as_str()).exists() {
                Some(normalized)
            } else if Path::new("/etc/rusty-pg-backup.conf").exists() {
                Some(String::from("/etc/rusty-pg-backup.conf"))
            } else {
                None
            }
        }
    };

    let mut arguments = Arguments {
        backup_file: None,
        backup_settings_file: String::from("backup_settings.xml"),
        env: None,
        mode: String::from("backup"),
    };

    if let Some(file_name) = config_file_name {
        info!("read setting from {}", file_name);
        match File::open(&file_name) {
            Ok(file) => apply_config_file(&mut arguments, BufReader::new(file)),
            Err(err) => error!("unable to read {}: {}", file_name, err),
        }
    }

    if let Some(value) = matches.get_one::<String>("backup-settings-file") {
        arguments.backup_settings_file = value.clone();
    }
    if let Some(value) = matches.get_one::<String>("mode") {
        arguments.mode = value.clone();
    }
    if let Some(value) = matches.get_one::<String>("env") {
        arguments.env = Some(value.clone());
    }
    if let Some(value) = matches.get_one::<String>("backup-file") {
        arguments.backup_file = Some(value.clone());
    }

    arguments
}

/// Reads `key = value` lines, unknown keys and malformed lines are ignored.
fn apply_config_file<R: BufRead>(arguments: &mut Arguments, buffer: R) {
    for line in buffer.lines() {
        let l = match line {
            Ok(l) => l,
            Err(_) => continue,
        };
        let position_of_equal_sign = match l.find('=') {
            Some(position) => position,
            None => continue,
        };
        let key = l[..position_of_equal_sign].trim();
        let value = l[(position_of_equal_sign + 1)..].trim().to_string();

        match key {
            "backup_settings_file" => {
                arguments.backup_settings_file = value;
            }
            "mode" => {
                arguments.mode = value;
            }
            "env" => {
                arguments.env = Some(value);
            }
            _ => (),
        }
    }
}
