use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{info, warn};

use crate::artifact;
use crate::catalog;
use crate::command;
use crate::configuration::{Configuration, ConnectionProfile};
use crate::error::Error;
use crate::formatter::Formatter;
use crate::runner::Runner;
use crate::resolver::{normalize_separators, ExecutableResolver, SearchEnvironment};
use crate::retention::{KeepPeriod, RetentionPolicy};

pub struct BackupHandler<R: Runner> {
    pub(crate) configuration: Configuration,
    pub(crate) connection: ConnectionProfile,
    pub(crate) resolver: ExecutableResolver,
    pub(crate) runner: R,
}

impl<R: Runner> BackupHandler<R> {
    pub fn new(
        configuration: Configuration,
        env_name: Option<&str>,
        runner: R,
    ) -> Result<BackupHandler<R>, Error> {
        Self::with_search_environment(configuration, env_name, runner, SearchEnvironment::from_env())
    }

    pub fn with_search_environment(
        configuration: Configuration,
        env_name: Option<&str>,
        runner: R,
        search: SearchEnvironment,
    ) -> Result<BackupHandler<R>, Error> {
        let connection = configuration.environments.resolve(env_name)?.clone();
        let resolver = ExecutableResolver::new(configuration.bin_dir.clone(), search);

        Ok(BackupHandler {
            configuration,
            connection,
            resolver,
            runner,
        })
    }

    pub fn backup_file(&self, timestamp: NaiveDateTime) -> String {
        let filename = artifact::compose(
            &self.configuration.app_name,
            &self.connection.database,
            &self.configuration.identifier,
            timestamp,
        );
        normalize_separators(Path::new(&self.configuration.backup_dir).join(filename))
    }

    /// Dumps the database into a new artifact and returns its path.
    pub fn backup(&self) -> Result<String, Error> {
        let exe_path = self.resolver.exe_path("pg_dump")?;
        fs::create_dir_all(&self.configuration.backup_dir)?;

        let backup_file = self.backup_file(Local::now().naive_local());
        let invocation = command::build_dump_command(
            &self.connection,
            &exe_path,
            &backup_file,
            &self.configuration.excluded_tables,
        );
        let command_line = invocation.command_line();

        info!("running command: {}", command_line);
        if !self.runner.run(&invocation)? {
            return Err(Error::SubprocessFailure {
                operation: "backup",
                command: command_line,
            });
        }

        match fs::metadata(&backup_file) {
            Ok(meta) => info!(
                "completed backup to {} ({})",
                backup_file,
                Formatter::format_size(meta.len(), 2)
            ),
            Err(_) => info!("completed backup to {}", backup_file),
        }

        Ok(backup_file)
    }

    pub fn prune_old_backups(&self) -> Result<Vec<String>, Error> {
        self.prune_old_backups_at(Local::now().date_naive())
    }

    /// Deletes the backups the retention policy doesn't keep and returns
    /// their file names.
    pub fn prune_old_backups_at(&self, today: NaiveDate) -> Result<Vec<String>, Error> {
        let period: KeepPeriod = self.configuration.keep_one_backup_each.parse()?;
        let policy = RetentionPolicy::new(self.configuration.keep_all_backup_last, period);

        let backup_dir = Path::new(&self.configuration.backup_dir);
        let backups = catalog::scan(
            catalog::list(backup_dir)?,
            &self.configuration.app_name,
            &self.connection.database,
        );
        if backups.is_empty() {
            warn!("no backups found in {}", backup_dir.display());
        }

        let mut deleted = Vec::new();
        for decision in policy.evaluate(&backups, today) {
            if !decision.is_delete() {
                continue;
            }
            info!("delete {}", decision.artifact.filename);
            fs::remove_file(backup_dir.join(&decision.artifact.filename))?;
            deleted.push(decision.artifact.filename);
        }

        Ok(deleted)
    }
}
