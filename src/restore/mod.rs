use log::info;

use crate::backup::BackupHandler;
use crate::command;
use crate::error::Error;
use crate::runner::Runner;

impl<R: Runner> BackupHandler<R> {
    pub fn restore(&self, backup_file: Option<&str>) -> Result<(), Error> {
        let backup_file = match backup_file {
            Some(file) if !file.trim().is_empty() => file.replace('\\', "/"),
            _ => {
                return Err(Error::InvalidArgument(String::from(
                    "restore needs the backup file to restore from",
                )))
            }
        };

        let exe_path = self.resolver.exe_path("pg_restore")?;
        let invocation = command::build_restore_command(&self.connection, &exe_path, &backup_file);
        let command_line = invocation.command_line();

        info!("running command: {}", command_line);
        if !self.runner.run(&invocation)? {
            return Err(Error::SubprocessFailure {
                operation: "restore",
                command: command_line,
            });
        }

        info!("completed restore of {} into {}", backup_file, self.connection.database);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::backup::tests::settings;
    use crate::backup::BackupHandler;
    use crate::error::Error;
    use crate::runner::testing::RecordingRunner;
    use tempfile::TempDir;

    #[test]
    fn test_restore_requires_backup_file() {
        let temp_dir = TempDir::new().unwrap();
        let handler =
            BackupHandler::new(settings(temp_dir.path()), Some("dev"), RecordingRunner::new(true))
                .unwrap();

        assert!(matches!(handler.restore(None), Err(Error::InvalidArgument(_))));
        assert!(matches!(handler.restore(Some("  ")), Err(Error::InvalidArgument(_))));
        assert!(handler.runner.invocations.borrow().is_empty());
    }

    #[test]
    fn test_restore_runs_pg_restore() {
        let temp_dir = TempDir::new().unwrap();
        let handler =
            BackupHandler::new(settings(temp_dir.path()), Some("dev"), RecordingRunner::new(true))
                .unwrap();

        handler
            .restore(Some(r"D:\My Backups\myapp-db-20230101-000000.backup"))
            .unwrap();

        let invocations = handler.runner.invocations.borrow();
        assert_eq!(
            invocations[0].command_line(),
            "\"/opt/pg/bin/pg_restore\" -i -h localhost -p 5432 -U dev -d db -v \
             \"D:/My Backups/myapp-db-20230101-000000.backup\""
        );
    }

    #[test]
    fn test_restore_failure_reports_command() {
        let temp_dir = TempDir::new().unwrap();
        let handler =
            BackupHandler::new(settings(temp_dir.path()), Some("dev"), RecordingRunner::new(false))
                .unwrap();

        match handler.restore(Some("backups/db-20230101-000000.backup")) {
            Err(Error::SubprocessFailure { operation, command }) => {
                assert_eq!(operation, "restore");
                assert!(command.ends_with("-v \"backups/db-20230101-000000.backup\""));
                assert!(!command.contains("devsecret"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
