use std::path::Path;

use walkdir::WalkDir;

use crate::artifact::{self, BackupArtifact};
use crate::error::Error;

/// Returns the backups of `database` found in `entries`, oldest first.
///
/// Entries that aren't backups of this database are skipped.
pub fn scan<I, S>(entries: I, app_name: &str, database: &str) -> Vec<BackupArtifact>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut backups: Vec<BackupArtifact> = entries
        .into_iter()
        .filter_map(|entry| artifact::parse(entry.as_ref(), app_name, database))
        .collect();
    backups.sort();

    backups
}

/// File names directly inside `dir`, symlinks to files included.
pub fn list<P: AsRef<Path>>(dir: P) -> Result<Vec<String>, Error> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| Error::Io(err.into()))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    #[test]
    fn test_scan_sorts_ascending() {
        let backups = scan(
            [
                "myapp-db-20230201-000000.backup",
                "myapp-db-20230101-000000.backup",
                "db-20230115-120000.backup",
            ],
            "myapp",
            "db",
        );
        let names: Vec<&str> = backups.iter().map(|b| b.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "myapp-db-20230101-000000.backup",
                "db-20230115-120000.backup",
                "myapp-db-20230201-000000.backup",
            ]
        );
    }

    #[test]
    fn test_scan_breaks_ties_by_filename() {
        let forward = scan(
            [
                "myapp-db-nightly-20230101-000000.backup",
                "myapp-db-20230101-000000.backup",
            ],
            "myapp",
            "db",
        );
        let backward = scan(
            [
                "myapp-db-20230101-000000.backup",
                "myapp-db-nightly-20230101-000000.backup",
            ],
            "myapp",
            "db",
        );
        assert_eq!(forward, backward);
        assert_eq!(forward[0].filename, "myapp-db-20230101-000000.backup");
    }

    #[test]
    fn test_scan_ignores_foreign_files() {
        let backups = scan(
            vec![
                String::from("readme.txt"),
                String::from("otherapp-foo-20230101-000000.backup"),
                String::from("myapp-db-20230101-000000.backup"),
                String::from("myapp-db-20231301-000000.backup"),
                String::from("myapp-db-20230102-000000.backup"),
            ],
            "myapp",
            "db",
        );
        let names: Vec<&str> = backups.iter().map(|b| b.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "myapp-db-20230101-000000.backup",
                "myapp-db-20230102-000000.backup",
            ]
        );
    }

    #[test]
    fn test_list_returns_files_only() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("myapp-db-20230101-000000.backup")).unwrap();
        File::create(temp_dir.path().join("readme.txt")).unwrap();
        fs::create_dir_all(temp_dir.path().join("nested.backup")).unwrap();
        File::create(temp_dir.path().join("nested.backup/db-20230101-000000.backup")).unwrap();

        let mut names = list(temp_dir.path()).unwrap();
        names.sort();
        assert_eq!(names, vec!["myapp-db-20230101-000000.backup", "readme.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_follows_symlinked_backups() {
        let temp_dir = TempDir::new().unwrap();
        let target_dir = TempDir::new().unwrap();
        let target = target_dir.path().join("dump.backup");
        File::create(&target).unwrap();
        std::os::unix::fs::symlink(&target, temp_dir.path().join("db-20230101-000000.backup"))
            .unwrap();
        std::os::unix::fs::symlink(
            target_dir.path().join("gone"),
            temp_dir.path().join("db-20230102-000000.backup"),
        )
        .unwrap();

        let names = list(temp_dir.path()).unwrap();
        assert_eq!(names, vec!["db-20230101-000000.backup"]);
        assert_eq!(scan(names, "myapp", "db").len(), 1);
    }

    #[test]
    fn test_list_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list(temp_dir.path().join("missing")).is_err());
    }
}
