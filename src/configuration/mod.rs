use std::{
    fs::File,
    io::{BufReader, Read},
    time::Duration,
};

use xml::reader::{EventReader, XmlEvent as XmlReaderEvent};

pub mod connection;

pub use connection::{ConnectionProfile, Environments};

use crate::error::Error;

pub struct Configuration {
    pub app_name: String,
    pub backup_dir: String,
    pub bin_dir: Option<String>,
    pub environments: Environments,
    pub excluded_tables: Vec<String>,
    pub identifier: String,
    pub keep_all_backup_last: Duration,
    /// Raw period name, validated when retention runs.
    pub keep_one_backup_each: String,
}

impl Configuration {
    pub const DEFAULT_KEEP_ALL_BACKUP_LAST: Duration = Duration::from_secs(30 * 24 * 60 * 60);
    pub const DEFAULT_KEEP_ONE_BACKUP_EACH: &'static str = "month";

    pub fn new() -> Configuration {
        Configuration {
            app_name: String::new(),
            backup_dir: String::new(),
            bin_dir: None,
            environments: Environments::new(),
            excluded_tables: Vec::new(),
            identifier: String::new(),
            keep_all_backup_last: Self::DEFAULT_KEEP_ALL_BACKUP_LAST,
            keep_one_backup_each: String::from(Self::DEFAULT_KEEP_ONE_BACKUP_EACH),
        }
    }

    pub fn load(filename: &str) -> Result<Configuration, Error> {
        let mut real_filename = String::from(filename);
        if let Some(home_dir) = dirs::home_dir() {
            if let Some(home) = home_dir.to_str() {
                real_filename = real_filename.replace("~", home);
            }
        }

        let file = File::open(&real_filename).map_err(|err| {
            Error::Configuration(format!(
                "unable to open backup settings '{}': {}",
                real_filename, err
            ))
        })?;

        Self::parse(BufReader::new(file))
    }

    pub fn parse<R: Read>(reader: R) -> Result<Configuration, Error> {
        let mut configuration = Configuration::new();
        let mut depth = 0;

        let parser = EventReader::new(reader);
        for e in parser {
            match e {
                Ok(XmlReaderEvent::StartElement {
                    name, attributes, ..
                }) => {
                    depth += 1;
                    match name.to_string().as_str() {
                        "backup-configuration" => {
                            for attr in attributes {
                                match attr.name.to_string().as_str() {
                                    "app-name" => {
                                        configuration.app_name = attr.value;
                                    }
                                    "identifier" => {
                                        configuration.identifier = attr.value;
                                    }
                                    "backup-dir" => {
                                        configuration.backup_dir = attr.value;
                                    }
                                    "bin-dir" => {
                                        if !attr.value.trim().is_empty() {
                                            configuration.bin_dir = Some(attr.value);
                                        }
                                    }
                                    "keep-all-backup-last" => {
                                        match parse_duration0::parse(attr.value.as_str()) {
                                            Ok(duration) => {
                                                configuration.keep_all_backup_last = duration;
                                            }
                                            Err(err) => {
                                                return Err(Error::Configuration(format!(
                                                    "invalid keep-all-backup-last value '{}': {:?}",
                                                    attr.value, err
                                                )));
                                            }
                                        }
                                    }
                                    "keep-one-backup-each" => {
                                        configuration.keep_one_backup_each = attr.value;
                                    }
                                    _ => {}
                                }
                            }
                        }
                        "excluded-tables" => {}
                        "table" => {
                            if depth == 3 {
                                for attr in attributes {
                                    if attr.name.to_string() == "name" && !attr.value.is_empty() {
                                        configuration.excluded_tables.push(attr.value);
                                    }
                                }
                            }
                        }
                        "environments" => {}
                        "environment" => {
                            let mut env_name = String::new();
                            let mut profile = ConnectionProfile::new();

                            for attr in attributes {
                                match attr.name.to_string().as_str() {
                                    "name" => {
                                        env_name = attr.value;
                                    }
                                    "host" => {
                                        profile.host = attr.value;
                                    }
                                    "port" => {
                                        if !attr.value.is_empty() {
                                            profile.port = attr.value;
                                        }
                                    }
                                    "username" => {
                                        profile.username = attr.value;
                                    }
                                    "password" => {
                                        profile.password = attr.value;
                                    }
                                    "database" => {
                                        profile.database = attr.value;
                                    }
                                    _ => {}
                                }
                            }

                            if env_name.is_empty() {
                                return Err(Error::Configuration(String::from(
                                    "every environment needs a name",
                                )));
                            }
                            if profile.database.is_empty() {
                                return Err(Error::Configuration(format!(
                                    "the environment '{}' has no database",
                                    env_name
                                )));
                            }
                            configuration.environments.insert(env_name, profile)?;
                        }
                        _ => {}
                    }
                }
                Ok(XmlReaderEvent::EndElement { .. }) => {
                    depth -= 1;
                }
                Err(err) => {
                    return Err(Error::Configuration(format!("XML-Error: {:?}", err)));
                }
                _ => {}
            }
        }

        if configuration.backup_dir.is_empty() {
            return Err(Error::Configuration(String::from(
                "the backup-dir must be set",
            )));
        }
        if configuration.environments.names().is_empty() {
            return Err(Error::Configuration(String::from(
                "at least one environment must be configured",
            )));
        }

        Ok(configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<backup-configuration app-name="myapp" identifier="nightly" backup-dir="/var/backups/myapp"
                      bin-dir="" keep-all-backup-last="14 days" keep-one-backup-each="week">
    <excluded-tables>
        <table name="audit_log" />
        <table name="sessions" />
    </excluded-tables>
    <environments>
        <environment name="development" host="localhost" username="dev" database="myapp_dev" />
        <environment name="production" host="db.internal" port="6432" username="app"
                     password="secret" database="myapp_prod" />
    </environments>
</backup-configuration>
"#;

    #[test]
    fn test_parse_settings() {
        let configuration = Configuration::parse(SETTINGS.as_bytes()).unwrap();

        assert_eq!(configuration.app_name, "myapp");
        assert_eq!(configuration.identifier, "nightly");
        assert_eq!(configuration.backup_dir, "/var/backups/myapp");
        assert_eq!(configuration.bin_dir, None);
        assert_eq!(configuration.excluded_tables, vec!["audit_log", "sessions"]);
        assert_eq!(
            configuration.keep_all_backup_last,
            Duration::from_secs(14 * 24 * 60 * 60)
        );
        assert_eq!(configuration.keep_one_backup_each, "week");
        assert_eq!(
            configuration.environments.names(),
            vec!["development", "production"]
        );

        let production = configuration.environments.get("production").unwrap();
        assert_eq!(production.host, "db.internal");
        assert_eq!(production.port, "6432");
        assert_eq!(production.password, "secret");
    }

    #[test]
    fn test_parse_applies_defaults() {
        let configuration = Configuration::parse(SETTINGS.as_bytes()).unwrap();
        let development = configuration.environments.get("development").unwrap();
        assert_eq!(development.port, "5432");
        assert_eq!(development.password, "");

        let minimal = r#"<backup-configuration app-name="myapp" backup-dir="backups">
    <environments>
        <environment name="production" database="myapp_prod" />
    </environments>
</backup-configuration>"#;
        let configuration = Configuration::parse(minimal.as_bytes()).unwrap();
        assert_eq!(
            configuration.keep_all_backup_last,
            Configuration::DEFAULT_KEEP_ALL_BACKUP_LAST
        );
        assert_eq!(configuration.keep_one_backup_each, "month");
        assert_eq!(configuration.identifier, "");
        assert!(configuration.excluded_tables.is_empty());
    }

    #[test]
    fn test_parse_keeps_bin_dir_override() {
        let xml = r#"<backup-configuration backup-dir="backups" bin-dir="C:\Program Files\PostgreSQL\16\bin">
    <environments><environment name="production" database="db" /></environments>
</backup-configuration>"#;
        let configuration = Configuration::parse(xml.as_bytes()).unwrap();
        assert_eq!(
            configuration.bin_dir.as_deref(),
            Some(r"C:\Program Files\PostgreSQL\16\bin")
        );
    }

    #[test]
    fn test_parse_rejects_invalid_settings() {
        let missing_database = r#"<backup-configuration backup-dir="backups">
    <environments><environment name="production" /></environments>
</backup-configuration>"#;
        assert!(matches!(
            Configuration::parse(missing_database.as_bytes()),
            Err(Error::Configuration(_))
        ));

        let bad_duration = r#"<backup-configuration backup-dir="backups" keep-all-backup-last="soon">
    <environments><environment name="production" database="db" /></environments>
</backup-configuration>"#;
        assert!(matches!(
            Configuration::parse(bad_duration.as_bytes()),
            Err(Error::Configuration(_))
        ));

        let duplicate = r#"<backup-configuration backup-dir="backups">
    <environments>
        <environment name="production" database="db" />
        <environment name="production" database="db2" />
    </environments>
</backup-configuration>"#;
        assert!(Configuration::parse(duplicate.as_bytes()).is_err());

        let no_environment = r#"<backup-configuration backup-dir="backups" />"#;
        assert!(Configuration::parse(no_environment.as_bytes()).is_err());
    }
}
