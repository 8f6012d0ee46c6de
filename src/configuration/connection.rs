use std::fmt;

use crate::error::Error;

pub const DEFAULT_PORT: &str = "5432";

const ENV_SHORTCUTS: [(&str, &str); 2] = [("dev", "development"), ("prod", "production")];

#[derive(Clone, PartialEq)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl ConnectionProfile {
    pub fn new() -> ConnectionProfile {
        ConnectionProfile {
            host: String::new(),
            port: String::from(DEFAULT_PORT),
            username: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// The named connection profiles of the settings file, in file order.
#[derive(Clone, Debug)]
pub struct Environments {
    entries: Vec<(String, ConnectionProfile)>,
}

impl Environments {
    pub fn new() -> Environments {
        Environments {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: String, profile: ConnectionProfile) -> Result<(), Error> {
        if self.get(&name).is_some() {
            return Err(Error::Configuration(format!(
                "the environment '{}' already exists",
                name
            )));
        }
        self.entries.push((name, profile));

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ConnectionProfile> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, profile)| profile)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Picks the profile for `env_name`, expanding `dev` and `prod`.
    ///
    /// A single configured environment is used whatever name was requested,
    /// also for a misspelled one, so check the logged database before
    /// restoring into a settings file with only one environment.
    pub fn resolve(&self, env_name: Option<&str>) -> Result<&ConnectionProfile, Error> {
        let requested = env_name.unwrap_or("").trim();
        let expanded = ENV_SHORTCUTS
            .iter()
            .find(|(shortcut, _)| *shortcut == requested)
            .map(|(_, full)| *full)
            .unwrap_or(requested);

        if let Some(profile) = self.get(expanded) {
            return Ok(profile);
        }
        if self.entries.len() == 1 {
            return Ok(&self.entries[0].1);
        }

        Err(Error::UnknownEnvironment {
            requested: expanded.to_string(),
            available: self.names(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(database: &str) -> ConnectionProfile {
        let mut profile = ConnectionProfile::new();
        profile.host = String::from("localhost");
        profile.database = String::from(database);
        profile
    }

    fn two_environments() -> Environments {
        let mut environments = Environments::new();
        environments
            .insert(String::from("development"), profile("app_dev"))
            .unwrap();
        environments
            .insert(String::from("production"), profile("app_prod"))
            .unwrap();
        environments
    }

    #[test]
    fn test_resolve_expands_shortcuts() {
        let environments = two_environments();
        assert_eq!(
            environments.resolve(Some("dev")).unwrap().database,
            "app_dev"
        );
        assert_eq!(
            environments.resolve(Some("prod")).unwrap().database,
            "app_prod"
        );
        assert_eq!(
            environments.resolve(Some("production")).unwrap().database,
            "app_prod"
        );
    }

    #[test]
    fn test_resolve_unknown_lists_valid_names() {
        let environments = two_environments();
        match environments.resolve(Some("staging")) {
            Err(Error::UnknownEnvironment {
                requested,
                available,
            }) => {
                assert_eq!(requested, "staging");
                assert_eq!(available, vec!["development", "production"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(environments.resolve(None).is_err());
    }

    #[test]
    fn test_resolve_falls_back_to_sole_environment() {
        let mut environments = Environments::new();
        environments
            .insert(String::from("production"), profile("app_prod"))
            .unwrap();
        assert_eq!(environments.resolve(None).unwrap().database, "app_prod");
        assert_eq!(
            environments.resolve(Some("anything")).unwrap().database,
            "app_prod"
        );
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut environments = two_environments();
        assert!(environments
            .insert(String::from("development"), profile("other"))
            .is_err());
        assert_eq!(environments.names().len(), 2);
    }

    #[test]
    fn test_debug_hides_password() {
        let mut profile = profile("app_dev");
        profile.password = String::from("hunter2");
        let debug = format!("{:?}", profile);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("app_dev"));
    }
}
