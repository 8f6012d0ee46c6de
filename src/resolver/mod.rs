use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use log::info;
use walkdir::WalkDir;

use crate::error::Error;

/// The parts of the process environment used to find an executable.
#[derive(Clone, Debug, Default)]
pub struct SearchEnvironment {
    pub path: Option<OsString>,
    pub path_ext: Option<String>,
    pub program_files: Option<PathBuf>,
    pub program_files_x86: Option<PathBuf>,
    pub windows: bool,
}

impl SearchEnvironment {
    pub fn from_env() -> SearchEnvironment {
        SearchEnvironment {
            path: env::var_os("PATH"),
            path_ext: env::var("PATHEXT").ok(),
            program_files: non_empty_path(env::var_os("ProgramFiles")),
            program_files_x86: non_empty_path(env::var_os("ProgramFiles(x86)")),
            windows: cfg!(windows),
        }
    }

    fn extensions(&self) -> Vec<String> {
        let mut extensions = vec![String::new()];
        if let Some(path_ext) = &self.path_ext {
            for ext in path_ext.split(';') {
                if !ext.is_empty() {
                    extensions.push(ext.to_string());
                }
            }
        }
        extensions
    }
}

fn non_empty_path(value: Option<OsString>) -> Option<PathBuf> {
    match value {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Found(PathBuf),
    NotFound,
    /// Matches below both `ProgramFiles` and `ProgramFiles(x86)`.
    Ambiguous(PathBuf, PathBuf),
}

pub struct ExecutableResolver {
    bin_dir: Option<String>,
    search: SearchEnvironment,
}

impl ExecutableResolver {
    pub fn new(bin_dir: Option<String>, search: SearchEnvironment) -> ExecutableResolver {
        ExecutableResolver { bin_dir, search }
    }

    pub fn resolve(&self, exe_name: &str) -> Resolution {
        if let Some(bin_dir) = &self.bin_dir {
            return Resolution::Found(Path::new(bin_dir).join(exe_name));
        }

        let extensions = self.search.extensions();
        if let Some(path) = &self.search.path {
            if let Some(found) = which(exe_name, env::split_paths(path), &extensions) {
                return Resolution::Found(found);
            }
        }

        if !self.search.windows {
            return Resolution::NotFound;
        }

        let pg_path = self
            .search
            .program_files
            .as_ref()
            .and_then(|root| which(exe_name, postgres_bin_dirs(root), &extensions));
        let pg_path_x86 = self
            .search
            .program_files_x86
            .as_ref()
            .and_then(|root| which(exe_name, postgres_bin_dirs(root), &extensions));

        match (pg_path, pg_path_x86) {
            (Some(first), Some(second)) => Resolution::Ambiguous(first, second),
            (Some(found), None) | (None, Some(found)) => Resolution::Found(found),
            (None, None) => Resolution::NotFound,
        }
    }

    /// Resolves `exe_name` to a path usable on a shell-style command line.
    pub fn exe_path(&self, exe_name: &str) -> Result<String, Error> {
        match self.resolve(exe_name) {
            Resolution::Found(path) => {
                let exe_path = normalize_separators(&path);
                info!("using {}: {}", exe_name, exe_path);
                Ok(exe_path)
            }
            Resolution::NotFound => Err(Error::ExecutableNotFound(exe_name.to_string())),
            Resolution::Ambiguous(first, second) => Err(Error::AmbiguousExecutable {
                exe_name: exe_name.to_string(),
                first: normalize_separators(&first),
                second: normalize_separators(&second),
            }),
        }
    }
}

/// Git bash and friends choke on backslashes.
pub fn normalize_separators<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

fn which<I>(exe_name: &str, dirs: I, extensions: &[String]) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    for dir in dirs {
        for ext in extensions {
            let candidate = dir.join(format!("{}{}", exe_name, ext));
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }

    None
}

/// `<root>/PostgreSQL/<version>/bin` for every installed version.
fn postgres_bin_dirs(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root.join("PostgreSQL"))
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.path().join("bin"))
        .filter(|bin| bin.is_dir())
        .collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};

    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
