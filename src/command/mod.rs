use std::{fmt, process::Command};

use crate::configuration::ConnectionProfile;

pub const PASSWORD_ENV: &str = "PGPASSWORD";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Quoting {
    WhenNeeded,
    Always,
}

#[derive(Clone, Debug, PartialEq)]
struct Argument {
    value: String,
    quoting: Quoting,
}

/// A fully composed pg_dump/pg_restore call.
///
/// The password is only handed to the child process as `PGPASSWORD`, it is
/// neither part of the command line nor of the `Debug` output.
#[derive(Clone, PartialEq)]
pub struct Invocation {
    program: String,
    args: Vec<Argument>,
    password: String,
}

impl Invocation {
    fn new(program: &str, password: &str) -> Invocation {
        Invocation {
            program: String::from(program),
            args: Vec::new(),
            password: String::from(password),
        }
    }

    fn arg<S: Into<String>>(&mut self, value: S) -> &mut Invocation {
        self.args.push(Argument {
            value: value.into(),
            quoting: Quoting::WhenNeeded,
        });
        self
    }

    fn quoted_arg<S: Into<String>>(&mut self, value: S) -> &mut Invocation {
        self.args.push(Argument {
            value: value.into(),
            quoting: Quoting::Always,
        });
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> Vec<&str> {
        self.args.iter().map(|arg| arg.value.as_str()).collect()
    }

    pub fn command_line(&self) -> String {
        let mut line = quote(&self.program);
        for arg in &self.args {
            line.push(' ');
            if arg.quoting == Quoting::Always || arg.value.chars().any(char::is_whitespace) {
                line.push_str(&quote(&arg.value));
            } else {
                line.push_str(&arg.value);
            }
        }
        line
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args());
        if self.password.is_empty() {
            cmd.env_remove(PASSWORD_ENV);
        } else {
            cmd.env(PASSWORD_ENV, &self.password);
        }
        cmd
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("command_line", &self.command_line())
            .finish()
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

fn push_connectivity(invocation: &mut Invocation, connection: &ConnectionProfile) {
    invocation
        .arg("-i")
        .arg("-h")
        .arg(connection.host.as_str())
        .arg("-p")
        .arg(connection.port.as_str())
        .arg("-U")
        .arg(connection.username.as_str());
}

pub fn build_dump_command(
    connection: &ConnectionProfile,
    exe_path: &str,
    backup_file: &str,
    excluded_tables: &[String],
) -> Invocation {
    let mut invocation = Invocation::new(exe_path, &connection.password);
    push_connectivity(&mut invocation, connection);
    invocation.arg("-F").arg("c").arg("-b").arg("-a").arg("-v");
    for table in excluded_tables {
        invocation.arg("-T").arg(table.as_str());
    }
    invocation
        .arg("-f")
        .arg(backup_file)
        .arg(connection.database.as_str());

    invocation
}

pub fn build_restore_command(
    connection: &ConnectionProfile,
    exe_path: &str,
    backup_file: &str,
) -> Invocation {
    let mut invocation = Invocation::new(exe_path, &connection.password);
    push_connectivity(&mut invocation, connection);
    invocation
        .arg("-d")
        .arg(connection.database.as_str())
        .arg("-v")
        .quoted_arg(backup_file);

    invocation
}
