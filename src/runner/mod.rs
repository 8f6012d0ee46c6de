use log::{error, info};

use crate::command::Invocation;
use crate::error::Error;

/// Runs a composed invocation to completion.
pub trait Runner {
    /// `Ok(false)` when the child exited unsuccessfully.
    fn run(&self, invocation: &Invocation) -> Result<bool, Error>;
}

pub struct SystemRunner {}

impl Runner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<bool, Error> {
        let mut cmd = invocation.to_command();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                error!("unable to start {}: {}", invocation.program(), err);
                return Err(Error::Io(err));
            }
        };
        let status = child.wait()?;
        info!("{} exited with {}", invocation.program(), status);

        Ok(status.success())
    }
}
