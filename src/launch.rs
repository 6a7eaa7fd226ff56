use std::process::Command;

use tracing::debug;

use crate::plan::{ConnectionPlan, SSH_PROGRAM};

/// Hand the rendered argument list to the system ssh client and block until
/// it exits. The child's exit status becomes ours.
pub fn launch(plan: &ConnectionPlan) -> anyhow::Result<i32> {
    debug!(command = %plan.command_line(), "spawning ssh client");
    let status = Command::new(SSH_PROGRAM)
        .args(plan.render_args())
        .spawn()?
        .wait()?;
    Result::Ok(status.code().unwrap_or(1))
}
