//! `fetchq pause|resume|stop` – signal a running `fetchq run`.

use anyhow::Result;

use crate::cli::control_socket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Stop,
}

impl ControlCommand {
    pub fn as_line(self) -> &'static str {
        match self {
            ControlCommand::Pause => "pause",
            ControlCommand::Resume => "resume",
            ControlCommand::Stop => "stop",
        }
    }
}

pub async fn run_control(cmd: ControlCommand) -> Result<()> {
    let path = control_socket::default_socket_path()?;
    if control_socket::send_command(&path, cmd.as_line()).await? {
        println!("Sent {}.", cmd.as_line());
    } else {
        println!("No running queue (start one with `fetchq run`).");
    }
    Ok(())
}
