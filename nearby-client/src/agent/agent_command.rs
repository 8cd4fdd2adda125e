use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentCommand {
    MoveTo { x: f64, y: f64 },
    /// Any user input; resets the idle timer.
    Activity,
    VisibilityChanged { visible: bool },
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct AgentHandle {
    tx: mpsc::UnboundedSender<AgentCommand>,
}

impl AgentHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<AgentCommand>) -> Self {
        Self { tx }
    }

    /// Returns false once the agent has stopped.
    pub fn send(&self, command: AgentCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn move_to(&self, x: f64, y: f64) -> bool {
        self.send(AgentCommand::MoveTo { x, y })
    }

    pub fn activity(&self) -> bool {
        self.send(AgentCommand::Activity)
    }

    pub fn set_visible(&self, visible: bool) -> bool {
        self.send(AgentCommand::VisibilityChanged { visible })
    }

    pub fn shutdown(&self) -> bool {
        self.send(AgentCommand::Shutdown)
    }
}
