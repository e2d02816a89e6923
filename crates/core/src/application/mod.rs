// Application Layer - Task lookups and the wait-until-terminal poller

pub mod poller;
pub mod tasks;

// Re-exports
pub use poller::{cancel_channel, CancelHandle, CancelToken, PollOptions, TaskPoller};
pub use tasks::TaskService;
