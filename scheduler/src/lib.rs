pub mod notify;
pub mod scheduler;
pub mod types;

pub use scheduler::WorkflowScheduler;
pub use types::SchedulerConfig;
