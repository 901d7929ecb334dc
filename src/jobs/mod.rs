pub mod model;
pub mod repo;
pub mod runner;

pub use model::{Job, JobStatus, NewJob};
pub use repo::JobsRepo;
pub use runner::{JobRunner, RunnerConfig};
