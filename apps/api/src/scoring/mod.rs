pub mod batch;
pub mod feedback;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod similarity;
pub mod skills;
pub mod verdict;
