pub mod interview_repository;
pub mod user_repository;

pub use interview_repository::{InterviewRepository, NewInterview, SaveOutcome};
pub use user_repository::{NewUser, UserRepository};
