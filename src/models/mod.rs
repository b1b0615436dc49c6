pub mod milestone;
pub mod task;
pub mod token;
pub mod user;

pub use milestone::{Milestone, MilestoneInput};
pub use task::{Task, TaskInput, TaskQuery, TaskStatus, TaskUrgency};
pub use token::RefreshTokenRecord;
pub use user::{Identity, NewUser, User};
