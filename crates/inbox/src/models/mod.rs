//! Domain models for inbox entities

mod correspondent;
mod message;
mod thread;

pub use correspondent::{Correspondent, CorrespondentId};
pub use message::{AuthorRole, Message, MessageBuilder, MessageId, PendingId};
pub use thread::Thread;
