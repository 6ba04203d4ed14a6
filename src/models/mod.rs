// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod billing;
pub mod invitation;
pub mod lesson;
pub mod message;
pub mod profile;
pub mod submission;
pub mod user;

pub use billing::Subscription;
pub use invitation::Invitation;
pub use lesson::{Lesson, PublishStatus};
pub use message::{Conversation, Message};
pub use profile::{CoachProfile, CoachStatus, ListingEntry};
pub use submission::{Review, Submission, SubmissionStatus};
pub use user::{Role, User};
