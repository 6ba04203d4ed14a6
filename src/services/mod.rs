// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod assist;
pub mod email;
pub mod stripe;
pub mod visibility;

pub use assist::AssistClient;
pub use email::EmailClient;
pub use stripe::{StripeClient, StripeEvent};
pub use visibility::{SyncReport, VisibilityService};
