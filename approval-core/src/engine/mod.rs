mod activate;
mod core;
mod decide;
mod draft;
mod logic;
mod notify;
mod query;
mod resolver;
mod submit;
mod withdraw;

pub use self::core::WorkflowEngine;
pub use self::decide::Decision;
pub use self::logic::{applicable_steps, next_step, route_applies};
pub use self::notify::{NoopNotifier, NotificationPort};
pub use self::query::ApplicationView;
pub use self::resolver::ApproverResolver;
