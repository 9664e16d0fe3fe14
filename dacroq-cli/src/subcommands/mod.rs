mod convert;
mod docs;
mod feedback;
mod hardware;
mod monitor;
mod notifications;
mod posts;
mod sat;
mod session;
mod system;
mod tests;
mod users;
mod watch;

pub use convert::Convert;
pub use docs::Docs;
pub use feedback::Feedback;
pub use hardware::Hardware;
pub use monitor::Monitor;
pub use notifications::Notifications;
pub use posts::Posts;
pub use sat::Sat;
pub use session::Session;
pub use system::System;
pub use tests::Tests;
pub use users::Users;
