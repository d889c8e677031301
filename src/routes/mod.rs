pub mod auth;

pub mod users;

pub mod students;

pub mod relations;

pub mod schedule;

pub mod calendar;

pub mod remote_admin;

pub mod remote_admin_proxy;

pub use auth::configure_auth_routes;
pub use calendar::configure_calendar_routes;
pub use relations::configure_relation_routes;
pub use remote_admin::configure_remote_admin_routes;
pub use remote_admin_proxy::configure_remote_admin_proxy_routes;
pub use schedule::{configure_lesson_routes, configure_schedule_routes};
pub use students::configure_student_routes;
pub use users::configure_user_routes;
