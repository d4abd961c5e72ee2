pub mod answer;
pub mod exam;
pub mod login_log;
pub mod notification;
pub mod question;
pub mod session;
pub mod user;

pub use answer::Answer;
pub use exam::Exam;
pub use login_log::LoginLog;
pub use notification::Notification;
pub use question::{Question, QuestionView};
pub use session::Session;
pub use user::User;
