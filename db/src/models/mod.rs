pub mod user;
pub mod role_counter;
pub mod question_set;
pub mod question;
pub mod test_question;
pub mod test_disqualification;
pub mod notification;
pub mod follow_request;
pub mod user_follow;
pub mod connection_request;
pub mod faculty_connection;
pub mod violation_alert;
pub mod test_attempt;

pub use user::Entity as User;
pub use question_set::Entity as QuestionSet;
pub use question::Entity as Question;
pub use test::Entity as Test;
pub use test_question::Entity as TestQuestion;
pub use test_disqualification::Entity as TestDisqualification;
pub use notification::Entity as Notification;
pub use follow_request::Entity as FollowRequest;
pub use user_follow::Entity as UserFollow;
pub use connection_request::Entity as ConnectionRequest;
pub use faculty_connection::Entity as FacultyConnection;
pub use violation_alert::Entity as ViolationAlert;
pub use test_attempt::Entity as TestAttempt;
