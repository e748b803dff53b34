pub mod contact_submission;
pub mod daily_updates;
pub mod idu_submission;
pub mod subscriber;
pub mod subscriber_email;
pub mod subscriber_name;
