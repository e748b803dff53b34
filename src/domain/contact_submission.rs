use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;

pub const CONTACT_SOURCE: &str = "contact";

/// Message left through the portfolio contact form.
#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: SubscriberName,
    pub email: SubscriberEmail,
    pub subject: String,
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct ContactSubmissionBody {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl TryFrom<ContactSubmissionBody> for ContactSubmission {
    type Error = String;

    fn try_from(body: ContactSubmissionBody) -> Result<Self, Self::Error> {
        let name = SubscriberName::parse(body.name)?;
        let email = SubscriberEmail::parse(body.email)?;
        let subject = body.subject.trim().to_string();
        let message = body.message.trim().to_string();

        if subject.is_empty() {
            return Err(String::from("subject cannot be empty"));
        }
        if message.is_empty() {
            return Err(String::from("message cannot be empty"));
        }

        Ok(ContactSubmission {
            name,
            email,
            subject,
            message,
        })
    }
}
