use serde::Deserialize;

use crate::domain::daily_updates::DailyUpdatesAnswer;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;

/// Validated sign-up coming from the IDU subscription form.
#[derive(Debug, Clone)]
pub struct IduSubmission {
    pub name: SubscriberName,
    pub email: SubscriberEmail,
    pub wants_daily_updates: bool,
    pub message: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IduSubmissionBody {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub wants_daily_updates: DailyUpdatesAnswer,
    pub message: Option<String>,
}

impl TryFrom<IduSubmissionBody> for IduSubmission {
    type Error = String;

    fn try_from(body: IduSubmissionBody) -> Result<Self, Self::Error> {
        let name = SubscriberName::parse(body.name)?;
        let email = SubscriberEmail::parse(body.email)?;
        let message = body
            .message
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty());

        Ok(IduSubmission {
            name,
            email,
            wants_daily_updates: body.wants_daily_updates.wants_daily_updates(),
            message,
        })
    }
}
