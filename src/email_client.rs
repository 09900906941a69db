use serde::Serialize;

use crate::error::DispatchError;

/// HTTP client against the mail-relay API.
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    relay_url: String,
    sender: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl EmailClient {
    pub fn new(relay_url: String, sender: String, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            relay_url,
            sender,
        }
    }

    pub async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        text_body: &str,
    ) -> Result<(), DispatchError> {
        let url = format!("{}/email", self.relay_url);
        let request = SendEmailRequest {
            from: &self.sender,
            to: recipient,
            subject,
            text: text_body,
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DispatchError::RelayUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| DispatchError::SendFailed(e.to_string()))?;

        Ok(())
    }
}
