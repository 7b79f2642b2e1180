//! Help-desk chatbot.

use serde::Serialize;
use serde_json::Value;

use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub const EMPTY_MESSAGE_ERROR: &str = "메시지를 입력해 주세요.";
const NO_REPLY_MESSAGE: &str = "챗봇 응답을 받지 못했습니다.";

#[derive(Serialize)]
struct ChatBody<'a> {
    content: &'a str,
}

impl CouncilClient {
    pub fn build_send_chat_message(&self, content: &str) -> Result<HttpRequest, ApiError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::InvalidInput(EMPTY_MESSAGE_ERROR.to_string()));
        }
        self.json_request(HttpMethod::Post, "/chat", &[], &ChatBody { content })
    }

    /// The bot's reply text.
    pub fn parse_send_chat_message(&self, response: HttpResponse) -> Result<String, ApiError> {
        let result = self.envelope(&response)?.require_result(NO_REPLY_MESSAGE)?;
        Ok(result
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        let client = CouncilClient::new("http://localhost:8080");
        assert_eq!(
            client.build_send_chat_message(" \n").unwrap_err(),
            ApiError::InvalidInput(EMPTY_MESSAGE_ERROR.to_string())
        );
        let req = client.build_send_chat_message("  사물함 신청 언제?  ").unwrap();
        assert_eq!(req.url, "http://localhost:8080/chat");
        assert_eq!(req.json_body(), Some(r#"{"content":"사물함 신청 언제?"}"#));
    }

    #[test]
    fn reply_or_default_error() {
        let client = CouncilClient::new("http://localhost:8080");
        let ok = HttpResponse::new(200, r#"{"isSuccess":true,"result":{"content":"3월 첫째 주입니다."}}"#);
        assert_eq!(client.parse_send_chat_message(ok).unwrap(), "3월 첫째 주입니다.");

        let missing = HttpResponse::new(200, r#"{"isSuccess":true,"result":null}"#);
        assert_eq!(
            client.parse_send_chat_message(missing).unwrap_err(),
            ApiError::envelope(NO_REPLY_MESSAGE)
        );
    }
}
