use actix_web::{
    HttpResponse, error,
    http::{StatusCode, header::ContentType},
};
use derive_more::derive::{Display, Error};

#[derive(Debug, Display, Error)]
#[display("Error: **{code}** \n {message} \n\n Details: {additional_information}")]
pub struct ServerError {
    pub code: StatusCode,
    pub message: String,
    pub additional_information: String,
}

impl ServerError {
    /// Rejects the request before any retrieval happens.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::BAD_REQUEST,
            message: message.into(),
            additional_information: String::new(),
        }
    }

    pub fn internal(message: impl Into<String>, details: impl ToString) -> Self {
        Self {
            code: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            additional_information: details.to_string(),
        }
    }
}

impl error::ResponseError for ServerError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.message.clone())
    }

    fn status_code(&self) -> StatusCode {
        self.code
    }
}
