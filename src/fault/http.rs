//! Serving Faults over HTTP: the public half becomes the response, the
//! internal half goes to the log.

use crate::fault::{Cause, Fault};
use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};
use serde::Serialize;
use tracing::error;

impl From<Cause> for StatusCode {
    fn from(cause: Cause) -> StatusCode {
        match cause {
            Cause::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Cause::InvalidInput => StatusCode::BAD_REQUEST,
            Cause::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

// Handlers can return Faults directly; actix renders them through this impl.
impl actix_web::ResponseError for Fault {
    fn status_code(&self) -> StatusCode {
        self.public.cause.into()
    }

    fn error_response(&self) -> HttpResponse {
        error!("{}", self.internal);
        let resp = serde_json::to_string(&ErrBody {
            error: self.to_string(),
        })
        .unwrap_or_else(|e| {
            error!("Serde error: {}", e.to_string());
            "{\"error\": \"ServerError: internal server error\"}".to_owned()
        });
        HttpResponse::build(self.public.cause.into())
            .header(header::CONTENT_TYPE, "application/json")
            .body(resp)
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

#[cfg(test)]
mod tests {
    use crate::fault::*;
    use actix_web::{dev::Service, test, web, App, Error as ActixError};

    #[actix_rt::test]
    async fn test_response_shows_public_error_only() -> Result<(), ActixError> {
        async fn index() -> Fallible<web::Json<String>> {
            let file = std::fs::read_to_string("secret-filename-do-not-leak-to-user");
            file.describe_err(PublicError {
                cause: Cause::NotFound,
                text: "page not found",
            })
            .map(web::Json)
        }

        let mut app =
            test::init_service(App::new().service(web::resource("/").route(web::get().to(index))))
                .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

        let expected_body = "{\"error\":\"NotFound: page not found\"}";
        if let Some(actix_web::body::Body::Bytes(bytes)) = resp.response().body().as_ref() {
            let actual_body = String::from_utf8(bytes.to_vec()).unwrap();
            assert_eq!(actual_body, expected_body);
        } else {
            panic!("wrong response type");
        }
        Ok(())
    }
}
