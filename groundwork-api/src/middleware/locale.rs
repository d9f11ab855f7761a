/// Request language middleware
///
/// Reads `Accept-Language` and runs the rest of the stack inside a locale
/// scope, so messages rendered anywhere below follow the caller's language.

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use groundwork_shared::locale::{self, Language};

pub async fn detect_language(req: Request, next: Next) -> Response {
    let language = Language::from_accept_language(
        req.headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    );

    let mut response = locale::scope(language, next.run(req)).await;
    response.headers_mut().insert(
        header::CONTENT_LANGUAGE,
        HeaderValue::from_static(match language {
            Language::EnUs => "en-US",
            Language::PtBr => "pt-BR",
        }),
    );
    response
}
