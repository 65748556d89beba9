//! Response construction for stream requests.
//!
//! # Design Decisions
//! - Every failure to obtain bytes is the same plain-text 500
//! - `Content-Length` equals the body actually sent; for HEAD it is the
//!   window a GET would request

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::stream::ByteRange;

pub const EXCHANGE_FAILED_BODY: &str = "Error fetching data";

/// 206 carrying `chunk` as bytes `range` of a `total`-byte resource.
pub fn partial_content(
    chunk: Bytes,
    range: ByteRange,
    total: u64,
    content_type: &HeaderValue,
) -> Response {
    (
        StatusCode::PARTIAL_CONTENT,
        [
            (header::CONTENT_TYPE, content_type.clone()),
            (header::CONTENT_LENGTH, HeaderValue::from(chunk.len())),
            (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
        ],
        [(header::CONTENT_RANGE, range.content_range(total))],
        chunk,
    )
        .into_response()
}

/// 206 headers for `range` with no body, for HEAD.
pub fn partial_content_head(range: ByteRange, total: u64, content_type: &HeaderValue) -> Response {
    (
        StatusCode::PARTIAL_CONTENT,
        [
            (header::CONTENT_TYPE, content_type.clone()),
            (header::CONTENT_LENGTH, HeaderValue::from(range.len())),
            (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
        ],
        [(header::CONTENT_RANGE, range.content_range(total))],
    )
        .into_response()
}

/// 500 for any failed exchange.
pub fn exchange_failed() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, EXCHANGE_FAILED_BODY).into_response()
}

/// 416 for a window outside the resource.
pub fn range_not_satisfiable(total: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [(header::CONTENT_RANGE, format!("bytes */{}", total))],
        "Range not satisfiable",
    )
        .into_response()
}
