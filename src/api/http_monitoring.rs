//! HTTP monitoring report endpoints.

use actix_web::{HttpRequest, HttpResponse, get, mime, post, web};

use crate::error::{AppError, CsvError};
use crate::models::{ReportQuery, ReportRequest, local_today};
use crate::services::ReportReader;

/// Configure report routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_report).service(post_report);
}

/// Stream a daily HTTP monitoring report as CSV.
///
/// GET /http-monitoring?report=traffic&date=2015-03-07&account=root&top=10
///
/// Rows are returned in file order. With `account`, only rows carrying the
/// account as a tab-delimited field are returned; `top` caps the number of
/// rows. A `top` that is not an integer is ignored.
#[utoipa::path(
    get,
    path = "/api/v1/http-monitoring",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Matching report rows", content_type = "text/csv", body = String),
        (status = 400, description = "Missing report type or unusable account pattern", content_type = "text/csv", body = String),
        (status = 404, description = "No report for this type and date", content_type = "text/csv", body = String),
        (status = 500, description = "Storage backend failure", content_type = "text/csv", body = String)
    )
)]
#[get("/http-monitoring")]
pub async fn get_report(
    req: HttpRequest,
    reader: web::Data<ReportReader>,
) -> Result<HttpResponse, CsvError> {
    let pairs = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map_err(|e| AppError::InvalidInput(format!("Malformed query string: {}", e)))?;
    let query = ReportQuery::from_pairs(pairs.into_inner());
    let request = ReportRequest::resolve(query, local_today())?;

    let lines = reader.open(&request).await?;

    Ok(HttpResponse::Ok()
        .content_type(mime::TEXT_CSV)
        .streaming(lines.into_stream()))
}

/// Reserved for future use; accepts anything and does nothing.
#[utoipa::path(
    post,
    path = "/api/v1/http-monitoring",
    tag = "Reports",
    responses(
        (status = 200, description = "Request accepted, nothing is stored")
    )
)]
#[post("/http-monitoring")]
pub async fn post_report() -> HttpResponse {
    HttpResponse::Ok().finish()
}
