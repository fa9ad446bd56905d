use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpResponse, Responder};
use log::{error, info, warn};
use uuid::Uuid;

use crate::agreement::validation::MAX_SIGNATURE_BYTES;
use crate::state::AppState;
use crate::ErrorResponse;

use super::controller::{self, DownloadablePdf, GenerationError, SessionState};
use super::models::{AgreementFormUpload, AgreementRequest, AgreementSubmission, SessionResponse};
use super::multipart_parser::MultipartParser;
use super::page::render_form;

/// Largest accepted JSON body: a base64 signature at the size limit plus room
/// for the text fields.
pub const MAX_JSON_BYTES: usize = MAX_SIGNATURE_BYTES.div_ceil(3) * 4 + 1024 * 1024;

/// Header values must be visible ASCII.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_ascii_graphic() || ch == ' ' { ch } else { '?' })
        .collect()
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn pdf_response(pdf: DownloadablePdf, pdf_count: u64) -> HttpResponse {
    let filename = header_safe(&pdf.filename);
    let mut response = HttpResponse::Ok();
    response
        .content_type(pdf.mime())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .insert_header(("X-Agreement-Filename", filename))
        .insert_header(("X-Agreement-Id", pdf.agreement_id.clone()))
        .insert_header(("X-Pdf-Count", pdf_count.to_string()));
    if !pdf.warnings.is_empty() {
        response.insert_header(("X-Agreement-Warnings", header_safe(&pdf.warnings.join("; "))));
    }
    response.body(pdf.bytes)
}

async fn run_generation(
    data: web::Data<AppState>,
    session_id: Uuid,
    submission: AgreementSubmission,
) -> HttpResponse {
    let Some(session) = data.sessions.get(&session_id).await else {
        return HttpResponse::NotFound()
            .json(ErrorResponse::not_found(&format!("Session {} not found", session_id)));
    };

    let assembler = data.assembler.clone().with_options(submission.options);
    let agreement = submission.agreement;
    let outcome =
        web::block(move || controller::generate(session, &agreement, &assembler)).await;

    let (session, result) = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Agreement generation task failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Agreement generation was interrupted"));
        }
    };

    match result {
        Ok(pdf) => {
            // Recorded on the live entry, not on the snapshot taken above.
            let pdf_count = match data
                .sessions
                .update(session_id, SessionState::record_generation)
                .await
            {
                Some(current) => current.pdf_count,
                None => {
                    warn!("Session {} expired while generating", session_id);
                    session.pdf_count
                }
            };
            info!(
                "Session {} generated {} ({} KB)",
                session_id,
                pdf.filename,
                pdf.size_kb()
            );
            pdf_response(pdf, pdf_count)
        }
        Err(GenerationError::Invalid(errors)) => {
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(&errors.to_message()))
        }
        Err(e) => HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error(&format!("Error generating PDF: {}", e))),
    }
}

/// Start a session and send the browser to its form.
pub async fn index(data: web::Data<AppState>) -> impl Responder {
    let (session_id, _) = data.sessions.create().await;
    see_other(format!("/sessions/{}", session_id))
}

/// The agreement form. Unknown or expired sessions are replaced by a new one.
pub async fn form_page(path: web::Path<String>, data: web::Data<AppState>) -> impl Responder {
    let requested = Uuid::parse_str(&path.into_inner()).ok();
    let (session_id, state) = match requested {
        Some(id) => data.sessions.get_or_create(&id).await,
        None => data.sessions.create().await,
    };

    if requested == Some(session_id) {
        HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(render_form(session_id, &state))
    } else {
        see_other(format!("/sessions/{}", session_id))
    }
}

#[utoipa::path(
    tag = "Agreement Sessions",
    post,
    path = "/api/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionResponse)
    )
)]
pub async fn create_session(data: web::Data<AppState>) -> impl Responder {
    let (session_id, state) = data.sessions.create().await;
    HttpResponse::Created().json(SessionResponse::new(session_id, state))
}

#[utoipa::path(
    tag = "Agreement Sessions",
    get,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Current session state", body = SessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn get_session(path: web::Path<Uuid>, data: web::Data<AppState>) -> impl Responder {
    let session_id = path.into_inner();
    match data.sessions.get(&session_id).await {
        Some(state) => HttpResponse::Ok().json(SessionResponse::new(session_id, state)),
        None => HttpResponse::NotFound()
            .json(ErrorResponse::not_found(&format!("Session {} not found", session_id))),
    }
}

#[utoipa::path(
    tag = "Agreement Sessions",
    post,
    path = "/api/sessions/{id}/sample",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Sample data loaded into the session", body = SessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn load_sample(path: web::Path<Uuid>, data: web::Data<AppState>) -> impl Responder {
    let session_id = path.into_inner();
    match data.sessions.update(session_id, SessionState::load_sample).await {
        Some(state) => {
            info!("Loaded sample data into session {}", session_id);
            HttpResponse::Ok().json(SessionResponse::new(session_id, state))
        }
        None => HttpResponse::NotFound()
            .json(ErrorResponse::not_found(&format!("Session {} not found", session_id))),
    }
}

#[utoipa::path(
    tag = "Agreements",
    post,
    path = "/api/sessions/{id}/agreements",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = AgreementRequest,
    responses(
        (status = 200, description = "Generated agreement PDF", body = String, content_type = "application/pdf"),
        (status = 400, description = "Invalid agreement", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_agreement(
    path: web::Path<Uuid>,
    item: web::Json<AgreementRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let submission = match item.into_inner().into_submission() {
        Ok(submission) => submission,
        Err(errors) => {
            return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&errors.to_message()))
        }
    };
    run_generation(data, path.into_inner(), submission).await
}

#[utoipa::path(
    tag = "Agreements",
    post,
    path = "/api/sessions/{id}/agreements/form",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body(content = inline(AgreementFormUpload), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Generated agreement PDF", body = String, content_type = "application/pdf"),
        (status = 400, description = "Invalid agreement", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_agreement_form(
    path: web::Path<Uuid>,
    payload: Multipart,
    data: web::Data<AppState>,
) -> impl Responder {
    let form = match MultipartParser::parse_agreement_multipart(payload).await {
        Ok(form) => form,
        Err(e) => return HttpResponse::from(e),
    };
    let submission = match form.into_submission() {
        Ok(submission) => submission,
        Err(errors) => {
            return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&errors.to_message()))
        }
    };
    run_generation(data, path.into_inner(), submission).await
}

/// JSON API routes, mounted under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(MAX_JSON_BYTES))
        .service(web::resource("/sessions").route(web::post().to(create_session)))
        .service(web::resource("/sessions/{id}").route(web::get().to(get_session)))
        .service(web::resource("/sessions/{id}/sample").route(web::post().to(load_sample)))
        .service(
            web::resource("/sessions/{id}/agreements").route(web::post().to(generate_agreement)),
        )
        .service(
            web::resource("/sessions/{id}/agreements/form")
                .route(web::post().to(generate_agreement_form)),
        );
}

/// Browser-facing HTML routes.
pub fn pages(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/sessions/{id}").route(web::get().to(form_page)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe() {
        assert_eq!(header_safe("Error adding logo: bad\ndata"), "Error adding logo: bad?data");
        assert_eq!(header_safe("agreement_ab12cd34.pdf"), "agreement_ab12cd34.pdf");
        assert_eq!(header_safe("caf\u{e9}"), "caf?");
    }
}
