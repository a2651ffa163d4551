use crate::models::{ErrorResponse, HealthResponse, SubmitQuizRequest, SubmitQuizResponse};
use crate::routes::JsonError;
use crate::services::SubmissionStore;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest, HttpResponse, Responder};
use std::future::{ready, Ready};
use std::sync::Arc;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub submissions: Arc<dyn SubmissionStore>,
}

impl AppState {
    pub fn new(submissions: Arc<dyn SubmissionStore>) -> Self {
        Self { submissions }
    }
}

/// Configure the quiz routes under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/user/{email}", web::get().to(get_user))
        .route("/submit-quiz", web::post().to(submit_quiz))
        .route("/my-quiz", web::get().to(my_quiz));
}

/// Bearer token from the Authorization header
///
/// Any present token is accepted; the header only has to be well formed.
/// Place it before body extractors so a missing token is reported as 401
/// whatever the body looks like.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequest for BearerToken {
    type Error = JsonError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        ready(match token {
            Some(token) => Ok(BearerToken(token.to_string())),
            None => {
                tracing::debug!("Rejected {} without bearer token", req.path());
                Err(JsonError {
                    error: "No token provided".to_string(),
                    message: "Authorization: Bearer <token> header is required".to_string(),
                    status_code: 401,
                })
            }
        })
    }
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.submissions.health_check().await.unwrap_or(false);
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Look up a submitted profile
///
/// GET /api/user/{email}
async fn get_user(state: web::Data<AppState>, email: web::Path<String>) -> impl Responder {
    let email = email.into_inner();

    match state.submissions.find_by_email(&email).await {
        Ok(Some(submission)) => HttpResponse::Ok().json(submission.to_profile()),
        Ok(None) => {
            tracing::debug!("No submission for {}", email);
            HttpResponse::NotFound().json(ErrorResponse::new(
                "User not found",
                format!("No quiz submitted for {}", email),
                404,
            ))
        }
        Err(e) => {
            tracing::error!("Failed to fetch submission for {}: {}", email, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Failed to fetch user",
                e.to_string(),
                500,
            ))
        }
    }
}

/// Save a finished quiz, replacing any earlier one for the same email
///
/// POST /api/submit-quiz
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "email": "string",
///   "name": "string",
///   "phoneNumber": "string",
///   "answers": { "questionId": "value" }
/// }
/// ```
async fn submit_quiz(
    _token: BearerToken,
    state: web::Data<AppState>,
    req: web::Json<SubmitQuizRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for submit_quiz request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            errors.to_string(),
            400,
        ));
    }

    match state.submissions.upsert(&req).await {
        Ok(quiz) => {
            tracing::info!("Saved quiz {} for {}", quiz.id, quiz.email);
            HttpResponse::Ok().json(SubmitQuizResponse { success: true, quiz })
        }
        Err(e) => {
            tracing::error!("Failed to save quiz for {}: {}", req.email, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Failed to save quiz",
                e.to_string(),
                500,
            ))
        }
    }
}

/// GET /api/my-quiz
async fn my_quiz(_token: BearerToken) -> impl Responder {
    HttpResponse::BadRequest().json(ErrorResponse::new(
        "Use /api/user/:email instead",
        "Look up quizzes by email",
        400,
    ))
}
