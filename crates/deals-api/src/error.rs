//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "LINK_NOT_FOUND",
///   "message": "링크를 찾을 수 없습니다",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "UNAUTHENTICATED", "VALIDATION_ERROR", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 상태 코드와 묶어 핸들러 에러로 변환.
    pub fn with_status(self, status: StatusCode) -> ApiError {
        (status, Json(self))
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 핸들러 에러 (상태 코드 + JSON 본문).
pub type ApiError = (StatusCode, Json<ApiErrorResponse>);

/// API 핸들러 Result 타입 별칭.
///
/// ```ignore
/// async fn get_link(
///     Path(id): Path<Uuid>,
///     State(state): State<Arc<AppState>>,
/// ) -> ApiResult<Json<Deal>> {
///     let pool = state.require_db()?;
///     let link = DealRepository::find_by_id(pool, id)
///         .await
///         .map_err(db_error)?
///         .ok_or_else(|| not_found("LINK_NOT_FOUND", "링크를 찾을 수 없습니다"))?;
///     Ok(Json(link))
/// }
/// ```
pub type ApiResult<T> = Result<T, ApiError>;

/// 400 입력 검증 실패.
pub fn validation_error(message: impl Into<String>, details: Value) -> ApiError {
    ApiErrorResponse::with_details("VALIDATION_ERROR", message, details)
        .with_status(StatusCode::BAD_REQUEST)
}

/// `validator` 검증 결과를 400 응답으로 변환.
///
/// 필드별 메시지를 `details`에, 합친 메시지를 `message`에 담습니다.
pub fn invalid_input(errors: &validator::ValidationErrors) -> ApiError {
    let field_errors = errors.field_errors();

    let mut fields: Vec<_> = field_errors.keys().map(|f| f.to_string()).collect();
    fields.sort();

    let message = field_errors
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ");

    validation_error(message, serde_json::json!({ "fields": fields }))
}

/// 404 리소스 없음.
pub fn not_found(code: &str, message: impl Into<String>) -> ApiError {
    ApiErrorResponse::new(code, message).with_status(StatusCode::NOT_FOUND)
}

/// 503 데이터베이스 미설정.
pub fn database_unavailable() -> ApiError {
    ApiErrorResponse::new("DB_NOT_CONFIGURED", "데이터베이스가 설정되지 않았습니다")
        .with_status(StatusCode::SERVICE_UNAVAILABLE)
}

/// 500 데이터베이스 에러. 원인은 로그에만 남깁니다.
pub fn db_error(err: impl std::fmt::Display) -> ApiError {
    tracing::error!(error = %err, "Database query failed");
    ApiErrorResponse::new("DB_ERROR", "데이터베이스 처리 중 오류가 발생했습니다")
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
}
