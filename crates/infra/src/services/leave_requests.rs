//! Teacher-side leave request endpoints
//!
//! The backend identifies the teacher from the bearer token and checks that
//! they teach the class; the teacher's display name travels as a query
//! parameter for the audit trail.

use std::sync::Arc;

use kinderhub_domain::LeaveRequest;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::errors::{ServiceError, ServiceResult};
use super::support::{clean_params, to_local_date_string, unwrap_data, unwrap_list, with_api_v1};
use crate::api::ApiClient;
use crate::http::{HttpError, RequestSpec};

const UNAUTHORIZED: &str =
    "Không có quyền truy cập (401). Vui lòng đăng nhập lại hoặc kiểm tra token.";

/// Pending, approve and reject operations for leave requests
#[derive(Debug, Clone)]
pub struct LeaveRequestService {
    client: Arc<ApiClient>,
}

impl LeaveRequestService {
    /// Service over the shared client.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn url(&self, path: &str) -> String {
        with_api_v1(self.client.base_url(), path)
    }

    /// Requests of `class_id` still waiting for the teacher.
    ///
    /// # Errors
    /// A 401 that survived the token refresh gets a dedicated message.
    #[instrument(skip(self))]
    pub async fn fetch_pending_by_class(&self, class_id: i64) -> ServiceResult<Vec<LeaveRequest>> {
        if class_id == 0 {
            return Err(ServiceError::invalid("Thiếu classId"));
        }
        let url = self.url(&format!("/leave-requests/teachers/classes/{class_id}/pending"));
        let body = self.client.get(&url).await.map_err(|err| {
            if err.is_auth_error() {
                ServiceError { message: UNAUTHORIZED.to_string(), status: Some(401) }
            } else {
                ServiceError::from_http(&err, "Lấy danh sách đơn xin nghỉ thất bại")
            }
        })?;

        let requests: Vec<LeaveRequest> = unwrap_list(body).iter().filter_map(parse_request).collect();
        debug!(class_id, count = requests.len(), "loaded pending leave requests");
        Ok(requests)
    }

    /// # Errors
    /// Fails without a request when `request_id` is zero.
    pub async fn approve(
        &self,
        request_id: i64,
        teacher_name: &str,
        note: &str,
    ) -> ServiceResult<Option<LeaveRequest>> {
        self.decide(request_id, "approve", teacher_name, note)
            .await
            .map_err(|e| e.with_fallback("Duyệt đơn xin nghỉ thất bại"))
    }

    /// # Errors
    /// Fails without a request when `request_id` is zero.
    pub async fn reject(
        &self,
        request_id: i64,
        teacher_name: &str,
        note: &str,
    ) -> ServiceResult<Option<LeaveRequest>> {
        self.decide(request_id, "reject", teacher_name, note)
            .await
            .map_err(|e| e.with_fallback("Từ chối đơn xin nghỉ thất bại"))
    }

    async fn decide(
        &self,
        request_id: i64,
        action: &str,
        teacher_name: &str,
        note: &str,
    ) -> Result<Option<LeaveRequest>, DecideError> {
        if request_id == 0 {
            return Err(DecideError::Invalid(ServiceError::invalid("Thiếu requestId")));
        }
        let url = self.url(&format!("/leave-requests/teachers/{request_id}/{action}"));
        let spec = RequestSpec::patch(url)
            .query_pairs(clean_params([("teacherName", Some(teacher_name))]))
            .json_value(json!({ "teacherNote": note }));

        let response = self.client.send(spec).await.map_err(DecideError::Http)?;
        Ok(parse_request(&unwrap_data(response.value())))
    }
}

enum DecideError {
    Invalid(ServiceError),
    Http(HttpError),
}

impl DecideError {
    fn with_fallback(self, fallback: &str) -> ServiceError {
        match self {
            Self::Invalid(err) => err,
            Self::Http(err) => ServiceError::from_http(&err, fallback),
        }
    }
}

/// Leave request with its dates reduced to `yyyy-MM-dd`
fn parse_request(raw: &Value) -> Option<LeaveRequest> {
    if !raw.is_object() {
        return None;
    }
    let mut request: LeaveRequest = serde_json::from_value(raw.clone()).ok()?;
    request.from_date = to_local_date_string(&request.from_date).unwrap_or_default();
    request.to_date = to_local_date_string(&request.to_date).unwrap_or_default();
    Some(request)
}

#[cfg(test)]
mod tests {
    use kinderhub_domain::LeaveStatus;

    use super::*;

    #[test]
    fn test_parse_request_normalises_dates() {
        let raw = json!({
            "id": 11,
            "studentName": "Bé Na",
            "fromDate": "2025-12-20T17:00:00.000Z",
            "toDate": "2025-12-22",
            "status": "PENDING"
        });
        let request = parse_request(&raw).unwrap();
        assert_eq!(request.id, 11);
        assert_eq!(request.from_date, "2025-12-20");
        assert_eq!(request.to_date, "2025-12-22");
        assert_eq!(request.status, LeaveStatus::Pending);

        assert!(parse_request(&Value::Null).is_none());
    }
}
