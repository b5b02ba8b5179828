//! Class management endpoints

use std::sync::Arc;

use kinderhub_domain::{ClassOption, ClassPayload, ClassRecord, Page};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::errors::{ServiceError, ServiceResult};
use super::export::{csv_document, Download, CSV_CONTENT_TYPE, OCTET_STREAM};
use super::query::{apply_query, ListQuery};
use super::support::{unwrap_data, unwrap_list, with_api_v1};
use crate::api::ApiClient;

const MISSING_ID: &str = "Thiếu id lớp";
const DELETED: &str = "Đã xoá lớp học";
const EXPORT_FILENAME: &str = "classes.xlsx";
const CSV_FILENAME: &str = "classes.csv";
const CSV_HEADER: [&str; 7] =
    ["id", "className", "classCode", "grade", "roomNumber", "academicYear", "teacherName"];

/// Filters accepted by [`ClassService::fetch_classes`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFilter {
    /// Academic year, matched exactly
    pub year: Option<String>,
    /// Substring of the class name
    pub class_name: Option<String>,
    /// Substring of the room
    pub room_number: Option<String>,
    /// Substring of the grade
    pub grade: Option<String>,
    /// Substring of the teacher name
    pub teacher_name: Option<String>,
    /// `field,asc|desc`
    pub sort: Option<String>,
    /// 1-based page
    pub page: Option<usize>,
    /// Items per page
    pub size: Option<usize>,
}

impl ClassFilter {
    fn to_query(&self) -> ListQuery {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let mut query = ListQuery::new()
            .exact("academicYear", &text(&self.year))
            .filter("className", &text(&self.class_name))
            .filter("roomNumber", &text(&self.room_number))
            .filter("grade", &text(&self.grade))
            .filter("teacherName", &text(&self.teacher_name));
        if let Some(sort) = self.sort.as_deref().and_then(super::query::SortSpec::parse) {
            query = query.sort(sort);
        }
        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(size) = self.size {
            query = query.size(size);
        }
        query
    }
}

/// CRUD, dropdown and export operations for classes
#[derive(Debug, Clone)]
pub struct ClassService {
    client: Arc<ApiClient>,
}

impl ClassService {
    /// Service over the shared client.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn url(&self, path: &str) -> String {
        with_api_v1(self.client.base_url(), path)
    }

    async fn fetch_all(&self) -> Result<Vec<ClassRecord>, crate::http::HttpError> {
        let body = self.client.get(&self.url("/classes/all")).await?;
        Ok(unwrap_list(body).iter().map(ClassRecord::from_value).collect())
    }

    /// All classes, filtered, sorted and paged locally.
    ///
    /// # Errors
    /// Returns the user-facing message when the list cannot be loaded.
    #[instrument(skip(self))]
    pub async fn fetch_classes(&self, filter: &ClassFilter) -> ServiceResult<Page<ClassRecord>> {
        let classes = self
            .fetch_all()
            .await
            .map_err(|e| ServiceError::from_http(&e, "Không thể tải danh sách lớp"))?;
        Ok(apply_query(classes, &filter.to_query()))
    }

    /// # Errors
    /// Fails without a request when `id` is zero.
    pub async fn fetch_class_by_id(&self, id: i64) -> ServiceResult<ClassRecord> {
        require_id(id)?;
        let body = self
            .client
            .get(&self.url(&format!("/classes/find/{id}")))
            .await
            .map_err(|e| ServiceError::from_http(&e, "Không lấy được thông tin lớp"))?;
        Ok(ClassRecord::from_value(&unwrap_data(body)))
    }

    /// # Errors
    /// Returns the server's validation message when creation is rejected.
    pub async fn create_class(&self, payload: &ClassPayload) -> ServiceResult<ClassRecord> {
        let body = self
            .client
            .post_json(&self.url("/classes/create"), &payload.trimmed())
            .await
            .map_err(|e| ServiceError::from_http(&e, "Tạo lớp học thất bại"))?;
        Ok(ClassRecord::from_value(&unwrap_data(body)))
    }

    /// # Errors
    /// Fails without a request when `id` is zero.
    pub async fn update_class(&self, id: i64, payload: &ClassPayload) -> ServiceResult<ClassRecord> {
        require_id(id)?;
        let body = self
            .client
            .put_json(&self.url(&format!("/classes/update/{id}")), &payload.trimmed())
            .await
            .map_err(|e| ServiceError::from_http(&e, "Cập nhật lớp học thất bại"))?;
        Ok(ClassRecord::from_value(&unwrap_data(body)))
    }

    /// Delete a class, returning the server's confirmation message.
    ///
    /// # Errors
    /// Fails without a request when `id` is zero.
    pub async fn delete_class(&self, id: i64) -> ServiceResult<String> {
        require_id(id)?;
        let body = self
            .client
            .delete(&self.url(&format!("/classes/delete/{id}")))
            .await
            .map_err(|e| ServiceError::from_http(&e, "Xoá lớp học thất bại"))?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(DELETED)
            .to_string())
    }

    /// `value`/`label` pairs for a plain dropdown. Failures give an empty
    /// list.
    pub async fn fetch_classes_lite(&self) -> Vec<ClassOption> {
        match self.fetch_all().await {
            Ok(classes) => classes
                .into_iter()
                .filter_map(|class| {
                    Some(ClassOption { value: class.id?, label: class.display_name() })
                })
                .collect(),
            Err(err) => {
                warn!(error = %err, "failed to load class dropdown");
                Vec::new()
            }
        }
    }

    /// Dropdown options labelled `name - grade (room) • year`, optionally
    /// for one academic year.
    ///
    /// # Errors
    /// Returns the user-facing message when the list cannot be loaded.
    pub async fn fetch_class_options(&self, year: Option<&str>) -> ServiceResult<Vec<ClassOption>> {
        let filter = ClassFilter {
            year: year.map(str::to_string),
            page: Some(1),
            size: Some(usize::MAX),
            ..ClassFilter::default()
        };
        let page = self.fetch_classes(&filter).await?;
        Ok(page.items.iter().filter_map(class_option).collect())
    }

    /// Spreadsheet from `GET /classes/export`, or a CSV built from the
    /// class list when the export endpoint fails.
    ///
    /// # Errors
    /// Returns the user-facing message when the fallback list cannot be
    /// loaded either.
    pub async fn export_classes(&self) -> ServiceResult<Download> {
        match self.client.download(&self.url("/classes/export")).await {
            Ok(response) => Ok(Download {
                filename: response
                    .attachment_filename()
                    .unwrap_or_else(|| EXPORT_FILENAME.to_string()),
                content_type: response.content_type().unwrap_or(OCTET_STREAM).to_string(),
                bytes: response.bytes(),
            }),
            Err(err) => {
                debug!(error = %err, "export endpoint failed, building CSV locally");
                let page = self
                    .fetch_classes(&ClassFilter { size: Some(usize::MAX), ..ClassFilter::default() })
                    .await?;
                let rows = page.items.iter().map(|c| {
                    [
                        c.id.map(|id| id.to_string()).unwrap_or_default(),
                        c.class_name.clone(),
                        c.class_code.clone(),
                        c.grade.clone(),
                        c.room_number.clone(),
                        c.academic_year.clone(),
                        c.teacher_name.clone(),
                    ]
                });
                Ok(Download {
                    filename: CSV_FILENAME.to_string(),
                    content_type: CSV_CONTENT_TYPE.to_string(),
                    bytes: csv_document(&CSV_HEADER, rows),
                })
            }
        }
    }
}

fn require_id(id: i64) -> ServiceResult<()> {
    if id == 0 {
        return Err(ServiceError::invalid(MISSING_ID));
    }
    Ok(())
}

fn class_option(class: &ClassRecord) -> Option<ClassOption> {
    let mut label = class.display_name();
    if !class.grade.is_empty() {
        label.push_str(&format!(" - {}", class.grade));
    }
    if !class.room_number.is_empty() {
        label.push_str(&format!(" ({})", class.room_number));
    }
    if !class.academic_year.is_empty() {
        label.push_str(&format!(" • {}", class.academic_year));
    }
    Some(ClassOption { value: class.id?, label })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_label() {
        let class = ClassRecord {
            id: Some(5),
            class_name: "Mầm 1".into(),
            grade: "Mầm".into(),
            room_number: "P101".into(),
            academic_year: "2025-2026".into(),
            ..ClassRecord::default()
        };
        assert_eq!(class_option(&class).unwrap().label, "Mầm 1 - Mầm (P101) • 2025-2026");

        let bare = ClassRecord { id: Some(8), ..ClassRecord::default() };
        assert_eq!(class_option(&bare).unwrap().label, "Lớp #8");

        assert!(class_option(&ClassRecord::default()).is_none());
    }

    #[test]
    fn test_filter_to_query() {
        let filter = ClassFilter {
            year: Some("2025-2026".into()),
            class_name: Some(" Mầm ".into()),
            sort: Some("grade,desc".into()),
            page: Some(2),
            ..ClassFilter::default()
        };
        let query = filter.to_query();
        assert_eq!(query.exact, vec![("academicYear".into(), "2025-2026".into())]);
        assert_eq!(query.filters, vec![("className".into(), "mầm".into())]);
        assert!(query.sort.is_some_and(|s| s.descending));
        assert_eq!((query.page, query.size), (2, 10));
    }
}
