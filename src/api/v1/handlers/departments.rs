use axum::Json;

use crate::api::v1::dto::departments::{Department, DepartmentListResponse};

// TODO: replace the fixture with the directory-service client once its API
// is published; the permission gate in front of this route stays as is.
pub async fn list() -> Json<DepartmentListResponse> {
    Json(DepartmentListResponse {
        departments: vec![
            Department {
                id: 1,
                name: "Engineering".to_string(),
            },
            Department {
                id: 2,
                name: "Operations".to_string(),
            },
        ],
    })
}
