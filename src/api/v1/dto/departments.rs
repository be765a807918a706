use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Department {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentListResponse {
    pub departments: Vec<Department>,
}
