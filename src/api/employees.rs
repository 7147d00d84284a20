use super::forms::delete_confirmation;
use super::types::{
    expect_json, BulkDeleteRequest, BulkDeleteResponse, DeleteResponse, Employee, EmployeeQuery,
    NewEmployee, SearchField, SearchFieldsResponse,
};
use crate::constants::RECORDS_PATH;
use crate::gateway::{ApiRequest, Gateway};
use crate::utils::{ApiError, ApiResult};

/// Employee record endpoints
#[derive(Debug, Clone)]
pub struct EmployeesApi {
    gateway: Gateway,
}

fn record_path(id: i64) -> String {
    format!("{}{}/", RECORDS_PATH, id)
}

impl EmployeesApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, query: &EmployeeQuery) -> ApiResult<Option<Vec<Employee>>> {
        let request = query.apply(ApiRequest::get(RECORDS_PATH));
        expect_json(self.gateway.send(&request).await?)
    }

    pub async fn get(&self, id: i64) -> ApiResult<Option<Employee>> {
        expect_json(self.gateway.send(&ApiRequest::get(record_path(id))).await?)
    }

    /// Field validation happens server side; failures come back as
    /// `ApiError::Rejected` keyed by field label
    pub async fn create(&self, employee: &NewEmployee) -> ApiResult<Option<Employee>> {
        let request = ApiRequest::post(RECORDS_PATH).json(employee)?;
        expect_json(self.gateway.send(&request).await?)
    }

    pub async fn update(&self, id: i64, employee: &NewEmployee) -> ApiResult<Option<Employee>> {
        let request = ApiRequest::put(record_path(id)).json(employee)?;
        expect_json(self.gateway.send(&request).await?)
    }

    pub async fn delete(&self, id: i64) -> ApiResult<Option<DeleteResponse>> {
        let outcome = self.gateway.send(&ApiRequest::delete(record_path(id))).await?;
        delete_confirmation(outcome, id)
    }

    pub async fn bulk_delete(&self, ids: &[i64]) -> ApiResult<Option<BulkDeleteResponse>> {
        if ids.is_empty() {
            return Err(ApiError::Invalid("No employee ids given".into()));
        }
        let request = ApiRequest::post(format!("{}bulk_delete/", RECORDS_PATH))
            .json(&BulkDeleteRequest { ids })?;
        expect_json(self.gateway.send(&request).await?)
    }

    /// Field labels usable as search filters, optionally for one form only
    pub async fn search_fields(&self, form_id: Option<i64>) -> ApiResult<Option<Vec<SearchField>>> {
        let mut request = ApiRequest::get(format!("{}search_fields/", RECORDS_PATH));
        if let Some(form_id) = form_id {
            request = request.query("form_id", form_id.to_string());
        }
        let response: Option<SearchFieldsResponse> =
            expect_json(self.gateway.send(&request).await?)?;
        Ok(response.map(|r| r.fields))
    }
}
