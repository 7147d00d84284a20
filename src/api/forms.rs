use super::types::{expect_json, DeleteResponse, DynamicForm, FieldOrder, FormQuery, ReorderRequest};
use crate::constants::FORMS_PATH;
use crate::gateway::{ApiOutcome, ApiRequest, Gateway};
use crate::utils::ApiResult;

/// Form builder endpoints
#[derive(Debug, Clone)]
pub struct FormsApi {
    gateway: Gateway,
}

fn form_path(id: i64) -> String {
    format!("{}{}/", FORMS_PATH, id)
}

/// Delete endpoints may answer with a JSON confirmation or a bare 204
pub(crate) fn delete_confirmation(
    outcome: Option<ApiOutcome>,
    id: i64,
) -> ApiResult<Option<DeleteResponse>> {
    let Some(outcome) = outcome else {
        return Ok(None);
    };
    let confirmation = outcome
        .into_optional_json::<DeleteResponse>()?
        .unwrap_or_else(|| DeleteResponse {
            message: format!("#{} deleted", id),
            deleted: true,
            id: Some(id),
        });
    Ok(Some(confirmation))
}

impl FormsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, query: &FormQuery) -> ApiResult<Option<Vec<DynamicForm>>> {
        let request = query.apply(ApiRequest::get(FORMS_PATH));
        expect_json(self.gateway.send(&request).await?)
    }

    pub async fn get(&self, id: i64) -> ApiResult<Option<DynamicForm>> {
        expect_json(self.gateway.send(&ApiRequest::get(form_path(id))).await?)
    }

    pub async fn create(&self, form: &DynamicForm) -> ApiResult<Option<DynamicForm>> {
        let request = ApiRequest::post(FORMS_PATH).json(form)?;
        expect_json(self.gateway.send(&request).await?)
    }

    /// Replace a form; the server recreates its fields from `form.fields`
    pub async fn update(&self, id: i64, form: &DynamicForm) -> ApiResult<Option<DynamicForm>> {
        let request = ApiRequest::put(form_path(id)).json(form)?;
        expect_json(self.gateway.send(&request).await?)
    }

    pub async fn delete(&self, id: i64) -> ApiResult<Option<DeleteResponse>> {
        let outcome = self.gateway.send(&ApiRequest::delete(form_path(id))).await?;
        delete_confirmation(outcome, id)
    }

    /// Move fields to new positions, returns the updated form
    pub async fn reorder_fields(
        &self,
        id: i64,
        field_orders: &[FieldOrder],
    ) -> ApiResult<Option<DynamicForm>> {
        let request = ApiRequest::post(format!("{}reorder_fields/", form_path(id)))
            .json(&ReorderRequest { field_orders })?;
        expect_json(self.gateway.send(&request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{FieldType, FormField};
    use crate::gateway::LogOnlyObserver;
    use crate::session::{MemoryTokenStore, Session};
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn api_for(url: String) -> FormsApi {
        let session = Session::new(Arc::new(MemoryTokenStore::new()));
        session.set_tokens("a1", Some("r1")).unwrap();
        let gateway = Gateway::new(url, None, session, Arc::new(LogOnlyObserver)).unwrap();
        FormsApi::new(gateway)
    }

    #[tokio::test]
    async fn test_list_with_search() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", FORMS_PATH)
            .match_query(Matcher::UrlEncoded("search".into(), "onboard".into()))
            .match_header("authorization", "Bearer a1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":1,"name":"Onboarding","fields":[]}]"#)
            .expect(1)
            .create_async()
            .await;

        let api = api_for(server.url());
        let query = FormQuery {
            search: Some("onboard".into()),
            ordering: None,
        };
        let forms = api.list(&query).await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].name, "Onboarding");
    }

    #[tokio::test]
    async fn test_create_sends_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", FORMS_PATH)
            .match_body(Matcher::PartialJson(json!({
                "name": "Onboarding",
                "fields": [{"label": "Email", "field_type": "email", "is_required": true, "order": 0}]
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":9,"name":"Onboarding","fields":[{"id":30,"label":"Email","field_type":"email","is_required":true,"order":0}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let api = api_for(server.url());
        let form = DynamicForm {
            id: None,
            name: "Onboarding".into(),
            description: None,
            fields: vec![FormField {
                id: None,
                label: "Email".into(),
                field_type: FieldType::Email,
                is_required: true,
                options: None,
                order: 0,
                placeholder: None,
                default_value: None,
            }],
            created_by: None,
            created_by_username: None,
            created_at: None,
            updated_at: None,
        };
        let created = api.create(&form).await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(created.id, Some(9));
        assert_eq!(created.fields[0].id, Some(30));
    }

    #[tokio::test]
    async fn test_delete_json_confirmation() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/api/employees/forms/9/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Form \"Onboarding\" deleted successfully","deleted":true,"id":9}"#)
            .create_async()
            .await;

        let api = api_for(server.url());
        let confirmation = api.delete(9).await.unwrap().unwrap();
        assert!(confirmation.deleted);
        assert_eq!(confirmation.message, "Form \"Onboarding\" deleted successfully");
    }

    #[tokio::test]
    async fn test_delete_no_content() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/api/employees/forms/9/")
            .with_status(204)
            .create_async()
            .await;

        let api = api_for(server.url());
        let confirmation = api.delete(9).await.unwrap().unwrap();
        assert!(confirmation.deleted);
        assert_eq!(confirmation.id, Some(9));
    }

    #[tokio::test]
    async fn test_reorder_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/employees/forms/9/reorder_fields/")
            .match_body(Matcher::Json(json!({
                "field_orders": [{"field_id": 31, "order": 0}, {"field_id": 30, "order": 1}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":9,"name":"Onboarding","fields":[
                    {"id":30,"label":"Email","field_type":"email","order":1},
                    {"id":31,"label":"Name","field_type":"text","order":0}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let api = api_for(server.url());
        let form = api
            .reorder_fields(
                9,
                &[
                    FieldOrder { field_id: 31, order: 0 },
                    FieldOrder { field_id: 30, order: 1 },
                ],
            )
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(form.ordered_fields()[0].label, "Name");
    }
}
