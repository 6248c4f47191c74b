/// Route handlers
///
/// Successful responses share the envelope `{ "status": "success", "data":
/// { "data": ... } }`; lists add `results`, `total`, and `page`. Field
/// projection (`?fields=a,b`) is applied here, at the serialization
/// boundary, after sensitive fields have already been dropped by the row
/// types themselves.

use axum::{http::Uri, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use trailbook_shared::store::query::{apply_projection, Page, QuerySpec};

pub mod auth;
pub mod bookings;
pub mod health;
pub mod reviews;
pub mod tours;
pub mod users;

/// Fallback handler for unmatched paths
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Can't find {} on this server!", uri.path()))
}

/// Envelope for a single document
pub fn doc_response<T: Serialize>(doc: &T) -> ApiResult<Json<Value>> {
    let data = serde_json::to_value(doc)
        .map_err(|e| ApiError::Internal(format!("response serialization: {}", e)))?;
    Ok(Json(json!({
        "status": "success",
        "data": { "data": data }
    })))
}

/// Envelope for a list, with the requested projection applied
pub fn list_response<T: Serialize>(page: &Page<T>, spec: &QuerySpec) -> ApiResult<Json<Value>> {
    let mut items = serde_json::to_value(&page.items)
        .map_err(|e| ApiError::Internal(format!("response serialization: {}", e)))?;
    if let Some(fields) = &spec.fields {
        items = apply_projection(items, fields);
    }

    Ok(Json(json!({
        "status": "success",
        "results": page.items.len(),
        "total": page.total,
        "page": page.page,
        "data": { "data": items }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Doc {
        id: &'static str,
        name: &'static str,
        price: f64,
    }

    #[test]
    fn test_doc_envelope() {
        let body = doc_response(&Doc {
            id: "1",
            name: "a",
            price: 10.0,
        })
        .unwrap();
        assert_eq!(body.0["status"], "success");
        assert_eq!(body.0["data"]["data"]["name"], "a");
    }

    #[test]
    fn test_list_envelope_counts() {
        let page = Page {
            items: vec![
                Doc {
                    id: "1",
                    name: "a",
                    price: 10.0,
                },
                Doc {
                    id: "2",
                    name: "b",
                    price: 20.0,
                },
            ],
            total: 41,
            page: 1,
            page_size: 2,
        };
        let body = list_response(&page, &QuerySpec::default()).unwrap();
        assert_eq!(body.0["results"], 2);
        assert_eq!(body.0["total"], 41);
        assert_eq!(body.0["page"], 1);
    }

    #[test]
    fn test_list_projection_applied() {
        let page = Page {
            items: vec![Doc {
                id: "1",
                name: "a",
                price: 10.0,
            }],
            total: 1,
            page: 1,
            page_size: 100,
        };
        let params: HashMap<String, String> =
            [("fields".to_string(), "name".to_string())].into();
        let spec = QuerySpec::from_params(&params);

        let body = list_response(&page, &spec).unwrap();
        let item = &body.0["data"]["data"][0];
        assert_eq!(item["name"], "a");
        assert_eq!(item["id"], "1");
        assert!(item.get("price").is_none());
    }
}
