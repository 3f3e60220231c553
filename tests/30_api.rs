mod common;

use anyhow::Result;
use reqwest::StatusCode;
use std::collections::HashSet;

/// GET /api/all/ nests every category exactly once with its own items.
/// Without a database behind the test server the endpoint still answers
/// with a structured error envelope.
#[tokio::test]
async fn api_all_has_one_entry_per_category() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/all/", server.base_url))
        .send()
        .await?;
    let status = res.status();
    let body = res.json::<serde_json::Value>().await?;

    if status == StatusCode::OK {
        assert_eq!(body["success"], true);
        let categories = body["data"]["categories"]
            .as_array()
            .expect("categories array");

        let mut seen = HashSet::new();
        for entry in categories {
            let id = entry["id"].as_i64().expect("category id");
            assert!(seen.insert(id), "category {} listed twice", id);
            assert!(entry["name"].is_string());

            for item in entry["items"].as_array().expect("items array") {
                assert_eq!(item["category_id"].as_i64(), Some(id));
                let keys: Vec<&str> = item
                    .as_object()
                    .unwrap()
                    .keys()
                    .map(|k| k.as_str())
                    .collect();
                assert_eq!(keys.len(), 4, "unexpected item fields: {:?}", keys);
            }
        }
    } else {
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }
    Ok(())
}
