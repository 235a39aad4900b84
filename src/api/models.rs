use crate::api::{ApiError, TagsResponse};
use crate::utils::url::construct_api_url;

/// List the model tags installed on the service behind `base_url`.
pub async fn fetch_models(client: &reqwest::Client, base_url: &str) -> Result<Vec<String>, ApiError> {
    let tags_url = construct_api_url(base_url, "tags");
    let response = client
        .get(tags_url)
        .header("Content-Type", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ApiError::Status {
            status,
            body: body.trim().to_string(),
        });
    }

    let tags = response.json::<TagsResponse>().await?;
    let mut models: Vec<String> = tags.models.into_iter().map(|tag| tag.name).collect();
    sort_models(&mut models);
    Ok(models)
}

/// Alphabetical, with exact duplicates removed. The service lists each tag
/// once, but proxies in front of it occasionally repeat entries.
pub fn sort_models(models: &mut Vec<String>) {
    models.sort_by_key(|name| name.to_lowercase());
    models.dedup();
}
