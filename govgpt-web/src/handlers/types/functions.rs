//! Remote function and tool loading types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoadUrlForm {
    #[schema(example = "https://github.com/open-webui/functions/blob/main/filters/summarize.py")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllowedDomainsResponse {
    /// Sorted allow-list
    pub domains: Vec<String>,
    pub count: usize,
}
