//! Custom QA toggle types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether the chat inlet forwards to the document QA service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QaConfigForm {
    pub enabled: bool,
}
