//! Whole of Government document catalogue, grouped by department

use crate::error::GovGptResult;
use serde::{Deserialize, Serialize};

const WOG_DOCUMENTS: &str = include_str!("../data/wog_documents.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WogDocument {
    pub title: String,
    #[serde(rename = "summaryEn")]
    pub summary_en: String,
    #[serde(rename = "summaryAr")]
    pub summary_ar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Department {
    pub name: String,
    #[serde(rename = "nameAr")]
    pub name_ar: String,
    pub documents: Vec<WogDocument>,
}

pub fn wog_documents_by_department() -> GovGptResult<Vec<Department>> {
    Ok(serde_json::from_str(WOG_DOCUMENTS)?)
}
