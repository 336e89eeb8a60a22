use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::judge::model::Category;

/// Endpoints used by the multi-step chip page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StepEndpoints {
    pub submit: String,
    pub overlay: String,
}

/// Everything the multi-step chip page needs before a match is loaded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StepPagePayload {
    /// Chip categories in step order.
    pub categories: Vec<Category>,
    pub api: StepEndpoints,
}

/// Fields of a `/submit_match` form post.
///
/// Category scores arrive as `jd_<key>_r` / `jd_<key>_w` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyFormInput {
    pub weight_class: String,
    pub red: String,
    pub white: String,
    pub result: String,
    pub scores: IndexMap<String, (Option<u32>, Option<u32>)>,
}

impl LegacyFormInput {
    /// Collect fields from ordered `name=value` pairs; unknown names are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut input = Self::default();
        for (name, value) in pairs {
            match name.as_str() {
                "wc" => input.weight_class = value.trim().to_string(),
                "red" => input.red = value.trim().to_string(),
                "white" => input.white = value.trim().to_string(),
                "result" => input.result = value.trim().to_string(),
                other => {
                    let Some(rest) = other.strip_prefix("jd_") else {
                        continue;
                    };
                    let points = value.trim().parse::<u32>().ok();
                    if let Some(key) = rest.strip_suffix("_r") {
                        input.scores.entry(key.to_string()).or_default().0 = points;
                    } else if let Some(key) = rest.strip_suffix("_w") {
                        input.scores.entry(key.to_string()).or_default().1 = points;
                    }
                }
            }
        }
        input
    }
}
