//! Compiled-in upload category rules.
//!
//! Each category a dive-center document can be uploaded under maps to the
//! extensions it accepts, a size ceiling, and (for photos used at fixed
//! display sizes) a minimum pixel dimension. The table is fixed at compile
//! time; it is not runtime configuration.

use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::HashMap;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRule {
    pub extensions: &'static [&'static str],
    pub max_bytes: u64,
    pub min_dimensions: Option<(u32, u32)>,
}

impl CategoryRule {
    pub fn max_megabytes(&self) -> f64 {
        self.max_bytes as f64 / MB as f64
    }

    /// Allowed extensions in table order, for rejection messages.
    pub fn allowed_list(&self) -> String {
        self.extensions.join(", ")
    }
}

lazy_static! {
    static ref CATEGORY_RULES: HashMap<&'static str, CategoryRule> = {
        let mut rules = HashMap::new();
        rules.insert(
            "customer-photo",
            CategoryRule {
                extensions: &["jpeg", "jpg", "png", "webp"],
                max_bytes: 5 * MB,
                min_dimensions: Some((200, 200)),
            },
        );
        rules.insert(
            "dive-certificate",
            CategoryRule {
                extensions: &["jpeg", "jpg", "png", "pdf"],
                max_bytes: 10 * MB,
                min_dimensions: None,
            },
        );
        rules.insert(
            "insurance-card",
            CategoryRule {
                extensions: &["jpeg", "jpg", "png", "pdf"],
                max_bytes: 5 * MB,
                min_dimensions: None,
            },
        );
        rules.insert(
            "equipment-photo",
            CategoryRule {
                extensions: &["jpeg", "jpg", "png", "webp"],
                max_bytes: 10 * MB,
                min_dimensions: None,
            },
        );
        rules.insert(
            "dive-site-map",
            CategoryRule {
                extensions: &["jpeg", "jpg", "png", "pdf"],
                max_bytes: 15 * MB,
                min_dimensions: None,
            },
        );
        rules.insert(
            "service-receipt",
            CategoryRule {
                extensions: &["jpeg", "jpg", "png", "pdf"],
                max_bytes: 5 * MB,
                min_dimensions: None,
            },
        );
        rules.insert(
            "invoice",
            CategoryRule {
                extensions: &["pdf", "jpeg", "jpg", "png"],
                max_bytes: 5 * MB,
                min_dimensions: None,
            },
        );
        rules
    };
}

pub fn rule_for(category: &str) -> Option<&'static CategoryRule> {
    CATEGORY_RULES.get(category)
}

pub fn category_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = CATEGORY_RULES.keys().copied().collect();
    names.sort_unstable();
    names
}

pub fn all_rules() -> &'static HashMap<&'static str, CategoryRule> {
    &CATEGORY_RULES
}
