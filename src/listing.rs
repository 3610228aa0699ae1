//! Markdown renderings of the endpoint and model catalogs.

use crate::format::{format_context_length, format_markdown_table, format_model_value};
use crate::logging::sanitize_for_log;
use crate::models::{Endpoint, EndpointsData, ModelAliases, ModelsData, RecommendedModels};

pub const VALID_CATEGORIES: [&str; 12] = [
    "chat",
    "images",
    "videos",
    "voice",
    "models",
    "files",
    "batch",
    "collections",
    "api-keys",
    "billing",
    "team",
    "audit",
];

const MAX_CATEGORY_LENGTH: usize = 50;

/// Endpoints selected by a category filter, plus a warning for a bad filter.
#[derive(Debug, Clone, Default)]
pub struct EndpointListing {
    pub endpoints: Vec<Endpoint>,
    pub warning: Option<String>,
}

/// Filter `data` by `category`.
///
/// No filter (or an empty one) lists everything. An unknown category lists
/// nothing and explains why, suggesting categories that contain the input or
/// are contained by it.
pub fn list_endpoints(data: &EndpointsData, category: Option<&str>) -> EndpointListing {
    let category = match category {
        Some(c) if !c.is_empty() => c,
        _ => {
            return EndpointListing {
                endpoints: data.endpoints.clone(),
                warning: None,
            }
        }
    };

    if category.chars().count() > MAX_CATEGORY_LENGTH {
        return EndpointListing {
            endpoints: Vec::new(),
            warning: Some("Category name too long".to_string()),
        };
    }

    let normalized = category.to_lowercase();
    if !VALID_CATEGORIES.contains(&normalized.as_str()) {
        let suggestions = suggest_categories(&normalized);
        let hint = if suggestions.is_empty() {
            String::new()
        } else {
            format!(" Did you mean: {}?", suggestions.join(", "))
        };
        let warning = format!(
            "Unknown category \"{}\". Valid categories: {}.{}",
            category,
            VALID_CATEGORIES.join(", "),
            hint
        );
        tracing::warn!(category = %sanitize_for_log(category), "unknown endpoint category");
        return EndpointListing {
            endpoints: Vec::new(),
            warning: Some(warning),
        };
    }

    EndpointListing {
        endpoints: data
            .endpoints
            .iter()
            .filter(|e| e.category == normalized)
            .cloned()
            .collect(),
        warning: None,
    }
}

/// Valid categories sharing a substring relationship with `input`.
pub fn suggest_categories(input: &str) -> Vec<&'static str> {
    VALID_CATEGORIES
        .iter()
        .copied()
        .filter(|valid| valid.contains(input) || input.contains(valid))
        .collect()
}

pub fn format_endpoints_table(listing: &EndpointListing) -> String {
    let mut parts = Vec::new();

    if let Some(warning) = &listing.warning {
        parts.push(format!("> **Warning**: {}\n", warning));
    }

    if listing.endpoints.is_empty() {
        parts.push("No endpoints found.".to_string());
        return parts.join("\n");
    }

    let rows: Vec<Vec<String>> = listing
        .endpoints
        .iter()
        .map(|e| {
            vec![
                e.method.clone(),
                e.path.clone(),
                e.description.clone(),
                e.category.clone(),
                e.api.to_string(),
            ]
        })
        .collect();

    parts.push(format_markdown_table(
        &["Method", "Path", "Description", "Category", "API"],
        &rows,
    ));
    parts.join("\n")
}

fn use_case_label(key: &str) -> &str {
    match key {
        "complexReasoning" => "Complex Reasoning",
        "balanced" => "Balanced Speed/Quality",
        "highThroughput" => "High Throughput",
        "coding" => "Coding Tasks",
        "agentic" => "Agentic/Tool Calling",
        "imageGeneration" => "Image Generation",
        "documentUnderstanding" => "Document Understanding",
        other => other,
    }
}

/// Summary table, per-model details, aliases and recommendations.
pub fn format_models(data: &ModelsData) -> String {
    if data.models.is_empty() {
        return "No models found.".to_string();
    }

    let rows: Vec<Vec<String>> = data
        .models
        .iter()
        .map(|m| {
            vec![
                format!("`{}`", m.id),
                m.name.clone(),
                format_context_length(m.context_length),
                m.capabilities.join(", "),
            ]
        })
        .collect();

    let mut lines = vec![
        format_markdown_table(&["Model ID", "Name", "Context", "Capabilities"], &rows),
        String::new(),
        "## Model Details".to_string(),
    ];

    for model in &data.models {
        lines.push(String::new());
        lines.push(format!("### {}", model.name));
        lines.push(format!("**ID**: `{}`", model.id));
        lines.push(String::new());
        lines.push(model.description.clone());
        if let Some(cutoff) = &model.knowledge_cutoff {
            lines.push(String::new());
            lines.push(format!("**Knowledge Cutoff**: {}", cutoff));
        }
    }

    if let Some(aliases) = &data.aliases {
        lines.extend(aliases_section(aliases));
    }
    if let Some(recommended) = &data.recommended_models {
        lines.extend(recommendations_section(recommended));
    }

    lines.join("\n")
}

fn aliases_section(aliases: &ModelAliases) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "## Model Aliases".to_string(),
        String::new(),
        aliases.description.clone(),
        String::new(),
    ];
    lines.extend(
        aliases
            .formats
            .iter()
            .map(|f| format!("- `{}`: {}", f.pattern, f.description)),
    );
    lines
}

fn recommendations_section(recommended: &RecommendedModels) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "## Recommended Models by Use Case".to_string(),
        String::new(),
    ];
    lines.extend(recommended.iter().map(|(use_case, value)| {
        format!(
            "- **{}**: {}",
            use_case_label(use_case),
            format_model_value(value, true)
        )
    }));
    lines
}
