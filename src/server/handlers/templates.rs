//! Template and font listing handlers.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::label::DEFAULT_FONT_FAMILY;
use crate::render::font::FONT_FAMILIES;
use crate::template::{registry, Template};

use super::super::state::AppState;

#[derive(Debug, Serialize)]
pub struct TemplateGroup {
    pub category: &'static str,
    pub templates: Vec<&'static Template>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateListing {
    pub default_id: &'static str,
    pub categories: Vec<TemplateGroup>,
}

#[derive(Debug, Serialize)]
pub struct FontFamily {
    pub name: &'static str,
    /// A matching font file was found; otherwise text falls back.
    pub installed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontListing {
    pub default_family: &'static str,
    pub families: Vec<FontFamily>,
}

/// Handle GET /api/templates - built-in templates grouped by category.
pub async fn list() -> Json<TemplateListing> {
    let categories = registry::by_category()
        .into_iter()
        .map(|(category, templates)| TemplateGroup {
            category,
            templates,
        })
        .collect();

    Json(TemplateListing {
        default_id: registry::default_template().id.as_str(),
        categories,
    })
}

/// Handle GET /api/fonts - selectable families and whether each is installed.
pub async fn fonts(State(state): State<Arc<AppState>>) -> Json<FontListing> {
    let families = FONT_FAMILIES
        .iter()
        .map(|&name| FontFamily {
            name,
            installed: state.fonts.has_family(name),
        })
        .collect();

    Json(FontListing {
        default_family: DEFAULT_FONT_FAMILY,
        families,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::state::test_state;

    #[tokio::test]
    async fn test_list_groups_by_category() {
        let Json(listing) = list().await;
        assert_eq!(listing.default_id, "jewel-case");

        let names: Vec<&str> = listing.categories.iter().map(|g| g.category).collect();
        assert_eq!(names, vec!["MiniDisc", "Cassette Inserts", "Album Inserts"]);

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["categories"][0]["templates"][0]["widthMM"], 37.0);
    }

    #[tokio::test]
    async fn test_fonts_without_files() {
        let Json(listing) = fonts(State(test_state())).await;
        assert_eq!(listing.default_family, "Space Grotesk");
        assert_eq!(listing.families.len(), FONT_FAMILIES.len());
        assert!(listing.families.iter().all(|f| !f.installed));
    }
}
