//! Built-in label formats.

use std::sync::OnceLock;

use super::{LayoutKind, Template};

/// Category names in presentation order.
const CATEGORIES: &[&str] = &["MiniDisc", "Cassette Inserts", "Album Inserts"];

const DEFAULT_ID: &str = "jewel-case";

static TEMPLATES: OnceLock<Vec<Template>> = OnceLock::new();

struct Spec {
    id: &'static str,
    name: &'static str,
    display_name: &'static str,
    category: &'static str,
    width_mm: f32,
    height_mm: f32,
    bleed_mm: f32,
    has_banner: bool,
    layout: LayoutKind,
}

const BUILTIN: &[Spec] = &[
    Spec {
        id: "jewel-case",
        name: "Jewel Case",
        display_name: "MiniDisc Jewel Case (37×53mm)",
        category: "MiniDisc",
        width_mm: 37.0,
        height_mm: 53.0,
        bleed_mm: 3.0,
        has_banner: true,
        layout: LayoutKind::Standard,
    },
    Spec {
        id: "disc-surface",
        name: "Disc Surface",
        display_name: "MiniDisc Disc Surface Sticker (37×53mm)",
        category: "MiniDisc",
        width_mm: 37.0,
        height_mm: 53.0,
        bleed_mm: 3.0,
        has_banner: true,
        layout: LayoutKind::DiscSurface,
    },
    Spec {
        id: "jewel-case-insert",
        name: "Jewel Case Insert",
        display_name: "MiniDisc Jewel Case Insert (68×70mm)",
        category: "MiniDisc",
        width_mm: 68.0,
        height_mm: 70.0,
        bleed_mm: 3.0,
        has_banner: false,
        layout: LayoutKind::Standard,
    },
    Spec {
        id: "cassette-j-card",
        name: "Cassette J-Card Front",
        display_name: "Cassette J-Card Front (64×101mm)",
        category: "Cassette Inserts",
        width_mm: 64.0,
        height_mm: 101.0,
        bleed_mm: 3.0,
        has_banner: false,
        layout: LayoutKind::Standard,
    },
    Spec {
        id: "cd-booklet",
        name: "CD Booklet Front",
        display_name: "CD Booklet Front (120×120mm)",
        category: "Album Inserts",
        width_mm: 120.0,
        height_mm: 120.0,
        bleed_mm: 3.0,
        has_banner: false,
        layout: LayoutKind::Standard,
    },
];

fn templates() -> &'static [Template] {
    TEMPLATES.get_or_init(|| {
        BUILTIN
            .iter()
            .map(|s| Template {
                id: s.id.to_string(),
                name: s.name.to_string(),
                display_name: s.display_name.to_string(),
                category: s.category.to_string(),
                width_mm: s.width_mm,
                height_mm: s.height_mm,
                bleed_mm: s.bleed_mm,
                has_banner: s.has_banner,
                layout: s.layout,
            })
            .collect()
    })
}

/// All built-in templates in registry order.
pub fn all() -> &'static [Template] {
    templates()
}

/// Look up a template by id.
pub fn by_id(id: &str) -> Option<&'static Template> {
    templates().iter().find(|t| t.id == id)
}

/// The template selected when nothing else is requested.
pub fn default_template() -> &'static Template {
    by_id(DEFAULT_ID).unwrap_or(&templates()[0])
}

/// Category names in presentation order.
pub fn categories() -> &'static [&'static str] {
    CATEGORIES
}

/// Templates grouped by category, in presentation order. Empty categories
/// are omitted.
pub fn by_category() -> Vec<(&'static str, Vec<&'static Template>)> {
    CATEGORIES
        .iter()
        .map(|&cat| {
            let members: Vec<&Template> =
                templates().iter().filter(|t| t.category == cat).collect();
            (cat, members)
        })
        .filter(|(_, members)| !members.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_templates_valid() {
        for t in all() {
            t.validate().unwrap();
        }
    }

    #[test]
    fn test_ids_unique() {
        let ids: HashSet<_> = all().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn test_every_category_known() {
        for t in all() {
            assert!(categories().contains(&t.category.as_str()), "{}", t.id);
        }
    }

    #[test]
    fn test_disc_surface_layout_declared() {
        let disc = by_id("disc-surface").unwrap();
        assert_eq!(disc.layout, LayoutKind::DiscSurface);
        for t in all().iter().filter(|t| t.id != "disc-surface") {
            assert_eq!(t.layout, LayoutKind::Standard, "{}", t.id);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(by_id("jewel-case").unwrap().width_mm, 37.0);
        assert!(by_id("nope").is_none());
        assert_eq!(default_template().id, "jewel-case");
    }

    #[test]
    fn test_grouping_preserves_order() {
        let groups = by_category();
        let names: Vec<_> = groups.iter().map(|(c, _)| *c).collect();
        assert_eq!(names, vec!["MiniDisc", "Cassette Inserts", "Album Inserts"]);
        assert_eq!(groups[0].1.len(), 3);
    }
}
