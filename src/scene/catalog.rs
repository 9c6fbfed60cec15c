use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::assets::color::Color;
use crate::foundation::error::{PosterError, PosterResult};
use crate::render::blur::blur_params;
use crate::render::canvas::check_fill;
use crate::scene::model::{Mask, PosterTemplate};

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("classic", include_str!("../../templates/classic.json")),
    ("modern", include_str!("../../templates/modern.json")),
    ("competition", include_str!("../../templates/competition.json")),
    ("kids", include_str!("../../templates/kids.json")),
];

/// In-memory template store keyed by template id.
///
/// Every template is structurally checked on insert, so a successful [`TemplateCatalog::lookup`]
/// always yields something the renderer can draw.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, Arc<PosterTemplate>>,
}

impl TemplateCatalog {
    /// Catalog with no templates.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the templates shipped in `templates/`.
    pub fn builtin() -> PosterResult<Self> {
        let mut catalog = Self::empty();
        for (id, json) in BUILTIN_TEMPLATES {
            catalog.insert_json(json).map_err(|e| {
                PosterError::Other(anyhow::anyhow!("built-in template '{id}' is broken: {e}"))
            })?;
        }
        Ok(catalog)
    }

    /// Parse one template from JSON and insert it.
    pub fn insert_json(&mut self, json: &str) -> PosterResult<()> {
        let template: PosterTemplate = serde_json::from_str(json)
            .map_err(|e| PosterError::invalid_input(format!("malformed template JSON: {e}")))?;
        self.insert(template)
    }

    /// Check and insert a template, replacing any previous template with the same id.
    pub fn insert(&mut self, template: PosterTemplate) -> PosterResult<()> {
        check_template(&template)?;
        tracing::debug!(template_id = %template.id, "template registered");
        self.templates
            .insert(template.id.clone(), Arc::new(template));
        Ok(())
    }

    /// Look up a template by id.
    pub fn lookup(&self, template_id: &str) -> PosterResult<Arc<PosterTemplate>> {
        self.get(template_id)
            .ok_or_else(|| PosterError::template_not_found(template_id))
    }

    /// Non-failing lookup.
    pub fn get(&self, template_id: &str) -> Option<Arc<PosterTemplate>> {
        self.templates.get(template_id).cloned()
    }

    /// Template ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Return `true` when the catalog holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Check that `data` has a non-empty value for every text field of `template`.
///
/// All missing ids are reported in one error, in template order.
pub fn validate(template: &PosterTemplate, data: &BTreeMap<String, String>) -> PosterResult<()> {
    let missing: Vec<&str> = template
        .text_fields
        .iter()
        .filter(|f| data.get(&f.id).is_none_or(|v| v.is_empty()))
        .map(|f| f.id.as_str())
        .collect();

    if !missing.is_empty() {
        return Err(PosterError::invalid_input(format!(
            "Missing required data fields: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

fn check_template(t: &PosterTemplate) -> PosterResult<()> {
    let fail = |msg: String| PosterError::invalid_input(format!("template '{}': {msg}", t.id));

    if t.id.trim().is_empty() {
        return Err(PosterError::invalid_input("template id must be non-empty"));
    }
    t.canvas
        .check_drawable("canvas")
        .map_err(|e| fail(e.to_string()))?;
    check_fill(&t.background).map_err(|e| fail(format!("background: {e}")))?;

    if t.photo_slots.is_empty() {
        return Err(fail("at least one photo slot is required".to_owned()));
    }
    let mut slot_ids = BTreeSet::new();
    for slot in &t.photo_slots {
        if !slot_ids.insert(slot.id.as_str()) {
            return Err(fail(format!("duplicate photo slot id '{}'", slot.id)));
        }
        slot.size
            .check_drawable(&format!("photo slot '{}'", slot.id))
            .map_err(|e| fail(e.to_string()))?;
        if let Mask::RoundedRect { radius } = slot.mask
            && !(radius.is_finite() && radius >= 0.0)
        {
            return Err(fail(format!(
                "photo slot '{}' has an invalid corner radius",
                slot.id
            )));
        }
        if let Some(border) = &slot.border {
            Color::parse_hex(&border.color).map_err(|e| fail(e.to_string()))?;
            if !(border.width.is_finite() && border.width >= 0.0) {
                return Err(fail(format!(
                    "photo slot '{}' has an invalid border width",
                    slot.id
                )));
            }
        }
        if let Some(shadow) = &slot.shadow {
            Color::parse_hex(&shadow.color).map_err(|e| fail(e.to_string()))?;
            blur_params(shadow.blur)
                .map_err(|e| fail(format!("photo slot '{}': {e}", slot.id)))?;
        }
    }

    let mut field_ids = BTreeSet::new();
    for field in &t.text_fields {
        if field.id.is_empty() {
            return Err(fail("text field id must be non-empty".to_owned()));
        }
        if !field_ids.insert(field.id.as_str()) {
            return Err(fail(format!("duplicate text field id '{}'", field.id)));
        }
        if !(field.style.font_size.is_finite() && field.style.font_size > 0.0) {
            return Err(fail(format!(
                "text field '{}' must have a positive font size",
                field.id
            )));
        }
        Color::parse_hex(&field.style.color).map_err(|e| fail(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/catalog.rs"]
mod tests;
