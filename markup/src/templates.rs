//! Named styles that can be reused across nodes.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{FillerStyle, LineStyle, StyleKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TemplateStyle {
    Line(LineStyle),
    Filler(FillerStyle),
}

impl TemplateStyle {
    pub fn kind(&self) -> StyleKind {
        match self {
            TemplateStyle::Line(style) => style.kind(),
            TemplateStyle::Filler(_) => StyleKind::Filler,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleTemplate {
    pub name: String,
    pub style: TemplateStyle,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TemplateManager {
    templates: Vec<StyleTemplate>,
    /// The template new objects of each kind start with
    #[serde(
        serialize_with = "abstutil::serialize_btreemap",
        deserialize_with = "abstutil::deserialize_btreemap"
    )]
    defaults: BTreeMap<StyleKind, String>,
}

impl TemplateManager {
    pub fn load(path: &str) -> TemplateManager {
        let mut mgr: TemplateManager = abstutil::maybe_read_json(path);
        // Defaults pointing at templates that don't exist are forgotten
        let names: Vec<String> = mgr.templates.iter().map(|t| t.name.clone()).collect();
        mgr.defaults.retain(|_, name| names.contains(name));
        mgr
    }

    pub fn save(&self, path: &str) -> Result<()> {
        abstutil::write_json(path, self)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.templates.iter().any(|t| t.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&StyleTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn add(&mut self, name: &str, style: TemplateStyle) -> Result<&StyleTemplate> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Templates need a name");
        }
        if self.contains_name(name) {
            bail!("A template named {} already exists", name);
        }
        self.templates.push(StyleTemplate {
            name: name.to_string(),
            style,
        });
        info!("Added template {}", name);
        Ok(&self.templates[self.templates.len() - 1])
    }

    /// Overwrites an existing template's style. The kind of style can't change.
    pub fn replace(&mut self, name: &str, style: TemplateStyle) -> Result<()> {
        match self.templates.iter_mut().find(|t| t.name == name) {
            Some(t) if t.style.kind() != style.kind() => bail!(
                "Template {} holds a {:?} style, not {:?}",
                name,
                t.style.kind(),
                style.kind()
            ),
            Some(t) => {
                t.style = style;
                Ok(())
            }
            None => bail!("No template named {}", name),
        }
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let new = new.trim();
        if new.is_empty() {
            bail!("Templates need a name");
        }
        if old != new && self.contains_name(new) {
            bail!("A template named {} already exists", new);
        }
        match self.templates.iter_mut().find(|t| t.name == old) {
            Some(t) => t.name = new.to_string(),
            None => bail!("No template named {}", old),
        }
        for name in self.defaults.values_mut() {
            if name.as_str() == old {
                *name = new.to_string();
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<StyleTemplate> {
        let idx = match self.templates.iter().position(|t| t.name == name) {
            Some(idx) => idx,
            None => bail!("No template named {}", name),
        };
        self.defaults.retain(|_, n| n.as_str() != name);
        Ok(self.templates.remove(idx))
    }

    pub fn get_templates(&self, kind: StyleKind) -> impl Iterator<Item = &StyleTemplate> {
        self.templates
            .iter()
            .filter(move |t| t.style.kind() == kind)
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        let kind = match self.get(name) {
            Some(t) => t.style.kind(),
            None => bail!("No template named {}", name),
        };
        self.defaults.insert(kind, name.to_string());
        Ok(())
    }

    pub fn default_for(&self, kind: StyleKind) -> Option<&StyleTemplate> {
        self.get(self.defaults.get(&kind)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LineType;

    #[test]
    fn names_are_unique() {
        let mut mgr = TemplateManager::default();
        let stop = TemplateStyle::Line(LineStyle::default_for(LineType::Stop));
        mgr.add("thick stop", stop.clone()).unwrap();
        assert!(mgr.add("thick stop", stop.clone()).is_err());
        assert!(mgr.add("  ", stop.clone()).is_err());

        mgr.add("stripes", TemplateStyle::Filler(FillerStyle::default()))
            .unwrap();
        assert!(mgr.rename("stripes", "thick stop").is_err());
        // Can't turn a stop line template into a filler one
        assert!(mgr
            .replace("thick stop", TemplateStyle::Filler(FillerStyle::default()))
            .is_err());
        assert_eq!(mgr.get_templates(StyleKind::StopLine).count(), 1);
    }

    #[test]
    fn defaults_follow_renames() {
        let mut mgr = TemplateManager::default();
        mgr.add("dashes", TemplateStyle::Line(LineStyle::default_for(LineType::Regular)))
            .unwrap();
        mgr.set_default("dashes").unwrap();
        mgr.rename("dashes", "long dashes").unwrap();
        assert_eq!(
            mgr.default_for(StyleKind::RegularLine).map(|t| t.name.as_str()),
            Some("long dashes")
        );
        mgr.remove("long dashes").unwrap();
        assert!(mgr.default_for(StyleKind::RegularLine).is_none());
    }
}
