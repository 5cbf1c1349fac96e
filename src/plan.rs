//! Account plan model and renderer.
//!
//! The research service returns the plan as a flat JSON object mapping
//! section keys to free text. Only the seven known sections are kept, and
//! they always render in [`PlanSection::ALL`] order no matter how the keys
//! arrived.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The known account plan sections, in canonical render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlanSection {
    CompanyOverview,
    KeyInitiatives,
    OrgMapAndStakeholders,
    CurrentTechLandscape,
    OpportunitiesForUs,
    RisksAndRedFlags,
    NextSteps,
}

impl PlanSection {
    /// Every section in render order.
    pub const ALL: [Self; 7] = [
        Self::CompanyOverview,
        Self::KeyInitiatives,
        Self::OrgMapAndStakeholders,
        Self::CurrentTechLandscape,
        Self::OpportunitiesForUs,
        Self::RisksAndRedFlags,
        Self::NextSteps,
    ];

    /// Wire key of the section.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::CompanyOverview => "company_overview",
            Self::KeyInitiatives => "key_initiatives",
            Self::OrgMapAndStakeholders => "org_map_and_stakeholders",
            Self::CurrentTechLandscape => "current_tech_landscape",
            Self::OpportunitiesForUs => "opportunities_for_us",
            Self::RisksAndRedFlags => "risks_and_red_flags",
            Self::NextSteps => "next_steps",
        }
    }

    /// Parse a wire key. Unknown keys yield `None`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    /// Display title, e.g. `Risks And Red Flags`.
    #[must_use]
    pub fn title(self) -> String {
        title_from_key(self.key())
    }
}

impl fmt::Display for PlanSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Turn a `snake_case` key into a title: separators become spaces and every
/// word starts upper-case.
#[must_use]
pub fn title_from_key(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// A structured account plan. Replaced wholesale on every update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "serde_json::Map<String, serde_json::Value>",
    into = "BTreeMap<String, String>"
)]
pub struct AccountPlan {
    sections: BTreeMap<PlanSection, String>,
}

impl AccountPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style section setter.
    #[must_use]
    pub fn with(mut self, section: PlanSection, text: impl Into<String>) -> Self {
        self.sections.insert(section, text.into());
        self
    }

    #[must_use]
    pub fn get(&self, section: PlanSection) -> Option<&str> {
        self.sections.get(&section).map(String::as_str)
    }

    /// Whether no known section carries any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(String::is_empty)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for AccountPlan {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let sections = map
            .into_iter()
            .filter_map(|(key, value)| {
                let section = PlanSection::from_key(&key)?;
                match value {
                    serde_json::Value::String(text) => Some((section, text)),
                    _ => None,
                }
            })
            .collect();
        Self { sections }
    }
}

impl From<AccountPlan> for BTreeMap<String, String> {
    fn from(plan: AccountPlan) -> Self {
        plan.sections
            .into_iter()
            .map(|(section, text)| (section.key().to_owned(), text))
            .collect()
    }
}

/// Why no section blocks were rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPlaceholder {
    /// No plan has been received yet.
    NoPlanYet,
    /// A plan arrived but none of its known sections had text.
    Empty,
}

impl PlanPlaceholder {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::NoPlanYet => {
                "No account plan yet. Ask me to \"generate plan\" once research is done."
            }
            Self::Empty => "Plan is empty.",
        }
    }
}

/// One titled section of a rendered plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanBlock {
    pub section: PlanSection,
    pub title: String,
    /// Section text split on newlines.
    pub lines: Vec<String>,
}

/// Output of [`render_plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedPlan {
    Placeholder(PlanPlaceholder),
    Sections(Vec<PlanBlock>),
}

impl RenderedPlan {
    /// Section blocks, empty for a placeholder.
    #[must_use]
    pub fn blocks(&self) -> &[PlanBlock] {
        match self {
            Self::Placeholder(_) => &[],
            Self::Sections(blocks) => blocks,
        }
    }
}

impl Default for RenderedPlan {
    fn default() -> Self {
        Self::Placeholder(PlanPlaceholder::NoPlanYet)
    }
}

/// Render a plan into titled blocks in canonical section order.
#[must_use]
pub fn render_plan(plan: Option<&AccountPlan>) -> RenderedPlan {
    let Some(plan) = plan else {
        return RenderedPlan::Placeholder(PlanPlaceholder::NoPlanYet);
    };

    let blocks: Vec<PlanBlock> = PlanSection::ALL
        .into_iter()
        .filter_map(|section| {
            let text = plan.get(section).filter(|t| !t.is_empty())?;
            Some(PlanBlock {
                section,
                title: section.title(),
                lines: text.split('\n').map(str::to_owned).collect(),
            })
        })
        .collect();

    if blocks.is_empty() {
        RenderedPlan::Placeholder(PlanPlaceholder::Empty)
    } else {
        RenderedPlan::Sections(blocks)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn titles_capitalize_every_word() {
        assert_eq!(PlanSection::CompanyOverview.title(), "Company Overview");
        assert_eq!(PlanSection::RisksAndRedFlags.title(), "Risks And Red Flags");
        assert_eq!(
            PlanSection::OrgMapAndStakeholders.title(),
            "Org Map And Stakeholders"
        );
        assert_eq!(title_from_key("next_steps"), "Next Steps");
    }

    #[test]
    fn keys_round_trip_through_from_key() {
        for section in PlanSection::ALL {
            assert_eq!(PlanSection::from_key(section.key()), Some(section));
        }
        assert_eq!(PlanSection::from_key("budget"), None);
    }

    #[test]
    fn renders_present_sections_in_canonical_order() {
        // Keys arrive in reverse order on the wire.
        let plan: AccountPlan = serde_json::from_str(
            r#"{"risks_and_red_flags": "Y", "company_overview": "X"}"#,
        )
        .unwrap();

        let rendered = render_plan(Some(&plan));
        let titles: Vec<&str> = rendered.blocks().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Company Overview", "Risks And Red Flags"]);
        assert_eq!(rendered.blocks()[0].lines, ["X"]);
        assert_eq!(rendered.blocks()[1].lines, ["Y"]);
    }

    #[test]
    fn absent_plan_renders_single_placeholder() {
        assert_eq!(
            render_plan(None),
            RenderedPlan::Placeholder(PlanPlaceholder::NoPlanYet)
        );
        assert!(render_plan(None).blocks().is_empty());
    }

    #[test]
    fn empty_plan_renders_single_placeholder() {
        let plan: AccountPlan = serde_json::from_str("{}").unwrap();
        assert_eq!(
            render_plan(Some(&plan)),
            RenderedPlan::Placeholder(PlanPlaceholder::Empty)
        );
    }

    #[test]
    fn unknown_keys_and_blank_sections_are_skipped() {
        let plan: AccountPlan = serde_json::from_str(
            r#"{"budget": "lots", "next_steps": "", "key_initiatives": 42}"#,
        )
        .unwrap();
        assert!(plan.is_empty());
        assert_eq!(
            render_plan(Some(&plan)),
            RenderedPlan::Placeholder(PlanPlaceholder::Empty)
        );
    }

    #[test]
    fn section_text_newlines_become_lines() {
        let plan = AccountPlan::new().with(PlanSection::NextSteps, "- call CTO\n- send deck");
        let rendered = render_plan(Some(&plan));
        assert_eq!(rendered.blocks()[0].lines, ["- call CTO", "- send deck"]);
    }

    #[test]
    fn rendering_is_idempotent() {
        let plan = AccountPlan::new()
            .with(PlanSection::KeyInitiatives, "AI")
            .with(PlanSection::CompanyOverview, "Zeta");
        assert_eq!(render_plan(Some(&plan)), render_plan(Some(&plan)));
    }

    #[test]
    fn serializes_back_to_wire_keys() {
        let plan = AccountPlan::new().with(PlanSection::NextSteps, "ship");
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value, serde_json::json!({"next_steps": "ship"}));
    }
}
