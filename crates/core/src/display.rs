//! How tool invocations are presented to the user.
//!
//! Tool names form an open set: the agent may start using a new tool at
//! any time. Renderers look names up in a [`ToolDisplayRegistry`], and a
//! name without an entry still gets a usable display built from the
//! fallback.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::Serialize;

/// Presentation of one tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ToolDisplay {
    /// A short progress label, like "Researching competitors".
    pub label: Cow<'static, str>,
    /// An icon identifier for the renderer to map.
    pub icon: Cow<'static, str>,
    /// An accent color name for the renderer to map.
    pub color: Cow<'static, str>,
}

impl ToolDisplay {
    /// Creates a display entry.
    #[inline]
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        icon: impl Into<Cow<'static, str>>,
        color: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            label: label.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }
}

const FALLBACK_ICON: &str = "FileText";
const FALLBACK_COLOR: &str = "gray";

#[rustfmt::skip]
const BUILTIN_TOOLS: &[(&str, &str, &str, &str)] = &[
    ("analyze_product", "Analyzing product", "FileText", "blue"),
    ("extract_value_props", "Extracting value props", "Target", "purple"),
    ("identify_icp", "Defining ICP", "Users", "indigo"),
    ("search_competitors", "Researching competitors", "Crosshair", "red"),
    ("analyze_pricing", "Analyzing pricing", "DollarSign", "green"),
    ("fetch_url", "Fetching data", "BarChart3", "gray"),
    ("analyze_reviews", "Mining reviews", "MessageSquare", "yellow"),
    ("create_positioning_statement", "Creating positioning", "Target", "emerald"),
    ("create_messaging_matrix", "Building messaging matrix", "ClipboardList", "purple"),
    ("create_battlecard", "Creating battlecard", "Swords", "orange"),
    ("create_launch_plan", "Building launch plan", "Rocket", "blue"),
    ("create_checklist", "Generating checklist", "ClipboardList", "gray"),
    ("assess_market_risks", "Assessing market risks", "AlertTriangle", "red"),
    ("validate_positioning", "Validating positioning", "CheckCircle2", "green"),
    ("identify_gaps", "Identifying gaps", "TrendingUp", "yellow"),
];

/// A lookup table from tool names to their presentation.
#[derive(Clone, Debug)]
pub struct ToolDisplayRegistry {
    entries: HashMap<String, ToolDisplay>,
    fallback_icon: Cow<'static, str>,
    fallback_color: Cow<'static, str>,
}

impl ToolDisplayRegistry {
    /// Creates a registry without any entries.
    #[inline]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            fallback_icon: Cow::Borrowed(FALLBACK_ICON),
            fallback_color: Cow::Borrowed(FALLBACK_COLOR),
        }
    }

    /// Adds or replaces the display of a tool.
    #[inline]
    pub fn insert<S: Into<String>>(&mut self, name: S, display: ToolDisplay) {
        self.entries.insert(name.into(), display);
    }

    /// Sets the icon and color used for unknown tools.
    #[inline]
    pub fn set_fallback(
        &mut self,
        icon: impl Into<Cow<'static, str>>,
        color: impl Into<Cow<'static, str>>,
    ) {
        self.fallback_icon = icon.into();
        self.fallback_color = color.into();
    }

    /// Returns `true` if the tool has its own entry.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolves the display of a tool.
    ///
    /// Unknown tools are labelled with their raw name.
    pub fn resolve(&self, name: &str) -> Cow<'_, ToolDisplay> {
        match self.entries.get(name) {
            Some(display) => Cow::Borrowed(display),
            None => Cow::Owned(ToolDisplay {
                label: Cow::Owned(name.to_owned()),
                icon: self.fallback_icon.clone(),
                color: self.fallback_color.clone(),
            }),
        }
    }
}

impl Default for ToolDisplayRegistry {
    /// Creates a registry with the agent's built-in tools.
    fn default() -> Self {
        let mut registry = Self::empty();
        for &(name, label, icon, color) in BUILTIN_TOOLS {
            registry.insert(name, ToolDisplay::new(label, icon, color));
        }
        registry
    }
}
