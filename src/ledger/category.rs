use serde::{Deserialize, Serialize};

pub const FALLBACK_CATEGORY_NAME: &str = "Autres";
pub const FALLBACK_CATEGORY_ICON: &str = "📦";
pub const FALLBACK_CATEGORY_COLOR: &str = "#9ca3af";

/// Categorises ledger activity for reporting. The category lifecycle lives outside the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    #[serde(default)]
    pub kind: CategoryKind,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
        kind: CategoryKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
            kind,
        }
    }
}

/// Which side of the ledger a category is offered for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryKind {
    Income,
    Expense,
    #[default]
    Both,
}

/// Resolves category ids to their metadata.
pub trait CategoryLookup {
    fn find_category(&self, id: &str) -> Option<&Category>;
}

impl CategoryLookup for [Category] {
    fn find_category(&self, id: &str) -> Option<&Category> {
        self.iter().find(|category| category.id == id)
    }
}

impl CategoryLookup for Vec<Category> {
    fn find_category(&self, id: &str) -> Option<&Category> {
        self.as_slice().find_category(id)
    }
}

/// Presentation metadata for a category reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryDisplay {
    pub name: String,
    pub icon: String,
    pub color: String,
    pub resolved: bool,
}

impl CategoryDisplay {
    pub fn fallback() -> Self {
        Self {
            name: FALLBACK_CATEGORY_NAME.into(),
            icon: FALLBACK_CATEGORY_ICON.into(),
            color: FALLBACK_CATEGORY_COLOR.into(),
            resolved: false,
        }
    }
}

/// Dangling references resolve to the neutral fallback instead of failing.
pub fn resolve_display<L>(lookup: &L, category_id: &str) -> CategoryDisplay
where
    L: CategoryLookup + ?Sized,
{
    match lookup.find_category(category_id) {
        Some(category) => CategoryDisplay {
            name: category.name.clone(),
            icon: category.icon.clone(),
            color: category.color.clone(),
            resolved: true,
        },
        None => CategoryDisplay::fallback(),
    }
}

/// Categories seeded into a fresh account.
pub fn default_categories() -> Vec<Category> {
    use CategoryKind::*;
    [
        ("salaire", "Salaire", "💼", "#10b981", Income),
        ("logement", "Logement", "🏠", "#6366f1", Expense),
        ("alimentation", "Alimentation", "🛒", "#f59e0b", Expense),
        ("transport", "Transport", "🚗", "#3b82f6", Expense),
        ("abonnements", "Abonnements", "📺", "#8b5cf6", Expense),
        ("sante", "Santé", "💊", "#ef4444", Expense),
        ("loisirs", "Loisirs", "🎉", "#ec4899", Expense),
        ("autres", FALLBACK_CATEGORY_NAME, FALLBACK_CATEGORY_ICON, FALLBACK_CATEGORY_COLOR, Both),
    ]
    .into_iter()
    .map(|(id, name, icon, color, kind)| Category::new(id, name, icon, color, kind))
    .collect()
}
