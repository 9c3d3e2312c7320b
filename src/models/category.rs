//! Resource categories
//!
//! A category groups the endpoints that share a TTL and an invalidation
//! policy. Every collaborator names its category explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical resource grouping used for TTL lookup and invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Projects,
    Revenue,
    Expenses,
    Billing,
    Collections,
    Dashboard,
    Users,
    Company,
    /// Anything without a dedicated policy (notifications, exports, ...)
    General,
}

impl Category {
    /// Named categories in endpoint-matching order.
    ///
    /// Aggregate endpoints come first so that `/dashboard/revenue` resolves
    /// to the dashboard rather than to revenue.
    pub const ALL: [Category; 8] = [
        Category::Dashboard,
        Category::Revenue,
        Category::Expenses,
        Category::Billing,
        Category::Collections,
        Category::Projects,
        Category::Users,
        Category::Company,
    ];

    /// Canonical lowercase name, also the substring matched in endpoints.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Projects => "projects",
            Category::Revenue => "revenue",
            Category::Expenses => "expenses",
            Category::Billing => "billing",
            Category::Collections => "collections",
            Category::Dashboard => "dashboard",
            Category::Users => "users",
            Category::Company => "company",
            Category::General => "general",
        }
    }

    /// Categories whose cached data is derived from this one.
    ///
    /// Hand-maintained: a mutation on `self` also invalidates these.
    pub fn dependents(self) -> &'static [Category] {
        match self {
            Category::Projects => &[Category::Dashboard],
            Category::Revenue => &[Category::Dashboard, Category::Projects],
            Category::Expenses => &[Category::Dashboard, Category::Projects],
            Category::Billing => &[Category::Collections, Category::Dashboard],
            Category::Collections => &[
                Category::Billing,
                Category::Dashboard,
                Category::Revenue,
            ],
            Category::Dashboard | Category::Users | Category::Company | Category::General => &[],
        }
    }

    /// Infers a category from an endpoint path by substring match.
    ///
    /// Returns `General` when nothing matches.
    pub fn infer(endpoint: &str) -> Category {
        Self::ALL
            .into_iter()
            .find(|category| endpoint.contains(category.as_str()))
            .unwrap_or(Category::General)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
