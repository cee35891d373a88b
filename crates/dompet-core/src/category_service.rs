//! Business logic helpers for category management.

use dompet_domain::{Category, Ledger, TransactionKind};
use uuid::Uuid;

use crate::{CoreError, Result};

const MAX_NAME_LEN: usize = 50;

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: TransactionKind,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Sparse update for a category. Changing the kind is only permitted while
/// nothing references the category, since transactions and budgets must
/// keep matching their category's kind.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub kind: Option<TransactionKind>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Provides validated operations for [`Category`] entities.
pub struct CategoryService;

impl CategoryService {
    pub fn create(ledger: &mut Ledger, input: NewCategory) -> Result<Uuid> {
        let name = normalized_name(&input.name)?;
        Self::validate_unique(ledger, None, &name, input.kind)?;
        let mut category = Category::new(name, input.kind);
        category.icon = input.icon;
        category.color = input.color;
        Ok(ledger.add_category(category))
    }

    pub fn update(ledger: &mut Ledger, id: Uuid, patch: CategoryPatch) -> Result<()> {
        let current = ledger
            .category(id)
            .ok_or(CoreError::CategoryNotFound(id))?;
        let kind = patch.kind.unwrap_or(current.kind);
        if kind != current.kind && Self::is_referenced(ledger, id) {
            return Err(CoreError::Conflict(
                "category type cannot change while transactions or budgets reference it".into(),
            ));
        }
        let name = match patch.name {
            Some(candidate) => {
                let name = normalized_name(&candidate)?;
                Self::validate_unique(ledger, Some(id), &name, kind)?;
                Some(name)
            }
            None => None,
        };
        let category = ledger
            .category_mut(id)
            .ok_or(CoreError::CategoryNotFound(id))?;
        if let Some(name) = name {
            category.name = name;
        }
        category.kind = kind;
        if let Some(icon) = patch.icon {
            category.icon = Some(icon);
        }
        if let Some(color) = patch.color {
            category.color = Some(color);
        }
        ledger.touch();
        Ok(())
    }

    /// Removes a category after verifying nothing references it.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> Result<()> {
        if ledger.category(id).is_none() {
            return Err(CoreError::CategoryNotFound(id));
        }
        if ledger.transactions.iter().any(|txn| txn.category_id == id) {
            return Err(CoreError::Conflict("category has linked transactions".into()));
        }
        if ledger.budgets.iter().any(|budget| budget.category_id == id) {
            return Err(CoreError::Conflict("category has linked budgets".into()));
        }
        ledger.categories.retain(|category| category.id != id);
        ledger.touch();
        Ok(())
    }

    /// Returns categories, optionally restricted to one kind, ordered by
    /// kind then name.
    pub fn list(ledger: &Ledger, kind: Option<TransactionKind>) -> Vec<&Category> {
        let mut categories: Vec<&Category> = ledger
            .categories
            .iter()
            .filter(|category| kind.map(|k| category.kind == k).unwrap_or(true))
            .collect();
        categories.sort_by(|a, b| {
            (a.kind.to_string(), a.name.to_ascii_lowercase())
                .cmp(&(b.kind.to_string(), b.name.to_ascii_lowercase()))
        });
        categories
    }

    fn is_referenced(ledger: &Ledger, id: Uuid) -> bool {
        ledger.transactions.iter().any(|txn| txn.category_id == id)
            || ledger.budgets.iter().any(|budget| budget.category_id == id)
    }

    fn validate_unique(
        ledger: &Ledger,
        exclude: Option<Uuid>,
        candidate: &str,
        kind: TransactionKind,
    ) -> Result<()> {
        let normalized = candidate.to_ascii_lowercase();
        let duplicate = ledger.categories.iter().any(|category| {
            category.kind == kind
                && category.name.trim().to_ascii_lowercase() == normalized
                && exclude != Some(category.id)
        });
        if duplicate {
            Err(CoreError::Conflict(format!(
                "category `{}` already exists",
                candidate
            )))
        } else {
            Ok(())
        }
    }
}

fn normalized_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("category name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::InvalidInput(format!(
            "category name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}
