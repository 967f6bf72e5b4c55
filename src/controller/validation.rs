use crate::clipboard::Clipboard;
use crate::error::{ListError, ListResult, ValidationError};
use crate::models::NewItem;
use crate::store::ListStore;

use super::ListController;

pub const MAX_LIST_NAME_CHARS: usize = 100;
pub const MAX_LIST_ITEMS: usize = 50;
pub const MAX_LABEL_CHARS: usize = 200;

impl<S: ListStore, C: Clipboard> ListController<S, C> {
    /// Check a list name and item set. Rules run in order and the first
    /// failure is returned: name present, name length, name free inside
    /// `category_id` (skipping `exclude_list_id`), at least one item, at
    /// most [`MAX_LIST_ITEMS`], and a usable label on every item.
    pub fn validate_list_data(
        &self,
        name: &str,
        items: &[NewItem],
        category_id: Option<i64>,
        exclude_list_id: Option<i64>,
    ) -> ListResult<()> {
        check_name(name)?;

        if let Some(category_id) = category_id {
            let unique = self
                .store
                .is_lista_name_unique(category_id, name, exclude_list_id)
                .map_err(ListError::store("validar lista"))?;
            if !unique {
                return Err(ValidationError::DuplicateName(name.to_string()).into());
            }
        }

        check_items(items)?;
        Ok(())
    }
}

pub(crate) fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_LIST_NAME_CHARS {
        return Err(ValidationError::NameTooLong {
            max: MAX_LIST_NAME_CHARS,
        });
    }
    Ok(())
}

pub(crate) fn check_items(items: &[NewItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::NoItems);
    }
    if items.len() > MAX_LIST_ITEMS {
        return Err(ValidationError::TooManyItems {
            max: MAX_LIST_ITEMS,
        });
    }
    for (step, item) in items.iter().enumerate().map(|(i, item)| (i + 1, item)) {
        if item.label.is_empty() {
            return Err(ValidationError::MissingLabel(step));
        }
        if item.label.chars().count() > MAX_LABEL_CHARS {
            return Err(ValidationError::LabelTooLong(step));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<NewItem> {
        (1..=n)
            .map(|i| NewItem::text(format!("step {i}"), format!("echo {i}")))
            .collect()
    }

    #[test]
    fn names_fail_only_when_blank_or_too_long() {
        for blank in ["", " ", "\t\n"] {
            assert_eq!(check_name(blank), Err(ValidationError::EmptyName));
        }
        assert_eq!(check_name(&"a".repeat(100)), Ok(()));
        assert_eq!(
            check_name(&"a".repeat(101)),
            Err(ValidationError::NameTooLong { max: 100 })
        );
        // Length is counted in characters, not bytes.
        assert_eq!(check_name(&"ñ".repeat(100)), Ok(()));
        assert_eq!(check_name("  padded  "), Ok(()));
    }

    #[test]
    fn item_count_bounds() {
        assert_eq!(check_items(&[]), Err(ValidationError::NoItems));
        for n in [1, 2, 25, 50] {
            assert_eq!(check_items(&items(n)), Ok(()), "{n} items");
        }
        assert_eq!(
            check_items(&items(51)),
            Err(ValidationError::TooManyItems { max: 50 })
        );
    }

    #[test]
    fn label_errors_report_one_based_step() {
        let mut set = items(3);
        set[1].label.clear();
        assert_eq!(check_items(&set), Err(ValidationError::MissingLabel(2)));

        let mut set = items(3);
        set[2].label = "x".repeat(201);
        assert_eq!(check_items(&set), Err(ValidationError::LabelTooLong(3)));

        let mut set = items(1);
        set[0].label = "x".repeat(200);
        assert_eq!(check_items(&set), Ok(()));
    }
}
