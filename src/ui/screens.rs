use crate::models::{Category, Item, Lista, NewItem};

use super::helpers::clamp_selection;

/// Lists of one category.
pub(crate) struct ListsScreen {
    pub(crate) category: Category,
    pub(crate) lists: Vec<Lista>,
    pub(crate) selected: usize,
}

impl ListsScreen {
    pub(crate) fn new(category: Category, lists: Vec<Lista>) -> Self {
        Self {
            category,
            lists,
            selected: 0,
        }
    }

    pub(crate) fn current(&self) -> Option<&Lista> {
        self.lists.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = clamp_selection(self.selected, offset, self.lists.len());
    }

    /// Replace the rows, keeping the cursor on `focus_id` when it is still
    /// present.
    pub(crate) fn set_lists(&mut self, lists: Vec<Lista>, focus_id: Option<i64>) {
        self.lists = lists;
        if let Some(index) = focus_id.and_then(|id| self.lists.iter().position(|l| l.id == id)) {
            self.selected = index;
        }
        self.selected = clamp_selection(self.selected, 0, self.lists.len());
    }
}

/// Ordered steps of a single list.
pub(crate) struct StepsScreen {
    pub(crate) category: Category,
    pub(crate) lista: Lista,
    pub(crate) items: Vec<Item>,
    pub(crate) selected: usize,
}

impl StepsScreen {
    pub(crate) fn new(category: Category, lista: Lista, items: Vec<Item>) -> Self {
        Self {
            category,
            lista,
            items,
            selected: 0,
        }
    }

    pub(crate) fn current(&self) -> Option<&Item> {
        self.items.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = clamp_selection(self.selected, offset, self.items.len());
    }

    pub(crate) fn set_items(&mut self, items: Vec<Item>) {
        self.items = items;
        self.selected = clamp_selection(self.selected, 0, self.items.len());
    }

    /// The item set with the selected step moved by `offset`, or `None` when
    /// the move would leave the list.
    pub(crate) fn reordered(&self, offset: isize) -> Option<(Vec<NewItem>, usize)> {
        let target = self.selected.checked_add_signed(offset)?;
        if target >= self.items.len() || self.selected >= self.items.len() {
            return None;
        }
        let mut items: Vec<NewItem> = self.items.iter().map(Item::to_new_item).collect();
        items.swap(self.selected, target);
        Some((items, target))
    }
}

/// Items of a category that do not belong to any list. Marked ids keep the
/// order in which they were marked.
pub(crate) struct ItemsScreen {
    pub(crate) category: Category,
    pub(crate) items: Vec<Item>,
    pub(crate) selected: usize,
    pub(crate) marked: Vec<i64>,
}

impl ItemsScreen {
    pub(crate) fn new(category: Category, items: Vec<Item>) -> Self {
        Self {
            category,
            items,
            selected: 0,
            marked: Vec::new(),
        }
    }

    pub(crate) fn current(&self) -> Option<&Item> {
        self.items.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = clamp_selection(self.selected, offset, self.items.len());
    }

    pub(crate) fn set_items(&mut self, items: Vec<Item>) {
        self.marked
            .retain(|id| items.iter().any(|item| item.id == *id));
        self.items = items;
        self.selected = clamp_selection(self.selected, 0, self.items.len());
    }

    /// Toggle the mark on the selected item; returns whether it is now marked.
    pub(crate) fn toggle_mark(&mut self) -> bool {
        let Some(id) = self.current().map(|item| item.id) else {
            return false;
        };
        match self.marked.iter().position(|marked| *marked == id) {
            Some(index) => {
                self.marked.remove(index);
                false
            }
            None => {
                self.marked.push(id);
                true
            }
        }
    }

    pub(crate) fn mark_position(&self, id: i64) -> Option<usize> {
        self.marked.iter().position(|marked| *marked == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemType;

    fn category() -> Category {
        Category {
            id: 1,
            name: "Git".into(),
            icon: None,
            created_at: String::new(),
        }
    }

    fn item(id: i64, label: &str) -> Item {
        Item {
            id,
            category_id: 1,
            label: label.into(),
            content: format!("content {id}"),
            item_type: ItemType::Text,
            icon: None,
            description: None,
            is_sensitive: false,
            tags: Vec::new(),
            list_id: None,
            orden_lista: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn reorder_swaps_with_neighbour() {
        let mut screen = StepsScreen::new(
            category(),
            Lista::new(9, 1, "Deploy"),
            vec![item(1, "pull"), item(2, "build"), item(3, "push")],
        );
        assert!(screen.reordered(-1).is_none());

        let (items, target) = screen.reordered(1).expect("move down");
        assert_eq!(target, 1);
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["build", "pull", "push"]);

        screen.selected = 2;
        assert!(screen.reordered(1).is_none());
    }

    #[test]
    fn marks_follow_marking_order_and_survive_reload() {
        let mut screen = ItemsScreen::new(category(), vec![item(1, "a"), item(2, "b"), item(3, "c")]);
        screen.selected = 2;
        assert!(screen.toggle_mark());
        screen.selected = 0;
        assert!(screen.toggle_mark());
        assert_eq!(screen.marked, vec![3, 1]);

        assert!(!screen.toggle_mark());
        assert_eq!(screen.marked, vec![3]);

        screen.set_items(vec![item(1, "a"), item(2, "b")]);
        assert!(screen.marked.is_empty());
    }

    #[test]
    fn list_focus_survives_reload() {
        let mut screen = ListsScreen::new(
            category(),
            vec![Lista::new(1, 1, "a"), Lista::new(2, 1, "b")],
        );
        screen.set_lists(
            vec![Lista::new(3, 1, "0"), Lista::new(1, 1, "a"), Lista::new(2, 1, "b")],
            Some(2),
        );
        assert_eq!(screen.selected, 2);
        screen.set_lists(Vec::new(), Some(2));
        assert_eq!(screen.selected, 0);
    }
}
