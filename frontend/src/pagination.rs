//! Paginated view state.

use std::ops::RangeInclusive;

/// Pagers with at most this many pages list every page.
const PAGER_WIDTH: u64 = 7;

/// One button of the pager under a list table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    /// Jumps to this 1-based page.
    Page(u64),
    /// Inert gap standing for skipped pages.
    Ellipsis,
}

/// Current page, page size and server total of one list page. The current
/// page never leaves `1..=max(1, ceil(total / size))` once the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    current_page: u64,
    page_size: u64,
    /// Unknown until the first list response arrives.
    total_items: Option<u64>,
}

impl PageState {
    /// First page of an empty list; a zero size is raised to 1.
    pub fn new(page_size: u64) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items: None,
        }
    }

    /// 1-based current page.
    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    /// Rows per page.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Server total, once known.
    pub fn total_items(&self) -> Option<u64> {
        self.total_items
    }

    /// `max(1, ceil(total / size))`; unbounded while the total is unknown.
    pub fn total_pages(&self) -> Option<u64> {
        self.total_items
            .map(|total| total.div_ceil(self.page_size).max(1))
    }

    /// Moves to `page`, clamped into the valid range. Returns whether the
    /// page changed.
    pub fn go_to(&mut self, page: u64) -> bool {
        let next = self.clamp(page);
        let changed = next != self.current_page;
        self.current_page = next;
        changed
    }

    /// Changes the page size and re-clamps. Returns whether the page moved.
    pub fn set_page_size(&mut self, page_size: u64) -> bool {
        self.page_size = page_size.max(1);
        self.go_to(self.current_page)
    }

    /// Records the server total and re-clamps. Returns whether the page
    /// moved.
    pub fn set_total_items(&mut self, total_items: u64) -> bool {
        self.total_items = Some(total_items);
        self.go_to(self.current_page)
    }

    /// Forgets the total; only the lower bound holds until the next one.
    pub fn clear_total_items(&mut self) {
        self.total_items = None;
    }

    /// Back to page 1, e.g. after a filter commit.
    pub fn reset(&mut self) -> bool {
        self.go_to(1)
    }

    /// Zero-based index of the first item of the current page.
    pub fn offset(&self) -> u64 {
        self.page_size.saturating_mul(self.current_page - 1)
    }

    /// Items of `items` belonging to the current page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(items.len());
        let size = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        let end = start.saturating_add(size).min(items.len());
        &items[start..end]
    }

    /// Buttons of the pager under a list table. The first and last page are
    /// always present, with a window of neighbours around the current page.
    /// Skipped runs collapse into one [`PageSlot::Ellipsis`]. While the total
    /// is unknown the current page counts as the last one.
    pub fn slots(&self) -> Vec<PageSlot> {
        let last = self.total_pages().unwrap_or(self.current_page);
        if last <= PAGER_WIDTH {
            return (1..=last).map(PageSlot::Page).collect();
        }

        let window = self.pager_window(last);
        let mut slots = vec![PageSlot::Page(1)];
        if *window.start() > 2 {
            slots.push(PageSlot::Ellipsis);
        }
        let inner_end = *window.end();
        slots.extend(window.map(PageSlot::Page));
        if inner_end < last - 1 {
            slots.push(PageSlot::Ellipsis);
        }
        slots.push(PageSlot::Page(last));
        slots
    }

    /// Inner pages listed between the first and the last one; four wide at
    /// either edge, two on each side of the current page otherwise.
    fn pager_window(&self, last: u64) -> RangeInclusive<u64> {
        let current = self.current_page;
        if current <= 3 {
            2..=5
        } else if current + 2 >= last {
            (last - 4).max(2)..=last - 1
        } else {
            current - 2..=current + 2
        }
    }

    fn clamp(&self, page: u64) -> u64 {
        match self.total_pages() {
            Some(last) => page.clamp(1, last),
            None => page.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_to_clamps_into_known_range() {
        let mut page = PageState::new(10);
        page.set_total_items(25);
        assert_eq!(page.total_pages(), Some(3));

        page.go_to(0);
        assert_eq!(page.current_page(), 1);
        page.go_to(99);
        assert_eq!(page.current_page(), 3);
    }

    #[test]
    fn go_to_holds_invariant_for_every_input() {
        for total in [0_u64, 1, 9, 10, 11, 57] {
            for size in [1_u64, 3, 10] {
                for target in 0..30 {
                    let mut page = PageState::new(size);
                    page.set_total_items(total);
                    page.go_to(target);
                    let max = u64::max(1, total.div_ceil(size));
                    assert!((1..=max).contains(&page.current_page()), "{total}/{size}/{target}");
                }
            }
        }
    }

    #[test]
    fn shrinking_total_moves_back_to_last_page() {
        let mut page = PageState::new(10);
        page.set_total_items(50);
        page.go_to(5);
        assert!(page.set_total_items(12));
        assert_eq!(page.current_page(), 2);
    }

    #[test]
    fn larger_page_size_reclamps() {
        let mut page = PageState::new(5);
        page.set_total_items(20);
        page.go_to(4);
        page.set_page_size(10);
        assert_eq!(page.current_page(), 2);
        assert_eq!(page.offset(), 10);
    }

    #[test]
    fn unknown_total_only_enforces_lower_bound() {
        let mut page = PageState::new(10);
        page.go_to(4);
        assert_eq!(page.current_page(), 4);
        assert_eq!(page.total_pages(), None);
    }

    #[test]
    fn slice_returns_current_page_items() {
        let items: Vec<u32> = (1..=23).collect();
        let mut page = PageState::new(10);
        page.set_total_items(items.len() as u64);
        page.go_to(3);
        assert_eq!(page.slice(&items), &[21, 22, 23]);
    }

    #[test]
    fn slots_collapse_gaps() {
        let mut page = PageState::new(1);
        page.set_total_items(20);
        page.go_to(10);
        assert_eq!(page.slots(), vec![
            PageSlot::Page(1),
            PageSlot::Ellipsis,
            PageSlot::Page(8),
            PageSlot::Page(9),
            PageSlot::Page(10),
            PageSlot::Page(11),
            PageSlot::Page(12),
            PageSlot::Ellipsis,
            PageSlot::Page(20),
        ]);
    }

    #[test]
    fn slots_keep_four_inner_pages_at_the_edges() {
        let mut page = PageState::new(10);
        page.set_total_items(100);
        assert_eq!(page.slots(), vec![
            PageSlot::Page(1),
            PageSlot::Page(2),
            PageSlot::Page(3),
            PageSlot::Page(4),
            PageSlot::Page(5),
            PageSlot::Ellipsis,
            PageSlot::Page(10),
        ]);

        page.go_to(10);
        assert_eq!(page.slots(), vec![
            PageSlot::Page(1),
            PageSlot::Ellipsis,
            PageSlot::Page(6),
            PageSlot::Page(7),
            PageSlot::Page(8),
            PageSlot::Page(9),
            PageSlot::Page(10),
        ]);
    }
}
