use std::fmt;

/// Identifier of a focusable element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keeps Tab focus cycling inside the modal.
#[derive(Debug, Clone, Default)]
pub struct FocusTrap {
    focusables: Vec<ElementId>,
}

impl FocusTrap {
    pub fn new(focusables: Vec<ElementId>) -> Self {
        Self { focusables }
    }

    pub fn focusables(&self) -> &[ElementId] {
        &self.focusables
    }

    pub fn first(&self) -> Option<&ElementId> {
        self.focusables.first()
    }

    /// Where focus should move on Tab (`shift == false`) or Shift+Tab.
    ///
    /// Returns `None` when the default tab order already stays inside the
    /// trap. Focus found outside the trap is pulled back to its edge.
    pub fn next(&self, current: Option<&ElementId>, shift: bool) -> Option<ElementId> {
        let first = self.focusables.first()?;
        let last = self.focusables.last()?;
        let inside = current.is_some_and(|c| self.focusables.contains(c));
        if !inside {
            return Some(if shift { last.clone() } else { first.clone() });
        }
        match (current, shift) {
            (Some(c), false) if c == last => Some(first.clone()),
            (Some(c), true) if c == first => Some(last.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trap() -> FocusTrap {
        FocusTrap::new(vec![
            ElementId::new("close"),
            ElementId::new("prev"),
            ElementId::new("next"),
        ])
    }

    #[test]
    fn test_tab_wraps_last_to_first() {
        let trap = trap();
        assert_eq!(
            trap.next(Some(&ElementId::new("next")), false),
            Some(ElementId::new("close"))
        );
        assert_eq!(trap.next(Some(&ElementId::new("close")), false), None);
    }

    #[test]
    fn test_shift_tab_wraps_first_to_last() {
        let trap = trap();
        assert_eq!(
            trap.next(Some(&ElementId::new("close")), true),
            Some(ElementId::new("next"))
        );
        assert_eq!(trap.next(Some(&ElementId::new("next")), true), None);
    }

    #[test]
    fn test_escaped_focus_is_pulled_back() {
        let trap = trap();
        assert_eq!(
            trap.next(Some(&ElementId::new("page-link")), false),
            Some(ElementId::new("close"))
        );
        assert_eq!(trap.next(None, true), Some(ElementId::new("next")));
    }

    #[test]
    fn test_empty_trap_defers() {
        assert_eq!(FocusTrap::default().next(None, false), None);
    }
}
