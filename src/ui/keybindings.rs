// Keybindings for the photorow modal viewer
// Maps key names to modal actions
//
// Keybindings:
// - Escape: Close the modal, restore focus to the trigger
// - ArrowLeft / h: Previous photo
// - ArrowRight / l: Next photo
// - Tab / Shift+Tab: Cycle focus inside the modal

/// Navigation direction through the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    pub fn step(self) -> isize {
        match self {
            Direction::Prev => -1,
            Direction::Next => 1,
        }
    }
}

/// A key press as seen by the modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKey {
    Escape,
    ArrowLeft,
    ArrowRight,
    Tab { shift: bool },
    Other,
}

impl ModalKey {
    /// Parses a DOM-style key name (`"Escape"`, `"ArrowLeft"`, `"Tab"`).
    pub fn from_name(name: &str, shift: bool) -> Self {
        match name {
            "Escape" | "Esc" => ModalKey::Escape,
            "ArrowLeft" | "Left" | "h" => ModalKey::ArrowLeft,
            "ArrowRight" | "Right" | "l" => ModalKey::ArrowRight,
            "Tab" => ModalKey::Tab { shift },
            _ => ModalKey::Other,
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            ModalKey::ArrowLeft => Some(Direction::Prev),
            ModalKey::ArrowRight => Some(Direction::Next),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(ModalKey::from_name("Escape", false), ModalKey::Escape);
        assert_eq!(ModalKey::from_name("ArrowLeft", false), ModalKey::ArrowLeft);
        assert_eq!(ModalKey::from_name("l", false), ModalKey::ArrowRight);
        assert_eq!(
            ModalKey::from_name("Tab", true),
            ModalKey::Tab { shift: true }
        );
        assert_eq!(ModalKey::from_name("Enter", false), ModalKey::Other);
    }

    #[test]
    fn test_arrow_directions() {
        assert_eq!(ModalKey::ArrowLeft.direction(), Some(Direction::Prev));
        assert_eq!(ModalKey::ArrowRight.direction(), Some(Direction::Next));
        assert_eq!(ModalKey::Escape.direction(), None);
        assert_eq!(Direction::Prev.step(), -1);
    }
}
