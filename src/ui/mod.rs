pub mod caption;
pub mod focus;
pub mod keybindings;
pub mod modal;
pub mod renderer;
pub mod session;
pub mod surface;
pub mod transition;

pub use caption::{compose_caption, Caption, CaptionField};
pub use focus::{ElementId, FocusTrap};
pub use keybindings::{Direction, ModalKey};
pub use modal::{
    DisplayedImage, KeyOutcome, LoadOutcome, LoadRequest, LoadToken, MediaModal, ModalPhase,
    ModalState, ModalTemplate, SharedModal, TriggerElement,
};
pub use renderer::{GalleryObserver, GalleryRenderer, OrientationProbe, RendererSettings};
pub use session::ModalSession;
pub use surface::{RowSurface, TextSurface};
