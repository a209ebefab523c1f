//! Capability interface of the externally owned rich-text widget.
//!
//! The widget reports user-driven edits by calling
//! `ContentReconciler::handle_surface_change` (or the session equivalent)
//! with its current HTML. Programmatic `render` calls must not be echoed back
//! as change events.

/// Rich-text editing surface.
pub trait RichTextSurface {
    /// Replaces the displayed document.
    fn render(&mut self, html: &str);
    /// Makes the surface editable.
    fn enable(&mut self);
    /// Makes the surface read-only.
    fn disable(&mut self);
}

impl<S: RichTextSurface + ?Sized> RichTextSurface for &mut S {
    fn render(&mut self, html: &str) {
        (**self).render(html);
    }

    fn enable(&mut self) {
        (**self).enable();
    }

    fn disable(&mut self) {
        (**self).disable();
    }
}

/// Marker the widget emits for an empty document.
pub const EMPTY_DOCUMENT_MARKUP: &str = "<p><br></p>";

/// Maps the widget's empty-document marker to empty content.
pub fn normalize_surface_html(html: &str) -> &str {
    if html == EMPTY_DOCUMENT_MARKUP {
        ""
    } else {
        html
    }
}
