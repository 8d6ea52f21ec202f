//! HTML/text rendering with Jinja2 syntax.
//!
//! Page templates live in `templates/` at the crate root and are compiled into
//! the binary. Ad-hoc sources (notification templates edited in the admin
//! console) go through [`render_source`].

pub mod engine;

pub use engine::{render_source, render_template, RenderedSource, TemplateError};
