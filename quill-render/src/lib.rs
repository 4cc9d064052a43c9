//! # quill-render
//!
//! The two block-tree converters: [`markdown::page_to_markdown`] and
//! [`html::page_to_html`], plus the rich-text run merger they share.
//!
//! Both renderers are independent policies over the same tree, not one code
//! path with flags — the markdown target drops images entirely (downstream
//! text consumers cannot fetch them), the HTML target renders `<img>` tags
//! for CMS publication. Rendering is infallible: unknown or malformed blocks
//! degrade, they never error.

pub mod html;
pub mod markdown;
pub mod richtext;

pub use html::page_to_html;
pub use markdown::page_to_markdown;
