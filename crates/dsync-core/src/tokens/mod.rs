//! Token model, resolver, contrast checks and CSS output.

pub mod contrast;
pub mod css;
pub mod model;
pub mod resolver;

pub use contrast::{validate_contrast, ContrastCheck, WCAG_AA_NORMAL};
pub use css::{css_variable_name, generate_css};
pub use model::{
    FlatTokenMap, Token, TokenCategory, TokenCollection, TokenNode, TokenRef, TokenReference, TokenSet,
};
pub use resolver::{flatten, resolve_reference};
