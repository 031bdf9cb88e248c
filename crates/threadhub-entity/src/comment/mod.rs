//! Comment domain entities.

pub mod model;
pub mod tree;
pub mod view;

pub use model::{Comment, NewComment};
pub use tree::ThreadNode;
pub use view::{CommentView, QueryOptions};
