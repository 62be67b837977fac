pub mod comment;
pub mod post;
pub mod social;
pub mod user;
