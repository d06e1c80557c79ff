pub mod error;
pub mod logging;
pub mod monitor;
pub mod poll;
pub mod source;
pub mod state;
pub mod summary;
pub mod view;
pub mod window;
