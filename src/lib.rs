pub mod api;
pub mod chromosome;
pub mod config;
pub mod consts;
pub mod corpus;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod individual;
pub mod keymap;
pub mod layouts;
pub mod optimizer;
pub mod scorer;
pub mod state;
pub mod util;
// cmd and reports are modules of the binary crate (main.rs).
