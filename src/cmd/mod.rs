//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                                 |
//! |-------------|--------------------------------------------------|
//! | `board`     | `Board`, `Add`, `Edit`, `Rm`, `Mv`, `Stats`      |
//! | `team`      | `Team`, `Invite`                                 |
//! | `calendar`  | `Cal`, `Event`                                   |
//! | `account`   | `Profile`, `Settings`                            |
//! | `assistant` | `Ask`                                            |
//! | `serve`     | `Serve`                                          |
//! | `auth`      | `Login`, `Logout`                                |
//! | `config`    | `Config`                                         |
//!
//! `workspace` picks the backend and session; `render` prints results.

pub mod account;
pub mod assistant;
pub mod auth;
pub mod board;
pub mod calendar;
pub mod config;
pub mod render;
pub mod serve;
pub mod team;
pub mod workspace;

pub use account::{cmd_profile, cmd_settings, parse_switch};
pub use assistant::cmd_ask;
pub use auth::{cmd_login, cmd_logout};
pub use board::{TaskFields, cmd_add, cmd_board, cmd_edit, cmd_mv, cmd_rm, cmd_stats};
pub use calendar::{cmd_cal, cmd_event_add};
pub use config::cmd_config;
pub use serve::cmd_serve;
pub use team::{cmd_invite, cmd_team};
