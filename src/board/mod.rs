//! The kanban board: data model, persistence and the interactive pieces
//! that sit on top of it.
//!
//! | Module       | Role                                                        |
//! |--------------|-------------------------------------------------------------|
//! | `models`     | Task, column, member, session and notice types              |
//! | `mapper`     | `tasks` table rows to and from [`models::Task`]             |
//! | `projection` | Groups a task list into the four board columns              |
//! | `backend`    | Persistence traits and the in-memory backend                |
//! | `rest`       | Hosted REST/auth/functions client                           |
//! | `functions`  | Assistant and invitation-email function clients             |
//! | `store`      | Task list with load/add/update/remove/move                  |
//! | `team`       | Team directory and invitations                              |
//! | `dnd`        | Card drag state and column drop handling                    |
//! | `forms`      | Add/edit task and invite dialogs                            |
//! | `analytics`  | Summary figures over the task list                          |
//! | `calendar`   | Calendar events: store, validation and day grouping         |
//! | `account`    | Profile and notification/privacy settings                   |
//! | `api`        | Local HTTP API                                              |
//! | `server`     | Router assembly and the serve loop                          |

pub mod account;
pub mod analytics;
pub mod api;
pub mod backend;
pub mod calendar;
pub mod dnd;
pub mod forms;
pub mod functions;
pub mod mapper;
pub mod models;
pub mod projection;
pub mod rest;
pub mod server;
pub mod store;
pub mod team;
