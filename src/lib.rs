//! Roster - student records with seat-number allocation
//!
//! A small CRUD service over a student roster. Records are created with a
//! sequential seat number, queried by any field, and patched or removed by id.
//! Account identifiers (`tkubm1760`) can be checked for format and for seat
//! code uniqueness.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Roster                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────┐  ┌─────────────────────────────┐   │
//! │  │   HTTP API (axum)       │  │   CLI (clap)                │   │
//! │  └────────────┬────────────┘  └──────────────┬──────────────┘   │
//! │               │                              │                  │
//! │               ▼                              ▼                  │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │                  Student Service                            ││
//! │  │  (every operation returns an Envelope {code, message, body})││
//! │  └──────┬───────────────────┬───────────────────────┬──────────┘│
//! │         │                   │                       │           │
//! │         ▼                   ▼                       ▼           │
//! │  ┌─────────────┐  ┌───────────────────┐  ┌────────────────────┐ │
//! │  │ Validation  │  │ Seat Allocator    │  │ Identifier Parser  │ │
//! │  │ (required   │  │ (max + 1, single  │  │ (school, dept,     │ │
//! │  │  fields)    │  │  writer, audit)   │  │  seat code)        │ │
//! │  └─────────────┘  └─────────┬─────────┘  └────────────────────┘ │
//! │                             │                                   │
//! │                             ▼                                   │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │                 StudentStore trait                          ││
//! │  │  ┌──────────────────────────┐  ┌──────────────────────────┐ ││
//! │  │  │  MarkdownStore           │  │  MemoryStore             │ ││
//! │  │  │  (frontmatter + git)     │  │  (tests, throwaway)      │ ││
//! │  │  └────────────┬─────────────┘  └──────────────────────────┘ ││
//! │  └───────────────┼─────────────────────────────────────────────┘│
//! │                  ▼                                              │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │   /collections/students/*.md   committed to git             ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod git;
pub mod identifier;
pub mod model;
pub mod seat;
pub mod service;
pub mod storage;
pub mod validation;

pub use envelope::Envelope;
pub use error::{Error, Result};
pub use model::{NewStudent, Student, StudentField, StudentPatch, StudentProfile};
pub use seat::{SeatConflict, ValidationOutcome};
pub use service::StudentService;
pub use storage::{MarkdownStore, MemoryStore, StudentStore};
