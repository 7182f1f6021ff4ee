//! Data layer: core types, loading, and name search.
//!
//! Architecture:
//! ```text
//!  reference .csv        sample .csv / .json / .parquet
//!        │                         │
//!        ▼                         ▼
//!   ┌──────────┐             ┌──────────┐
//!   │  loader  │             │  loader  │
//!   └──────────┘             └──────────┘
//!        │                         │
//!        ▼                         ▼
//!  ┌──────────────────┐      ┌──────────┐
//!  │ ReferenceLibrary │      │ PeakList │
//!  └──────────────────┘      └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  search  │  case-insensitive name lookup → indices
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod search;
