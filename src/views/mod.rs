//! User-facing screens
//!
//! Each operation returns an [`Outcome`](crate::notify::Outcome) carrying the
//! notification to show and where to navigate next.

pub mod account;
pub mod dashboard;
pub mod detail;
pub mod form;

pub use dashboard::{DashboardView, Filter, ItineraryCard};
pub use detail::DetailView;
pub use form::{ActivityField, Field, FormController, ItineraryDraft};
