//! Guest and personalized recipe aggregation.
//!
//! [`GuestLoader`] fetches the curated lists every visitor sees,
//! [`PersonalizedLoader`] builds the signed-in feed from the ML service and
//! falls back to the guest lists, and [`AggregationController`] runs both for
//! the current session.

pub mod controller;
pub mod guest;
pub mod personalized;

pub use controller::{AggregationController, Phase, Snapshot, SEARCH_PAGE_SIZE};
pub use guest::{GuestLists, GuestLoad, GuestLoader};
pub use personalized::{
    FallbackReason, FeedMode, FeedSettings, PersonalizedFeed, PersonalizedLists,
    PersonalizedLoader,
};
