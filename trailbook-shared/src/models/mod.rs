/// Data models
///
/// Each model owns its table's row type, its write-input types for the
/// generic store, and the handful of bespoke queries (auth lookups, joined
/// detail reads) that don't go through the generic path.
///
/// # Models
///
/// - [`user`]: accounts, roles, credential and reset-token state
/// - [`tour`]: the catalog, with derived slug and rating aggregate
/// - [`review`]: per-(tour, user) reviews driving the rating aggregate
/// - [`booking`]: paid tour bookings

pub mod booking;
pub mod review;
pub mod tour;
pub mod user;
