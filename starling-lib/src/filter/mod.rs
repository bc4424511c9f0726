//! The per-viewer filter stack: visibility, mutes, keyword filters.
//! Applied in that order by the surfacer; each layer only sees statuses
//! the previous one let through.

mod mute;
pub use mute::{ExpiryTime, MuteFilter, StatusMuteDetails};

mod status_filter;
pub use status_filter::{FilterAction, KeywordFilter, StatusFilters};

mod visibility;
pub use visibility::{home_timelineable, public_timelineable, status_visible, VisContext};
