//! Entity types shared across the core.
//!
//! Relations are represented by ID only. Reads that need sub-objects go
//! back through the store, either populated or "barebones" (scalars only).

mod account;
pub use account::{Account, AccountSettings};

mod api;
pub use api::{ApiAccount, ApiConversation, ApiNotification, ApiStatus, FilterResult};

mod block;
pub use block::Block;

mod conversation;
pub use conversation::Conversation;

mod domain_limit;
pub use domain_limit::{
    AccountsPolicy, DomainLimit, FollowsPolicy, MediaPolicy, StatusesPolicy,
};

mod emoji;
pub use emoji::{Emoji, EmojiRefs};

mod follow;
pub use follow::{Follow, FollowRequest};

mod id;
pub use id::Id;

mod interaction;
pub use interaction::{Favourite, InteractionKind, InteractionRequest, StatusInteraction};

mod list;
pub use list::{List, ListEntry, RepliesPolicy};

mod media;
pub use media::{Dimensions, FileMeta, MediaAttachment, MediaType};

mod mute;
pub use mute::{ThreadMute, UserMute};

mod notification;
pub use notification::{Notification, NotificationKind};

mod status;
pub use status::{
    InteractionPolicy, Mention, Poll, PolicyRules, PolicyValue, PopulatedStatus, Status,
    Visibility,
};

mod tag;
pub use tag::Tag;

mod user;
pub use user::User;
