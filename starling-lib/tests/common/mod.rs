//! Shared fixtures for integration tests. Each test binary is its own
//! process, so GLOBALS is initialised once per file; tests inside a file
//! use unique accounts and statuses to stay out of each other's way.

#![allow(dead_code)]

use starling_lib::model::{
    Account, Dimensions, FileMeta, Id, MediaAttachment, MediaType, Mention, Status, User,
    Visibility,
};
use starling_lib::store::{MemStore, Store};
use starling_lib::stream::CollectingStream;
use starling_lib::transport::{MockTransport, MockTransportController};
use starling_lib::{RunState, GLOBALS};
use std::sync::{Arc, OnceLock};

pub struct TestWorld {
    pub store: Arc<MemStore>,
    pub stream: Arc<CollectingStream>,
    pub transport: Arc<MockTransport>,
    _media_dir: tempfile::TempDir,
}

static WORLD: OnceLock<TestWorld> = OnceLock::new();

pub fn world() -> &'static TestWorld {
    WORLD.get_or_init(|| {
        let store = Arc::new(MemStore::new());
        let stream = Arc::new(CollectingStream::new());
        let transport = Arc::new(MockTransport::new());

        GLOBALS.attach_store(store.clone());
        GLOBALS.attach_streams(stream.clone());
        GLOBALS.attach_transport(Arc::new(MockTransportController(transport.clone())));

        let media_dir = tempfile::tempdir().expect("tempdir for media");
        GLOBALS.settings.write().media_base_dir = media_dir.path().to_path_buf();

        let _ = GLOBALS.write_runstate.send(RunState::Online);

        TestWorld {
            store,
            stream,
            transport,
            _media_dir: media_dir,
        }
    })
}

pub fn store() -> &'static Arc<MemStore> {
    &world().store
}

pub fn stream() -> &'static Arc<CollectingStream> {
    &world().stream
}

pub fn transport() -> &'static Arc<MockTransport> {
    &world().transport
}

/// A local account with its user row, enumerated by fan-out.
pub async fn local_user(username: &str) -> Account {
    let account = Account::new_local(
        username,
        &format!("https://localhost/users/{username}"),
    );
    store().put_account(&account).await.unwrap();
    let user = User {
        id: Id::gen(),
        account_id: account.id,
        email: None,
        locale: "en".to_owned(),
        created_at: chrono::Utc::now(),
    };
    store().put_user(&user).await.unwrap();
    account
}

pub async fn remote_account(username: &str, domain: &str) -> Account {
    let account = Account::new_remote(
        username,
        domain,
        &format!("https://{domain}/users/{username}"),
    );
    store().put_account(&account).await.unwrap();
    account
}

pub async fn status_by(author: &Account, visibility: Visibility, content: &str) -> Status {
    let mut status = Status::new_local(
        author.id,
        &format!("https://localhost/statuses/{}", Id::gen()),
        content,
    );
    status.visibility = visibility;
    status.local = author.is_local();
    if !author.is_local() {
        status.uri = format!("https://{}/statuses/{}", author.domain, status.id);
        status.federated = true;
    }
    store().put_status(&status).await.unwrap();
    status
}

pub async fn reply_to(author: &Account, parent: &Status, content: &str) -> Status {
    let mut status = Status::new_local(
        author.id,
        &format!("https://localhost/statuses/{}", Id::gen()),
        content,
    );
    status.visibility = parent.visibility;
    status.local = author.is_local();
    status.in_reply_to_uri = parent.uri.clone();
    status.in_reply_to_id = Some(parent.id);
    status.in_reply_to_account_id = Some(parent.account_id);
    status.thread_id = parent.thread_id;
    store().put_status(&status).await.unwrap();
    status
}

pub async fn mention(status: &mut Status, target: &Account) {
    status.mentions.push(Mention {
        id: Id::gen(),
        target_account_id: target.id,
        target_account_uri: target.uri.clone(),
    });
    store().update_status(status).await.unwrap();
}

pub async fn follow(source: &Account, target: &Account) -> starling_lib::model::Follow {
    let follow = starling_lib::model::Follow::new(
        source.id,
        target.id,
        &format!("https://localhost/follows/{}", Id::gen()),
    );
    store().put_follow(&follow).await.unwrap();
    follow
}

/// A cached remote attachment with real bytes on disk.
pub async fn cached_attachment(
    owner: &Account,
    status_id: Option<Id>,
    fetched_days_ago: i64,
) -> MediaAttachment {
    let id = Id::gen();
    let attachment = MediaAttachment {
        id,
        account_id: owner.id,
        status_id,
        remote_url: Some(format!("https://{}/media/{id}.png", owner.domain)),
        storage_path: format!("attachment/original/{id}.png"),
        thumbnail_path: format!("attachment/small/{id}.png"),
        content_type: "image/png".to_owned(),
        file_size: 4,
        file_meta: FileMeta {
            original: Dimensions {
                width: 2,
                height: 2,
            },
            small: None,
        },
        description: String::new(),
        media_type: MediaType::Image,
        cached: true,
        created_at: chrono::Utc::now() - chrono::TimeDelta::days(fetched_days_ago),
        fetched_at: Some(chrono::Utc::now() - chrono::TimeDelta::days(fetched_days_ago)),
    };
    starling_lib::blobs::put(&attachment.storage_path, b"png!")
        .await
        .unwrap();
    starling_lib::blobs::put(&attachment.thumbnail_path, b"png!")
        .await
        .unwrap();
    store().put_attachment(&attachment).await.unwrap();
    attachment
}
