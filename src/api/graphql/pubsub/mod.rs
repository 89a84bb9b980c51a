use async_graphql::Context;
use futures_util::stream::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::warn;

use crate::entity::{Post, Thread};

const CHANNEL_CAPACITY: usize = 256;

/// In-process fan-out of forum changes to subscription streams.
#[derive(Clone)]
pub struct ForumEvents {
    posts_tx: broadcast::Sender<Post>,
    threads_tx: broadcast::Sender<Thread>,
}

impl Default for ForumEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ForumEvents {
    #[must_use]
    pub fn new() -> Self {
        let (posts_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (threads_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            posts_tx,
            threads_tx,
        }
    }

    /// Published after the post is committed. No subscribers is not an error.
    pub fn publish_post(&self, post: Post) {
        let _ = self.posts_tx.send(post);
    }

    pub fn publish_thread(&self, thread: Thread) {
        let _ = self.threads_tx.send(thread);
    }

    /// New posts in `thread_id`.
    pub fn posts_in(&self, thread_id: i32) -> impl Stream<Item = Post> + Send + 'static {
        filtered(self.posts_tx.subscribe(), move |post: &Post| {
            post.thread_id == thread_id
        })
    }

    /// Created or changed threads, optionally restricted to one category.
    pub fn threads_in(
        &self,
        category_id: Option<i32>,
    ) -> impl Stream<Item = Thread> + Send + 'static {
        filtered(self.threads_tx.subscribe(), move |thread: &Thread| {
            category_id.map_or(true, |id| thread.category_id == id)
        })
    }

    #[must_use]
    pub fn from_context<'a>(ctx: &'a Context<'_>) -> Option<&'a Self> {
        ctx.data_opt::<Self>()
    }
}

// Lagging receivers skip what they missed and keep going; the stream ends
// when the hub is dropped.
fn filtered<T, F>(rx: broadcast::Receiver<T>, keep: F) -> impl Stream<Item = T> + Send + 'static
where
    T: Clone + Send + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    BroadcastStream::new(rx).filter_map(move |item| {
        let out = match item {
            Ok(value) if keep(&value) => Some(value),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("Subscriber lagged behind, skipped {} events", skipped);
                None
            }
        };
        futures_util::future::ready(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn post(id: i32, thread_id: i32) -> Post {
        Post {
            id,
            thread_id,
            author_id: 1,
            body: format!("post {id}"),
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn thread(id: i32, category_id: i32) -> Thread {
        Thread {
            id,
            category_id,
            author_id: 1,
            title: format!("thread {id}"),
            locked: false,
            pinned: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_posts_filtered_by_thread() {
        let events = ForumEvents::new();
        let mut stream = Box::pin(events.posts_in(3));

        events.publish_post(post(1, 2));
        events.publish_post(post(2, 3));

        let next = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_threads_unfiltered_without_category() {
        let events = ForumEvents::new();
        let mut all = Box::pin(events.threads_in(None));
        let mut only_five = Box::pin(events.threads_in(Some(5)));

        events.publish_thread(thread(1, 4));
        events.publish_thread(thread(2, 5));

        assert_eq!(all.next().await.unwrap().id, 1);
        assert_eq!(all.next().await.unwrap().id, 2);
        assert_eq!(only_five.next().await.unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_stream_ends_when_hub_dropped() {
        let events = ForumEvents::new();
        let mut stream = Box::pin(events.posts_in(1));
        drop(events);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let events = ForumEvents::default();
        events.publish_post(post(1, 1));
        events.publish_thread(thread(1, 1));
    }
}
