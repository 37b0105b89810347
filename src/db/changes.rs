use tokio::sync::broadcast;
use uuid::Uuid;

const FEED_CAPACITY: usize = 256;

/// Collections that publish row changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Profiles,
    UserPreferences,
    Watchlist,
    WatchedMovies,
    MovieReviews,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A committed write to one user's rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowChange {
    pub table: Table,
    pub user_id: Uuid,
    pub kind: ChangeKind,
}

/// Fan-out of row changes to live subscribers
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<RowChange>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Publishing with no subscribers is not an error
    pub fn publish(&self, table: Table, user_id: Uuid, kind: ChangeKind) {
        let _ = self.tx.send(RowChange {
            table,
            user_id,
            kind,
        });
    }

    /// Subscribes to changes of one table for one user
    pub fn subscribe(&self, table: Table, user_id: Uuid) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            table,
            user_id,
        }
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<RowChange>,
    table: Table,
    user_id: Uuid,
}

impl Subscription {
    /// Waits for the next matching change; `None` once the feed is gone
    ///
    /// A subscriber that fell behind receives one synthetic `Update` so it
    /// re-reads current state instead of replaying what it missed.
    pub async fn next(&mut self) -> Option<RowChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.table == self.table && change.user_id == self.user_id => {
                    return Some(change)
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, table = ?self.table, "Change subscriber lagged");
                    return Some(RowChange {
                        table: self.table,
                        user_id: self.user_id,
                        kind: ChangeKind::Update,
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
