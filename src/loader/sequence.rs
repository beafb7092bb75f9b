//! Last-writer-wins ordering for overlapping loads.
//!
//! Rapid filter changes issue loads that can settle out of order. Every query
//! takes a [`Ticket`] with a strictly increasing number; only the result of
//! the latest ticket is applied, and older in-flight loads can bail out as
//! soon as they are superseded.

use std::sync::Arc;

use tokio::sync::watch;

/// A value tagged with the sequence number of the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequenced<T> {
    pub seq: u64,
    pub value: T,
}

/// Issues sequence numbers and tracks the latest one.
#[derive(Clone, Debug)]
pub struct QuerySequencer {
    latest: Arc<watch::Sender<u64>>,
}

impl QuerySequencer {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            latest: Arc::new(tx),
        }
    }

    /// Issue the next ticket, superseding every earlier one.
    pub fn issue(&self) -> Ticket {
        let mut seq = 0;
        self.latest.send_modify(|latest| {
            *latest += 1;
            seq = *latest;
        });
        Ticket {
            seq,
            latest: self.latest.subscribe(),
        }
    }

    pub fn latest(&self) -> u64 {
        *self.latest.borrow()
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        self.latest() == seq
    }

    /// Unwrap a result only if it answers the most recent query.
    pub fn accept<T>(&self, result: Sequenced<T>) -> Option<T> {
        if self.is_latest(result.seq) {
            Some(result.value)
        } else {
            log::debug!(
                "Dropping stale result #{} (latest is #{})",
                result.seq,
                self.latest()
            );
            None
        }
    }
}

impl Default for QuerySequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one issued query.
#[derive(Debug)]
pub struct Ticket {
    seq: u64,
    latest: watch::Receiver<u64>,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_current(&self) -> bool {
        *self.latest.borrow() == self.seq
    }

    pub fn stamp<T>(&self, value: T) -> Sequenced<T> {
        Sequenced {
            seq: self.seq,
            value,
        }
    }

    /// Resolves once a newer ticket has been issued.
    ///
    /// Never resolves if the sequencer is dropped first.
    pub async fn superseded(&mut self) {
        loop {
            if *self.latest.borrow_and_update() != self.seq {
                return;
            }
            if self.latest.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tickets_are_strictly_increasing() {
        let sequencer = QuerySequencer::new();
        let a = sequencer.issue();
        let b = sequencer.issue();
        assert!(b.seq() > a.seq());
        assert!(!a.is_current());
        assert!(b.is_current());
    }

    #[test]
    fn out_of_order_results_keep_the_newest() {
        let sequencer = QuerySequencer::new();
        let a = sequencer.issue();
        let ab = sequencer.issue();

        // "ab" settles first, then the slower "a" response arrives.
        let mut displayed = None;
        for result in [ab.stamp("ab items"), a.stamp("a items")] {
            if let Some(items) = sequencer.accept(result) {
                displayed = Some(items);
            }
        }
        assert_eq!(displayed, Some("ab items"));
    }

    #[test]
    fn clones_share_the_counter() {
        let sequencer = QuerySequencer::new();
        let other = sequencer.clone();
        let first = sequencer.issue();
        let second = other.issue();
        assert_eq!(second.seq(), first.seq() + 1);
        assert!(sequencer.is_latest(second.seq()));
    }

    #[tokio::test]
    async fn superseded_wakes_on_newer_ticket() {
        let sequencer = QuerySequencer::new();
        let mut first = sequencer.issue();

        let waiter = tokio::spawn(async move {
            first.superseded().await;
            first.seq()
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        sequencer.issue();

        let seq = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seq, 1);
    }

    #[tokio::test]
    async fn current_ticket_is_not_superseded() {
        let sequencer = QuerySequencer::new();
        let mut ticket = sequencer.issue();
        let waited =
            tokio::time::timeout(Duration::from_millis(50), ticket.superseded()).await;
        assert!(waited.is_err());
    }
}
