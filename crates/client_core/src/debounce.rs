use std::time::Duration;

use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};

const SEARCH_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Debounces search input. Each `set` schedules publication of that query
/// after the quiet period and aborts the previously scheduled one, so
/// subscribers only ever observe the settled query.
pub struct SearchDebouncer {
    quiet_period: Duration,
    tx: watch::Sender<String>,
    scheduled: Mutex<Option<JoinHandle<()>>>,
}

impl SearchDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        let (tx, _) = watch::channel(String::new());
        Self {
            quiet_period,
            tx,
            scheduled: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }

    pub async fn set(&self, query: impl Into<String>) {
        let query = query.into();
        let tx = self.tx.clone();
        let quiet_period = self.quiet_period;
        // the previous task must be gone before the replacement exists;
        // competing setters serialize on the lock
        let mut scheduled = self.scheduled.lock().await;
        if let Some(previous) = scheduled.take() {
            previous.abort();
        }
        *scheduled = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            tx.send_replace(query);
        }));
    }

    /// Publishes immediately, cancelling any scheduled publication.
    pub async fn apply_now(&self, query: impl Into<String>) {
        if let Some(task) = self.scheduled.lock().await.take() {
            task.abort();
        }
        self.tx.send_replace(query.into());
    }
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(SEARCH_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn publishes_only_the_settled_query() {
        let debouncer = SearchDebouncer::new(Duration::from_millis(25));
        let mut rx = debouncer.subscribe();

        debouncer.set("t").await;
        debouncer.set("t4").await;
        debouncer.set("t42").await;

        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("settled in time")
            .expect("sender alive");
        assert_eq!(rx.borrow().as_str(), "t42");

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!rx.has_changed().expect("sender alive"));
    }

    #[tokio::test]
    async fn apply_now_skips_the_quiet_period() {
        let debouncer = SearchDebouncer::new(Duration::from_secs(30));
        let mut rx = debouncer.subscribe();

        debouncer.set("typo").await;
        debouncer.apply_now("final").await;

        tokio::time::timeout(Duration::from_millis(100), rx.changed())
            .await
            .expect("published immediately")
            .expect("sender alive");
        assert_eq!(rx.borrow().as_str(), "final");
    }

    #[tokio::test]
    async fn concurrent_setters_settle_on_a_final_query() {
        let debouncer = Arc::new(SearchDebouncer::new(Duration::from_millis(10)));
        let rx = debouncer.subscribe();

        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let debouncer = Arc::clone(&debouncer);
                tokio::spawn(async move {
                    for step in 0..25 {
                        debouncer.set(format!("w{writer} s{step}")).await;
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.expect("join");
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        let settled = rx.borrow().clone();
        assert!(
            settled.ends_with("s24"),
            "a non-final query survived: '{settled}'"
        );
    }
}
