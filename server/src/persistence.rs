use rocket::{
    fairing::AdHoc,
    tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use shared::Comparison;
use tracing::{error, info, instrument};

use crate::db::{BattleStore, Store};

/// Hands finished comparisons to a background worker so that
/// responses never wait on storage.
#[derive(Clone, Debug)]
pub struct PersistenceQueue {
    sender: UnboundedSender<Comparison>,
}

#[derive(Debug)]
pub struct PersistenceWorker {
    receiver: UnboundedReceiver<Comparison>,
}

impl PersistenceQueue {
    pub fn new() -> (Self, PersistenceWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, PersistenceWorker { receiver })
    }

    pub fn submit(&self, comparison: Comparison) {
        if let Err(e) = self.sender.send(comparison) {
            error!(
                "Persistence worker stopped, dropping comparison {}",
                e.0.comparison_id
            );
        }
    }
}

impl PersistenceWorker {
    pub async fn run(mut self, store: Store) {
        info!("Persistence worker started");
        while let Some(comparison) = self.receiver.recv().await {
            let store = store.clone();
            rocket::tokio::spawn(async move {
                persist(store.as_ref(), &comparison).await;
            });
        }
        info!("Persistence worker stopped");
    }
}

/// Saves the comparison, then folds both results into the leaderboard.
/// Failures are logged and dropped.
#[instrument(skip_all, fields(id = %comparison.comparison_id))]
pub async fn persist(store: &dyn BattleStore, comparison: &Comparison) {
    if let Err(e) = store.save_comparison(comparison).await {
        error!("Failed to save comparison: {e:#}");
    }

    let [first, second] = comparison.participants();
    let (first_result, second_result) = futures::join!(
        store.record_result(
            first.username(),
            first.score.total,
            comparison.is_winner(first)
        ),
        store.record_result(
            second.username(),
            second.score.total,
            comparison.is_winner(second)
        )
    );

    for (bundle, result) in [(first, first_result), (second, second_result)] {
        if let Err(e) = result {
            error!(
                "Failed to update leaderboard for {}: {e:#}",
                bundle.username()
            );
        }
    }
}

pub fn stage(worker: PersistenceWorker) -> AdHoc {
    AdHoc::on_liftoff("Persistence worker", move |rocket| {
        Box::pin(async move {
            match rocket.state::<Store>() {
                Some(store) => {
                    rocket::tokio::spawn(worker.run(store.clone()));
                }
                None => error!("No battle store is managed, comparisons will not be saved"),
            }
        })
    })
}
