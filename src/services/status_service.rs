use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::AppResult,
    models::OrderStatus,
    state::AppState,
};

/// Transitions walked by one sweep, ordered from the end of the flow so an
/// order moved by an earlier batch can never match a later one — each
/// eligible order advances exactly one step per invocation. The terminal
/// states never appear on the left, so `delivered` and `cancelled` orders
/// are untouched.
const SWEEP_TRANSITIONS: [(OrderStatus, OrderStatus); 3] = [
    (OrderStatus::Enroute, OrderStatus::Delivered),
    (OrderStatus::Preparing, OrderStatus::Enroute),
    (OrderStatus::Processing, OrderStatus::Preparing),
];

/// Advances every in-flight order one step along the delivery flow.
/// Returns how many orders moved.
pub async fn advance_all(state: &AppState) -> AppResult<u64> {
    let mut advanced = 0;
    for (from, to) in SWEEP_TRANSITIONS {
        let result = Orders::update_many()
            .col_expr(OrderCol::Status, Expr::value(to.as_str()))
            .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
            .filter(OrderCol::Status.eq(from.as_str()))
            .exec(&state.orm)
            .await?;
        advanced += result.rows_affected;
    }
    Ok(advanced)
}

/// Background task ticking `advance_all` on a fixed interval. Ticks are
/// handled sequentially in a single task and missed ticks are skipped, so
/// a slow sweep never overlaps the next one.
pub struct StatusSweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StatusSweeper {
    pub fn start(state: AppState, every: Duration) -> Self {
        let (shutdown, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; consume it so the
            // first sweep runs one full interval after startup.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match advance_all(&state).await {
                            Ok(0) => {}
                            Ok(advanced) => {
                                tracing::info!(advanced, "order status sweep");
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "order status sweep failed");
                            }
                        }
                    }
                    _ = rx.changed() => break,
                }
            }
        });

        Self { shutdown, handle }
    }

    pub fn stop(self) {
        if self.shutdown.send(true).is_err() {
            self.handle.abort();
        }
    }
}
