//! Stock ledger arithmetic.
//!
//! The item's `current_stock` is a cached projection of its event log.
//! Every mutation of the log goes through these functions so the cache
//! and the ledger move together: appends apply a delta, deletes reverse
//! one, and edits replay the item's whole timeline (which both reverses
//! the old delta and refreshes the `resulting_stock` snapshot of every
//! subsequent event).
//!
//! Consumption clamps at zero; a household can't use supplies it does not
//! have, and the stored data contains logs that would otherwise drive the
//! counter negative. Returns of reusable items do not move the item
//! counter at all; they only settle the actor's held balance.

use uuid::Uuid;

use crate::models::{EventAction, StockEvent};

/// Stock level after applying one event to `stock`.
pub fn apply_event(stock: i64, action: EventAction, quantity: u32) -> i64 {
    match action {
        EventAction::Consumed => (stock - i64::from(quantity)).max(0),
        EventAction::Restocked => stock + i64::from(quantity),
        EventAction::Returned => stock,
    }
}

/// Stock level after reversing one event, used when a ledger entry is
/// deleted. The reversal is invariant-critical: removing an event without
/// undoing its delta desynchronizes the counter from the ledger.
pub fn reverse_event(stock: i64, action: EventAction, quantity: u32) -> i64 {
    match action {
        EventAction::Consumed => stock + i64::from(quantity),
        EventAction::Restocked => (stock - i64::from(quantity)).max(0),
        EventAction::Returned => stock,
    }
}

/// Resulting stock snapshot for one event in a replayed timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedStock {
    pub event_id: Uuid,
    pub resulting_stock: i64,
}

/// Outcome of replaying an item's full timeline from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub snapshots: Vec<ReplayedStock>,
    pub final_stock: i64,
}

/// Replays an item's events in chronological order, starting from zero
/// stock, and returns the per-event `resulting_stock` snapshots plus the
/// final stock level.
///
/// `events` must already be filtered to a single item; this function sorts
/// them by `occurred_at` (stable, so same-instant events keep their input
/// order).
pub fn replay_timeline(events: &[StockEvent]) -> Replay {
    let mut ordered: Vec<&StockEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.occurred_at);

    let mut running = 0i64;
    let mut snapshots = Vec::with_capacity(ordered.len());
    for event in ordered {
        running = apply_event(running, event.action, event.quantity);
        snapshots.push(ReplayedStock {
            event_id: event.id,
            resulting_stock: running,
        });
    }

    Replay {
        snapshots,
        final_stock: running,
    }
}

/// Net change a ledger implies, ignoring clamping: restocked minus
/// consumed. Returns do not contribute.
pub fn net_change(events: &[StockEvent]) -> i64 {
    events
        .iter()
        .map(|e| match e.action {
            EventAction::Consumed => -i64::from(e.quantity),
            EventAction::Restocked => i64::from(e.quantity),
            EventAction::Returned => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn event(action: EventAction, quantity: u32, minutes_ago: i64) -> StockEvent {
        StockEvent::new(
            Uuid::new_v4(),
            "Alex Johnson",
            Uuid::new_v4(),
            "Paper Towels",
            action,
            quantity,
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    #[test]
    fn consumption_clamps_at_zero() {
        assert_eq!(apply_event(3, EventAction::Consumed, 5), 0);
        assert_eq!(apply_event(5, EventAction::Consumed, 3), 2);
    }

    #[test]
    fn returns_leave_the_counter_alone() {
        assert_eq!(apply_event(7, EventAction::Returned, 2), 7);
        assert_eq!(reverse_event(7, EventAction::Returned, 2), 7);
    }

    #[test]
    fn reversal_undoes_application() {
        for action in [EventAction::Consumed, EventAction::Restocked] {
            let applied = apply_event(20, action, 6);
            assert_eq!(reverse_event(applied, action, 6), 20);
        }
    }

    #[test]
    fn replay_tracks_running_stock() {
        let item_id = Uuid::new_v4();
        let mut restock = event(EventAction::Restocked, 10, 60);
        restock.item_id = item_id;
        let mut consume = event(EventAction::Consumed, 4, 30);
        consume.item_id = item_id;

        let replay = replay_timeline(&[consume.clone(), restock.clone()]);
        assert_eq!(replay.final_stock, 6);
        // chronological: the restock happened first
        assert_eq!(replay.snapshots[0].event_id, restock.id);
        assert_eq!(replay.snapshots[0].resulting_stock, 10);
        assert_eq!(replay.snapshots[1].event_id, consume.id);
        assert_eq!(replay.snapshots[1].resulting_stock, 6);
    }

    #[test]
    fn net_change_is_restocked_minus_consumed() {
        let events = vec![
            event(EventAction::Consumed, 2, 50),
            event(EventAction::Restocked, 10, 40),
            event(EventAction::Returned, 1, 30),
        ];
        assert_eq!(net_change(&events), 8);
    }
}
