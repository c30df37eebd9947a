//! Elapsed-time monitor.
//!
//! A periodic tick advances every non-delivered order's elapsed time by
//! one minute, evaluates the alert thresholds, and recomputes the
//! progress bar for preparing orders. This is the only place
//! `elapsed_minutes` is mutated; everything else treats it as
//! read-only.
//!
//! Threshold alerts are level-triggered with a per-order dedup latch:
//! the notification fires on the first tick at which the order is past
//! the threshold and never again, even if a tick was skipped while the
//! process was suspended.

use crate::model::{AlertLevel, OrderStatus};
use crate::notify::{Severity, SoundCue};
use crate::KitchenPanel;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A ready order older than this is flagged stale (style only, no
/// notification).
pub const READY_STALE_MINUTES: u32 = 15;
/// Assumed average preparation time the progress bar is scaled against.
pub const AVERAGE_PREP_MINUTES: u32 = 30;
/// The bar never reaches 100 while still preparing.
pub const PROGRESS_CAP_PERCENT: u32 = 98;
/// Once past the average, the bar sits in this band instead.
const LATE_BAND_MIN: u32 = 85;
const LATE_BAND_MAX: u32 = 95;

const CRITICAL_VIBRATION_MS: &[u32] = &[200, 100, 200];

/// Progress percentage for a preparing order at `elapsed` minutes.
///
/// `min(elapsed / average * 100, 98)` up to the average; past it the
/// value is clamped into the 85-95 band so a late order never looks
/// done.
pub fn preparation_progress(elapsed: u32) -> u8 {
    let raw = elapsed.saturating_mul(100) / AVERAGE_PREP_MINUTES;
    let pct = if elapsed > AVERAGE_PREP_MINUTES {
        raw.clamp(LATE_BAND_MIN, LATE_BAND_MAX)
    } else {
        raw.min(PROGRESS_CAP_PERCENT)
    };
    pct as u8
}

/// One monitor pass over the whole snapshot. Persists the snapshot once
/// at the end of the pass.
pub fn tick(panel: &KitchenPanel) {
    let (alert_minutes, critical_minutes) = {
        match panel.prefs.lock() {
            Ok(p) => (p.alert_minutes, p.critical_minutes),
            Err(_) => return,
        }
    };

    // (display label, crossed level) for notifications emitted after the
    // snapshot lock is released.
    let mut crossings: Vec<(String, AlertLevel)> = Vec::new();
    let mut advanced = 0usize;

    panel.store.update_all(&panel.db, |order| {
        if order.status == OrderStatus::Delivered {
            return;
        }
        order.elapsed_minutes += 1;
        advanced += 1;

        match order.status {
            OrderStatus::Ready => {
                if order.elapsed_minutes > READY_STALE_MINUTES {
                    order.alert_level = AlertLevel::Warning;
                }
            }
            OrderStatus::Pending | OrderStatus::Preparing => {
                if order.elapsed_minutes > critical_minutes {
                    order.alert_level = AlertLevel::Critical;
                    if !order.critical_notified {
                        order.critical_notified = true;
                        crossings.push((order.display_label(), AlertLevel::Critical));
                    }
                } else if order.elapsed_minutes > alert_minutes {
                    order.alert_level = AlertLevel::Warning;
                    if !order.alert_notified {
                        order.alert_notified = true;
                        crossings.push((order.display_label(), AlertLevel::Warning));
                    }
                }
            }
            OrderStatus::Delivered => {}
        }

        if order.status == OrderStatus::Preparing {
            order.progress_percent = Some(preparation_progress(order.elapsed_minutes));
        }
    });

    debug!(advanced, crossings = crossings.len(), "monitor tick");

    for (label, level) in crossings {
        match level {
            AlertLevel::Critical => {
                panel.notifier.notify(
                    &format!("Order {label} has been waiting too long"),
                    Severity::Critical,
                );
                if panel.sound_enabled() {
                    panel.notifier.sound(SoundCue::Alarm);
                    panel.notifier.vibrate(CRITICAL_VIBRATION_MS);
                }
            }
            AlertLevel::Warning => {
                // Warning crossings never play a sound.
                panel
                    .notifier
                    .notify(&format!("Order {label} is running late"), Severity::Warning);
            }
            AlertLevel::None => {}
        }
    }
}

/// Spawn the recurring monitor task. The interval is the simulated
/// "minute"; production uses 60s, tests and demos shrink it.
pub fn start_monitor_loop(
    panel: Arc<KitchenPanel>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    panel.monitor_running.store(true, Ordering::SeqCst);
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "elapsed-time monitor started");
        loop {
            tokio::time::sleep(interval).await;
            if !panel.monitor_running.load(Ordering::SeqCst) {
                info!("elapsed-time monitor stopped");
                break;
            }
            tick(&panel);
        }
    })
}

/// Signal the monitor loop to exit after its current sleep.
pub fn stop_monitor_loop(panel: &KitchenPanel) {
    panel.monitor_running.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Order, OrderType};
    use crate::test_support::panel_with;

    fn order_with_status(id: &str, status: OrderStatus, elapsed: u32) -> Order {
        let mut o = Order::new(id, OrderType::DineIn);
        o.status = status;
        o.elapsed_minutes = elapsed;
        o
    }

    #[test]
    fn tick_advances_only_non_delivered_orders() {
        let (panel, _, _) = panel_with(vec![
            order_with_status("a", OrderStatus::Pending, 4),
            order_with_status("b", OrderStatus::Delivered, 30),
        ]);
        tick(&panel);
        assert_eq!(panel.store.get("a").unwrap().elapsed_minutes, 5);
        assert_eq!(panel.store.get("b").unwrap().elapsed_minutes, 30);
    }

    #[test]
    fn warning_fires_exactly_once_at_first_crossing() {
        let (panel, notifier, _) = panel_with(vec![order_with_status(
            "42",
            OrderStatus::Pending,
            0,
        )]);
        for _ in 0..21 {
            tick(&panel);
        }
        let order = panel.store.get("42").unwrap();
        assert_eq!(order.elapsed_minutes, 21);
        assert_eq!(order.alert_level, AlertLevel::Warning);

        let warnings: Vec<_> = notifier
            .active()
            .into_iter()
            .filter(|n| n.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        // Warnings carry no sound.
        assert!(notifier.played_cues().is_empty());

        tick(&panel);
        let warnings_after: Vec<_> = notifier
            .active()
            .into_iter()
            .filter(|n| n.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings_after.len(), 1);
    }

    #[test]
    fn critical_crossing_fires_once_with_alarm() {
        let (panel, notifier, _) = panel_with(vec![order_with_status(
            "9",
            OrderStatus::Preparing,
            39,
        )]);
        // 39 -> 40 -> 41: crosses criticalTime=40 exactly once.
        tick(&panel);
        tick(&panel);
        let order = panel.store.get("9").unwrap();
        assert_eq!(order.elapsed_minutes, 41);
        assert_eq!(order.alert_level, AlertLevel::Critical);

        let criticals = notifier
            .active()
            .into_iter()
            .filter(|n| n.severity == Severity::Critical)
            .count();
        assert_eq!(criticals, 1);
        assert_eq!(notifier.played_cues(), vec![SoundCue::Alarm]);

        // 41 -> 42 must not re-fire.
        tick(&panel);
        let criticals_after = notifier
            .active()
            .into_iter()
            .filter(|n| n.severity == Severity::Critical)
            .count();
        assert_eq!(criticals_after, 1);
        assert_eq!(notifier.played_cues(), vec![SoundCue::Alarm]);
    }

    #[test]
    fn skipped_ticks_still_alert_once() {
        // Level trigger: an order restored already past the threshold
        // (e.g. tab backgrounded across the crossing) alerts on the next
        // tick instead of never.
        let (panel, notifier, _) = panel_with(vec![order_with_status(
            "9",
            OrderStatus::Pending,
            55,
        )]);
        tick(&panel);
        let criticals = notifier
            .active()
            .into_iter()
            .filter(|n| n.severity == Severity::Critical)
            .count();
        assert_eq!(criticals, 1);
    }

    #[test]
    fn stale_ready_order_gets_style_flag_without_notification() {
        let (panel, notifier, _) = panel_with(vec![order_with_status(
            "r",
            OrderStatus::Ready,
            15,
        )]);
        tick(&panel);
        let order = panel.store.get("r").unwrap();
        assert_eq!(order.alert_level, AlertLevel::Warning);
        assert!(notifier.active().is_empty());
    }

    #[test]
    fn preparing_progress_is_capped_and_banded() {
        assert_eq!(preparation_progress(3), 10);
        assert_eq!(preparation_progress(15), 50);
        assert_eq!(preparation_progress(29), 96);
        // At the assumed average the raw value would be 100; capped.
        assert_eq!(preparation_progress(30), 98);
        // Past the average the bar drops into the 85-95 band.
        assert_eq!(preparation_progress(31), 95);
        assert_eq!(preparation_progress(90), 95);
    }

    #[test]
    fn tick_recomputes_progress_for_preparing_orders() {
        let (panel, _, _) = panel_with(vec![order_with_status(
            "p",
            OrderStatus::Preparing,
            14,
        )]);
        tick(&panel);
        assert_eq!(
            panel.store.get("p").unwrap().progress_percent,
            Some(preparation_progress(15))
        );
    }

    #[test]
    fn tick_persists_the_snapshot() {
        let (panel, _, _) = panel_with(vec![order_with_status("a", OrderStatus::Pending, 0)]);
        tick(&panel);
        let restored = crate::store::SnapshotStore::load(&panel.db, Vec::new());
        assert_eq!(restored.get("a").unwrap().elapsed_minutes, 1);
    }

    #[test]
    fn critical_sound_respects_preference() {
        let (panel, notifier, _) = panel_with(vec![order_with_status(
            "9",
            OrderStatus::Pending,
            45,
        )]);
        panel.prefs.lock().unwrap().set_sound_enabled(&panel.db, false);
        tick(&panel);
        let criticals = notifier
            .active()
            .into_iter()
            .filter(|n| n.severity == Severity::Critical)
            .count();
        assert_eq!(criticals, 1);
        assert!(notifier.played_cues().is_empty());
    }
}
