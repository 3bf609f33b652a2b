//! Terminal output: progress bars and user-facing notifications.
//!
//! Notifications go through the `MultiProgress` so they interleave
//! cleanly with the bars instead of tearing them.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use vaultsync_core::{Direction, Notifier, ProgressCallback};

const BAR_TEMPLATE: &str = "{prefix:>12} [{bar:40.cyan/blue}] {pos:>3}%";

pub struct Console {
    multi: MultiProgress,
    bars: Arc<Mutex<[Option<ProgressBar>; 3]>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Arc::new(Mutex::new([None, None, None])),
        }
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::new(ConsoleNotifier {
            multi: self.multi.clone(),
        })
    }

    /// Callback that lazily creates one bar per direction and drives
    /// it from progress events.
    pub fn progress_callback(&self) -> ProgressCallback {
        let multi = self.multi.clone();
        let bars = Arc::clone(&self.bars);
        Arc::new(move |event| {
            let Ok(mut bars) = bars.lock() else { return };
            let slot = &mut bars[bar_index(event.direction)];
            let bar = slot.get_or_insert_with(|| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(
                    ProgressStyle::with_template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar.set_prefix(event.direction.to_string());
                bar
            });
            bar.set_position(u64::from(event.percentage));
            if event.percentage == 100 {
                bar.finish();
            }
        })
    }

    /// Finish any bars still in flight (a failed run leaves them
    /// short of 100%).
    pub fn finish(&self) {
        if let Ok(bars) = self.bars.lock() {
            for bar in bars.iter().flatten() {
                if !bar.is_finished() {
                    bar.abandon();
                }
            }
        }
    }
}

fn bar_index(direction: Direction) -> usize {
    match direction {
        Direction::Pull => 0,
        Direction::Push => 1,
        Direction::ForcedPush => 2,
    }
}

struct ConsoleNotifier {
    multi: MultiProgress,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        let _ = self.multi.println(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultsync_core::ProgressEvent;

    #[test]
    fn callback_creates_one_bar_per_direction() {
        let console = Console::new();
        let cb = console.progress_callback();

        cb(ProgressEvent {
            direction: Direction::Pull,
            percentage: 40,
        });
        cb(ProgressEvent {
            direction: Direction::Pull,
            percentage: 100,
        });
        cb(ProgressEvent {
            direction: Direction::Push,
            percentage: 10,
        });

        let bars = console.bars.lock().unwrap();
        assert!(bars[0].as_ref().unwrap().is_finished());
        assert_eq!(bars[1].as_ref().unwrap().position(), 10);
        assert!(bars[2].is_none());
    }
}
