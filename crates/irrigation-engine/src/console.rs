//! Cycle observer that prints zone status to stdout.

use irrigation_core::cycle::CycleObserver;
use irrigation_core::report;
use irrigation_types::StoredReading;

/// Prints the status and decision lines for each recorded reading.
///
/// The decision line is printed before the pump starts, so an operator
/// watching the terminal sees `Watering now...` for the whole hold.
pub struct ConsoleObserver {
    color: bool,
}

impl ConsoleObserver {
    /// Create an observer; `color` enables ANSI label highlighting.
    pub const fn new(color: bool) -> Self {
        Self { color }
    }
}

impl CycleObserver for ConsoleObserver {
    fn on_recorded(&mut self, stored: &StoredReading) {
        println!("{}", report::status_line(&stored.reading, self.color));
        println!("{}", report::decision_line(&stored.reading, self.color));
    }
}
