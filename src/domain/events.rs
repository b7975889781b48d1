use super::benchmark::{Phase, RunId};

/// Lifecycle notifications consumed by the overlay and the JS surface.
#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkEvent {
    PhaseChanged {
        run: RunId,
        from: Phase,
        to: Phase,
    },
    /// Emitted for every rendered frame, warm-up included.
    FrameRendered {
        run: RunId,
        phase: Phase,
        fps: f64,
        cpu_ms: f64,
        gpu_ms: Option<f64>,
        /// Time left in `phase`.
        remaining_ms: f64,
    },
    SampleRecorded {
        run: RunId,
        count: usize,
    },
    RunFinished {
        run: RunId,
        samples: usize,
        stopped_manually: bool,
        exported: bool,
    },
    RunFailed {
        run: RunId,
        reason: String,
    },
}

/// Event dispatcher for publishing events
pub trait EventDispatcher {
    fn publish(&self, event: BenchmarkEvent);
}

/// Synchronous fan-out to registered handlers
#[derive(Default)]
pub struct InMemoryEventDispatcher {
    handlers: Vec<Box<dyn Fn(&BenchmarkEvent)>>,
}

impl InMemoryEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&BenchmarkEvent) + 'static,
    {
        self.handlers.push(Box::new(handler));
    }
}

impl EventDispatcher for InMemoryEventDispatcher {
    fn publish(&self, event: BenchmarkEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn every_subscriber_sees_every_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = InMemoryEventDispatcher::new();
        for _ in 0..2 {
            let seen = seen.clone();
            dispatcher.subscribe(move |event| seen.borrow_mut().push(event.clone()));
        }

        let event = BenchmarkEvent::PhaseChanged { run: RunId(1), from: Phase::Idle, to: Phase::WarmingUp };
        dispatcher.publish(event.clone());

        assert_eq!(*seen.borrow(), vec![event.clone(), event]);
    }
}
