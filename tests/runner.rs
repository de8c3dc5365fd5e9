// ABOUTME: Integration tests for the step runner.
// ABOUTME: Covers halting, cancellation, and reverse-order cleanup.

use std::sync::Arc;

use async_trait::async_trait;
use labforge::pipeline::{Action, Disposition, Runner, StateBag, Step, StepError, keys};
use parking_lot::Mutex;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Run(usize),
    Cleanup(usize),
}

type Log = Arc<Mutex<Vec<Event>>>;

struct Recorded {
    index: usize,
    action: Action,
    cancel_during_run: Option<CancellationToken>,
    log: Log,
}

#[async_trait]
impl Step for Recorded {
    fn name(&self) -> &'static str {
        "recorded"
    }

    async fn run(&self, _cancel: &CancellationToken, _state: &mut StateBag) -> Action {
        self.log.lock().push(Event::Run(self.index));
        if let Some(token) = &self.cancel_during_run {
            token.cancel();
        }
        self.action
    }

    async fn cleanup(&self, _state: &mut StateBag) -> Result<(), StepError> {
        self.log.lock().push(Event::Cleanup(self.index));
        Ok(())
    }
}

fn steps(count: usize, halt_at: Option<usize>, log: &Log) -> Vec<Box<dyn Step>> {
    (0..count)
        .map(|index| {
            let action = if halt_at == Some(index) {
                Action::Halt
            } else {
                Action::Continue
            };
            Box::new(Recorded {
                index,
                action,
                cancel_during_run: None,
                log: Arc::clone(log),
            }) as Box<dyn Step>
        })
        .collect()
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    /// Test: cleanup visits exactly the started steps, in reverse start order.
    #[test]
    fn cleanup_reverses_run_order(count in 0usize..8, halt in proptest::option::of(0usize..8)) {
        let halt_at = halt.filter(|h| *h < count);
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let runner = Runner::new(steps(count, halt_at, &log));
        let mut state = StateBag::new();

        let outcome = block_on(runner.run(&CancellationToken::new(), &mut state));

        let ran = halt_at.map_or(count, |h| h + 1);
        let expected: Vec<Event> = (0..ran)
            .map(Event::Run)
            .chain((0..ran).rev().map(Event::Cleanup))
            .collect();
        prop_assert_eq!(log.lock().clone(), expected);
        prop_assert_eq!(outcome.started.len(), ran);

        let disposition = if halt_at.is_some() {
            Disposition::Halted
        } else {
            Disposition::Completed
        };
        prop_assert_eq!(outcome.disposition, disposition);
        prop_assert_eq!(state.get(keys::DISPOSITION).ok(), Some(&disposition));
    }
}

mod halting {
    use super::*;

    /// Test: a halting step stops the walk and later steps never run.
    #[tokio::test]
    async fn halt_skips_remaining_steps() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let runner = Runner::new(steps(4, Some(1), &log));
        let mut state = StateBag::new();

        let outcome = runner.run(&CancellationToken::new(), &mut state).await;

        assert_eq!(outcome.disposition, Disposition::Halted);
        assert_eq!(
            *log.lock(),
            vec![
                Event::Run(0),
                Event::Run(1),
                Event::Cleanup(1),
                Event::Cleanup(0)
            ]
        );
    }
}

mod cancellation {
    use super::*;

    /// Test: cancelling during step k-1 means step k never starts.
    #[tokio::test]
    async fn cancel_before_step_k() {
        for k in 1..4 {
            let log: Log = Arc::new(Mutex::new(Vec::new()));
            let cancel = CancellationToken::new();
            let runner = Runner::new(
                (0..4)
                    .map(|index| {
                        Box::new(Recorded {
                            index,
                            action: Action::Continue,
                            cancel_during_run: (index == k - 1).then(|| cancel.clone()),
                            log: Arc::clone(&log),
                        }) as Box<dyn Step>
                    })
                    .collect(),
            );
            let mut state = StateBag::new();

            let outcome = runner.run(&cancel, &mut state).await;

            assert_eq!(outcome.disposition, Disposition::Cancelled);
            assert_eq!(outcome.started.len(), k);
            let expected: Vec<Event> = (0..k)
                .map(Event::Run)
                .chain((0..k).rev().map(Event::Cleanup))
                .collect();
            assert_eq!(*log.lock(), expected);
        }
    }

    /// Test: an already cancelled token runs nothing and cleans nothing.
    #[tokio::test]
    async fn cancelled_before_start() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let runner = Runner::new(steps(3, None, &log));
        let mut state = StateBag::new();

        let outcome = runner.run(&cancel, &mut state).await;

        assert_eq!(outcome.disposition, Disposition::Cancelled);
        assert!(outcome.started.is_empty());
        assert!(log.lock().is_empty());
        assert_eq!(state.get(keys::DISPOSITION).ok(), Some(&Disposition::Cancelled));
    }
}
