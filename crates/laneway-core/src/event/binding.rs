// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A single channel's subscriber list and pending-payload queue.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use crate::event::types::{Channel, SenderId};

type Callback<P> = Box<dyn Fn(&P, SenderId) + Send + Sync>;

/// Type-erased handle to a [`Binding<P>`] for a concrete, but hidden, `P`.
///
/// `Binder` stores these behind `Box<dyn ErasedBinding>` and downcasts back
/// to the concrete `Binding<P>` at connect/emit sites where `P` is known from
/// the caller's generic parameter. A failed downcast is the `IncompatibleType`
/// condition from the error taxonomy.
pub trait ErasedBinding: Any + Send + Sync {
    /// Drain the queue, invoking every callback once per queued payload.
    fn call(&self);

    /// The channel this binding was created for.
    fn channel(&self) -> Channel;

    /// `type_name` of the payload type this binding was established with,
    /// used to build a useful `IncompatibleType` message.
    fn payload_type_name(&self) -> &'static str;

    /// Borrow as `dyn Any` so callers can `downcast_ref::<Binding<P>>()`.
    fn as_any(&self) -> &dyn Any;
}

/// Queue payloads of exactly one compile-time type `P` for one channel, and
/// fan them out to all connected callbacks on [`call`](Binding::call).
pub struct Binding<P> {
    channel: Channel,
    callbacks: Mutex<Vec<Callback<P>>>,
    queue: Mutex<VecDeque<(P, SenderId)>>,
}

impl<P: Send + 'static> Binding<P> {
    /// Create an empty binding for `channel`.
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            callbacks: Mutex::new(Vec::new()),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Append `callback` to the subscriber list.
    ///
    /// All connects must happen before the owning Lane starts ticking, or on
    /// the owning Lane's own thread; concurrent mutation during `call` is a
    /// contract violation, not something this type guards against.
    pub fn connect<F>(&self, callback: F)
    where
        F: Fn(&P, SenderId) + Send + Sync + 'static,
    {
        self.callbacks
            .lock()
            .expect("binding callback list poisoned")
            .push(Box::new(callback));
    }

    /// Push `(payload, sender)` onto the queue. Safe to call from any thread.
    pub fn emit(&self, payload: P, sender: SenderId) {
        self.queue
            .lock()
            .expect("binding queue poisoned")
            .push_back((payload, sender));
    }

    /// Number of payloads currently queued, for diagnostics and tests.
    pub fn pending_len(&self) -> usize {
        self.queue.lock().expect("binding queue poisoned").len()
    }
}

impl<P: Send + 'static> ErasedBinding for Binding<P> {
    fn call(&self) {
        let pending: Vec<(P, SenderId)> = self
            .queue
            .lock()
            .expect("binding queue poisoned")
            .drain(..)
            .collect();

        if pending.is_empty() {
            return;
        }

        let callbacks = self.callbacks.lock().expect("binding callback list poisoned");
        for (payload, sender) in &pending {
            for callback in callbacks.iter() {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| callback(payload, *sender)));
                if let Err(panic) = outcome {
                    let message = panic_message(&panic);
                    log::error!(
                        "handler panicked on channel {:?}: {message}",
                        self.channel
                    );
                }
            }
        }
    }

    fn channel(&self) -> Channel {
        self.channel
    }

    fn payload_type_name(&self) -> &'static str {
        std::any::type_name::<P>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn call_delivers_queued_payloads_in_fifo_order() {
        let binding = Binding::<i32>::new((1, 0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        binding.connect(move |payload, _sender| seen_clone.lock().unwrap().push(*payload));

        binding.emit(1, 0);
        binding.emit(2, 0);
        binding.emit(3, 0);
        binding.call();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(binding.pending_len(), 0);
    }

    #[test]
    fn call_invokes_every_callback_per_payload() {
        let binding = Binding::<i32>::new((1, 0));
        let calls = Arc::new(AtomicU32::new(0));
        for _ in 0..3 {
            let calls = calls.clone();
            binding.connect(move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        binding.emit(7, 0);
        binding.call();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn panicking_callback_does_not_stop_remaining_dispatch() {
        let binding = Binding::<i32>::new((1, 0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        binding.connect(|_, _| panic!("boom"));
        let seen_clone = seen.clone();
        binding.connect(move |payload, _| seen_clone.lock().unwrap().push(*payload));

        binding.emit(1, 0);
        binding.emit(2, 0);
        binding.call();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn empty_queue_call_is_a_no_op() {
        let binding = Binding::<i32>::new((1, 0));
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        binding.connect(move |_, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        binding.call();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
