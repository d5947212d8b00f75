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

//! Adapts handler signatures of varying arity into the uniform
//! `Fn(&P, SenderId)` shape [`Binder`] stores.
//!
//! The four accepted shapes, matching a target's method signature:
//! `Fn(&T)`, `Fn(&T, SenderId)`, `Fn(&T, &P)` and `Fn(&T, &P, SenderId)`.
//! Each is a distinct `Fn` trait for a given closure type, so the compiler
//! picks the matching [`IntoCallback`] impl without any arity argument from
//! the caller. [`connect`] accepts the payload-carrying shapes; [`connect_void`]
//! accepts the `Void`-payload shapes, mirroring `connectV` in spirit while
//! reading as ordinary generic Rust rather than a template trick.

use std::sync::Arc;

use crate::event::binder::Binder;
use crate::event::types::{DestinationId, EventId, SenderId, Void};

/// Marker for `Fn(&T, &P, SenderId)` handlers.
pub struct WithSender;
/// Marker for `Fn(&T, &P)` handlers.
pub struct WithoutSender;

/// The uniform callback shape a [`Binding`](crate::event::binding::Binding) stores.
pub type Callback<P> = Box<dyn Fn(&P, SenderId) + Send + Sync>;

/// Converts a handler of one accepted arity, bound to `target`, into the
/// uniform callback shape a [`Binding`](crate::event::binding::Binding) stores.
pub trait IntoCallback<T, P, Marker>
where
    T: Send + Sync + 'static,
    P: Send + 'static,
{
    /// Produce the uniform callback, closing over `target`.
    fn into_callback(self, target: Arc<T>) -> Callback<P>;
}

impl<T, P, F> IntoCallback<T, P, WithSender> for F
where
    T: Send + Sync + 'static,
    P: Send + 'static,
    F: Fn(&T, &P, SenderId) + Send + Sync + 'static,
{
    fn into_callback(self, target: Arc<T>) -> Callback<P> {
        Box::new(move |payload, sender| (self)(&target, payload, sender))
    }
}

impl<T, P, F> IntoCallback<T, P, WithoutSender> for F
where
    T: Send + Sync + 'static,
    P: Send + 'static,
    F: Fn(&T, &P) + Send + Sync + 'static,
{
    fn into_callback(self, target: Arc<T>) -> Callback<P> {
        Box::new(move |payload, _sender| (self)(&target, payload))
    }
}

/// Marker for `Fn(&T)` handlers connected against a `Void` channel.
pub struct VoidOnly;
/// Marker for `Fn(&T, SenderId)` handlers connected against a `Void` channel.
pub struct VoidWithSender;

impl<T, F> IntoCallback<T, Void, VoidOnly> for F
where
    T: Send + Sync + 'static,
    F: Fn(&T) + Send + Sync + 'static,
{
    fn into_callback(self, target: Arc<T>) -> Callback<Void> {
        Box::new(move |_payload, _sender| (self)(&target))
    }
}

impl<T, F> IntoCallback<T, Void, VoidWithSender> for F
where
    T: Send + Sync + 'static,
    F: Fn(&T, SenderId) + Send + Sync + 'static,
{
    fn into_callback(self, target: Arc<T>) -> Callback<Void> {
        Box::new(move |_payload, sender| (self)(&target, sender))
    }
}

/// Register a payload-carrying handler method on `(id, dest)`.
///
/// Accepts `Fn(&T, &P)` and `Fn(&T, &P, SenderId)` methods; the payload type
/// `P` is deduced from the handler's signature.
pub fn connect<T, P, F, Marker>(
    binder: &Binder,
    id: EventId,
    dest: DestinationId,
    target: Arc<T>,
    handler: F,
) where
    T: Send + Sync + 'static,
    P: Send + 'static,
    F: IntoCallback<T, P, Marker> + 'static,
{
    let callback = handler.into_callback(target);
    binder.connect::<P, _>(id, dest, move |payload, sender| callback(payload, sender));
}

/// Register a `Void`-payload handler method on `(id, dest)`.
///
/// Accepts `Fn(&T)` and `Fn(&T, SenderId)` methods. Attempting to use this
/// for a handler that expects a real payload does not compile: no
/// [`IntoCallback<T, Void, _>`] impl matches such a handler's `Fn` trait.
pub fn connect_void<T, F, Marker>(
    binder: &Binder,
    id: EventId,
    dest: DestinationId,
    target: Arc<T>,
    handler: F,
) where
    T: Send + Sync + 'static,
    F: IntoCallback<T, Void, Marker> + 'static,
{
    let callback = handler.into_callback(target);
    binder.connect::<Void, _>(id, dest, move |payload, sender| callback(payload, sender));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    struct Counter {
        total: AtomicI32,
    }

    #[test]
    fn connect_with_payload_and_sender() {
        let binder = Binder::new();
        let target = Arc::new(Counter {
            total: AtomicI32::new(0),
        });

        connect::<Counter, i32, _, _>(
            &binder,
            1,
            0,
            target.clone(),
            |t: &Counter, payload: &i32, sender: SenderId| {
                t.total
                    .fetch_add(*payload + sender as i32, Ordering::SeqCst);
            },
        );

        binder.emit::<i32>(1, 0, 5, 2).unwrap();
        binder.tick();

        assert_eq!(target.total.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn connect_with_payload_only() {
        let binder = Binder::new();
        let target = Arc::new(Counter {
            total: AtomicI32::new(0),
        });

        connect::<Counter, i32, _, _>(
            &binder,
            2,
            0,
            target.clone(),
            |t: &Counter, payload: &i32| {
                t.total.fetch_add(*payload, Ordering::SeqCst);
            },
        );

        binder.emit::<i32>(2, 0, 5, 99).unwrap();
        binder.tick();

        assert_eq!(target.total.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn connect_void_without_sender() {
        let binder = Binder::new();
        let target = Arc::new(Counter {
            total: AtomicI32::new(0),
        });

        connect_void::<Counter, _, _>(&binder, 3, 0, target.clone(), |t: &Counter| {
            t.total.fetch_add(1, Ordering::SeqCst);
        });

        binder.emit::<Void>(3, 0, Void, 0).unwrap();
        binder.tick();

        assert_eq!(target.total.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn connect_void_with_sender() {
        let binder = Binder::new();
        let target = Arc::new(Counter {
            total: AtomicI32::new(0),
        });

        connect_void::<Counter, _, _>(
            &binder,
            4,
            0,
            target.clone(),
            |t: &Counter, sender: SenderId| {
                t.total.fetch_add(sender as i32, Ordering::SeqCst);
            },
        );

        binder.emit::<Void>(4, 0, Void, 11).unwrap();
        binder.tick();

        assert_eq!(target.total.load(Ordering::SeqCst), 11);
    }
}
