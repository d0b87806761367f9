//! Derived cells: pure functions of one or more observables.

use crate::cell::{Cell, Observable, Subscriber, Subscription};
use std::sync::Arc;

/// Read-only cell whose value is recomputed whenever a source broadcasts.
///
/// Holds its source subscriptions, so the derivation stays live as long as
/// any handle to it exists. Chaining is the point: a `Derived` is itself an
/// `Observable` and can feed further derivations.
pub struct Derived<T> {
    cell: Cell<T>,
    _sources: Arc<Vec<Subscription>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            _sources: Arc::clone(&self._sources),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for Derived<T> {
    fn get(&self) -> T {
        self.cell.get()
    }

    fn subscribe_with(&self, subscriber: Subscriber<T>) -> Subscription {
        self.cell.subscribe_with(subscriber)
    }
}

/// Derive from a single source.
pub fn derived<A, T, F>(source: &impl Observable<A>, f: F) -> Derived<T>
where
    A: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(&A) -> T + Send + Sync + 'static,
{
    let source = source.clone();
    let cell = Cell::new(f(&source.get()));
    let sub = {
        let cell = cell.clone();
        source.on_change(move |value| cell.set(f(value)))
    };
    Derived {
        cell,
        _sources: Arc::new(vec![sub]),
    }
}

/// Derive from two sources.
///
/// A broadcast from either source recomputes against the current value of
/// both; within one synchronous wave that snapshot is consistent.
pub fn derived2<A, B, T, F>(a: &impl Observable<A>, b: &impl Observable<B>, f: F) -> Derived<T>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(&A, &B) -> T + Send + Sync + 'static,
{
    let (a, b) = (a.clone(), b.clone());
    let f = Arc::new(f);
    let cell = Cell::new(f(&a.get(), &b.get()));
    let recompute: Arc<dyn Fn() + Send + Sync> = {
        let (a, b, cell, f) = (a.clone(), b.clone(), cell.clone(), Arc::clone(&f));
        Arc::new(move || cell.set(f(&a.get(), &b.get())))
    };
    let subs = vec![
        {
            let recompute = Arc::clone(&recompute);
            a.on_change(move |_| recompute())
        },
        {
            let recompute = Arc::clone(&recompute);
            b.on_change(move |_| recompute())
        },
    ];
    Derived {
        cell,
        _sources: Arc::new(subs),
    }
}

/// Derive from three sources.
pub fn derived3<A, B, C, T, F>(
    a: &impl Observable<A>,
    b: &impl Observable<B>,
    c: &impl Observable<C>,
    f: F,
) -> Derived<T>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(&A, &B, &C) -> T + Send + Sync + 'static,
{
    let (a, b, c) = (a.clone(), b.clone(), c.clone());
    let f = Arc::new(f);
    let cell = Cell::new(f(&a.get(), &b.get(), &c.get()));
    let recompute: Arc<dyn Fn() + Send + Sync> = {
        let (a, b, c, cell, f) = (
            a.clone(),
            b.clone(),
            c.clone(),
            cell.clone(),
            Arc::clone(&f),
        );
        Arc::new(move || cell.set(f(&a.get(), &b.get(), &c.get())))
    };
    let subs = vec![
        {
            let recompute = Arc::clone(&recompute);
            a.on_change(move |_| recompute())
        },
        {
            let recompute = Arc::clone(&recompute);
            b.on_change(move |_| recompute())
        },
        {
            let recompute = Arc::clone(&recompute);
            c.on_change(move |_| recompute())
        },
    ];
    Derived {
        cell,
        _sources: Arc::new(subs),
    }
}
