//! Observers receive `(state, time)` notifications from the integration loops.
//!
//! They are used for reporting only and never feed back into the integration.
//! Variants compose by delegation: [`Decimate`] wraps any other observer.

use crate::traits::Scalar;
use anyhow::{Context, Result};
use std::fmt::Display;
use std::io::{self, Write};

pub trait Observer<T: Scalar> {
    fn observe(&mut self, state: &[T], t: T) -> Result<()>;
}

impl<T: Scalar, O: Observer<T> + ?Sized> Observer<T> for &mut O {
    fn observe(&mut self, state: &[T], t: T) -> Result<()> {
        (**self).observe(state, t)
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl<T: Scalar> Observer<T> for Silent {
    fn observe(&mut self, _state: &[T], _t: T) -> Result<()> {
        Ok(())
    }
}

/// Forwards one notification out of every `every` to the inner observer.
///
/// The counter starts at zero, so the `every`-th call is the first one
/// forwarded. `every == 0` forwards all calls.
#[derive(Debug, Clone)]
pub struct Decimate<O> {
    inner: O,
    every: usize,
    counter: usize,
}

impl<O> Decimate<O> {
    pub fn new(every: usize, inner: O) -> Self {
        Self {
            inner,
            every,
            counter: 0,
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn into_inner(self) -> O {
        self.inner
    }

    fn should_observe(&mut self) -> bool {
        if self.every == 0 {
            return true;
        }
        self.counter += 1;
        if self.counter == self.every {
            self.counter = 0;
            return true;
        }
        false
    }
}

impl<T: Scalar, O: Observer<T>> Observer<T> for Decimate<O> {
    fn observe(&mut self, state: &[T], t: T) -> Result<()> {
        if self.should_observe() {
            self.inner.observe(state, t)?;
        }
        Ok(())
    }
}

/// Writes one line per notification: the time followed by the state
/// components, separated by spaces.
#[derive(Debug)]
pub struct Print<W> {
    out: W,
}

impl Print<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> Print<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<T: Scalar + Display, W: Write> Observer<T> for Print<W> {
    fn observe(&mut self, state: &[T], t: T) -> Result<()> {
        let mut line = t.to_string();
        for value in state {
            line.push(' ');
            line.push_str(&value.to_string());
        }
        writeln!(self.out, "{line}").context("Failed to write observation.")
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Clone, Default)]
pub struct Record<T> {
    pub times: Vec<T>,
    pub states: Vec<Vec<T>>,
}

impl<T> Record<T> {
    pub fn new() -> Self {
        Self {
            times: Vec::new(),
            states: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl<T: Scalar> Observer<T> for Record<T> {
    fn observe(&mut self, state: &[T], t: T) -> Result<()> {
        self.times.push(t);
        self.states.push(state.to_vec());
        Ok(())
    }
}

/// Observer backed by a closure, see [`from_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(F);

/// Wraps a closure `|state, t|` as an [`Observer`].
pub fn from_fn<F>(f: F) -> FromFn<F> {
    FromFn(f)
}

impl<T: Scalar, F: FnMut(&[T], T)> Observer<T> for FromFn<F> {
    fn observe(&mut self, state: &[T], t: T) -> Result<()> {
        (self.0)(state, t);
        Ok(())
    }
}
