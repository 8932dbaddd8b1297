use super::Generator;
use anyhow::Result;

/// Functional combinators and terminal consumers.
///
/// Every combinator moves `self` into the body of the generator it returns,
/// so the chain is owned tip-to-source and pulls stay serialized: one
/// downstream pull drives at most one upstream pull (`filter` excepted,
/// which pulls until a match). Upstream errors surface from the in-progress
/// pull and leave the chain terminal.
impl<T: 'static> Generator<T> {
    /// Yields `f(v)` for each upstream `v`.
    pub fn map<U, F>(mut self, mut f: F) -> Generator<U>
    where
        U: 'static,
        F: FnMut(T) -> U + 'static,
    {
        Generator::new(move |y| async move {
            while let Some(value) = self.next()? {
                y.give(f(value)).await;
            }
            Ok(())
        })
    }

    /// Yields only the upstream values for which `p` holds.
    pub fn filter<P>(mut self, mut p: P) -> Generator<T>
    where
        P: FnMut(&T) -> bool + 'static,
    {
        Generator::new(move |y| async move {
            while let Some(value) = self.next()? {
                if p(&value) {
                    y.give(value).await;
                }
            }
            Ok(())
        })
    }

    /// Yields the first `n` upstream values. The upstream is never pulled
    /// more than `n` times; `take(0)` pulls nothing at all.
    pub fn take(mut self, n: usize) -> Generator<T> {
        Generator::new(move |y| async move {
            for _ in 0..n {
                match self.next()? {
                    Some(value) => y.give(value).await,
                    None => break,
                }
            }
            Ok(())
        })
    }

    /// Yields upstream values while `p` holds; the first failing element is
    /// discarded and the sequence ends there.
    pub fn take_while<P>(mut self, mut p: P) -> Generator<T>
    where
        P: FnMut(&T) -> bool + 'static,
    {
        Generator::new(move |y| async move {
            while let Some(value) = self.next()? {
                if !p(&value) {
                    break;
                }
                y.give(value).await;
            }
            Ok(())
        })
    }

    /// Yields the running aggregates of a left fold: for upstream values
    /// `v1, v2, …` this yields `f(init, v1)`, `f(f(init, v1), v2)`, and so
    /// on. The seed itself is not emitted, so an empty upstream yields
    /// nothing.
    pub fn scan<R, F>(mut self, init: R, mut f: F) -> Generator<R>
    where
        R: Clone + 'static,
        F: FnMut(R, T) -> R + 'static,
    {
        Generator::new(move |y| async move {
            let mut acc = init;
            while let Some(value) = self.next()? {
                acc = f(acc, value);
                y.give(acc.clone()).await;
            }
            Ok(())
        })
    }

    /// Pull the chain dry, applying `f` to each value.
    pub fn for_each<F>(mut self, mut f: F) -> Result<()>
    where
        F: FnMut(T),
    {
        while let Some(value) = self.next()? {
            f(value);
        }
        Ok(())
    }

    /// Left fold over the remaining values.
    pub fn fold<R, F>(mut self, init: R, mut f: F) -> Result<R>
    where
        F: FnMut(R, T) -> R,
    {
        let mut acc = init;
        while let Some(value) = self.next()? {
            acc = f(acc, value);
        }
        Ok(acc)
    }

    /// Fold seeded by the first element; `Ok(None)` on an empty generator,
    /// and `f` is never invoked for a one-element sequence.
    pub fn reduce<F>(mut self, mut f: F) -> Result<Option<T>>
    where
        F: FnMut(T, T) -> T,
    {
        let Some(mut acc) = self.next()? else {
            return Ok(None);
        };
        while let Some(value) = self.next()? {
            acc = f(acc, value);
        }
        Ok(Some(acc))
    }
}
