//! Async adapters for feeding a [`Forest`] from a symbol source.
//!
//! The engine itself never blocks and never waits: a [`Forest`] only moves
//! when it is fed. These adapters pull symbols from an async source and feed
//! them in arrival order, so a parse can follow input as it trickles in over a
//! channel or network stream.
//!
//! - feature `tokio`: [`tokio_impl::ChannelParser`] drains an
//!   `mpsc::Receiver`.
//! - feature `futures`: [`futures_impl::FeedStream`] drains any
//!   `futures_core::Stream`, runtime-agnostic.
//!
//! # Example
//!
//! ```ignore
//! use thicket::async_stream::tokio_impl::ChannelParser;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(32);
//! tokio::spawn(async move {
//!     for ch in "a,b\n".chars() {
//!         tx.send(ch).await?;
//!     }
//! });
//!
//! let mut parser = ChannelParser::new(Forest::new(grammar), rx);
//! parser.run().await?;
//! let tokens = parser.finish()?;
//! ```

use crate::Forest;

#[cfg(feature = "tokio")]
pub mod tokio_impl {
    //! Tokio channel adapter.

    use super::*;
    use crate::{Error, Rejection};
    use ::tokio::sync::mpsc;

    /// Feeds every symbol received on a channel into an owned forest.
    pub struct ChannelParser<S, T> {
        symbol_rx: mpsc::Receiver<S>,
        forest: Forest<S, T>,
    }

    impl<S, T> ChannelParser<S, T>
    where
        S: Clone + PartialEq,
        T: Clone,
    {
        /// Feeds `forest` from `symbol_rx`.
        pub fn new(forest: Forest<S, T>, symbol_rx: mpsc::Receiver<S>) -> Self {
            Self { symbol_rx, forest }
        }

        /// Feeds symbols until every sender is dropped.
        ///
        /// Returns the number of symbols received by this call. Stops early on
        /// the first limit violation; the channel is then left undrained.
        pub async fn run(&mut self) -> Result<usize, Error> {
            let mut received = 0;
            while let Some(symbol) = self.symbol_rx.recv().await {
                self.forest.feed(symbol)?;
                received += 1;
            }
            log::debug!("symbol channel closed after {} symbols", received);
            Ok(received)
        }

        /// The forest as fed so far.
        pub fn forest(&self) -> &Forest<S, T> {
            &self.forest
        }

        /// Classifies the input received so far. See [`Forest::finish`].
        pub fn finish(&mut self) -> Result<Vec<T>, Rejection> {
            self.forest.finish()
        }

        /// Gives the forest back, e.g. to keep feeding it by hand.
        pub fn into_forest(self) -> Forest<S, T> {
            self.forest
        }
    }
}

#[cfg(feature = "futures")]
pub mod futures_impl {
    //! Runtime-agnostic stream adapter.

    use super::*;
    use core::future::Future;
    use core::pin::Pin;
    use core::task::{Context, Poll};
    use futures_core::Stream;

    /// A future that feeds every item of a stream into a forest and resolves
    /// to that forest once the stream ends.
    ///
    /// Feeding stops at the first limit violation; the returned forest then
    /// reports it through [`Forest::aborted`] and [`Forest::finish`].
    pub struct FeedStream<St, S, T> {
        inner: St,
        forest: Option<Forest<S, T>>,
    }

    impl<St, S, T> FeedStream<St, S, T>
    where
        St: Stream<Item = S>,
    {
        /// Feeds `forest` with every item of `inner`.
        pub fn new(inner: St, forest: Forest<S, T>) -> Self {
            Self {
                inner,
                forest: Some(forest),
            }
        }
    }

    // The forest is never pinned in place.
    impl<St: Unpin, S, T> Unpin for FeedStream<St, S, T> {}

    impl<St, S, T> Future for FeedStream<St, S, T>
    where
        St: Stream<Item = S> + Unpin,
        S: Clone + PartialEq,
        T: Clone,
    {
        type Output = Forest<S, T>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            let this = self.get_mut();
            loop {
                match Pin::new(&mut this.inner).poll_next(cx) {
                    Poll::Ready(Some(symbol)) => {
                        let Some(forest) = this.forest.as_mut() else {
                            return Poll::Pending;
                        };
                        if forest.feed(symbol).is_err() {
                            break;
                        }
                    }
                    Poll::Ready(None) => break,
                    Poll::Pending => return Poll::Pending,
                }
            }
            match this.forest.take() {
                Some(forest) => Poll::Ready(forest),
                // Polled again after completion.
                None => Poll::Pending,
            }
        }
    }
}
