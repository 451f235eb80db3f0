//! Token refresh collaborator

use crate::error::RefreshError;
use async_trait::async_trait;
use std::future::Future;
use std::rc::Rc;

/// Exchanges the long-lived credential for a new access token.
///
/// Implementations update the session store and persisted storage themselves;
/// the guard only looks at whether the call succeeded.
#[async_trait(?Send)]
pub trait TokenRefresher {
    async fn refresh(&self) -> Result<(), RefreshError>;
}

#[async_trait(?Send)]
impl<T: TokenRefresher + ?Sized> TokenRefresher for Rc<T> {
    async fn refresh(&self) -> Result<(), RefreshError> {
        (**self).refresh().await
    }
}

/// Adapts an async closure into a [`TokenRefresher`]
pub struct FnRefresher<F>(F);

impl<F> FnRefresher<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait(?Send)]
impl<F, Fut> TokenRefresher for FnRefresher<F>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), RefreshError>> + 'static,
{
    async fn refresh(&self) -> Result<(), RefreshError> {
        (self.0)().await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_fn_refresher_runs_closure() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let refresher = FnRefresher::new(move || {
            let counter = counter.clone();
            async move {
                counter.set(counter.get() + 1);
                Ok(())
            }
        });

        refresher.refresh().await.unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_fn_refresher_propagates_failure() {
        let refresher = FnRefresher::new(|| async { Err(RefreshError::NoCredential) });
        assert_eq!(refresher.refresh().await, Err(RefreshError::NoCredential));
    }
}
