//! Hand-off of notices from background passes to the main context
//!
//! Validation passes run on the tokio pool. Presenting a notice must happen on
//! the single main/UI context, so [`MainThreadReporter::report`] queues the
//! notice for the [`MainThreadDispatcher`] and suspends until the presenter
//! has shown it.

use async_trait::async_trait;
use intellisense_check_core::error::{Error, Result};
use intellisense_check_core::report::{Notice, NoticePresenter, Reporter};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

struct NoticeRequest {
    notice: Notice,
    presented: oneshot::Sender<()>,
}

/// Create a connected reporter/dispatcher pair
pub fn main_thread_channel<P>(
    capacity: usize,
    presenter: P,
) -> (MainThreadReporter, MainThreadDispatcher<P>)
where
    P: NoticePresenter,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        MainThreadReporter { tx },
        MainThreadDispatcher { rx, presenter },
    )
}

/// Reporter side, cloned into every validator
#[derive(Clone)]
pub struct MainThreadReporter {
    tx: mpsc::Sender<NoticeRequest>,
}

#[async_trait]
impl Reporter for MainThreadReporter {
    async fn report(&self, notice: Notice) -> Result<()> {
        let (presented_tx, presented_rx) = oneshot::channel();
        self.tx
            .send(NoticeRequest {
                notice,
                presented: presented_tx,
            })
            .await
            .map_err(|_| Error::reporter("Main-thread dispatcher has shut down"))?;

        presented_rx
            .await
            .map_err(|_| Error::reporter("Notice was dropped before it was presented"))
    }
}

/// Owns the presenter; drive it from the main context
pub struct MainThreadDispatcher<P> {
    rx: mpsc::Receiver<NoticeRequest>,
    presenter: P,
}

impl<P: NoticePresenter> MainThreadDispatcher<P> {
    /// Present notices until every reporter is dropped
    pub async fn run(mut self) -> P {
        while let Some(request) = self.rx.recv().await {
            self.present(request);
        }
        debug!("Notice dispatcher stopped: all reporters dropped");
        self.presenter
    }

    /// Present notices until `shutdown` fires, then drain what is queued
    pub async fn run_until(mut self, shutdown: CancellationToken) -> P {
        loop {
            tokio::select! {
                request = self.rx.recv() => match request {
                    Some(request) => self.present(request),
                    None => break,
                },
                _ = shutdown.cancelled() => {
                    while let Ok(request) = self.rx.try_recv() {
                        self.present(request);
                    }
                    break;
                }
            }
        }
        debug!("Notice dispatcher stopped");
        self.presenter
    }

    fn present(&mut self, request: NoticeRequest) {
        trace!("Presenting notice for {:?}", request.notice.project_name);
        self.presenter.present(&request.notice);
        // Reporter may have given up waiting
        let _ = request.presented.send(());
    }
}
