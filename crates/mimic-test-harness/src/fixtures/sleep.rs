//! Sleeping on an injected clock.

use mimic_clock::Clock;
use mimic_common_core::Result;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;

/// Return a future that completes once `delay` has elapsed on `clock`.
///
/// The timer is scheduled immediately, so on a virtual clock the future
/// completes after the test advances time past `delay`, even if it is
/// awaited only afterwards. If the timer is cancelled or discarded, the
/// future completes without waiting.
pub fn sleep(clock: &dyn Clock, delay: Duration) -> Result<impl Future<Output = ()>> {
    let (tx, rx) = oneshot::channel();
    let mut tx = Some(tx);
    clock.schedule_once(
        Box::new(move || {
            if let Some(tx) = tx.take() {
                let _ = tx.send(());
            }
        }),
        delay,
    )?;
    Ok(async move {
        let _ = rx.await;
    })
}
