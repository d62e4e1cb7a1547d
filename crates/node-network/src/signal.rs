use tokio::sync::watch;

/// Resolves once the watched flag is raised or its sender is dropped.
pub(crate) async fn raised(rx: &mut watch::Receiver<bool>) {
    loop {
        let is_raised = *rx.borrow_and_update();
        if is_raised || rx.changed().await.is_err() {
            return;
        }
    }
}
