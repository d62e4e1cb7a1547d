//! A handle to a [`Server`] running on its own task.

use super::{Server, Shutdown};
use crate::{error::StartError, RpcHandler, Transport};

/// Handle for closing or joining a spawned [`Server`].
pub struct Handle {
    join: tokio::task::JoinHandle<Result<(), StartError>>,
    close: Close,
}

/// Struct which when dropped will shut the server down.
struct Close(Shutdown);

impl<T, H> Server<T, H>
where
    T: Transport,
    H: RpcHandler,
{
    /// Run the server on a new task.
    ///
    /// Dropping the returned [`Handle`] shuts the server down.
    pub fn spawn(self) -> Handle {
        let close = Close(self.shutdown_signal());
        let join = tokio::spawn(self.start());
        Handle { join, close }
    }
}

impl Handle {
    /// A signal that shuts down the server without consuming the handle.
    pub fn shutdown_signal(&self) -> Shutdown {
        self.close.0.clone()
    }

    /// Whether the server task has finished.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Shut the server down and join it.
    ///
    /// If this future isn't polled the server will continue to run.
    /// However, if the future is dropped the server will be shut down.
    pub async fn close(self) -> Result<(), StartError> {
        let Self { join, close } = self;
        close.close();
        flatten_result(join.await)
    }

    /// Join the server.
    ///
    /// This does not shut the server down.
    /// Instead it waits for the dispatch loop to finish.
    ///
    /// If this future is dropped then the server will be shut down.
    pub async fn join(self) -> Result<(), StartError> {
        let Self { join, close } = self;
        let r = join.await;
        close.close();
        flatten_result(r)
    }
}

impl Close {
    fn close(&self) {
        self.0.shutdown();
    }
}

impl Drop for Close {
    fn drop(&mut self) {
        self.close();
    }
}

/// Flatten the result of a join handle into the server result.
fn flatten_result(
    result: Result<Result<(), StartError>, tokio::task::JoinError>,
) -> Result<(), StartError> {
    match result {
        // Joined successfully.
        // Return the result from the task.
        Ok(r) => r,
        Err(e) => {
            // If the task panicked then resume the panic.
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic())
            } else {
                // If the task was cancelled then we consider the server
                // to have successfully finished.
                Ok(())
            }
        }
    }
}
