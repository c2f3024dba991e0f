//! Command execution helpers
//!
//! Every route handler goes through [`execute_command`] so timing and
//! outcome logging stay uniform.

use std::future::Future;
use std::time::Instant;

use encore_domain::Result as DomainResult;
use tracing::debug;

use crate::error::ApiError;
use crate::utils::logging::{error_label, log_command_execution};

/// Execute a command, log its duration and outcome, and convert the error
/// into an HTTP response.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_bands(
///     State(ctx): State<Arc<AppContext>>,
///     CurrentUser(user): CurrentUser,
/// ) -> ApiResult<Json<Vec<Band>>> {
///     execute_command("bands::list_bands", ctx.bands.list_bands(&user)).await.map(Json)
/// }
/// ```
pub async fn execute_command<Fut, T>(command_name: &str, command: Fut) -> Result<T, ApiError>
where
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command.await;
    let elapsed = start.elapsed();

    log_command_execution(command_name, elapsed, result.is_ok());
    if let Err(err) = &result {
        debug!(command = command_name, error_type = error_label(err), error = %err, "command failed");
    }

    result.map_err(ApiError::from)
}
