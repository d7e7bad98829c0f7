use axum::Router;

/// A business module that contributes HTTP routes.
///
/// Each module mounts its own routes under `/{name}`; the server binary
/// merges them.
pub trait Module: Send + Sync {
    /// Module name, used for logging and as the route prefix.
    fn name(&self) -> &str;

    /// Routes with state applied, already under the module's prefix.
    fn routes(&self) -> Router;
}
