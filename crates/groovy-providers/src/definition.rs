//! Go-to-definition.

use crate::error::{CancellationToken, ProviderError};
use crate::items::Location;
use crate::resolve::{WorkspaceView, resolve_at};
use groovy_compilation::CompilationCache;
use groovy_position::Position;
use url::Url;

/// Resolves the position to its declaration's location. Dependency-only
/// results come back empty — the core does not decompile.
pub fn definition(
    cache: &CompilationCache,
    workspace: &WorkspaceView,
    uri: &Url,
    position: Position,
    token: &CancellationToken,
) -> Result<Vec<Location>, ProviderError> {
    token.checkpoint()?;
    let Some((handle, decl)) = resolve_at(cache, uri, position) else {
        return Ok(Vec::new());
    };
    if !workspace.owns(&handle.uri) {
        return Ok(Vec::new());
    }
    Ok(vec![Location { uri: handle.uri, range: decl.selection_range }])
}
