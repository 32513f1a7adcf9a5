use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing from the editor settings.
///
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_tracing_with_config(level: &str, json_format: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_new(level).wrap_err_with(|| format!("Invalid log level: {level}"))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if json_format {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.json().with_current_span(true).with_span_list(false))
            .try_init()
            .wrap_err("Failed to install JSON subscriber")?;
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.compact())
            .try_init()
            .wrap_err("Failed to install console subscriber")?;
    }

    tracing::debug!(level, json_format, "Route editor logging initialized");
    Ok(())
}

/// Span covering one edit session of a route (`None` when creating).
pub fn create_session_span(route: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "route_edit",
        route.name = route.unwrap_or(""),
        mode = if route.is_some() { "edit" } else { "create" },
        outcome = tracing::field::Empty,
    )
}

/// Span around a single directory lookup
pub fn create_directory_span(directory: &str) -> tracing::Span {
    tracing::debug_span!("directory_fetch", directory = directory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_with_config_rejects_bad_filter() {
        assert!(init_tracing_with_config("route_editor=loudest", false).is_err());
    }

    #[test]
    fn test_create_session_span() {
        let span = create_session_span(Some("user-default"));
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "route_edit");
        }
    }

    #[test]
    fn test_create_directory_span() {
        let span = create_directory_span("services");
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "directory_fetch");
        }
    }
}
